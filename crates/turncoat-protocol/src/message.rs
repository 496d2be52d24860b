//! Request and response messages.
//!
//! Requests are tagged by `action`, responses by `type`. Every response
//! carries an HTTP-style `status` so a client can treat 200/202 as success
//! and anything else as an error without inspecting the variant.
//!
//! ```text
//! → {"action":"join","playerName":"Alex"}
//! ← {"type":"joined","status":202,"joinStatus":"queued","waitingPosition":1,...}
//! ```

use serde::{Deserialize, Serialize};

use crate::{GameRecord, Player, PlayerId, RoomSnapshot};

/// Client → server.
///
/// Required fields default to empty instead of failing the decode, so a
/// missing name or id reaches the room and comes back as an
/// invalid-argument error rather than a generic decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Take a seat, or a place in the waiting queue if the room is full.
    Join {
        #[serde(default)]
        player_name: String,
    },
    /// Leave the room or the queue. Unknown ids are accepted.
    Leave {
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    /// Current room snapshot.
    GetState,
    /// Most recent game records.
    GetLogs,
}

/// Where a successful join put the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinStatus {
    Seated,
    Queued,
}

impl JoinStatus {
    /// `200` for a seat, `202` for accepted-but-queued.
    pub fn code(&self) -> u16 {
        match self {
            Self::Seated => 200,
            Self::Queued => 202,
        }
    }
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    Joined {
        status: u16,
        join_status: JoinStatus,
        player: Player,
        room_state: RoomSnapshot,
        /// 1-based queue position; absent when seated.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        waiting_position: Option<usize>,
    },
    Left {
        status: u16,
        success: bool,
        room_state: RoomSnapshot,
    },
    State {
        status: u16,
        room_state: RoomSnapshot,
    },
    Logs {
        status: u16,
        logs: Vec<GameRecord>,
        total_games: usize,
    },
    Error {
        status: u16,
        error: String,
    },
}

impl Response {
    /// Builds an error response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Error {
            status,
            error: message.into(),
        }
    }

    /// The HTTP-style status code carried by every variant.
    pub fn status(&self) -> u16 {
        match self {
            Self::Joined { status, .. }
            | Self::Left { status, .. }
            | Self::State { status, .. }
            | Self::Logs { status, .. }
            | Self::Error { status, .. } => *status,
        }
    }
}
