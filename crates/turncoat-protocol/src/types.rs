//! Room data model shared by the core and the request layer.
//!
//! Every type here serializes with camelCase field names, so a browser
//! client sees `isTraitor`, `joinedAt`, `gamePhase`, and so on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque, server-generated player identifier.
///
/// Ids are never reused for the lifetime of a room manager, so a client
/// holding a stale id can at worst leave a room it is no longer in (a no-op).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// Which side a player was assigned to.
///
/// On the wire this is the plain number `0`, `1` or `2`; `0` means the
/// player has not been through an assignment yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Team {
    #[default]
    Unassigned,
    One,
    Two,
}

impl From<Team> for u8 {
    fn from(team: Team) -> u8 {
        match team {
            Team::Unassigned => 0,
            Team::One => 1,
            Team::Two => 2,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unassigned),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(ProtocolError::InvalidMessage(format!(
                "team must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seated or queued player.
///
/// `is_traitor` and `team` stay at their defaults until the room fills;
/// the assignment stamps them once and nothing touches them afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_traitor: bool,
    pub team: Team,
    /// Unix epoch milliseconds.
    pub joined_at: u64,
}

impl Player {
    /// Creates an unassigned, non-traitor player.
    pub fn new(id: PlayerId, name: impl Into<String>, joined_at: u64) -> Self {
        Self {
            id,
            name: name.into(),
            is_traitor: false,
            team: Team::Unassigned,
            joined_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Room lifecycle.
///
/// ```text
/// Waiting ──(room reaches capacity)──→ Playing ──(reset delay)──→ Waiting
/// ```
///
/// There is no terminal state; the room cycles for as long as the process
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Waiting,
    Playing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// The two sides of one game. Both lists are empty while waiting.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teams {
    pub team1: Vec<Player>,
    pub team2: Vec<Player>,
}

impl Teams {
    /// Returns `true` when no assignment has been made.
    pub fn is_empty(&self) -> bool {
        self.team1.is_empty() && self.team2.is_empty()
    }

    /// Iterates over both teams, team 1 first.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.team1.iter().chain(self.team2.iter())
    }

    /// Ids of every traitor on either team.
    pub fn traitor_ids(&self) -> Vec<PlayerId> {
        self.iter()
            .filter(|p| p.is_traitor)
            .map(|p| p.id.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RoomSnapshot
// ---------------------------------------------------------------------------

/// A consistent, owned copy of the room at one instant.
///
/// Mutating a snapshot never affects the room it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// Seated players in join order.
    pub players: Vec<Player>,
    #[serde(rename = "gamePhase")]
    pub phase: Phase,
    pub teams: Teams,
    pub player_count: usize,
    /// Queued players, front of the queue first.
    pub waiting_queue: Vec<Player>,
    pub waiting_count: usize,
    pub game_number: u64,
    pub capacity: usize,
    /// Games retained in the game log.
    pub total_games: usize,
}

#[cfg(test)]
impl RoomSnapshot {
    /// An empty waiting room.
    pub(crate) fn empty(capacity: usize, game_number: u64) -> Self {
        Self {
            players: Vec::new(),
            phase: Phase::Waiting,
            teams: Teams::default(),
            player_count: 0,
            waiting_queue: Vec::new(),
            waiting_count: 0,
            game_number,
            capacity,
            total_games: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// GameRecord
// ---------------------------------------------------------------------------

/// Archive entry for one completed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    /// Unix epoch milliseconds at assignment time.
    pub timestamp: u64,
    pub game_number: u64,
    /// Seated players in join order, with their assignment stamped.
    pub players: Vec<Player>,
    pub teams: Teams,
    pub traitors: Vec<PlayerId>,
}
