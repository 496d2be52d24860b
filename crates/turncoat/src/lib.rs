//! # Turncoat
//!
//! A single-room matchmaking server for team games with hidden traitors.
//!
//! Ten players fill one room. The tenth join starts a game: the room is
//! split into two teams of five and four players are secretly flagged as
//! traitors. Thirty seconds later the room resets and the next players
//! take their seats.
//!
//! Clients speak action-tagged JSON over a WebSocket:
//!
//! ```text
//! → {"action":"join","playerName":"Alex"}
//! ← {"type":"joined","status":200,"joinStatus":"seated","player":{...},"roomState":{...}}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use turncoat::prelude::*;
//!
//! # async fn run() -> Result<(), TurncoatError> {
//! let server = TurncoatServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .log_file("game-logs.json")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod connection;
mod error;
mod handler;
mod server;

pub use error::TurncoatError;
pub use server::{DEFAULT_BIND, TurncoatServer, TurncoatServerBuilder};

/// Everything needed to run a server or talk to one in-process.
pub mod prelude {
    pub use crate::{TurncoatError, TurncoatServer, TurncoatServerBuilder};
    pub use turncoat_protocol::{
        Codec, GameRecord, JoinStatus, JsonCodec, Phase, Player, PlayerId, Request, Response,
        RoomSnapshot, Team, Teams,
    };
    pub use turncoat_room::{GameLog, RoomConfig, RoomError, RoomManager, SplitPolicy};
}
