//! Single-room matchmaking for Turncoat.
//!
//! Players join one fixed-capacity room. When the last seat is taken the
//! room starts a game: everyone is shuffled into two teams and a few are
//! secretly made traitors. After a fixed delay the room resets and the
//! front of the waiting queue moves into the fresh room.
//!
//! # Key types
//!
//! - [`RoomManager`]: handle to the room actor; the entry point for
//!   request handlers
//! - [`Room`]: the synchronous state machine the actor drives
//! - [`assign_teams`]: the traitor draw and team split
//! - [`GameLog`]: capped archive of started games
//! - [`RoomConfig`]: capacity, reset delay, traitor rules

mod assign;
mod config;
mod error;
mod gamelog;
mod manager;
mod room;

pub use assign::assign_teams;
pub use config::{RoomConfig, SplitPolicy};
pub use error::RoomError;
pub use gamelog::{DEFAULT_LOG_CAPACITY, GameLog};
pub use manager::{JoinOutcome, LogPage, RoomManager};
pub use room::{Admission, Departure, Placement, Promotion, Room};
