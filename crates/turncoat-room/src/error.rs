//! Error types for the room layer.

/// Errors that can occur during room operations.
///
/// None of these are fatal: the room stays usable after any of them.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A game is in progress; joins are rejected until the room resets.
    #[error("game {0} is in progress, try again after it ends")]
    RoomBusy(u64),

    /// A required field was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The room actor has shut down or its channel is closed.
    #[error("room is unavailable")]
    Unavailable,

    /// Writing the game log to disk failed.
    #[error("failed to persist game log: {0}")]
    Persist(#[source] std::io::Error),

    /// The game log could not be parsed or serialized.
    #[error("game log format error: {0}")]
    LogFormat(#[source] serde_json::Error),
}

impl RoomError {
    /// HTTP-style status code for the request layer.
    pub fn status(&self) -> u16 {
        match self {
            Self::RoomBusy(_) => 409,
            Self::InvalidArgument(_) => 400,
            Self::Unavailable => 503,
            Self::Persist(_) | Self::LogFormat(_) => 500,
        }
    }
}
