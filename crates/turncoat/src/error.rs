//! Unified error type for the Turncoat server.

use turncoat_protocol::ProtocolError;
use turncoat_room::RoomError;

/// Top-level error that wraps the per-crate errors plus the socket layer.
///
/// The `#[from]` attribute on each wrapped variant generates a `From` impl,
/// so `?` converts protocol and room errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TurncoatError {
    /// Binding or accepting TCP connections failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// The WebSocket upgrade, a send, or a receive failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (busy, invalid argument, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),
}
