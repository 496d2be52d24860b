//! A single client WebSocket, wrapped so the handler deals in bytes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::TurncoatError;

/// Counter for generating unique connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// An upgraded client connection.
///
/// Owned by exactly one handler task, so no locking is needed around the
/// stream.
pub(crate) struct Connection {
    id: u64,
    peer: SocketAddr,
    ws: WebSocketStream<TcpStream>,
}

impl Connection {
    /// Performs the WebSocket upgrade on an accepted TCP stream.
    pub(crate) async fn accept(stream: TcpStream, peer: SocketAddr) -> Result<Self, TurncoatError> {
        let ws = tokio_tungstenite::accept_async(stream).await?;
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(conn = id, %peer, "accepted websocket connection");
        Ok(Self { id, peer, ws })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one JSON document as a text frame.
    pub(crate) async fn send(&mut self, data: Vec<u8>) -> Result<(), TurncoatError> {
        let msg = match String::from_utf8(data) {
            Ok(text) => Message::Text(text.into()),
            Err(e) => Message::Binary(e.into_bytes().into()),
        };
        self.ws.send(msg).await?;
        Ok(())
    }

    /// Next data frame, text or binary. `None` once the peer closes.
    ///
    /// Ping, pong and raw frames are skipped; tungstenite answers pings
    /// on its own.
    pub(crate) async fn recv(&mut self) -> Result<Option<Vec<u8>>, TurncoatError> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Sends a close frame. Errors are ignored; the peer may be gone.
    pub(crate) async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
