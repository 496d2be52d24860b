//! `TurncoatServer` builder and accept loop.
//!
//! This is the entry point for running a Turncoat server. It ties the
//! layers together: WebSocket → protocol → room manager.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use turncoat_protocol::JsonCodec;
use turncoat_room::{GameLog, RoomConfig, RoomManager};

use crate::TurncoatError;
use crate::connection::Connection;
use crate::handler::handle_connection;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) room: RoomManager,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Turncoat server.
///
/// # Example
///
/// ```rust,ignore
/// use turncoat::prelude::*;
///
/// let server = TurncoatServer::builder()
///     .bind("0.0.0.0:8080")
///     .log_file("game-logs.json")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TurncoatServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    log_file: Option<PathBuf>,
}

impl TurncoatServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room_config: RoomConfig::default(),
            log_file: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Persists the game log to `path` and reloads it on start.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Loads the game log, starts the room and binds the listener.
    ///
    /// An unreadable or corrupt log file is logged and the server starts
    /// with an empty log. The file is overwritten after the next game.
    ///
    /// # Errors
    /// [`TurncoatError::Accept`] if the address can't be bound.
    pub async fn build(self) -> Result<TurncoatServer, TurncoatError> {
        let capacity = self.room_config.log_capacity;
        let log = match &self.log_file {
            Some(path) => match GameLog::open(path, capacity).await {
                Ok(log) => log,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "game log unusable, starting a new one"
                    );
                    GameLog::fresh_at(path, capacity)
                }
            },
            None => GameLog::in_memory(capacity),
        };

        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(TurncoatError::Accept)?;
        tracing::info!(addr = %self.bind_addr, "websocket listener bound");

        let state = Arc::new(ServerState {
            room: RoomManager::with_log(self.room_config, log),
            codec: JsonCodec,
        });

        Ok(TurncoatServer { listener, state })
    }
}

impl Default for TurncoatServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Turncoat server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TurncoatServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl TurncoatServer {
    /// Creates a new builder.
    pub fn builder() -> TurncoatServerBuilder {
        TurncoatServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the room, for in-process callers and tests.
    pub fn room(&self) -> RoomManager {
        self.state.room.clone()
    }

    /// Runs the accept loop.
    ///
    /// Each accepted socket is upgraded and handled on its own task. Runs
    /// until the process is terminated.
    pub async fn run(self) -> Result<(), TurncoatError> {
        tracing::info!("turncoat server running");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let conn = match Connection::accept(stream, peer).await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::debug!(%peer, error = %e, "websocket upgrade failed");
                        return;
                    }
                };
                if let Err(e) = handle_connection(conn, state).await {
                    tracing::debug!(%peer, error = %e, "connection ended with error");
                }
            });
        }
    }
}
