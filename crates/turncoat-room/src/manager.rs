//! Room manager: the actor that owns the room, and the handle callers use.
//!
//! The [`Room`] runs inside a single Tokio task. Join, leave and the reset
//! timer are all processed one at a time by that task, so a join that fills
//! the last seat and a reset that drains the queue can never interleave with
//! another mutation. Callers talk to it through [`RoomManager`], a cheap,
//! cloneable handle wrapping the command channel.
//!
//! After every mutation the actor publishes a fresh [`RoomSnapshot`] on a
//! `watch` channel. Snapshot reads and subscribers go through that channel,
//! never through the actor, and always see a complete state.
//!
//! Game log file writes happen on a separate writer task; the actor only
//! hands it the serialized bytes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use turncoat_protocol::{GameRecord, Player, PlayerId, RoomSnapshot};
use turncoat_timer::{Expired, ResetTimer};

use crate::room::{Departure, Placement, Room};
use crate::{GameLog, RoomConfig, RoomError};

/// Default command channel size for the room actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Result of a successful [`RoomManager::join`].
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub player: Player,
    pub placement: Placement,
    /// Room state right after the join.
    pub room_state: RoomSnapshot,
}

impl JoinOutcome {
    /// 1-based queue position, if the player was queued.
    pub fn waiting_position(&self) -> Option<usize> {
        match self.placement {
            Placement::Seated => None,
            Placement::Queued { position } => Some(position),
        }
    }
}

/// Result of [`RoomManager::logs`].
#[derive(Debug, Clone)]
pub struct LogPage {
    /// Most recent records, oldest first.
    pub logs: Vec<GameRecord>,
    /// Records retained in the log.
    pub total_games: usize,
}

/// Commands sent to the room actor.
enum RoomCommand {
    Join {
        name: String,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown,
}

/// Handle to the running room.
///
/// Clone it freely and share it between request handlers; every clone
/// talks to the same actor.
#[derive(Clone)]
pub struct RoomManager {
    sender: mpsc::Sender<RoomCommand>,
    state: watch::Receiver<RoomSnapshot>,
    log: Arc<Mutex<GameLog>>,
    recent_logs: usize,
}

impl RoomManager {
    /// Starts a room with a memory-only game log.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: RoomConfig) -> Self {
        let log = GameLog::in_memory(config.log_capacity);
        Self::with_log(config, log)
    }

    /// Starts a room backed by `log`.
    ///
    /// Game numbering continues after the last game in the log. If the log
    /// has a file path, every new record is written there.
    pub fn with_log(config: RoomConfig, log: GameLog) -> Self {
        let room = Room::starting_at(config, log.next_game_number());
        let recent_logs = room.config().recent_logs;
        let timer = ResetTimer::new(room.config().reset_delay);

        let mut initial = room.snapshot();
        initial.total_games = log.total();
        let (state_tx, state_rx) = watch::channel(initial);

        let writer = log.path().map(|p| spawn_log_writer(p.to_path_buf()));
        let log = Arc::new(Mutex::new(log));
        let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

        let actor = RoomActor {
            room,
            timer,
            log: Arc::clone(&log),
            writer,
            state: state_tx,
            receiver: rx,
        };
        tokio::spawn(actor.run());

        Self {
            sender: tx,
            state: state_rx,
            log,
            recent_logs,
        }
    }

    /// Seats a player, queues them, or rejects the join.
    ///
    /// # Errors
    /// - [`RoomError::InvalidArgument`] for a blank name.
    /// - [`RoomError::RoomBusy`] while a game is in progress.
    /// - [`RoomError::Unavailable`] after shutdown.
    pub async fn join(&self, name: &str) -> Result<JoinOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                name: name.to_owned(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Removes a player from the room or the queue. Unknown ids succeed.
    ///
    /// # Errors
    /// - [`RoomError::InvalidArgument`] for a blank id.
    /// - [`RoomError::Unavailable`] after shutdown.
    pub async fn leave(&self, player_id: &PlayerId) -> Result<RoomSnapshot, RoomError> {
        if player_id.as_str().trim().is_empty() {
            return Err(RoomError::InvalidArgument("player id is required".into()));
        }
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id: player_id.clone(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Latest published room state.
    ///
    /// # Errors
    /// [`RoomError::Unavailable`] after shutdown.
    pub fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        if self.sender.is_closed() {
            return Err(RoomError::Unavailable);
        }
        Ok(self.state.borrow().clone())
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<RoomSnapshot> {
        self.state.clone()
    }

    /// Most recent game records and the number retained.
    pub async fn logs(&self) -> LogPage {
        let log = self.log.lock().await;
        LogPage {
            logs: log.recent(self.recent_logs),
            total_games: log.total(),
        }
    }

    /// Stops the actor. A pending reset is dropped with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// The actor: owns the room and the reset timer.
struct RoomActor {
    room: Room,
    timer: ResetTimer,
    log: Arc<Mutex<GameLog>>,
    writer: Option<mpsc::UnboundedSender<Vec<u8>>>,
    state: watch::Sender<RoomSnapshot>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(
            game = self.room.game_number(),
            capacity = self.room.config().capacity,
            "room actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    match cmd {
                        RoomCommand::Join { name, reply } => {
                            let result = self.handle_join(&name).await;
                            let _ = reply.send(result);
                        }
                        RoomCommand::Leave { player_id, reply } => {
                            let snapshot = self.handle_leave(&player_id).await;
                            let _ = reply.send(snapshot);
                        }
                        RoomCommand::Shutdown => {
                            if let Some(generation) = self.timer.cancel() {
                                tracing::info!(game = generation, "pending reset dropped on shutdown");
                            }
                            break;
                        }
                    }
                }
                fired = self.timer.wait() => {
                    self.handle_reset(fired).await;
                }
            }
        }

        tracing::info!(game = self.room.game_number(), "room actor stopped");
    }

    async fn handle_join(&mut self, name: &str) -> Result<JoinOutcome, RoomError> {
        let admission = match self.room.join(name) {
            Ok(a) => a,
            Err(e) => {
                tracing::debug!(error = %e, "join rejected");
                return Err(e);
            }
        };

        if let Some(record) = admission.started {
            self.game_started(record).await;
        }
        let room_state = self.publish().await;

        Ok(JoinOutcome {
            player: admission.player,
            placement: admission.placement,
            room_state,
        })
    }

    async fn handle_leave(&mut self, player_id: &PlayerId) -> RoomSnapshot {
        match self.room.leave(player_id) {
            Departure::Absent => self.current().await,
            Departure::Seated(_) | Departure::Queued(_) => self.publish().await,
        }
    }

    async fn handle_reset(&mut self, fired: Expired) {
        if fired.late_by > self.room.config().reset_delay / 10 {
            tracing::warn!(
                game = fired.generation,
                late_ms = fired.late_by.as_millis() as u64,
                "reset fired late"
            );
        }

        let Some(promotion) = self.room.reset(fired.generation) else {
            return;
        };
        tracing::info!(
            finished = promotion.finished_game,
            game = self.room.game_number(),
            promoted = promotion.promoted,
            waiting = promotion.still_waiting,
            "room reset"
        );
        if let Some(record) = promotion.started {
            self.game_started(record).await;
        }
        self.publish().await;
    }

    /// Arms the reset for the new game and archives its record.
    async fn game_started(&mut self, record: GameRecord) {
        self.timer.arm(record.game_number);

        let bytes = {
            let mut log = self.log.lock().await;
            log.record(record);
            match &self.writer {
                Some(_) => match log.to_file_bytes() {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to serialize game log");
                        None
                    }
                },
                None => None,
            }
        };

        if let (Some(writer), Some(bytes)) = (&self.writer, bytes) {
            if writer.send(bytes).is_err() {
                tracing::warn!("game log writer is gone, record kept in memory only");
            }
        }
    }

    /// Current snapshot with the log total filled in.
    async fn current(&self) -> RoomSnapshot {
        let mut snapshot = self.room.snapshot();
        snapshot.total_games = self.log.lock().await.total();
        snapshot
    }

    /// Builds, publishes and returns the current snapshot.
    async fn publish(&self) -> RoomSnapshot {
        let snapshot = self.current().await;
        self.state.send_replace(snapshot.clone());
        snapshot
    }
}

/// Spawns the task that writes serialized game logs to `path`, in order.
fn spawn_log_writer(path: PathBuf) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(bytes) = rx.recv().await {
            if let Err(e) = tokio::fs::write(&path, &bytes).await {
                tracing::warn!(
                    path = %path.display(),
                    error = %RoomError::Persist(e),
                    "game log write failed"
                );
            }
        }
        tracing::debug!(path = %path.display(), "game log writer stopped");
    });
    tx
}
