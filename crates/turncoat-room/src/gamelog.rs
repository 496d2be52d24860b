//! Capped archive of started games.
//!
//! The room only ever appends to the log; readers get copies. When a file
//! path is configured the whole log is rewritten after each record, by a
//! writer task outside the room actor (see [`RoomManager`](crate::RoomManager)).

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use turncoat_protocol::GameRecord;

use crate::RoomError;
use crate::room::now_millis;

/// Default number of retained records.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// On-disk layout. Missing fields load as empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LogFile {
    logs: Vec<GameRecord>,
    /// Number of the most recently recorded game.
    game_number: u64,
    last_updated: u64,
}

/// Append-only ring of the most recent [`GameRecord`]s.
#[derive(Debug)]
pub struct GameLog {
    entries: VecDeque<GameRecord>,
    capacity: usize,
    last_game_number: u64,
    path: Option<PathBuf>,
}

impl GameLog {
    /// An empty, memory-only log.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            last_game_number: 0,
            path: None,
        }
    }

    /// An empty log that will be written to `path`, replacing whatever the
    /// file holds now.
    pub fn fresh_at(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::in_memory(capacity)
        }
    }

    /// A log persisted at `path`, reloaded from it if the file exists.
    ///
    /// # Errors
    /// - [`RoomError::Persist`] if the file exists but can't be read.
    /// - [`RoomError::LogFormat`] if it can't be parsed.
    pub async fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, RoomError> {
        let path = path.into();
        let mut log = Self::fresh_at(&path, capacity);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: LogFile =
                    serde_json::from_slice(&bytes).map_err(RoomError::LogFormat)?;
                log.last_game_number = file.game_number;
                for record in file.logs {
                    log.push(record);
                }
                tracing::info!(
                    path = %path.display(),
                    records = log.entries.len(),
                    last_game = log.last_game_number,
                    "game log loaded"
                );
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no game log yet, starting fresh");
            }
            Err(e) => return Err(RoomError::Persist(e)),
        }

        Ok(log)
    }

    /// Appends a record, dropping the oldest beyond capacity.
    pub fn record(&mut self, record: GameRecord) {
        tracing::debug!(
            game = record.game_number,
            traitors = record.traitors.len(),
            "game recorded"
        );
        self.push(record);
    }

    fn push(&mut self, record: GameRecord) {
        self.last_game_number = self.last_game_number.max(record.game_number);
        self.entries.push_back(record);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<GameRecord> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Records currently retained.
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Game number to use for the next room generation.
    pub fn next_game_number(&self) -> u64 {
        self.last_game_number + 1
    }

    /// Backing file, if persistent.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serialized file contents for the current state.
    pub fn to_file_bytes(&self) -> Result<Vec<u8>, RoomError> {
        let file = LogFile {
            logs: self.entries.iter().cloned().collect(),
            game_number: self.last_game_number,
            last_updated: now_millis(),
        };
        serde_json::to_vec_pretty(&file).map_err(RoomError::LogFormat)
    }
}

impl Default for GameLog {
    fn default() -> Self {
        Self::in_memory(DEFAULT_LOG_CAPACITY)
    }
}
