//! Room configuration and game-rule constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SplitPolicy
// ---------------------------------------------------------------------------

/// How a full room is divided into two teams after traitors are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Traitors and regulars are shuffled separately and dealt so that each
    /// team receives exactly half of the traitors.
    #[default]
    Balanced,
    /// First half of the shuffled room is team 1, second half is team 2.
    /// Traitors land wherever the shuffle put them.
    Positional,
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for the room.
///
/// Call [`RoomConfig::validated`] (the manager does this for you) before
/// use; it fixes values the assignment can't honor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Seats in the room. A full room starts a game.
    pub capacity: usize,

    /// How long a game lasts before the room resets.
    pub reset_delay: Duration,

    /// Players flagged as traitors in each game.
    pub traitor_count: usize,

    /// Team split rule.
    pub split_policy: SplitPolicy,

    /// Queue joins that arrive while a game is in progress instead of
    /// rejecting them as busy.
    pub queue_while_playing: bool,

    /// How many records `getLogs` returns.
    pub recent_logs: usize,

    /// How many records the game log retains.
    pub log_capacity: usize,

    /// Fixed RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            reset_delay: Duration::from_secs(30),
            traitor_count: 4,
            split_policy: SplitPolicy::Balanced,
            queue_while_playing: false,
            recent_logs: 10,
            log_capacity: 100,
            seed: None,
        }
    }
}

impl RoomConfig {
    /// Size of one team.
    pub fn team_size(&self) -> usize {
        self.capacity / 2
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `capacity` is forced even and at least 2.
    /// - `traitor_count` is capped at `capacity`. Under
    ///   [`SplitPolicy::Balanced`] it is also rounded down to even and
    ///   capped so neither team is all traitors beyond its size.
    /// - `log_capacity` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.capacity < 2 || self.capacity % 2 != 0 {
            let fixed = (self.capacity.max(2) / 2) * 2;
            tracing::warn!(
                capacity = self.capacity,
                fixed,
                "capacity must be even and at least 2, adjusting"
            );
            self.capacity = fixed;
        }

        if self.traitor_count > self.capacity {
            tracing::warn!(
                traitors = self.traitor_count,
                capacity = self.capacity,
                "traitor_count exceeds capacity, clamping"
            );
            self.traitor_count = self.capacity;
        }

        if self.split_policy == SplitPolicy::Balanced {
            let per_team = (self.traitor_count / 2).min(self.team_size());
            if per_team * 2 != self.traitor_count {
                tracing::warn!(
                    traitors = self.traitor_count,
                    fixed = per_team * 2,
                    "balanced split needs an even traitor count, rounding down"
                );
                self.traitor_count = per_team * 2;
            }
        }

        if self.log_capacity == 0 {
            tracing::warn!("log_capacity must be at least 1, using 1");
            self.log_capacity = 1;
        }

        self
    }
}
