//! One-shot reset timer for Turncoat.
//!
//! A room that fills up starts a game and must go back to waiting after a
//! fixed delay. [`ResetTimer`] is that delay: it is armed with the game's
//! generation number and, once the deadline passes, yields that number back
//! so the owner can check it still refers to the current game.
//!
//! # Disarmed mode
//!
//! While nothing is armed, [`ResetTimer::wait`] pends forever. That keeps
//! the owner's `tokio::select!` loop free of special cases:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, leave, snapshot */ }
//!         fired = timer.wait() => {
//!             room.reset(fired.generation);
//!         }
//!     }
//! }
//! ```
//!
//! `wait` is cancel-safe: if another branch wins the `select!`, the armed
//! deadline is left untouched and the next call picks it up again.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Delay used when none is configured.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(30);

/// A fired timer, returned by [`ResetTimer::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired {
    /// Generation the timer was armed for.
    pub generation: u64,
    /// How far past the deadline the wake-up happened.
    pub late_by: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    generation: u64,
    deadline: Instant,
}

/// A single-slot, generation-keyed deadline.
///
/// At most one deadline is armed at a time. Arming again replaces the
/// previous one.
#[derive(Debug)]
pub struct ResetTimer {
    delay: Duration,
    armed: Option<Armed>,
}

impl ResetTimer {
    /// Creates a disarmed timer that will wait `delay` once armed.
    pub fn new(delay: Duration) -> Self {
        debug!(delay_ms = delay.as_millis() as u64, "reset timer created");
        Self {
            delay,
            armed: None,
        }
    }

    /// Arms the timer for `generation`, due `delay` from now.
    pub fn arm(&mut self, generation: u64) {
        if let Some(prev) = self.armed {
            if prev.generation != generation {
                warn!(
                    previous = prev.generation,
                    generation, "re-arming reset timer over a pending generation"
                );
            }
        }
        self.armed = Some(Armed {
            generation,
            deadline: Instant::now() + self.delay,
        });
        debug!(generation, "reset timer armed");
    }

    /// Disarms the timer. Returns the generation that was pending, if any.
    pub fn cancel(&mut self) -> Option<u64> {
        let prev = self.armed.take().map(|a| a.generation);
        if let Some(generation) = prev {
            debug!(generation, "reset timer cancelled");
        }
        prev
    }

    /// Waits for the armed deadline and disarms the timer.
    ///
    /// Pends forever while disarmed.
    pub async fn wait(&mut self) -> Expired {
        let Some(armed) = self.armed else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(armed.deadline).await;

        // Nothing is awaited past this point, so a cancelled wait never
        // loses the deadline.
        self.armed = None;
        let late_by = Instant::now().saturating_duration_since(armed.deadline);
        trace!(generation = armed.generation, ?late_by, "reset timer fired");

        Expired {
            generation: armed.generation,
            late_by,
        }
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Generation of the pending deadline, if any.
    pub fn armed_generation(&self) -> Option<u64> {
        self.armed.map(|a| a.generation)
    }
}

impl Default for ResetTimer {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_DELAY)
    }
}
