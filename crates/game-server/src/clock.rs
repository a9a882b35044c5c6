//! The single outstanding timer of a game session.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Times the current turn and owns the task that fires when the player to
/// move runs out of time.
///
/// Every disarm bumps the generation. A timer task carries the generation it
/// was armed with, so a task that wakes after being superseded can tell its
/// expiry is stale even if the abort came too late.
#[derive(Debug, Default)]
pub struct TurnClock {
    generation: u64,
    turn_started_at: Option<Instant>,
    pending: Option<JoinHandle<()>>,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing a turn and schedules `on_expire` after `remaining`.
    ///
    /// Any earlier timer is cancelled first. `on_expire` receives the
    /// generation this timer was armed with. Must be called from within a
    /// tokio runtime.
    pub fn arm<F>(&mut self, remaining: Duration, on_expire: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.disarm();
        let generation = self.generation;
        self.turn_started_at = Some(Instant::now());
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            on_expire(generation);
        }));
    }

    /// Cancels the pending timer, if any, and stops timing the turn.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.turn_started_at = None;
        self.generation += 1;
    }

    /// Returns true if a timer armed with `generation` is still the live one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.pending.is_some() && self.generation == generation
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Time spent on the current turn so far.
    pub fn elapsed(&self) -> Duration {
        self.turn_started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }
}

impl Drop for TurnClock {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
