//! Rest-timer value object.
//!
//! Remaining time is always computed from wall-clock timestamps, never by
//! decrementing a counter. That makes the timer robust to the hosting view
//! being destroyed and recreated, and to the process being suspended for an
//! arbitrary interval: on the next tick the arithmetic lands on the right
//! value regardless of how many ticks were missed.

use serde::{Deserialize, Serialize};

/// Default rest length between sets, in seconds.
pub const DEFAULT_REST_SECS: u32 = 90;

/// One rest period for one exercise slot.
///
/// Held by the caller's session object, not persisted beyond it. All
/// methods take `now_ms` explicitly so the arithmetic is testable without a
/// wall clock. Serializable so the hosting view can snapshot it across
/// teardown/rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    /// Exercise this rest period belongs to.
    pub exercise_id: String,

    /// Requested rest length in milliseconds.
    pub duration_ms: i64,

    /// Timestamp the timer started counting from (epoch ms).
    pub started_at_ms: i64,

    /// Total milliseconds spent paused since `started_at_ms`.
    pub paused_accumulated_ms: i64,

    /// When paused, the instant the current pause began. `resume` folds the
    /// pause length into `paused_accumulated_ms`.
    paused_at_ms: Option<i64>,

    /// Latched once remaining time first reaches zero.
    completed: bool,
}

impl RestTimer {
    /// Start a fresh rest period at `now_ms`.
    pub fn start(exercise_id: impl Into<String>, duration_secs: u32, now_ms: i64) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            duration_ms: i64::from(duration_secs) * 1000,
            started_at_ms: now_ms,
            paused_accumulated_ms: 0,
            paused_at_ms: None,
            completed: false,
        }
    }

    /// Remaining rest in milliseconds, never negative.
    ///
    /// While paused the result is frozen at the value it had when the pause
    /// began, so any number of pause/resume cycles is loss-less.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        let effective_now = self.paused_at_ms.unwrap_or(now_ms);
        let elapsed = effective_now - self.started_at_ms - self.paused_accumulated_ms;
        (self.duration_ms - elapsed).max(0)
    }

    /// Freeze the countdown. No-op when already paused or completed.
    pub fn pause(&mut self, now_ms: i64) {
        if self.paused_at_ms.is_none() && !self.completed {
            self.paused_at_ms = Some(now_ms);
        }
    }

    /// Resume a paused countdown. No-op when not paused.
    pub fn resume(&mut self, now_ms: i64) {
        if let Some(paused_at) = self.paused_at_ms.take() {
            self.paused_accumulated_ms += (now_ms - paused_at).max(0);
        }
    }

    pub const fn is_paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Latch the terminal state. Called by the controller on the first tick
    /// that observes zero remaining time; never unset.
    pub const fn complete(&mut self) {
        self.completed = true;
    }
}
