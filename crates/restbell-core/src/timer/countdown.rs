//! Local countdown controller.
//!
//! Drives one visible rest countdown from a [`RestTimer`] via cooperative
//! per-tick recomputation, and keeps the durable notification schedule in
//! step through a fire-and-forget [`ReminderScheduler`]. The controller
//! never blocks on the durable side: a lost schedule or cancel degrades
//! background delivery only, never the visible countdown.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::state::RestTimer;

/// A request to deliver a push notification when a rest period elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestReminder {
    /// Durable notification record id (uuid v4, generated by the controller
    /// so cancellation can address the record before the schedule call has
    /// even completed).
    pub notification_id: String,

    /// Exercise the rest period belongs to.
    pub exercise_id: String,

    /// Absolute delivery time (epoch ms).
    pub fire_at_ms: i64,
}

/// Seam between the local countdown and the durable notification schedule.
///
/// Implementations must not block; both calls are fire-and-forget from the
/// controller's perspective. The CLI implementation spawns the gRPC calls
/// and logs failures at `warn`.
pub trait ReminderScheduler {
    /// Enqueue a durable notification. Best-effort.
    fn schedule(&self, reminder: RestReminder);

    /// Remove a previously enqueued notification. Best-effort; cancelling an
    /// id that was never stored (or already delivered) is expected.
    fn cancel(&self, notification_id: &str);
}

/// Visible phase of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    /// No rest period in progress.
    Idle,
    Running,
    Paused,
    /// Rest elapsed; the "ready" indicator stays visible until the user
    /// starts a new timer or leaves the exercise.
    Completed,
}

/// One rendered frame of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownView {
    pub phase: CountdownPhase,
    pub remaining_ms: i64,
}

impl CountdownView {
    const IDLE: Self = Self {
        phase: CountdownPhase::Idle,
        remaining_ms: 0,
    };
}

/// Snapshot handed out at view teardown and back in at rebuild.
///
/// Carries the timer verbatim plus the id of the scheduled notification so
/// the rebuilt controller can still cancel it on skip/supersede.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    timer: RestTimer,
    notification_id: Option<String>,
}

/// Controller for the rest countdown of the currently focused exercise.
///
/// The host UI owns one controller per exercise slot and drives it with
/// `tick(now_ms)` once per frame (or per second). Which exercise is focused
/// is the host's business and arrives as an explicit argument to [`start`],
/// never as ambient state.
///
/// [`start`]: CountdownController::start
pub struct CountdownController<S> {
    scheduler: S,
    timer: Option<RestTimer>,
    notification_id: Option<String>,
}

impl<S: ReminderScheduler> CountdownController<S> {
    pub const fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            timer: None,
            notification_id: None,
        }
    }

    /// Start a fresh rest period, superseding any active one.
    ///
    /// The prior scheduled notification (if any) is cancelled so at most one
    /// record stays outstanding per exercise slot. Scheduling the new
    /// reminder is best-effort and does not gate the countdown.
    pub fn start(&mut self, exercise_id: &str, duration_secs: u32, now_ms: i64) {
        self.cancel_scheduled();

        let timer = RestTimer::start(exercise_id, duration_secs, now_ms);
        let notification_id = Uuid::new_v4().to_string();

        debug!(
            exercise_id,
            duration_secs, notification_id, "Rest countdown started"
        );

        self.scheduler.schedule(RestReminder {
            notification_id: notification_id.clone(),
            exercise_id: exercise_id.to_string(),
            fire_at_ms: now_ms + timer.duration_ms,
        });

        self.notification_id = Some(notification_id);
        self.timer = Some(timer);
    }

    /// Recompute the visible countdown for this frame.
    ///
    /// The first tick that observes zero remaining time latches the terminal
    /// state; after that the view keeps reporting `Completed` without any
    /// further timer mutation, so the host may stop ticking once it has seen
    /// the transition.
    pub fn tick(&mut self, now_ms: i64) -> CountdownView {
        let Some(timer) = &mut self.timer else {
            return CountdownView::IDLE;
        };

        if timer.is_completed() {
            return CountdownView {
                phase: CountdownPhase::Completed,
                remaining_ms: 0,
            };
        }

        let remaining_ms = timer.remaining_ms(now_ms);
        if remaining_ms == 0 {
            timer.complete();
            return CountdownView {
                phase: CountdownPhase::Completed,
                remaining_ms: 0,
            };
        }

        let phase = if timer.is_paused() {
            CountdownPhase::Paused
        } else {
            CountdownPhase::Running
        };
        CountdownView { phase, remaining_ms }
    }

    pub fn pause(&mut self, now_ms: i64) {
        if let Some(timer) = &mut self.timer {
            timer.pause(now_ms);
        }
    }

    pub fn resume(&mut self, now_ms: i64) {
        if let Some(timer) = &mut self.timer {
            timer.resume(now_ms);
        }
    }

    /// Skip the rest period: the visible countdown disappears immediately
    /// and the scheduled notification is cancelled best-effort. The cancel
    /// may still race an in-flight delivery sweep; a spurious notification
    /// in that window is tolerated.
    pub fn skip(&mut self) {
        self.cancel_scheduled();
        self.timer = None;
    }

    /// Same local effect as [`skip`]: the timer is discarded from any state.
    ///
    /// [`skip`]: CountdownController::skip
    pub fn cancel(&mut self) {
        self.skip();
    }

    /// Capture the countdown for a view teardown.
    ///
    /// The scheduled notification is deliberately left in place: teardown is
    /// a UI rebuild, not a user cancellation. Returns `None` when no timer
    /// is active.
    pub fn detach_for_teardown(&mut self) -> Option<CountdownSnapshot> {
        let timer = self.timer.take()?;
        Some(CountdownSnapshot {
            timer,
            notification_id: self.notification_id.take(),
        })
    }

    /// Restore a countdown captured by [`detach_for_teardown`].
    ///
    /// [`detach_for_teardown`]: CountdownController::detach_for_teardown
    pub fn reattach(&mut self, snapshot: CountdownSnapshot) {
        self.timer = Some(snapshot.timer);
        self.notification_id = snapshot.notification_id;
    }

    /// Exercise of the active timer, if any.
    pub fn exercise_id(&self) -> Option<&str> {
        self.timer.as_ref().map(|t| t.exercise_id.as_str())
    }

    fn cancel_scheduled(&mut self) {
        if let Some(id) = self.notification_id.take() {
            debug!(notification_id = %id, "Cancelling scheduled rest notification");
            self.scheduler.cancel(&id);
        }
    }
}
