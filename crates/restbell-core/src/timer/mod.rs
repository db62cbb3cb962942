//! Rest-timer domain logic.
//!
//! Pure timing arithmetic and the local countdown controller. Nothing in
//! this module touches a clock, a network, or a database: callers pass
//! `now_ms` explicitly and durable scheduling goes through the
//! [`ReminderScheduler`] seam.

pub mod countdown;
pub mod display;
pub mod state;

pub use countdown::{
    CountdownController, CountdownPhase, CountdownSnapshot, CountdownView, ReminderScheduler,
    RestReminder,
};
pub use state::{DEFAULT_REST_SECS, RestTimer};
