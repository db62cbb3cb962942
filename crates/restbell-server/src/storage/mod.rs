//! `SQLite` storage for the Restbell notification server.
//!
//! Provides persistence for the notification schedule and the push delivery
//! target registry.

mod db;
mod models;
mod queries_schedule;
mod queries_targets;

pub use db::ServerDatabase;
pub use models::*;
pub use queries_schedule::ScheduleNotificationParams;
pub use restbell_core::db::DatabaseError;
