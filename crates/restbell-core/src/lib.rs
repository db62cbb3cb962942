//! Restbell Core Library
//!
//! Shared functionality for Restbell components:
//! - Rest-timer arithmetic and the local countdown controller
//! - `SQLite` pool helpers used by the server storage layer
//! - Tracing initialisation shared by the binaries

pub mod db;
pub mod timer;
pub mod tracing_init;

pub use timer::{CountdownController, CountdownPhase, RestTimer};
