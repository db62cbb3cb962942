//! Restbell Notification Server Library
//!
//! Core functionality for the Restbell server:
//! - `SQLite` storage for the notification schedule and delivery targets
//! - JWT authentication
//! - gRPC services (`RestTimerService`, `DeviceService`)
//! - Periodic delivery sweep over due notifications

pub mod auth;
pub mod push;
pub mod server;
pub mod storage;
pub mod worker;
