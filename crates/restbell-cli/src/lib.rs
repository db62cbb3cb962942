//! Restbell CLI Library
//!
//! Client for the Restbell notification server:
//! - Persistent config (server URL, access token, registered target)
//! - gRPC connection wrapper with bearer-token metadata
//! - Fire-and-forget reminder scheduling for the countdown controller
//! - The rest countdown TUI

pub mod config;
pub mod connection;
pub mod scheduler;
pub mod tui;
