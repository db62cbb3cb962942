//! Restbell Protocol Buffers
//!
//! Generated protobuf code for the Restbell gRPC API.
//!
//! This crate contains:
//! - `RestTimerService` for scheduling and cancelling rest notifications
//! - `DeviceService` for push delivery target registration

#![allow(clippy::derive_partial_eq_without_eq)]

/// Restbell v1 API definitions.
///
/// All generated types and services are included here.
pub mod v1 {
    tonic::include_proto!("restbell.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types for downstream crates that need Struct/Value conversion
pub use prost_types;
