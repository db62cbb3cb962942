//! Push delivery channel.
//!
//! This module provides:
//! - [`PushChannel`], the seam the delivery sweep sends through
//! - [`FcmClient`] for delivering via the FCM HTTP v1 API
//! - [`PushError`], distinguishing permanently-gone targets from transient
//!   failures

pub mod fcm;

use std::collections::HashMap;
use std::future::Future;

pub use fcm::FcmClient;

/// Payload delivered to the device for an elapsed rest period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload {
    /// Notification title.
    pub title: String,

    /// Notification body text.
    pub body: String,

    /// Icon shown by the platform notification UI.
    pub icon: String,

    /// Collapse tag: a newer rest notification replaces an older one
    /// instead of stacking.
    pub tag: String,

    /// Opaque key-value data handed to the client app.
    pub data: HashMap<String, String>,
}

/// Errors that can occur in the push channel.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// Failed to read or parse the push service credentials file.
    #[error("push credentials error: {0}")]
    Credentials(String),

    /// HTTP request to the push service failed.
    #[error("push request error: {0}")]
    Request(String),

    /// The delivery target no longer exists (unsubscribed or expired).
    /// The owning subscription record is stale and eligible for eviction.
    #[error("delivery target gone (status {status}): {body}")]
    TargetGone {
        /// HTTP status code returned by the push service.
        status: u16,
        /// Response body from the push service.
        body: String,
    },

    /// The push service returned some other non-success status code.
    #[error("push API error (status {status}): {body}")]
    Api {
        /// HTTP status code returned by the push service.
        status: u16,
        /// Response body from the push service.
        body: String,
    },
}

impl PushError {
    /// Whether the failure means the target is permanently invalid.
    pub const fn is_target_gone(&self) -> bool {
        matches!(self, Self::TargetGone { .. })
    }
}

/// A channel that can deliver one push notification to one target.
///
/// The delivery sweep is generic over this trait so it can be exercised
/// with a scripted channel in tests.
pub trait PushChannel {
    /// Attempt one delivery. No retry happens at this level; the caller
    /// records the outcome and moves on.
    fn deliver(
        &self,
        target: &str,
        payload: &PushPayload,
    ) -> impl Future<Output = Result<(), PushError>> + Send;
}
