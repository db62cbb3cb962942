//! Data models for Restbell server storage.

use serde::{Deserialize, Serialize};

/// Delivery status of a scheduled notification.
///
/// `Pending` is the only non-terminal status; records move to `Sent` or
/// `Failed` exactly once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One scheduled rest notification, keyed by a caller-generated id.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RestNotification {
    pub id: String,
    pub owner_id: String,
    pub delivery_target: String,
    /// Absolute delivery time (epoch ms). Set at creation, never mutated.
    pub send_at_ms: i64,
    pub title: String,
    pub body: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub sent_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

impl RestNotification {
    /// Typed view of the raw status column.
    pub fn status(&self) -> Option<NotificationStatus> {
        NotificationStatus::parse(&self.status)
    }
}

/// Registered push delivery target, one per (user, platform).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryTarget {
    pub owner_id: String,
    /// Opaque push-subscription/device-token payload.
    pub target: String,
    pub platform: String,
    pub updated_at_ms: i64,
}
