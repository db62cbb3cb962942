//! Fire-and-forget reminder scheduling over gRPC.
//!
//! Implements the countdown controller's [`ReminderScheduler`] seam. Both
//! calls spawn the RPC and return immediately; a failure is logged and
//! swallowed so the visible countdown is never gated on the server. The
//! worst case is that no background notification arrives for this rest
//! period.

use tracing::{debug, warn};

use restbell_core::timer::{ReminderScheduler, RestReminder};
use restbell_proto::v1::ScheduleRestNotificationRequest;

use crate::connection::ServerConnection;

/// Title of every rest notification.
const REMINDER_TITLE: &str = "Rest complete";

/// Schedules rest reminders against the Restbell server.
pub struct RemoteReminderScheduler {
    conn: ServerConnection,
    /// Registered push target; `None` disables background delivery.
    delivery_target: Option<String>,
}

impl RemoteReminderScheduler {
    pub const fn new(conn: ServerConnection, delivery_target: Option<String>) -> Self {
        Self {
            conn,
            delivery_target,
        }
    }
}

/// Build the schedule request for one reminder.
fn build_schedule_request(
    reminder: &RestReminder,
    delivery_target: &str,
) -> ScheduleRestNotificationRequest {
    ScheduleRestNotificationRequest {
        id: reminder.notification_id.clone(),
        delivery_target: delivery_target.to_string(),
        send_at_epoch_ms: reminder.fire_at_ms,
        duration_seconds: 0,
        title: REMINDER_TITLE.to_string(),
        body: format!("Time for your next set of {}", reminder.exercise_id),
    }
}

impl ReminderScheduler for RemoteReminderScheduler {
    fn schedule(&self, reminder: RestReminder) {
        let Some(target) = &self.delivery_target else {
            debug!("No delivery target registered; skipping background notification");
            return;
        };

        let request = build_schedule_request(&reminder, target);
        let conn = self.conn.clone();
        tokio::spawn(async move {
            if let Err(e) = conn.schedule_rest_notification(request).await {
                // Accepted degradation: the countdown keeps running, only
                // background delivery for this interval is lost.
                warn!(error = %e, "Failed to schedule rest notification");
            }
        });
    }

    fn cancel(&self, notification_id: &str) {
        let conn = self.conn.clone();
        let id = notification_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = conn.cancel_rest_notification(&id).await {
                warn!(error = %e, notification_id = %id, "Failed to cancel rest notification");
            }
        });
    }
}
