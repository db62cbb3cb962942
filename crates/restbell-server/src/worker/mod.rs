//! Periodic delivery sweep over the notification schedule.
//!
//! The sweep is the only component that moves records out of `pending`. It
//! runs on a fixed cadence (the server binary drives it from a background
//! task), shares no memory with the scheduling side, and treats every
//! record in a batch independently: one failed delivery or status update
//! never stops the rest of the sweep.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info, warn};

use restbell_core::db::unix_timestamp_ms;

use crate::push::{PushChannel, PushPayload};
use crate::storage::{DatabaseError, RestNotification, ServerDatabase};

/// Default retention window: records older than this are purged regardless
/// of status, bounding store growth.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

/// `data.kind` value on every rest-timer push payload; the client app
/// routes taps on the notification by it.
const PAYLOAD_KIND: &str = "rest-timer";

/// Icon shown by the platform notification UI.
const PAYLOAD_ICON: &str = "/icons/rest-bell.png";

/// Collapse tag: a newer rest notification replaces an older one.
const PAYLOAD_TAG: &str = "rest-timer";

/// Sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Records with `created_at_ms` older than this window are purged.
    pub retention: Duration,

    /// Delete delivery target registrations the push channel reports as
    /// permanently gone. Off by default: the stock behavior only logs the
    /// stale registration.
    pub evict_invalid_targets: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            evict_invalid_targets: false,
        }
    }
}

/// Counters for one sweep invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    /// Pending records that were due this sweep.
    pub due: u64,
    /// Records transitioned to `sent`.
    pub sent: u64,
    /// Records transitioned to `failed`.
    pub failed: u64,
    /// Stale records purged.
    pub purged: u64,
}

/// Delivers due notifications and retires stale records.
pub struct DeliveryWorker<C> {
    db: ServerDatabase,
    channel: C,
    config: SweepConfig,
}

impl<C: PushChannel> DeliveryWorker<C> {
    pub fn new(db: ServerDatabase, channel: C) -> Self {
        Self::with_config(db, channel, SweepConfig::default())
    }

    pub const fn with_config(db: ServerDatabase, channel: C, config: SweepConfig) -> Self {
        Self {
            db,
            channel,
            config,
        }
    }

    /// Run one sweep against the current wall clock.
    pub async fn run_sweep(&self) -> Result<SweepSummary, DatabaseError> {
        self.run_sweep_at(unix_timestamp_ms()).await
    }

    /// Run one sweep as-of `now_ms`.
    ///
    /// Split out so tests can pin the clock. Only the initial due-query
    /// error aborts the sweep; per-record delivery and status-update
    /// failures are logged and the batch continues.
    pub async fn run_sweep_at(&self, now_ms: i64) -> Result<SweepSummary, DatabaseError> {
        let due = self.db.due_pending(now_ms).await?;

        let mut summary = SweepSummary {
            due: due.len() as u64,
            ..SweepSummary::default()
        };

        for record in &due {
            self.process_record(record, now_ms, &mut summary).await;
        }

        let cutoff_ms = now_ms - as_millis(self.config.retention);
        match self.db.purge_older_than(cutoff_ms).await {
            Ok(purged) => summary.purged = purged,
            Err(e) => warn!(error = %e, "Failed to purge stale notification records"),
        }

        Ok(summary)
    }

    /// Deliver one due record and record the outcome.
    async fn process_record(
        &self,
        record: &RestNotification,
        now_ms: i64,
        summary: &mut SweepSummary,
    ) {
        let payload = build_payload(record);

        match self.channel.deliver(&record.delivery_target, &payload).await {
            Ok(()) => match self.db.mark_sent(&record.id, now_ms).await {
                Ok(true) => {
                    summary.sent += 1;
                    debug!(id = %record.id, owner = %record.owner_id, "Rest notification delivered");
                }
                Ok(false) => {
                    // An overlapping sweep already settled this record.
                    debug!(id = %record.id, "Record no longer pending, status left untouched");
                }
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Failed to record sent status");
                }
            },
            Err(e) => {
                if e.is_target_gone() {
                    warn!(
                        id = %record.id,
                        owner = %record.owner_id,
                        "Delivery target is gone; its registration is stale"
                    );
                    if self.config.evict_invalid_targets {
                        match self.db.delete_targets_matching(&record.delivery_target).await {
                            Ok(evicted) if evicted > 0 => {
                                info!(owner = %record.owner_id, evicted, "Evicted invalid delivery target");
                            }
                            Ok(_) => {}
                            Err(db_err) => {
                                warn!(id = %record.id, error = %db_err, "Failed to evict invalid delivery target");
                            }
                        }
                    }
                } else {
                    warn!(id = %record.id, error = %e, "Rest notification delivery failed");
                }

                match self.db.mark_failed(&record.id, &e.to_string()).await {
                    Ok(true) => summary.failed += 1,
                    Ok(false) => {
                        debug!(id = %record.id, "Record no longer pending, status left untouched");
                    }
                    Err(db_err) => {
                        warn!(id = %record.id, error = %db_err, "Failed to record failed status");
                    }
                }
            }
        }
    }
}

/// Build the device payload for one scheduled record.
fn build_payload(record: &RestNotification) -> PushPayload {
    let mut data = HashMap::new();
    data.insert("kind".to_string(), PAYLOAD_KIND.to_string());
    data.insert("notification_id".to_string(), record.id.clone());

    PushPayload {
        title: record.title.clone(),
        body: record.body.clone(),
        icon: PAYLOAD_ICON.to_string(),
        tag: PAYLOAD_TAG.to_string(),
        data,
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn as_millis(duration: Duration) -> i64 {
    duration.as_millis() as i64
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::push::PushError;
    use crate::storage::{NotificationStatus, ScheduleNotificationParams};

    /// Scripted channel: behavior is keyed off the target string, and every
    /// delivery attempt is recorded.
    #[derive(Default)]
    struct ScriptedChannel {
        deliveries: Mutex<Vec<(String, PushPayload)>>,
    }

    impl ScriptedChannel {
        fn attempts(&self) -> Vec<(String, PushPayload)> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    impl PushChannel for &ScriptedChannel {
        async fn deliver(&self, target: &str, payload: &PushPayload) -> Result<(), PushError> {
            self.deliveries
                .lock()
                .unwrap()
                .push((target.to_string(), payload.clone()));

            if target.contains("gone") {
                return Err(PushError::TargetGone {
                    status: 404,
                    body: "UNREGISTERED".to_string(),
                });
            }
            if target.contains("flaky") {
                return Err(PushError::Request("connection reset".to_string()));
            }
            Ok(())
        }
    }

    async fn test_db() -> ServerDatabase {
        ServerDatabase::open_in_memory().await.unwrap()
    }

    async fn schedule(db: &ServerDatabase, id: &str, target: &str, send_at_ms: i64) {
        db.upsert_notification(&ScheduleNotificationParams {
            id,
            owner_id: "user-1",
            delivery_target: target,
            send_at_ms,
            title: "Rest complete",
            body: "Time for your next set",
        })
        .await
        .unwrap();
    }

    async fn status_of(db: &ServerDatabase, id: &str) -> NotificationStatus {
        db.get_notification(id)
            .await
            .unwrap()
            .unwrap()
            .status()
            .unwrap()
    }

    #[tokio::test]
    async fn sweep_delivers_due_and_leaves_future_untouched() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "due-1", "tok-a", 1_000).await;
        schedule(&db, "due-2", "tok-b", 2_000).await;
        schedule(&db, "future", "tok-c", 9_000_000_000_000).await;

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let summary = worker.run_sweep_at(5_000).await.unwrap();

        assert_eq!(summary.due, 2);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(status_of(&db, "due-1").await, NotificationStatus::Sent);
        assert_eq!(status_of(&db, "due-2").await, NotificationStatus::Sent);
        assert_eq!(status_of(&db, "future").await, NotificationStatus::Pending);
        assert_eq!(channel.attempts().len(), 2);
    }

    #[tokio::test]
    async fn target_gone_failure_does_not_stop_the_batch() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "bad", "gone-token", 1_000).await;
        schedule(&db, "good", "tok-ok", 1_000).await;

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let summary = worker.run_sweep_at(5_000).await.unwrap();

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(status_of(&db, "bad").await, NotificationStatus::Failed);
        assert_eq!(status_of(&db, "good").await, NotificationStatus::Sent);

        let record = db.get_notification("bad").await.unwrap().unwrap();
        assert!(record.failure_reason.unwrap().contains("gone"));
        // Both records were attempted
        assert_eq!(channel.attempts().len(), 2);
    }

    #[tokio::test]
    async fn failed_records_are_not_retried() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "n1", "flaky-token", 1_000).await;

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let first = worker.run_sweep_at(5_000).await.unwrap();
        assert_eq!(first.failed, 1);

        let second = worker.run_sweep_at(10_000).await.unwrap();
        assert_eq!(second.due, 0);
        assert_eq!(channel.attempts().len(), 1);
    }

    #[tokio::test]
    async fn superseded_record_is_never_sent() {
        // Client restarted the timer: the first record was cancelled, the
        // replacement fires 10s later. A sweep past only the first deadline
        // delivers nothing.
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "first", "tok-a", 60_000).await;
        schedule(&db, "second", "tok-a", 70_000).await;
        db.delete_notification("first").await.unwrap();

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let summary = worker.run_sweep_at(65_000).await.unwrap();

        assert_eq!(summary.due, 0);
        assert_eq!(summary.sent, 0);
        assert!(channel.attempts().is_empty());
        assert_eq!(status_of(&db, "second").await, NotificationStatus::Pending);
    }

    #[tokio::test]
    async fn purge_removes_stale_records_of_any_status() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "stale-sent", "tok-a", 1_000).await;
        schedule(&db, "stale-pending", "tok-b", 9_000_000_000_000).await;
        schedule(&db, "fresh", "tok-c", 9_000_000_000_000).await;
        db.mark_sent("stale-sent", 2_000).await.unwrap();

        for id in ["stale-sent", "stale-pending"] {
            sqlx::query("UPDATE rest_notifications SET created_at_ms = 0 WHERE id = ?")
                .bind(id)
                .execute(db.pool())
                .await
                .unwrap();
        }

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let summary = worker.run_sweep().await.unwrap();

        assert_eq!(summary.purged, 2);
        assert!(db.get_notification("stale-sent").await.unwrap().is_none());
        assert!(db.get_notification("stale-pending").await.unwrap().is_none());
        assert!(db.get_notification("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn payload_carries_rest_timer_shape() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "n1", "tok-a", 1_000).await;

        let worker = DeliveryWorker::new(db.clone(), &channel);
        worker.run_sweep_at(5_000).await.unwrap();

        let attempts = channel.attempts();
        let (target, payload) = &attempts[0];
        assert_eq!(target, "tok-a");
        assert_eq!(payload.title, "Rest complete");
        assert_eq!(payload.tag, "rest-timer");
        assert_eq!(payload.data.get("kind").unwrap(), "rest-timer");
        assert_eq!(payload.data.get("notification_id").unwrap(), "n1");
    }

    #[tokio::test]
    async fn eviction_is_off_by_default() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        db.upsert_delivery_target("user-1", "gone-token", "native")
            .await
            .unwrap();
        schedule(&db, "n1", "gone-token", 1_000).await;

        let worker = DeliveryWorker::new(db.clone(), &channel);
        worker.run_sweep_at(5_000).await.unwrap();

        // Stock behavior only logs the stale registration
        assert!(
            db.get_delivery_target("user-1", "native")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn eviction_removes_gone_targets_when_enabled() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        db.upsert_delivery_target("user-1", "gone-token", "native")
            .await
            .unwrap();
        schedule(&db, "n1", "gone-token", 1_000).await;

        let worker = DeliveryWorker::with_config(
            db.clone(),
            &channel,
            SweepConfig {
                evict_invalid_targets: true,
                ..SweepConfig::default()
            },
        );
        worker.run_sweep_at(5_000).await.unwrap();

        assert!(
            db.get_delivery_target("user-1", "native")
                .await
                .unwrap()
                .is_none()
        );
        // The record itself still ends failed, not deleted
        assert_eq!(status_of(&db, "n1").await, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn record_settled_by_overlapping_sweep_is_not_double_counted() {
        let db = test_db().await;
        let channel = ScriptedChannel::default();
        schedule(&db, "n1", "tok-a", 1_000).await;

        // Simulate a concurrent sweep winning the transition between our due
        // query and our status update: the record is already sent.
        let due = db.due_pending(5_000).await.unwrap();
        assert_eq!(due.len(), 1);
        db.mark_sent("n1", 4_000).await.unwrap();

        let worker = DeliveryWorker::new(db.clone(), &channel);
        let summary = worker.run_sweep_at(5_000).await.unwrap();

        // Nothing due anymore; the earlier transition stands
        assert_eq!(summary.due, 0);
        let record = db.get_notification("n1").await.unwrap().unwrap();
        assert_eq!(record.sent_at_ms, Some(4_000));
    }
}
