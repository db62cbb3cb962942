//! Notification schedule queries.
//!
//! The schedule is the only state shared between the scheduling side (gRPC
//! services, driven by the client countdown) and the delivery sweep. Status
//! transitions are conditional on the current status so overlapping sweeps
//! cannot double-deliver or regress a terminal record.

use restbell_core::db::unix_timestamp_ms;

use super::db::ServerDatabase;
use super::models::RestNotification;
use restbell_core::db::DatabaseError;

/// Parameters for scheduling one notification.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleNotificationParams<'a> {
    pub id: &'a str,
    pub owner_id: &'a str,
    pub delivery_target: &'a str,
    pub send_at_ms: i64,
    pub title: &'a str,
    pub body: &'a str,
}

impl ServerDatabase {
    // =========================================================================
    // Notification schedule queries
    // =========================================================================

    /// Create a scheduled notification.
    ///
    /// Idempotent on `id`: re-scheduling an existing id overwrites the
    /// record and resets it to `pending`.
    pub async fn upsert_notification(
        &self,
        params: &ScheduleNotificationParams<'_>,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp_ms();

        sqlx::query(
            "INSERT INTO rest_notifications \
             (id, owner_id, delivery_target, send_at_ms, title, body, status, created_at_ms) \
             VALUES (?, ?, ?, ?, ?, ?, 'pending', ?) \
             ON CONFLICT(id) DO UPDATE SET \
             owner_id = ?, delivery_target = ?, send_at_ms = ?, title = ?, body = ?, \
             status = 'pending', failure_reason = NULL, sent_at_ms = NULL, created_at_ms = ?",
        )
        .bind(params.id)
        .bind(params.owner_id)
        .bind(params.delivery_target)
        .bind(params.send_at_ms)
        .bind(params.title)
        .bind(params.body)
        .bind(now)
        .bind(params.owner_id)
        .bind(params.delivery_target)
        .bind(params.send_at_ms)
        .bind(params.title)
        .bind(params.body)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Get a notification by id.
    pub async fn get_notification(
        &self,
        id: &str,
    ) -> Result<Option<RestNotification>, DatabaseError> {
        let record = sqlx::query_as::<_, RestNotification>(
            "SELECT * FROM rest_notifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(record)
    }

    /// Delete a notification by id.
    ///
    /// Returns `true` if a row was deleted. A missing id is a no-op, not an
    /// error: cancellation races the delivery sweep by design.
    pub async fn delete_notification(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM rest_notifications WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All pending notifications due at or before `now_ms`, oldest first.
    pub async fn due_pending(&self, now_ms: i64) -> Result<Vec<RestNotification>, DatabaseError> {
        let records = sqlx::query_as::<_, RestNotification>(
            "SELECT * FROM rest_notifications \
             WHERE status = 'pending' AND send_at_ms <= ? \
             ORDER BY send_at_ms ASC",
        )
        .bind(now_ms)
        .fetch_all(self.pool())
        .await?;

        Ok(records)
    }

    /// Transition a record to `sent`, only if it is still `pending`.
    ///
    /// Returns `false` when the record was missing or already terminal (an
    /// overlapping sweep got there first).
    pub async fn mark_sent(&self, id: &str, sent_at_ms: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE rest_notifications SET status = 'sent', sent_at_ms = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(sent_at_ms)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Transition a record to `failed`, only if it is still `pending`.
    pub async fn mark_failed(&self, id: &str, reason: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE rest_notifications SET status = 'failed', failure_reason = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(reason)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every record created before `cutoff_ms`, regardless of status.
    /// Returns the count removed.
    pub async fn purge_older_than(&self, cutoff_ms: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM rest_notifications WHERE created_at_ms < ?")
            .bind(cutoff_ms)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
