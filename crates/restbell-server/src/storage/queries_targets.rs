//! Delivery target registry queries.
//!
//! One target per (user, platform). Registration overwrites: only the most
//! recently registered target per platform is retained, there is no
//! multi-device fan-out.

use restbell_core::db::unix_timestamp_ms;

use super::db::ServerDatabase;
use super::models::DeliveryTarget;
use restbell_core::db::DatabaseError;

impl ServerDatabase {
    // =========================================================================
    // Delivery target queries
    // =========================================================================

    /// Register or replace the delivery target for a (user, platform) pair.
    pub async fn upsert_delivery_target(
        &self,
        owner_id: &str,
        target: &str,
        platform: &str,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp_ms();

        sqlx::query(
            "INSERT INTO delivery_targets (owner_id, target, platform, updated_at_ms) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(owner_id, platform) DO UPDATE SET target = ?, updated_at_ms = ?",
        )
        .bind(owner_id)
        .bind(target)
        .bind(platform)
        .bind(now)
        .bind(target)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Get the registered target for a (user, platform) pair.
    pub async fn get_delivery_target(
        &self,
        owner_id: &str,
        platform: &str,
    ) -> Result<Option<DeliveryTarget>, DatabaseError> {
        let target = sqlx::query_as::<_, DeliveryTarget>(
            "SELECT * FROM delivery_targets WHERE owner_id = ? AND platform = ?",
        )
        .bind(owner_id)
        .bind(platform)
        .fetch_optional(self.pool())
        .await?;

        Ok(target)
    }

    /// Remove the registered target for a (user, platform) pair.
    ///
    /// Returns `true` if a row was deleted, `false` if nothing was
    /// registered.
    pub async fn delete_delivery_target(
        &self,
        owner_id: &str,
        platform: &str,
    ) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("DELETE FROM delivery_targets WHERE owner_id = ? AND platform = ?")
                .bind(owner_id)
                .bind(platform)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every registration of a target payload, whoever owns it.
    ///
    /// Used by the sweep's opt-in eviction when the push channel reports the
    /// target permanently gone. Returns the count removed.
    pub async fn delete_targets_matching(&self, target: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM delivery_targets WHERE target = ?")
            .bind(target)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
