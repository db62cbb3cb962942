//! `RestTimerService` gRPC implementation.
//!
//! Scheduling and cancellation of durable rest notifications. Validation
//! failures are rejected synchronously before anything is persisted;
//! cancellation is idempotent because it routinely races the delivery
//! sweep.

use tonic::{Request, Response, Status};
use tracing::{debug, info, instrument, warn};

use restbell_core::db::unix_timestamp_ms;
use restbell_proto::v1::rest_timer_service_server::RestTimerService;
use restbell_proto::v1::{
    CancelRestNotificationRequest, CancelRestNotificationResponse,
    ScheduleRestNotificationRequest, ScheduleRestNotificationResponse,
};

use crate::storage::{ScheduleNotificationParams, ServerDatabase};

use super::interceptor::extract_claims;

/// gRPC service for the notification schedule.
pub struct RestTimerServiceImpl {
    db: ServerDatabase,
}

impl RestTimerServiceImpl {
    /// Create a new `RestTimerServiceImpl`.
    pub const fn new(db: ServerDatabase) -> Self {
        Self { db }
    }
}

#[tonic::async_trait]
impl RestTimerService for RestTimerServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "ScheduleRestNotification"))]
    async fn schedule_rest_notification(
        &self,
        request: Request<ScheduleRestNotificationRequest>,
    ) -> Result<Response<ScheduleRestNotificationResponse>, Status> {
        let owner_id = extract_claims(&request)?.sub.clone();
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }
        if req.delivery_target.is_empty() {
            return Err(Status::invalid_argument("delivery_target is required"));
        }
        if req.title.is_empty() {
            return Err(Status::invalid_argument("title is required"));
        }
        if req.body.is_empty() {
            return Err(Status::invalid_argument("body is required"));
        }

        let send_at_ms = if req.send_at_epoch_ms > 0 {
            req.send_at_epoch_ms
        } else if req.duration_seconds > 0 {
            unix_timestamp_ms() + i64::from(req.duration_seconds) * 1000
        } else {
            return Err(Status::invalid_argument(
                "either send_at_epoch_ms or duration_seconds is required",
            ));
        };

        // An id belongs to whoever scheduled it first; overwriting a foreign
        // record would let one user hijack another's schedule.
        match self.db.get_notification(&req.id).await {
            Ok(Some(existing)) if existing.owner_id != owner_id => {
                return Err(Status::permission_denied(
                    "notification id belongs to another user",
                ));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to check existing notification");
                return Err(Status::internal(format!(
                    "Failed to schedule notification: {e}"
                )));
            }
        }

        let params = ScheduleNotificationParams {
            id: &req.id,
            owner_id: &owner_id,
            delivery_target: &req.delivery_target,
            send_at_ms,
            title: &req.title,
            body: &req.body,
        };

        match self.db.upsert_notification(&params).await {
            Ok(()) => {
                info!(
                    id = %req.id,
                    owner_id = %owner_id,
                    send_at_ms,
                    "Rest notification scheduled"
                );
                Ok(Response::new(ScheduleRestNotificationResponse {
                    success: true,
                    id: req.id,
                    send_at_epoch_ms: send_at_ms,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Failed to schedule rest notification");
                Err(Status::internal(format!(
                    "Failed to schedule notification: {e}"
                )))
            }
        }
    }

    #[instrument(skip(self, request), fields(rpc = "CancelRestNotification"))]
    async fn cancel_rest_notification(
        &self,
        request: Request<CancelRestNotificationRequest>,
    ) -> Result<Response<CancelRestNotificationResponse>, Status> {
        let owner_id = extract_claims(&request)?.sub.clone();
        let req = request.into_inner();

        if req.id.is_empty() {
            return Err(Status::invalid_argument("id is required"));
        }

        match self.db.get_notification(&req.id).await {
            Ok(Some(existing)) if existing.owner_id != owner_id => {
                return Err(Status::permission_denied(
                    "notification belongs to another user",
                ));
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to look up notification for cancel");
                return Err(Status::internal(format!(
                    "Failed to cancel notification: {e}"
                )));
            }
        }

        match self.db.delete_notification(&req.id).await {
            Ok(removed) => {
                if removed {
                    info!(id = %req.id, owner_id = %owner_id, "Rest notification cancelled");
                } else {
                    // Already delivered, purged, or never stored; the cancel
                    // still succeeds.
                    debug!(id = %req.id, "Cancel found no record (already gone)");
                }
                Ok(Response::new(CancelRestNotificationResponse {
                    success: true,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Failed to cancel rest notification");
                Err(Status::internal(format!(
                    "Failed to cancel notification: {e}"
                )))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::storage::NotificationStatus;

    fn authed<T>(message: T, user_id: &str) -> Request<T> {
        let mut req = Request::new(message);
        req.extensions_mut().insert(Claims {
            jti: "test-jti".to_string(),
            sub: user_id.to_string(),
            iat: 0,
            exp: i64::MAX,
        });
        req
    }

    fn schedule_req(id: &str, send_at_epoch_ms: i64) -> ScheduleRestNotificationRequest {
        ScheduleRestNotificationRequest {
            id: id.to_string(),
            delivery_target: "token-abc".to_string(),
            send_at_epoch_ms,
            duration_seconds: 0,
            title: "Rest complete".to_string(),
            body: "Time for your next set".to_string(),
        }
    }

    async fn test_service() -> RestTimerServiceImpl {
        let db = ServerDatabase::open_in_memory().await.unwrap();
        RestTimerServiceImpl::new(db)
    }

    #[tokio::test]
    async fn schedule_with_absolute_time() {
        let svc = test_service().await;
        let resp = svc
            .schedule_rest_notification(authed(schedule_req("n1", 90_000), "user-1"))
            .await
            .unwrap()
            .into_inner();

        assert!(resp.success);
        assert_eq!(resp.id, "n1");
        assert_eq!(resp.send_at_epoch_ms, 90_000);

        let record = svc.db.get_notification("n1").await.unwrap().unwrap();
        assert_eq!(record.owner_id, "user-1");
        assert_eq!(record.status(), Some(NotificationStatus::Pending));
    }

    #[tokio::test]
    async fn schedule_with_duration_resolves_against_clock() {
        let svc = test_service().await;
        let mut req = schedule_req("n1", 0);
        req.duration_seconds = 90;

        let before = unix_timestamp_ms();
        let resp = svc
            .schedule_rest_notification(authed(req, "user-1"))
            .await
            .unwrap()
            .into_inner();
        let after = unix_timestamp_ms();

        assert!(resp.send_at_epoch_ms >= before + 90_000);
        assert!(resp.send_at_epoch_ms <= after + 90_000);
    }

    // jscpd:ignore-start -- validation tests are intentionally repetitive
    #[tokio::test]
    async fn schedule_missing_id_fails() {
        let svc = test_service().await;
        let err = svc
            .schedule_rest_notification(authed(schedule_req("", 90_000), "user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        assert!(err.message().contains("id"));
    }

    #[tokio::test]
    async fn schedule_missing_target_fails() {
        let svc = test_service().await;
        let mut req = schedule_req("n1", 90_000);
        req.delivery_target = String::new();

        let err = svc
            .schedule_rest_notification(authed(req, "user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        assert!(err.message().contains("delivery_target"));
    }

    #[tokio::test]
    async fn schedule_missing_title_fails() {
        let svc = test_service().await;
        let mut req = schedule_req("n1", 90_000);
        req.title = String::new();

        let err = svc
            .schedule_rest_notification(authed(req, "user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        assert!(err.message().contains("title"));
    }

    #[tokio::test]
    async fn schedule_without_any_time_fails() {
        let svc = test_service().await;
        let err = svc
            .schedule_rest_notification(authed(schedule_req("n1", 0), "user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
        assert!(err.message().contains("send_at_epoch_ms"));
    }
    // jscpd:ignore-end

    #[tokio::test]
    async fn schedule_without_claims_is_unauthenticated() {
        let svc = test_service().await;
        let err = svc
            .schedule_rest_notification(Request::new(schedule_req("n1", 90_000)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
        // Nothing persisted
        assert!(svc.db.get_notification("n1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reschedule_same_id_same_owner_overwrites() {
        let svc = test_service().await;
        svc.schedule_rest_notification(authed(schedule_req("n1", 90_000), "user-1"))
            .await
            .unwrap();
        let resp = svc
            .schedule_rest_notification(authed(schedule_req("n1", 120_000), "user-1"))
            .await
            .unwrap()
            .into_inner();

        assert!(resp.success);
        let record = svc.db.get_notification("n1").await.unwrap().unwrap();
        assert_eq!(record.send_at_ms, 120_000);
    }

    #[tokio::test]
    async fn schedule_foreign_id_is_denied() {
        let svc = test_service().await;
        svc.schedule_rest_notification(authed(schedule_req("n1", 90_000), "user-1"))
            .await
            .unwrap();

        let err = svc
            .schedule_rest_notification(authed(schedule_req("n1", 120_000), "user-2"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let svc = test_service().await;
        svc.schedule_rest_notification(authed(schedule_req("n1", 90_000), "user-1"))
            .await
            .unwrap();

        let cancel = CancelRestNotificationRequest {
            id: "n1".to_string(),
        };
        let resp = svc
            .cancel_rest_notification(authed(cancel.clone(), "user-1"))
            .await
            .unwrap()
            .into_inner();
        assert!(resp.success);

        // Second cancel finds nothing and still succeeds
        let resp = svc
            .cancel_rest_notification(authed(cancel, "user-1"))
            .await
            .unwrap()
            .into_inner();
        assert!(resp.success);
    }

    #[tokio::test]
    async fn cancel_foreign_record_is_denied() {
        let svc = test_service().await;
        svc.schedule_rest_notification(authed(schedule_req("n1", 90_000), "user-1"))
            .await
            .unwrap();

        let err = svc
            .cancel_rest_notification(authed(
                CancelRestNotificationRequest {
                    id: "n1".to_string(),
                },
                "user-2",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::PermissionDenied);

        // Record untouched
        assert!(svc.db.get_notification("n1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cancel_missing_id_fails() {
        let svc = test_service().await;
        let err = svc
            .cancel_rest_notification(authed(
                CancelRestNotificationRequest { id: String::new() },
                "user-1",
            ))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
}
