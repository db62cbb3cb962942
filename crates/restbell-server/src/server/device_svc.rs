//! `DeviceService` gRPC implementation.
//!
//! Registers push delivery targets. One target is kept per
//! (user, platform); re-registration overwrites the previous target.

use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use restbell_proto::v1::device_service_server::DeviceService;
use restbell_proto::v1::{
    DeliveryPlatform, RegisterDeliveryTargetRequest, RegisterDeliveryTargetResponse,
    UnregisterDeliveryTargetRequest, UnregisterDeliveryTargetResponse,
};

use crate::storage::ServerDatabase;

use super::interceptor::extract_claims;

/// gRPC service for managing delivery target registrations.
pub struct DeviceServiceImpl {
    db: ServerDatabase,
}

impl DeviceServiceImpl {
    /// Create a new `DeviceServiceImpl`.
    pub const fn new(db: ServerDatabase) -> Self {
        Self { db }
    }
}

/// Convert a `DeliveryPlatform` enum value to a database string.
#[allow(clippy::result_large_err)]
fn platform_to_str(platform: i32) -> Result<&'static str, Status> {
    match DeliveryPlatform::try_from(platform) {
        Ok(DeliveryPlatform::Web) => Ok("web"),
        Ok(DeliveryPlatform::Native) => Ok("native"),
        Ok(DeliveryPlatform::Unspecified) | Err(_) => {
            Err(Status::invalid_argument("Platform must be WEB or NATIVE"))
        }
    }
}

#[tonic::async_trait]
impl DeviceService for DeviceServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "RegisterDeliveryTarget"))]
    async fn register_delivery_target(
        &self,
        request: Request<RegisterDeliveryTargetRequest>,
    ) -> Result<Response<RegisterDeliveryTargetResponse>, Status> {
        let owner_id = extract_claims(&request)?.sub.clone();
        let req = request.into_inner();

        if req.delivery_target.is_empty() {
            return Err(Status::invalid_argument("delivery_target is required"));
        }

        let platform = platform_to_str(req.platform)?;

        match self
            .db
            .upsert_delivery_target(&owner_id, &req.delivery_target, platform)
            .await
        {
            Ok(()) => {
                info!(
                    owner_id = %owner_id,
                    platform = platform,
                    "Delivery target registered"
                );
                Ok(Response::new(RegisterDeliveryTargetResponse {
                    success: true,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Failed to register delivery target");
                Err(Status::internal(format!(
                    "Failed to register delivery target: {e}"
                )))
            }
        }
    }

    #[instrument(skip(self, request), fields(rpc = "UnregisterDeliveryTarget"))]
    async fn unregister_delivery_target(
        &self,
        request: Request<UnregisterDeliveryTargetRequest>,
    ) -> Result<Response<UnregisterDeliveryTargetResponse>, Status> {
        let owner_id = extract_claims(&request)?.sub.clone();
        let req = request.into_inner();

        let platform = platform_to_str(req.platform)?;

        match self.db.delete_delivery_target(&owner_id, platform).await {
            Ok(removed) => {
                if removed {
                    info!(owner_id = %owner_id, platform, "Delivery target unregistered");
                } else {
                    info!(owner_id = %owner_id, platform, "No delivery target was registered");
                }
                Ok(Response::new(UnregisterDeliveryTargetResponse {
                    success: removed,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Failed to unregister delivery target");
                Err(Status::internal(format!(
                    "Failed to unregister delivery target: {e}"
                )))
            }
        }
    }
}
