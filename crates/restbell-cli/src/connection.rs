//! Server connection client.
//!
//! Manages the gRPC connection to restbell-server and attaches the bearer
//! token to every request.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tracing::info;

use restbell_proto::v1::device_service_client::DeviceServiceClient;
use restbell_proto::v1::rest_timer_service_client::RestTimerServiceClient;
use restbell_proto::v1::{
    CancelRestNotificationRequest, CancelRestNotificationResponse, DeliveryPlatform,
    RegisterDeliveryTargetRequest, RegisterDeliveryTargetResponse,
    ScheduleRestNotificationRequest, ScheduleRestNotificationResponse,
    UnregisterDeliveryTargetRequest, UnregisterDeliveryTargetResponse,
};

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// JWT access token attached to every request.
    pub auth_token: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:50051".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            auth_token: None,
        }
    }
}

/// Connected gRPC client for the Restbell server.
///
/// Cheap to clone: the underlying tonic channel multiplexes.
#[derive(Clone)]
pub struct ServerConnection {
    config: ConnectionConfig,
    channel: Channel,
}

impl ServerConnection {
    /// Establish the connection.
    pub async fn connect(config: ConnectionConfig) -> anyhow::Result<Self> {
        let endpoint = Endpoint::from_shared(config.addr.clone())?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        let channel = endpoint.connect().await?;
        info!(addr = %config.addr, "Connected to restbell-server");

        Ok(Self { config, channel })
    }

    /// Attach the bearer token to a request.
    fn apply_auth<T>(&self, req: &mut tonic::Request<T>) {
        if let Some(token) = &self.config.auth_token {
            if let Ok(val) = format!("Bearer {token}").parse() {
                req.metadata_mut().insert("authorization", val);
            }
        }
    }

    /// Schedule a durable rest notification.
    pub async fn schedule_rest_notification(
        &self,
        message: ScheduleRestNotificationRequest,
    ) -> anyhow::Result<ScheduleRestNotificationResponse> {
        let mut client = RestTimerServiceClient::new(self.channel.clone());
        let mut req = tonic::Request::new(message);
        self.apply_auth(&mut req);
        Ok(client.schedule_rest_notification(req).await?.into_inner())
    }

    /// Cancel a scheduled rest notification by id.
    pub async fn cancel_rest_notification(
        &self,
        id: &str,
    ) -> anyhow::Result<CancelRestNotificationResponse> {
        let mut client = RestTimerServiceClient::new(self.channel.clone());
        let mut req = tonic::Request::new(CancelRestNotificationRequest { id: id.to_string() });
        self.apply_auth(&mut req);
        Ok(client.cancel_rest_notification(req).await?.into_inner())
    }

    /// Register this device's push delivery target.
    pub async fn register_delivery_target(
        &self,
        delivery_target: &str,
        platform: DeliveryPlatform,
    ) -> anyhow::Result<RegisterDeliveryTargetResponse> {
        let mut client = DeviceServiceClient::new(self.channel.clone());
        let mut req = tonic::Request::new(RegisterDeliveryTargetRequest {
            delivery_target: delivery_target.to_string(),
            platform: platform as i32,
        });
        self.apply_auth(&mut req);
        Ok(client.register_delivery_target(req).await?.into_inner())
    }

    /// Remove the registered delivery target for a platform.
    pub async fn unregister_delivery_target(
        &self,
        platform: DeliveryPlatform,
    ) -> anyhow::Result<UnregisterDeliveryTargetResponse> {
        let mut client = DeviceServiceClient::new(self.channel.clone());
        let mut req = tonic::Request::new(UnregisterDeliveryTargetRequest {
            platform: platform as i32,
        });
        self.apply_auth(&mut req);
        Ok(client.unregister_delivery_target(req).await?.into_inner())
    }
}
