//! FCM HTTP v1 API client.
//!
//! Constructs and sends push notification requests to the Firebase Cloud
//! Messaging HTTP v1 API endpoint. A 404/410 response is surfaced as
//! [`PushError::TargetGone`] so the sweep can tell a dead device token from
//! a transient channel failure.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{PushChannel, PushError, PushPayload};

/// FCM HTTP v1 API endpoint template.
/// The `{project_id}` placeholder is replaced with the actual project ID.
const FCM_API_URL_TEMPLATE: &str =
    "https://fcm.googleapis.com/v1/projects/{project_id}/messages:send";

/// Environment variable name for the FCM access token.
const FCM_ACCESS_TOKEN_ENV: &str = "RESTBELL_FCM_ACCESS_TOKEN";

/// Service account credentials loaded from a Google Cloud JSON key file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    /// The Google Cloud project ID.
    pub project_id: String,

    /// The service account email.
    #[serde(default)]
    pub client_email: String,

    /// The private key in PEM format.
    #[serde(default)]
    pub private_key: String,
}

/// FCM notification message payload.
#[derive(Debug, Serialize)]
pub struct FcmMessage {
    /// The wrapper message object required by the FCM v1 API.
    pub message: FcmMessageBody,
}

/// The inner message body sent to FCM.
#[derive(Debug, Serialize)]
pub struct FcmMessageBody {
    /// The device registration token to send the notification to.
    pub token: String,

    /// The notification payload (title + body).
    pub notification: FcmNotification,

    /// Web-platform presentation options (icon, collapse tag).
    pub webpush: FcmWebPushConfig,

    /// Data payload (key-value string pairs) handed to the client app.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<std::collections::HashMap<String, String>>,
}

/// FCM notification display payload.
#[derive(Debug, Serialize)]
pub struct FcmNotification {
    /// The notification title.
    pub title: String,

    /// The notification body text.
    pub body: String,
}

/// Web push presentation block of the FCM v1 message.
#[derive(Debug, Serialize)]
pub struct FcmWebPushConfig {
    pub notification: FcmWebPushNotification,
}

/// Icon and collapse tag shown by the browser notification UI.
#[derive(Debug, Serialize)]
pub struct FcmWebPushNotification {
    pub icon: String,
    pub tag: String,
}

/// Client for the FCM HTTP v1 API.
///
/// Holds the HTTP client, service account credentials, and the resolved API
/// endpoint URL.
#[derive(Debug)]
pub struct FcmClient {
    /// The reqwest HTTP client.
    http: reqwest::Client,

    /// Service account credentials.
    credentials: ServiceAccountCredentials,

    /// The fully-resolved FCM API URL for this project.
    api_url: String,

    /// Bearer token for FCM API authentication, read from the
    /// `RESTBELL_FCM_ACCESS_TOKEN` environment variable at construction
    /// time. When `None`, falls back to `credentials.private_key`.
    access_token: Option<String>,
}

/// Read the FCM access token from the environment.
///
/// Logs a warning if the variable is not set, since the fallback to
/// `credentials.private_key` is unlikely to work with the real FCM API.
fn read_access_token_from_env() -> Option<String> {
    let token = std::env::var(FCM_ACCESS_TOKEN_ENV).ok();
    if token.is_none() {
        warn!(
            "Environment variable {FCM_ACCESS_TOKEN_ENV} is not set; \
             falling back to credentials.private_key for FCM auth"
        );
    }
    token
}

impl FcmClient {
    /// Create a new FCM client by loading service account credentials from a
    /// JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Credentials`] if the file cannot be read or
    /// parsed.
    pub fn from_credentials_file(path: &Path) -> Result<Self, PushError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PushError::Credentials(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;

        let credentials: ServiceAccountCredentials = serde_json::from_str(&content)
            .map_err(|e| PushError::Credentials(format!("Failed to parse credentials JSON: {e}")))?;

        Ok(Self::from_credentials(credentials, reqwest::Client::new()))
    }

    /// Create an FCM client from pre-parsed credentials and a pre-built HTTP
    /// client.
    pub fn from_credentials(credentials: ServiceAccountCredentials, http: reqwest::Client) -> Self {
        let api_url = FCM_API_URL_TEMPLATE.replace("{project_id}", &credentials.project_id);
        let access_token = read_access_token_from_env();

        debug!(
            project_id = %credentials.project_id,
            has_env_token = access_token.is_some(),
            "FCM client initialized"
        );

        Self {
            http,
            credentials,
            api_url,
            access_token,
        }
    }

    /// Create an FCM client for testing purposes only.
    ///
    /// Installs the `ring` crypto provider (via dev-dependency on `rustls`)
    /// so that `reqwest::Client` can be constructed in the test environment
    /// where `rustls-no-provider` is the workspace default.
    #[cfg(test)]
    #[allow(clippy::expect_used)]
    pub(crate) fn for_testing(credentials: ServiceAccountCredentials) -> Self {
        let api_url = FCM_API_URL_TEMPLATE.replace("{project_id}", &credentials.project_id);

        // Install ring as the default crypto provider (no-op if already installed).
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .build()
            .expect("failed to build test HTTP client");

        Self {
            http,
            credentials,
            api_url,
            access_token: Some("test-access-token".to_string()),
        }
    }

    /// Build an [`FcmMessage`] for the given delivery target.
    pub fn build_message(target: &str, payload: &PushPayload) -> FcmMessage {
        FcmMessage {
            message: FcmMessageBody {
                token: target.to_string(),
                notification: FcmNotification {
                    title: payload.title.clone(),
                    body: payload.body.clone(),
                },
                webpush: FcmWebPushConfig {
                    notification: FcmWebPushNotification {
                        icon: payload.icon.clone(),
                        tag: payload.tag.clone(),
                    },
                },
                data: if payload.data.is_empty() {
                    None
                } else {
                    Some(payload.data.clone())
                },
            },
        }
    }

    /// Send a push notification via the FCM HTTP v1 API.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Request`] if the HTTP request fails,
    /// [`PushError::TargetGone`] when FCM reports the registration token no
    /// longer exists, or [`PushError::Api`] for any other non-2xx status.
    pub async fn send(&self, message: &FcmMessage) -> Result<(), PushError> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", self.auth_header())
            .json(message)
            .send()
            .await
            .map_err(|e| PushError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!("FCM notification sent successfully");
            return Ok(());
        }

        let status_code = status.as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());

        // FCM reports a dead registration token as 404 (UNREGISTERED); 410
        // is the equivalent for expired web push subscriptions.
        if status_code == 404 || status_code == 410 {
            warn!(status = status_code, "FCM reports delivery target gone");
            return Err(PushError::TargetGone {
                status: status_code,
                body,
            });
        }

        warn!(status = status_code, body = %body, "FCM API returned error");
        Err(PushError::Api {
            status: status_code,
            body,
        })
    }

    /// Construct the Authorization header value.
    ///
    /// Uses the access token read from `RESTBELL_FCM_ACCESS_TOKEN` at
    /// construction time. If that variable was not set, falls back to
    /// `credentials.private_key`.
    fn auth_header(&self) -> String {
        let token = self
            .access_token
            .as_deref()
            .unwrap_or(&self.credentials.private_key);
        format!("Bearer {token}")
    }

    /// Returns the project ID from the loaded credentials.
    pub fn project_id(&self) -> &str {
        &self.credentials.project_id
    }

    /// Returns the resolved FCM API URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl PushChannel for FcmClient {
    async fn deliver(&self, target: &str, payload: &PushPayload) -> Result<(), PushError> {
        let message = Self::build_message(target, payload);
        self.send(&message).await
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn test_credentials() -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            project_id: "restbell-test".to_string(),
            client_email: "push@restbell-test.iam.gserviceaccount.com".to_string(),
            private_key: "test-private-key".to_string(),
        }
    }

    fn test_payload() -> PushPayload {
        let mut data = HashMap::new();
        data.insert("kind".to_string(), "rest-timer".to_string());
        data.insert("notification_id".to_string(), "n-123".to_string());
        PushPayload {
            title: "Rest complete".to_string(),
            body: "Time for your next set".to_string(),
            icon: "/icons/rest-bell.png".to_string(),
            tag: "rest-timer".to_string(),
            data,
        }
    }

    #[test]
    fn build_message_carries_payload_shape() {
        let msg = FcmClient::build_message("device-token-abc", &test_payload());

        assert_eq!(msg.message.token, "device-token-abc");
        assert_eq!(msg.message.notification.title, "Rest complete");
        assert_eq!(msg.message.webpush.notification.icon, "/icons/rest-bell.png");
        assert_eq!(msg.message.webpush.notification.tag, "rest-timer");
        let data = msg.message.data.as_ref().unwrap();
        assert_eq!(data.get("kind").unwrap(), "rest-timer");
        assert_eq!(data.get("notification_id").unwrap(), "n-123");
    }

    #[test]
    fn message_serializes_to_fcm_v1_json() {
        let msg = FcmClient::build_message("tok", &test_payload());
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["message"]["token"], "tok");
        assert_eq!(json["message"]["notification"]["title"], "Rest complete");
        assert_eq!(
            json["message"]["webpush"]["notification"]["tag"],
            "rest-timer"
        );
        assert_eq!(json["message"]["data"]["kind"], "rest-timer");
    }

    #[test]
    fn empty_data_is_omitted() {
        let mut payload = test_payload();
        payload.data.clear();
        let msg = FcmClient::build_message("tok", &payload);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json["message"].get("data").is_none());
    }

    #[test]
    fn from_credentials_sets_api_url() {
        let client = FcmClient::for_testing(test_credentials());

        assert_eq!(client.project_id(), "restbell-test");
        assert_eq!(
            client.api_url(),
            "https://fcm.googleapis.com/v1/projects/restbell-test/messages:send"
        );
    }

    #[test]
    fn from_credentials_file_missing_returns_error() {
        let result = FcmClient::from_credentials_file(Path::new("/nonexistent/path.json"));
        let err = result.unwrap_err();
        assert!(
            matches!(err, PushError::Credentials(_)),
            "expected Credentials error, got: {err}"
        );
    }

    #[test]
    fn auth_header_uses_access_token_when_set() {
        let client = FcmClient::for_testing(test_credentials());
        // for_testing sets access_token to Some("test-access-token")
        assert_eq!(client.auth_header(), "Bearer test-access-token");
    }

    #[test]
    fn target_gone_is_distinguished() {
        let gone = PushError::TargetGone {
            status: 404,
            body: "UNREGISTERED".to_string(),
        };
        let transient = PushError::Request("connection refused".to_string());
        assert!(gone.is_target_gone());
        assert!(!transient.is_target_gone());
    }

    #[tokio::test]
    async fn deliver_against_unreachable_endpoint_fails() {
        // No real FCM endpoint is reachable in tests; the point is that the
        // error is a PushError, not a panic.
        let client = FcmClient::for_testing(test_credentials());
        let result = client.deliver("device-tok", &test_payload()).await;
        assert!(result.is_err(), "expected an error from unreachable FCM");
    }
}
