//! CLI configuration management.
//!
//! Persists the server URL, access token, and the registered push delivery
//! target to `~/.restbell/config.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    /// Server URL (e.g., "<http://127.0.0.1:50051>").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Access token issued by the account service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Push delivery target registered from this device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
}

/// The delivery target this device registered with the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Opaque push subscription / device token payload.
    pub delivery_target: String,

    /// Platform kind: "web" or "native".
    pub platform: String,
}

impl CliConfig {
    /// Path to the config directory: `~/.restbell/`.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".restbell"))
    }

    /// Path to the config file: `~/.restbell/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from disk. Returns default if file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let dir =
            Self::config_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let config = CliConfig {
            server_url: Some("http://127.0.0.1:50051".to_string()),
            access_token: Some("token-abc".to_string()),
            device: Some(DeviceConfig {
                delivery_target: "sub-xyz".to_string(),
                platform: "web".to_string(),
            }),
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: CliConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.server_url.as_deref(), Some("http://127.0.0.1:50051"));
        assert_eq!(restored.device.unwrap().platform, "web");
    }

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_string(&CliConfig::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
