// --- File: crates/fcm_config/src/models.rs ---

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for FCM HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_FCM_BASE_URI: &str = "https://fcm.googleapis.com";
pub const DEFAULT_GROUP_NOTIFICATION_BASE_URI: &str = "https://android.googleapis.com";
pub const DEFAULT_INSTANCE_ID_API: &str = "https://iid.googleapis.com";

// --- Endpoint Config ---
/// Base URLs of the Google services the client talks to.
///
/// Paths (`/fcm/send`, `/gcm/notification`, `/iid/...`) are appended by the
/// request builder, so only scheme and host belong here.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Legacy send and HTTP v1 send
    #[serde(default = "default_fcm_base")]
    pub fcm_base: String,
    /// Device group management
    #[serde(default = "default_group_base")]
    pub group_notification_base: String,
    /// Instance ID / topic management
    #[serde(default = "default_instance_id_base")]
    pub instance_id_base: String,
}

fn default_fcm_base() -> String {
    DEFAULT_FCM_BASE_URI.to_string()
}

fn default_group_base() -> String {
    DEFAULT_GROUP_NOTIFICATION_BASE_URI.to_string()
}

fn default_instance_id_base() -> String {
    DEFAULT_INSTANCE_ID_API.to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fcm_base: default_fcm_base(),
            group_notification_base: default_group_base(),
            instance_id_base: default_instance_id_base(),
        }
    }
}

impl Endpoints {
    /// Points every service at the same base URL (handy for a local mock server).
    pub fn all_at(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            fcm_base: base.clone(),
            group_notification_base: base.clone(),
            instance_id_base: base,
        }
    }
}

// --- Retry Config ---
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Add random jitter (±30%) to every backoff
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// A policy that performs exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// --- Unified FCM Configuration ---
/// Everything needed to build a legacy or v1 client.
///
/// Secrets are normally supplied through the environment
/// (`FCM__API_KEY`, `FCM__SERVICE_ACCOUNT_KEY_PATH`).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FcmConfig {
    /// Server key for the legacy HTTP API
    #[serde(default)]
    pub api_key: Option<String>,
    /// Path to a service_account_key.json for the HTTP v1 API
    #[serde(default)]
    pub service_account_key_path: Option<String>,
    /// Firebase project used by HTTP v1 sends
    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            service_account_key_path: None,
            project_name: None,
            timeout_secs: default_timeout_secs(),
            retry: RetryConfig::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl FcmConfig {
    /// Legacy-API configuration with default timeout, retry and endpoints.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
