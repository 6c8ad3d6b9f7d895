//! Combined entry point
//!
//! [`Fcm`] holds whichever clients a single [`FcmConfig`] can build: a legacy
//! [`Client`] when an API key is present, a [`ClientV1`] when a
//! service-account key path is present, or both.

use fcm_common::{config_error, FcmError};
use fcm_config::FcmConfig;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::client_v1::ClientV1;
use crate::response::FcmResponse;

#[derive(Debug, Clone)]
pub struct Fcm {
    legacy: Option<Client>,
    v1: Option<ClientV1>,
    project_name: Option<String>,
}

impl Fcm {
    /// Fails unless the configuration carries at least one credential.
    pub fn from_config(config: &FcmConfig) -> Result<Self, FcmError> {
        let legacy = match config.api_key.as_deref() {
            Some(_) => Some(Client::from_config(config)?),
            None => None,
        };
        let v1 = match config.service_account_key_path.as_deref() {
            Some(_) => Some(ClientV1::from_config(config)?),
            None => None,
        };

        if legacy.is_none() && v1.is_none() {
            return Err(config_error(
                "FcmConfig needs an api_key or a service_account_key_path",
            ));
        }

        debug!(
            legacy = legacy.is_some(),
            v1 = v1.is_some(),
            "FCM clients configured"
        );
        Ok(Self {
            legacy,
            v1,
            project_name: config.project_name.clone(),
        })
    }

    /// Assembles the facade from clients built elsewhere.
    pub fn from_parts(
        legacy: Option<Client>,
        v1: Option<ClientV1>,
        project_name: Option<String>,
    ) -> Result<Self, FcmError> {
        if legacy.is_none() && v1.is_none() {
            return Err(config_error("at least one FCM client is required"));
        }
        Ok(Self {
            legacy,
            v1,
            project_name,
        })
    }

    /// Loads [`FcmConfig`] from file and environment, then builds the clients.
    pub fn from_env() -> Result<Self, FcmError> {
        let config = fcm_config::load_config()?;
        Self::from_config(&config)
    }

    pub fn legacy(&self) -> Result<&Client, FcmError> {
        self.legacy
            .as_ref()
            .ok_or_else(|| config_error("legacy API requires an api_key"))
    }

    pub fn v1(&self) -> Result<&ClientV1, FcmError> {
        self.v1
            .as_ref()
            .ok_or_else(|| config_error("HTTP v1 API requires a service_account_key_path"))
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// HTTP v1 send within the configured project.
    pub async fn send_v1<M: Serialize + ?Sized>(&self, message: &M) -> Result<FcmResponse, FcmError> {
        let project_name = self.project_name.as_deref().unwrap_or_default();
        self.v1()?.send_notification_v1(message, project_name).await
    }
}
