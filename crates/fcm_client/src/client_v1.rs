//! HTTP v1 API client
//!
//! Sends messages through `POST /v1/projects/{project}/messages:send` using
//! an OAuth2 bearer token derived from a service-account key.

use fcm_common::{config_error, validation_error, FcmError};
use fcm_config::{Endpoints, FcmConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{CredentialProvider, KeySource, TokenIssuer};
use crate::connection::{Connection, RetryPolicy};
use crate::request;
use crate::response::{build_fcm_response, FcmResponse};

/// Client for the FCM HTTP v1 API.
///
/// The access token is fetched lazily on the first send and cached for the
/// lifetime of the client.
///
/// # Example
///
/// ```rust,no_run
/// use fcm_client::{ClientV1, KeySource};
/// use serde_json::json;
///
/// async fn notify() -> Result<(), fcm_client::FcmError> {
///     let client = ClientV1::new(KeySource::from_path("/path/to/service-account.json"))?;
///     let message = json!({
///         "token": "4sdsx",
///         "notification": { "title": "Breaking News", "body": "New news story available." },
///         "data": { "story_id": "story_12345" }
///     });
///     let response = client.send_notification_v1(&message, "my-project").await?;
///     println!("{} {}", response.status_code, response.body);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ClientV1 {
    credentials: CredentialProvider,
    connection: Connection,
    endpoints: Endpoints,
}

impl ClientV1 {
    /// Client with default timeout and Google endpoints.
    pub fn new(key_source: KeySource) -> Result<Self, FcmError> {
        Self::with_credentials(
            CredentialProvider::service_account(key_source),
            &FcmConfig::default(),
        )
    }

    /// Builds a client from `config.service_account_key_path`.
    pub fn from_config(config: &FcmConfig) -> Result<Self, FcmError> {
        let key_path = config
            .service_account_key_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .ok_or_else(|| config_error("Missing service_account_key_path in FcmConfig"))?;

        Self::with_credentials(
            CredentialProvider::service_account(KeySource::from_path(key_path)),
            config,
        )
    }

    /// Uses a custom token issuer instead of a service-account key.
    pub fn with_token_issuer(
        issuer: Arc<dyn TokenIssuer>,
        config: &FcmConfig,
    ) -> Result<Self, FcmError> {
        Self::with_credentials(CredentialProvider::from_issuer(issuer), config)
    }

    fn with_credentials(
        credentials: CredentialProvider,
        config: &FcmConfig,
    ) -> Result<Self, FcmError> {
        Ok(Self {
            credentials,
            connection: Connection::new(config.timeout(), config.retry.clone())?,
            endpoints: config.endpoints.clone(),
        })
    }

    /// Sends `message` (the v1 `Message` object) within `project_name`.
    ///
    /// An empty project name is rejected with [`FcmError::Validation`]
    /// before any token exchange or HTTP call.
    pub async fn send_notification_v1<M: Serialize + ?Sized>(
        &self,
        message: &M,
        project_name: &str,
    ) -> Result<FcmResponse, FcmError> {
        if project_name.trim().is_empty() {
            warn!("refusing v1 send without a project name");
            return Err(validation_error("project name must not be empty"));
        }

        let message = serde_json::to_value(message)?;
        let headers = self.credentials.authorization_headers().await?;
        let request = request::v1_send(&self.endpoints, headers, project_name, message);

        let raw = self.connection.execute(&request, RetryPolicy::Never).await?;
        let response = build_fcm_response(&raw, None);
        info!(
            project = project_name,
            status = response.status_code,
            "FCM v1 send finished: {}",
            response.response
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenIssuer;
    use serde_json::json;

    #[test]
    fn test_missing_key_path_fails_fast() {
        assert!(matches!(
            ClientV1::from_config(&FcmConfig::default()),
            Err(FcmError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_project_is_rejected_before_network() {
        let mut config = FcmConfig::default();
        config.endpoints = Endpoints::all_at("http://127.0.0.1:9");
        let client =
            ClientV1::with_token_issuer(Arc::new(StaticTokenIssuer::new("t")), &config).unwrap();

        let result = client
            .send_notification_v1(&json!({ "token": "abc" }), "")
            .await;
        assert!(matches!(result, Err(FcmError::Validation(_))));
    }
}
