//! Legacy HTTP API client
//!
//! [`Client`] covers the server-key authenticated endpoints: downstream
//! sends (`/fcm/send`), device groups (`/gcm/notification`) and Instance ID
//! topic management (`/iid/...`). Every call returns a normalized
//! [`FcmResponse`]; 4xx/5xx answers are reported there, not as errors.

use fcm_common::{config_error, validation_error, FcmError};
use fcm_config::{Endpoints, FcmConfig};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::CredentialProvider;
use crate::condition::{valid_topic_name, validate_condition};
use crate::connection::{Connection, RetryPolicy};
use crate::models::{DeviceGroupRequest, RegistrationIds, TopicAction};
use crate::request::{self, FcmRequest, Headers};
use crate::response::{build_fcm_response, FcmResponse};

/// Client for the legacy (server key) FCM API.
///
/// # Example
///
/// ```rust,no_run
/// use fcm_client::Client;
/// use serde_json::json;
///
/// async fn notify() -> Result<(), fcm_client::FcmError> {
///     let client = Client::new("AIzaSy...")?;
///     let response = client
///         .send_notification(
///             vec!["4sdsx", "8sdsd"],
///             json!({ "notification": { "title": "Portugal vs. Denmark", "text": "5 to 1" } }),
///         )
///         .await?;
///
///     for stale in response.not_registered_ids.unwrap_or_default() {
///         println!("drop token {stale}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    credentials: CredentialProvider,
    connection: Connection,
    endpoints: Endpoints,
}

impl Client {
    /// Client with default timeout, retry policy and Google endpoints.
    pub fn new(api_key: impl Into<String>) -> Result<Self, FcmError> {
        Self::from_config(&FcmConfig::with_api_key(api_key))
    }

    /// Builds a client from `config.api_key`, timeout, retry and endpoints.
    pub fn from_config(config: &FcmConfig) -> Result<Self, FcmError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| config_error("Missing api_key in FcmConfig"))?;

        Ok(Self {
            credentials: CredentialProvider::api_key(api_key)?,
            connection: Connection::new(config.timeout(), config.retry.clone())?,
            endpoints: config.endpoints.clone(),
        })
    }

    async fn headers(&self) -> Result<Headers, FcmError> {
        self.credentials.authorization_headers().await
    }

    async fn dispatch(
        &self,
        operation: &'static str,
        request: FcmRequest,
        registration_ids: Option<&[String]>,
    ) -> Result<FcmResponse, FcmError> {
        let raw = self
            .connection
            .execute(&request, RetryPolicy::Transient)
            .await?;
        let response = build_fcm_response(&raw, registration_ids);
        info!(
            operation,
            status = response.status_code,
            "FCM {} finished: {}",
            operation,
            response.response
        );
        Ok(response)
    }

    // --- Notification delivery ---

    /// Sends to one or more registration IDs.
    ///
    /// `options` is merged into the body (`notification`, `data`, `priority`,
    /// ...). The response carries canonical-ID remappings and not-registered
    /// IDs aligned with `registration_ids`.
    pub async fn send_notification(
        &self,
        registration_ids: impl Into<RegistrationIds>,
        options: Value,
    ) -> Result<FcmResponse, FcmError> {
        let ids = registration_ids.into();
        let request = request::legacy_send(&self.endpoints, self.headers().await?, &ids, options);
        self.dispatch("send_notification", request, Some(ids.as_slice()))
            .await
    }

    /// Sends to a device group (or any raw `to` address).
    pub async fn send_with_notification_key(
        &self,
        notification_key: &str,
        options: Value,
    ) -> Result<FcmResponse, FcmError> {
        let request =
            request::send_to(&self.endpoints, self.headers().await?, notification_key, options);
        self.dispatch("send_with_notification_key", request, None)
            .await
    }

    /// Sends to `/topics/<topic>`.
    ///
    /// Returns [`FcmError::Validation`] without touching the network when
    /// the topic name contains characters outside `[A-Za-z0-9-_.~%]`.
    pub async fn send_to_topic(&self, topic: &str, options: Value) -> Result<FcmResponse, FcmError> {
        if !valid_topic_name(topic) {
            warn!(topic, "refusing to send to invalid topic");
            return Err(validation_error(format!("invalid topic name: {topic:?}")));
        }
        self.send_with_notification_key(&request::topic_address(topic), options)
            .await
    }

    /// Sends to every device matching a topic condition.
    ///
    /// Invalid conditions are rejected locally with [`FcmError::Validation`].
    pub async fn send_to_topic_condition(
        &self,
        condition: &str,
        options: Value,
    ) -> Result<FcmResponse, FcmError> {
        if !validate_condition(condition) {
            warn!(condition, "refusing to send with invalid topic condition");
            return Err(validation_error(format!(
                "invalid topic condition: {condition:?}"
            )));
        }
        let request =
            request::send_to_condition(&self.endpoints, self.headers().await?, condition, options);
        self.dispatch("send_to_topic_condition", request, None)
            .await
    }

    // --- Device groups ---

    pub async fn create_notification_key(
        &self,
        key_name: &str,
        project_id: &str,
        registration_ids: impl Into<RegistrationIds>,
    ) -> Result<FcmResponse, FcmError> {
        let group = DeviceGroupRequest::create(key_name, registration_ids.into());
        self.manage_device_group("create_notification_key", project_id, &group)
            .await
    }

    pub async fn add_registration_ids(
        &self,
        key_name: &str,
        project_id: &str,
        notification_key: &str,
        registration_ids: impl Into<RegistrationIds>,
    ) -> Result<FcmResponse, FcmError> {
        let group = DeviceGroupRequest::add(key_name, notification_key, registration_ids.into());
        self.manage_device_group("add_registration_ids", project_id, &group)
            .await
    }

    pub async fn remove_registration_ids(
        &self,
        key_name: &str,
        project_id: &str,
        notification_key: &str,
        registration_ids: impl Into<RegistrationIds>,
    ) -> Result<FcmResponse, FcmError> {
        let group =
            DeviceGroupRequest::remove(key_name, notification_key, registration_ids.into());
        self.manage_device_group("remove_registration_ids", project_id, &group)
            .await
    }

    async fn manage_device_group(
        &self,
        operation: &'static str,
        project_id: &str,
        group: &DeviceGroupRequest,
    ) -> Result<FcmResponse, FcmError> {
        let request =
            request::device_group(&self.endpoints, self.headers().await?, project_id, group);
        self.dispatch(operation, request, None).await
    }

    /// Retrieves the notification key of the group named `key_name`.
    pub async fn recover_notification_key(
        &self,
        key_name: &str,
        project_id: &str,
    ) -> Result<FcmResponse, FcmError> {
        let request = request::recover_notification_key(
            &self.endpoints,
            self.headers().await?,
            key_name,
            project_id,
        );
        self.dispatch("recover_notification_key", request, None)
            .await
    }

    // --- Instance ID topic management ---

    /// Subscribes a single registration token to `topic`.
    ///
    /// The topic goes into the URL path, so it is validated like
    /// [`Client::send_to_topic`] does.
    pub async fn topic_subscription(
        &self,
        topic: &str,
        registration_id: &str,
    ) -> Result<FcmResponse, FcmError> {
        if !valid_topic_name(topic) {
            warn!(topic, "refusing to subscribe to invalid topic");
            return Err(validation_error(format!("invalid topic name: {topic:?}")));
        }
        let request = request::topic_subscription(
            &self.endpoints,
            self.headers().await?,
            topic,
            registration_id,
        );
        self.dispatch("topic_subscription", request, None).await
    }

    pub async fn batch_topic_subscription(
        &self,
        topic: &str,
        registration_ids: impl Into<RegistrationIds>,
    ) -> Result<FcmResponse, FcmError> {
        self.manage_topics_relationship(topic, registration_ids.into(), TopicAction::Add)
            .await
    }

    pub async fn batch_topic_unsubscription(
        &self,
        topic: &str,
        registration_ids: impl Into<RegistrationIds>,
    ) -> Result<FcmResponse, FcmError> {
        self.manage_topics_relationship(topic, registration_ids.into(), TopicAction::Remove)
            .await
    }

    pub async fn batch_subscribe_instance_ids_to_topic(
        &self,
        instance_ids: impl Into<RegistrationIds>,
        topic_name: &str,
    ) -> Result<FcmResponse, FcmError> {
        self.manage_topics_relationship(topic_name, instance_ids.into(), TopicAction::Add)
            .await
    }

    pub async fn batch_unsubscribe_instance_ids_from_topic(
        &self,
        instance_ids: impl Into<RegistrationIds>,
        topic_name: &str,
    ) -> Result<FcmResponse, FcmError> {
        self.manage_topics_relationship(topic_name, instance_ids.into(), TopicAction::Remove)
            .await
    }

    pub async fn subscribe_instance_id_to_topic(
        &self,
        iid_token: &str,
        topic_name: &str,
    ) -> Result<FcmResponse, FcmError> {
        self.batch_subscribe_instance_ids_to_topic(iid_token, topic_name)
            .await
    }

    pub async fn unsubscribe_instance_id_from_topic(
        &self,
        iid_token: &str,
        topic_name: &str,
    ) -> Result<FcmResponse, FcmError> {
        self.batch_unsubscribe_instance_ids_from_topic(iid_token, topic_name)
            .await
    }

    /// `/iid/v1:batchAdd` or `/iid/v1:batchRemove`; every batch variant ends here.
    pub async fn manage_topics_relationship(
        &self,
        topic: &str,
        registration_ids: RegistrationIds,
        action: TopicAction,
    ) -> Result<FcmResponse, FcmError> {
        let request = request::manage_topic_relationship(
            &self.endpoints,
            self.headers().await?,
            topic,
            &registration_ids,
            action,
        );
        self.dispatch(
            "manage_topics_relationship",
            request,
            Some(registration_ids.as_slice()),
        )
        .await
    }

    /// Instance ID metadata; with `details` the topic subscriptions are included.
    pub async fn get_instance_id_info(
        &self,
        iid_token: &str,
        details: bool,
    ) -> Result<FcmResponse, FcmError> {
        let request =
            request::instance_id_info(&self.endpoints, self.headers().await?, iid_token, details);
        self.dispatch("get_instance_id_info", request, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_fails_fast() {
        let result = Client::from_config(&FcmConfig::default());
        assert!(matches!(result, Err(FcmError::Config(_))));
        assert!(matches!(Client::new(""), Err(FcmError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_topic_is_rejected_locally() {
        // Nothing listens on this address; reaching the network would be a transport error.
        let mut config = FcmConfig::with_api_key("key");
        config.endpoints = Endpoints::all_at("http://127.0.0.1:9");
        let client = Client::from_config(&config).unwrap();

        let result = client.send_to_topic("TopicA$", Value::Null).await;
        assert!(matches!(result, Err(FcmError::Validation(_))));

        let result = client
            .send_to_topic_condition("'TopicA$' in topics", Value::Null)
            .await;
        assert!(matches!(result, Err(FcmError::Validation(_))));

        let result = client.topic_subscription("news/../send", "42").await;
        assert!(matches!(result, Err(FcmError::Validation(_))));
    }
}
