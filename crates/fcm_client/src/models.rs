//! Request-side data types
//!
//! Typed inputs for the operations of the legacy API. Response types live in
//! [`crate::response`].

use serde::{Deserialize, Serialize};

/// One or more registration tokens.
///
/// A single token is wrapped into a one-element list, so
/// `RegistrationIds::from("42")` and `RegistrationIds::from(vec!["42"])`
/// produce the same request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationIds(Vec<String>);

impl RegistrationIds {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for RegistrationIds {
    fn from(id: &str) -> Self {
        Self(vec![id.to_string()])
    }
}

impl From<String> for RegistrationIds {
    fn from(id: String) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<String>> for RegistrationIds {
    fn from(ids: Vec<String>) -> Self {
        Self(ids)
    }
}

impl From<Vec<&str>> for RegistrationIds {
    fn from(ids: Vec<&str>) -> Self {
        Self(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for RegistrationIds {
    fn from(ids: &[String]) -> Self {
        Self(ids.to_vec())
    }
}

impl From<&[&str]> for RegistrationIds {
    fn from(ids: &[&str]) -> Self {
        Self(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for RegistrationIds {
    fn from(ids: [&str; N]) -> Self {
        Self(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// Device group operation sent to `/gcm/notification`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperation {
    Create,
    Add,
    Remove,
}

/// Body of a device group create/add/remove request.
///
/// `notification_key` is only sent for add and remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceGroupRequest {
    pub registration_ids: RegistrationIds,
    pub operation: GroupOperation,
    pub notification_key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_key: Option<String>,
}

impl DeviceGroupRequest {
    pub fn create(key_name: impl Into<String>, registration_ids: RegistrationIds) -> Self {
        Self {
            registration_ids,
            operation: GroupOperation::Create,
            notification_key_name: key_name.into(),
            notification_key: None,
        }
    }

    pub fn add(
        key_name: impl Into<String>,
        notification_key: impl Into<String>,
        registration_ids: RegistrationIds,
    ) -> Self {
        Self {
            registration_ids,
            operation: GroupOperation::Add,
            notification_key_name: key_name.into(),
            notification_key: Some(notification_key.into()),
        }
    }

    pub fn remove(
        key_name: impl Into<String>,
        notification_key: impl Into<String>,
        registration_ids: RegistrationIds,
    ) -> Self {
        Self {
            registration_ids,
            operation: GroupOperation::Remove,
            notification_key_name: key_name.into(),
            notification_key: Some(notification_key.into()),
        }
    }
}

/// Direction of a batch topic relationship change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicAction {
    Add,
    Remove,
}

impl TopicAction {
    /// Path suffix of the Instance ID batch endpoint (`/iid/v1:batchAdd`)
    pub fn batch_endpoint(self) -> &'static str {
        match self {
            TopicAction::Add => "batchAdd",
            TopicAction::Remove => "batchRemove",
        }
    }
}

/// Body of `/iid/v1:batchAdd` and `/iid/v1:batchRemove`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicRelationshipRequest {
    pub to: String,
    pub registration_tokens: RegistrationIds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_id_equals_one_element_list() {
        assert_eq!(RegistrationIds::from("42"), RegistrationIds::from(vec!["42"]));
        assert_eq!(
            RegistrationIds::from("42".to_string()),
            RegistrationIds::from(["42"])
        );
    }

    #[test]
    fn test_registration_ids_serialize_as_array() {
        let ids = RegistrationIds::from(["a", "b"]);
        assert_eq!(serde_json::to_value(&ids).unwrap(), json!(["a", "b"]));
        assert_eq!(ids.as_slice(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_create_group_body_omits_notification_key() {
        let body = DeviceGroupRequest::create("appUser-Chris", RegistrationIds::from("42"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "registration_ids": ["42"],
                "operation": "create",
                "notification_key_name": "appUser-Chris"
            })
        );
    }

    #[test]
    fn test_remove_group_body() {
        let body = DeviceGroupRequest::remove("appUser-Chris", "APA91bGHX", RegistrationIds::from("42"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "registration_ids": ["42"],
                "operation": "remove",
                "notification_key_name": "appUser-Chris",
                "notification_key": "APA91bGHX"
            })
        );
    }

    #[test]
    fn test_topic_action_endpoints() {
        assert_eq!(TopicAction::Add.batch_endpoint(), "batchAdd");
        assert_eq!(TopicAction::Remove.batch_endpoint(), "batchRemove");
    }
}
