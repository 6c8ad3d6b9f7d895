//! Request construction
//!
//! Every operation is turned into an [`FcmRequest`] by a pure function here:
//! no I/O, no credentials lookup. The caller supplies the authorization
//! headers obtained from the [`crate::auth::CredentialProvider`].

use fcm_config::Endpoints;
use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use urlencoding::encode;

use crate::models::{DeviceGroupRequest, RegistrationIds, TopicAction, TopicRelationshipRequest};

/// Ordered header map, used for both requests and responses
pub type Headers = IndexMap<String, String>;

pub const LEGACY_SEND_PATH: &str = "/fcm/send";
pub const GROUP_NOTIFICATION_PATH: &str = "/gcm/notification";
pub const V1_PROJECTS_PATH: &str = "/v1/projects";

/// Header carrying the sender ID on device group calls
pub const PROJECT_ID_HEADER: &str = "project_id";

/// A fully built HTTP request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FcmRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Value>,
}

impl FcmRequest {
    fn post(url: String, headers: Headers, body: Option<Value>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers,
            body,
        }
    }

    fn get(url: String, headers: Headers) -> Self {
        Self {
            method: Method::GET,
            url,
            headers,
            body: None,
        }
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Merges caller options into `base`. Caller keys win.
///
/// Options that are not a JSON object (including `null`) are ignored.
pub fn merge_options(mut base: Map<String, Value>, options: Value) -> Value {
    match options {
        Value::Object(options) => base.extend(options),
        Value::Null => {}
        other => debug!("ignoring non-object options: {}", other),
    }
    Value::Object(base)
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Legacy send to an explicit list of registration IDs.
pub fn legacy_send(
    endpoints: &Endpoints,
    headers: Headers,
    registration_ids: &RegistrationIds,
    options: Value,
) -> FcmRequest {
    let mut base = Map::new();
    base.insert("registration_ids".to_string(), json!(registration_ids));
    FcmRequest::post(
        join(&endpoints.fcm_base, LEGACY_SEND_PATH),
        headers,
        Some(merge_options(base, options)),
    )
}

/// Legacy send to a notification key or a `/topics/<name>` address.
pub fn send_to(endpoints: &Endpoints, headers: Headers, to: &str, options: Value) -> FcmRequest {
    let mut base = Map::new();
    base.insert("to".to_string(), Value::String(to.to_string()));
    FcmRequest::post(
        join(&endpoints.fcm_base, LEGACY_SEND_PATH),
        headers,
        Some(merge_options(base, options)),
    )
}

/// The `to` address of a topic.
pub fn topic_address(topic: &str) -> String {
    format!("/topics/{}", topic)
}

/// Legacy send to a topic condition. The condition must already be validated.
pub fn send_to_condition(
    endpoints: &Endpoints,
    headers: Headers,
    condition: &str,
    options: Value,
) -> FcmRequest {
    let mut base = Map::new();
    base.insert("condition".to_string(), Value::String(condition.to_string()));
    FcmRequest::post(
        join(&endpoints.fcm_base, LEGACY_SEND_PATH),
        headers,
        Some(merge_options(base, options)),
    )
}

/// Create, add to or remove from a device group.
pub fn device_group(
    endpoints: &Endpoints,
    mut headers: Headers,
    project_id: &str,
    request: &DeviceGroupRequest,
) -> FcmRequest {
    headers.insert(PROJECT_ID_HEADER.to_string(), project_id.to_string());
    FcmRequest::post(
        join(&endpoints.group_notification_base, GROUP_NOTIFICATION_PATH),
        headers,
        Some(Value::Object(to_object(request))),
    )
}

/// Look up the notification key of a device group by name.
pub fn recover_notification_key(
    endpoints: &Endpoints,
    mut headers: Headers,
    key_name: &str,
    project_id: &str,
) -> FcmRequest {
    headers.insert(PROJECT_ID_HEADER.to_string(), project_id.to_string());
    let query = serde_urlencoded::to_string([("notification_key_name", key_name)])
        .unwrap_or_default();
    let url = format!(
        "{}?{}",
        join(&endpoints.group_notification_base, GROUP_NOTIFICATION_PATH),
        query
    );
    FcmRequest::get(url, headers)
}

/// Subscribe one registration token to a topic.
pub fn topic_subscription(
    endpoints: &Endpoints,
    headers: Headers,
    topic: &str,
    registration_id: &str,
) -> FcmRequest {
    let path = format!(
        "/iid/v1/{}/rel/topics/{}",
        encode(registration_id),
        encode(topic)
    );
    FcmRequest::post(join(&endpoints.instance_id_base, &path), headers, None)
}

/// Batch add or remove tokens to/from a topic.
pub fn manage_topic_relationship(
    endpoints: &Endpoints,
    headers: Headers,
    topic: &str,
    registration_ids: &RegistrationIds,
    action: TopicAction,
) -> FcmRequest {
    let body = TopicRelationshipRequest {
        to: topic_address(topic),
        registration_tokens: registration_ids.clone(),
    };
    let path = format!("/iid/v1:{}", action.batch_endpoint());
    FcmRequest::post(
        join(&endpoints.instance_id_base, &path),
        headers,
        Some(Value::Object(to_object(&body))),
    )
}

/// Instance ID details; `details` adds the topic subscriptions to the answer.
pub fn instance_id_info(
    endpoints: &Endpoints,
    headers: Headers,
    iid_token: &str,
    details: bool,
) -> FcmRequest {
    let path = format!("/iid/info/{}", encode(iid_token));
    let mut url = join(&endpoints.instance_id_base, &path);
    if details {
        url.push_str("?details=true");
    }
    FcmRequest::get(url, headers)
}

/// HTTP v1 send. `project_name` must be non-empty; callers check that first.
pub fn v1_send(
    endpoints: &Endpoints,
    headers: Headers,
    project_name: &str,
    message: Value,
) -> FcmRequest {
    let path = format!("{}/{}/messages:send", V1_PROJECTS_PATH, encode(project_name));
    FcmRequest::post(
        join(&endpoints.fcm_base, &path),
        headers,
        Some(json!({ "message": message })),
    )
}
