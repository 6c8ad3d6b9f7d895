//! Response normalization
//!
//! Legacy and v1 clients both funnel their HTTP answers through
//! [`build_fcm_response`], which turns status, headers and body into one
//! [`FcmResponse`]. Remote failures are data here, not errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::request::Headers;

pub const ERROR_RESPONSE_400: &str = "Only applies for JSON requests. Indicates that the request could not be parsed as JSON, or it contained invalid fields.";
pub const ERROR_RESPONSE_401: &str = "There was an error authenticating the sender account.";
pub const ERROR_RESPONSE_503: &str = "Server is temporarily unavailable.";
pub const ERROR_RESPONSE_50X: &str =
    "There was an internal error in the FCM server while trying to process the request.";
pub const ERROR_RESPONSE_UNKNOWN: &str = "Unexpected response status from the FCM server.";

/// Per-recipient error code marking a token that should be dropped
pub const NOT_REGISTERED: &str = "NotRegistered";

/// What came back over the wire, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

/// Classification of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    BadRequest,
    Unauthorized,
    ServiceUnavailable,
    ServerError,
    /// Anything outside 2xx, 400, 401 and 5xx (3xx, 404, 429, ...)
    Unknown,
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Outcome::Success,
            400 => Outcome::BadRequest,
            401 => Outcome::Unauthorized,
            503 => Outcome::ServiceUnavailable,
            500..=599 => Outcome::ServerError,
            _ => Outcome::Unknown,
        }
    }

    /// `"success"` or the fixed descriptive string of the error class.
    pub fn description(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::BadRequest => ERROR_RESPONSE_400,
            Outcome::Unauthorized => ERROR_RESPONSE_401,
            Outcome::ServiceUnavailable => ERROR_RESPONSE_503,
            Outcome::ServerError => ERROR_RESPONSE_50X,
            Outcome::Unknown => ERROR_RESPONSE_UNKNOWN,
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.description())
    }
}

/// A stale registration ID and the one that replaces it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalId {
    pub old: String,
    pub new: String,
}

/// Normalized result of every operation.
///
/// `canonical_ids` and `not_registered_ids` are only present for successful
/// calls that carried an explicit registration-ID list; they are then empty
/// rather than absent when nothing needs remapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FcmResponse {
    pub body: String,
    pub headers: Headers,
    pub status_code: u16,
    pub response: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_ids: Option<Vec<CanonicalId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_registered_ids: Option<Vec<String>>,
}

impl FcmResponse {
    pub fn is_success(&self) -> bool {
        self.response.is_success()
    }
}

/// Per-recipient entry of a legacy batch answer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyResult {
    #[serde(default)]
    pub message_id: Option<serde_json::Value>,
    #[serde(default)]
    pub registration_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a legacy send (or batch topic) answer. Missing counters read as 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyBatchBody {
    #[serde(default)]
    pub success: i64,
    #[serde(default)]
    pub failure: i64,
    #[serde(default)]
    pub canonical_ids: i64,
    #[serde(default)]
    pub results: Vec<LegacyResult>,
}

impl LegacyBatchBody {
    /// `None` for an empty or non-JSON body.
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}

/// Converts a raw HTTP answer into an [`FcmResponse`].
///
/// `registration_ids` is the ID list the request was made with, aligned
/// positionally with `results` in the body. Pure: the same input always
/// yields the same output.
pub fn build_fcm_response(raw: &RawResponse, registration_ids: Option<&[String]>) -> FcmResponse {
    let outcome = Outcome::from_status(raw.status);
    let mut response = FcmResponse {
        body: raw.body.clone(),
        headers: raw.headers.clone(),
        status_code: raw.status,
        response: outcome,
        canonical_ids: None,
        not_registered_ids: None,
    };

    if !outcome.is_success() {
        return response;
    }

    if let Some(ids) = registration_ids {
        let parsed = LegacyBatchBody::parse(&raw.body);
        if parsed.is_none() && !raw.body.trim().is_empty() {
            warn!(
                status = raw.status,
                "successful response body is not a legacy batch result"
            );
        }
        let body = parsed.unwrap_or_default();
        response.canonical_ids = Some(build_canonical_ids(&body, ids));
        response.not_registered_ids = Some(build_not_registered_ids(&body, ids));
    }

    response
}

fn build_canonical_ids(body: &LegacyBatchBody, registration_ids: &[String]) -> Vec<CanonicalId> {
    if body.canonical_ids <= 0 {
        return Vec::new();
    }

    body.results
        .iter()
        .zip(registration_ids)
        .filter_map(|(result, old)| {
            result.registration_id.as_ref().map(|new| CanonicalId {
                old: old.clone(),
                new: new.clone(),
            })
        })
        .collect()
}

fn build_not_registered_ids(body: &LegacyBatchBody, registration_ids: &[String]) -> Vec<String> {
    if body.failure <= 0 {
        return Vec::new();
    }

    body.results
        .iter()
        .zip(registration_ids)
        .filter(|(result, _)| result.error.as_deref() == Some(NOT_REGISTERED))
        .map(|(_, id)| id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: IndexMap::from([("content-type".to_string(), "application/json".to_string())]),
            body: body.to_string(),
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_success_body_yields_empty_sequences() {
        let ids = ids(&["42"]);
        let response = build_fcm_response(&raw(200, ""), Some(ids.as_slice()));
        assert_eq!(response.response, Outcome::Success);
        assert_eq!(response.canonical_ids, Some(vec![]));
        assert_eq!(response.not_registered_ids, Some(vec![]));
    }

    #[test]
    fn test_canonical_ids_are_remapped() {
        let ids = ids(&["42"]);
        let body = r#"{"canonical_ids":1,"failure":0,"results":[{"registration_id":"43","message_id":"0:1385025861956342%572c22801bb3"}]}"#;
        let response = build_fcm_response(&raw(200, body), Some(ids.as_slice()));
        assert_eq!(
            response.canonical_ids,
            Some(vec![CanonicalId {
                old: "42".to_string(),
                new: "43".to_string()
            }])
        );
        assert_eq!(response.not_registered_ids, Some(vec![]));
        assert_eq!(response.body, body);
    }

    #[test]
    fn test_not_registered_ids_are_extracted() {
        let ids = ids(&["42"]);
        let body = r#"{"canonical_ids":0,"failure":1,"results":[{"error":"NotRegistered"}]}"#;
        let response = build_fcm_response(&raw(200, body), Some(ids.as_slice()));
        assert_eq!(response.not_registered_ids, Some(vec!["42".to_string()]));
        assert_eq!(response.canonical_ids, Some(vec![]));
    }

    #[test]
    fn test_mixed_results_keep_positions() {
        let ids = ids(&["a", "b", "c", "d"]);
        let body = r#"{"success":2,"failure":2,"canonical_ids":1,"results":[
            {"message_id":"1"},
            {"error":"NotRegistered"},
            {"message_id":"2","registration_id":"c2"},
            {"error":"InvalidRegistration"}
        ]}"#;
        let response = build_fcm_response(&raw(200, body), Some(ids.as_slice()));
        assert_eq!(
            response.canonical_ids,
            Some(vec![CanonicalId {
                old: "c".to_string(),
                new: "c2".to_string()
            }])
        );
        assert_eq!(response.not_registered_ids, Some(vec!["b".to_string()]));
    }

    #[test]
    fn test_counters_gate_derivation() {
        let ids = ids(&["42"]);
        let body = r#"{"canonical_ids":0,"failure":0,"results":[{"registration_id":"43","error":"NotRegistered"}]}"#;
        let response = build_fcm_response(&raw(200, body), Some(ids.as_slice()));
        assert_eq!(response.canonical_ids, Some(vec![]));
        assert_eq!(response.not_registered_ids, Some(vec![]));
    }

    #[test]
    fn test_batch_topic_body_without_counters() {
        let ids = ids(&["a", "b"]);
        let body = r#"{"results":[{},{"error":"NOT_FOUND"}]}"#;
        let response = build_fcm_response(&raw(200, body), Some(ids.as_slice()));
        assert_eq!(response.canonical_ids, Some(vec![]));
        assert_eq!(response.not_registered_ids, Some(vec![]));
    }

    #[test]
    fn test_non_json_success_body() {
        let ids = ids(&["42"]);
        let response = build_fcm_response(&raw(200, "not json"), Some(ids.as_slice()));
        assert!(response.is_success());
        assert_eq!(response.canonical_ids, Some(vec![]));
        assert_eq!(response.not_registered_ids, Some(vec![]));
    }

    #[test]
    fn test_without_ids_no_derived_sequences() {
        let response = build_fcm_response(&raw(200, r#"{"message_id":1}"#), None);
        assert_eq!(response.response.description(), "success");
        assert!(response.canonical_ids.is_none());
        assert!(response.not_registered_ids.is_none());
    }

    #[test]
    fn test_error_statuses_map_to_fixed_strings() {
        let cases = [
            (400, ERROR_RESPONSE_400),
            (401, ERROR_RESPONSE_401),
            (503, ERROR_RESPONSE_503),
            (500, ERROR_RESPONSE_50X),
            (502, ERROR_RESPONSE_50X),
            (599, ERROR_RESPONSE_50X),
        ];
        let ids = ids(&["42"]);
        for (status, expected) in cases {
            let response = build_fcm_response(&raw(status, "{}"), Some(ids.as_slice()));
            assert_eq!(response.response.description(), expected, "status {status}");
            assert_eq!(response.status_code, status);
            assert_eq!(response.body, "{}");
            assert!(response.canonical_ids.is_none());
            assert!(response.not_registered_ids.is_none());
        }
    }

    #[test]
    fn test_unexpected_status_is_unknown() {
        for status in [301, 404, 429] {
            let response = build_fcm_response(&raw(status, ""), None);
            assert_eq!(response.response, Outcome::Unknown);
            assert_eq!(response.response.description(), ERROR_RESPONSE_UNKNOWN);
        }
    }

    #[test]
    fn test_headers_are_surfaced_verbatim() {
        let mut input = raw(599, r#"{"body-key" => "Body value"}"#);
        input
            .headers
            .insert("header-key".to_string(), "Header value".to_string());
        let response = build_fcm_response(&input, None);
        assert_eq!(
            response.headers.get("header-key").map(String::as_str),
            Some("Header value")
        );
        assert_eq!(response.body, r#"{"body-key" => "Body value"}"#);
    }

    #[test]
    fn test_normalizer_is_idempotent() {
        let ids = ids(&["42"]);
        let input = raw(
            200,
            r#"{"canonical_ids":1,"failure":1,"results":[{"registration_id":"43","error":"NotRegistered"}]}"#,
        );
        let first = build_fcm_response(&input, Some(ids.as_slice()));
        let second = build_fcm_response(&input, Some(ids.as_slice()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialized_shape() {
        let ids = ids(&["42"]);
        let response = build_fcm_response(&raw(200, ""), Some(ids.as_slice()));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["response"], "success");
        assert_eq!(value["status_code"], 200);
        assert_eq!(value["canonical_ids"], serde_json::json!([]));
        assert_eq!(value["not_registered_ids"], serde_json::json!([]));
    }
}
