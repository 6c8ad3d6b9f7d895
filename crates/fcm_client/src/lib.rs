//! Firebase Cloud Messaging client
//!
//! This crate talks to the FCM legacy HTTP API (server key), the HTTP v1 API
//! (service-account OAuth2), device group management and Instance ID topic
//! management, and normalizes every answer into one [`FcmResponse`] shape.
//!
//! # Features
//!
//! - Sending to registration IDs, device groups, topics and topic conditions
//! - Canonical-ID and not-registered extraction from batch sends
//! - Local validation of topics and conditions before anything is sent
//! - Device group create/add/remove/recover
//! - Topic (un)subscription, single and batch, and Instance ID lookups
//! - HTTP v1 sends with a lazily fetched, cached bearer token
//! - Bounded timeout and retry with backoff for transient legacy failures
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! fcm-client = { version = "0.1.0" }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use fcm_client::Client;
//! use serde_json::json;
//!
//! async fn send() -> Result<(), fcm_client::FcmError> {
//!     let client = Client::new("AIzaSy...")?;
//!     let response = client
//!         .send_to_topic("news", json!({ "data": { "score": "5x1", "time": "15:10" } }))
//!         .await?;
//!     assert!(response.is_success());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod client_v1;
pub mod condition;
pub mod connection;
pub mod fcm;
pub mod models;
pub mod request;
pub mod response;

pub use auth::{CredentialProvider, KeySource, StaticTokenIssuer, TokenIssuer};
pub use client::Client;
pub use client_v1::ClientV1;
pub use fcm::Fcm;
pub use models::{GroupOperation, RegistrationIds, TopicAction};
pub use response::{CanonicalId, FcmResponse, Outcome};

pub use fcm_common::FcmError;
pub use fcm_config::{Endpoints, FcmConfig, RetryConfig};
