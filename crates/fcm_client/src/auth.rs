//! Authentication for Firebase Cloud Messaging
//!
//! The legacy endpoints take a static server key (`Authorization: key=...`).
//! The HTTP v1 endpoint takes an OAuth2 bearer token obtained from a
//! service-account key. Both are hidden behind [`CredentialProvider`], which
//! hands the request builder a ready-made set of authorization headers.

use async_trait::async_trait;
use fcm_common::{auth_error, config_error, FcmError};
use indexmap::IndexMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, error};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{
    parse_service_account_key, read_service_account_key, ServiceAccountAuthenticator,
    ServiceAccountKey,
};

use crate::request::Headers;

/// FCM requires the "https://www.googleapis.com/auth/firebase.messaging" scope
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

const CONTENT_TYPE_JSON: &str = "application/json";

/// Where the service-account key comes from.
pub enum KeySource {
    /// Path to a `service_account_key.json` file, opened on first use
    FilePath(PathBuf),
    /// An already open stream holding the key JSON, read on first use
    ByteStream(Box<dyn Read + Send + Sync>),
}

impl KeySource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        KeySource::FilePath(path.into())
    }

    pub fn from_reader<R: Read + Send + Sync + 'static>(reader: R) -> Self {
        KeySource::ByteStream(Box::new(reader))
    }

    /// Key JSON already held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(Cursor::new(bytes.into()))
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            KeySource::ByteStream(_) => f.write_str("ByteStream(..)"),
        }
    }
}

impl From<PathBuf> for KeySource {
    fn from(path: PathBuf) -> Self {
        KeySource::FilePath(path)
    }
}

impl From<&Path> for KeySource {
    fn from(path: &Path) -> Self {
        KeySource::FilePath(path.to_path_buf())
    }
}

/// Source of OAuth2 access tokens for the HTTP v1 API.
///
/// Implementations own caching and refresh; callers ask for a token on
/// every request.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn access_token(&self) -> Result<String, FcmError>;
}

/// Issues tokens from a Google service-account key via yup-oauth2.
///
/// The key is read, the authenticator built and the first token exchanged
/// once; concurrent first calls wait for that single initialization. The
/// authenticator then keeps the token cached and refreshes it on expiry.
pub struct ServiceAccountIssuer {
    source: Mutex<Option<KeySource>>,
    key: OnceCell<ServiceAccountKey>,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl ServiceAccountIssuer {
    pub fn new(source: KeySource) -> Self {
        Self {
            source: Mutex::new(Some(source)),
            key: OnceCell::new(),
            authenticator: OnceCell::new(),
        }
    }

    async fn service_account_key(&self) -> Result<&ServiceAccountKey, FcmError> {
        self.key
            .get_or_try_init(|| async { read_key(self.next_source()?).await })
            .await
    }

    async fn authenticator(&self) -> Result<&DefaultAuthenticator, FcmError> {
        self.authenticator
            .get_or_try_init(|| async {
                let key = self.service_account_key().await?.clone();
                debug!(client_email = %key.client_email, "building service account authenticator");
                let auth = ServiceAccountAuthenticator::builder(key)
                    .build()
                    .await
                    .map_err(|e| auth_error(format!("failed to build authenticator: {e}")))?;
                // First exchange runs inside the cell; later calls hit the token cache.
                fetch_token(&auth).await?;
                Ok(auth)
            })
            .await
    }

    // A path is reopened until a key has been parsed. A stream is read once.
    fn next_source(&self) -> Result<KeySource, FcmError> {
        let mut guard = self
            .source
            .lock()
            .map_err(|_| auth_error("key source lock poisoned"))?;
        if let Some(KeySource::FilePath(path)) = guard.as_ref() {
            return Ok(KeySource::FilePath(path.clone()));
        }
        guard
            .take()
            .ok_or_else(|| auth_error("service account key source was already consumed"))
    }
}

async fn read_key(source: KeySource) -> Result<ServiceAccountKey, FcmError> {
    match source {
        KeySource::FilePath(path) => read_service_account_key(&path).await.map_err(|e| {
            auth_error(format!(
                "failed to read service account key {}: {e}",
                path.display()
            ))
        }),
        KeySource::ByteStream(mut reader) => {
            let mut bytes = Vec::new();
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| auth_error(format!("failed to read service account key stream: {e}")))?;
            parse_service_account_key(bytes)
                .map_err(|e| auth_error(format!("invalid service account key: {e}")))
        }
    }
}

async fn fetch_token(auth: &DefaultAuthenticator) -> Result<String, FcmError> {
    let token = auth
        .token(&[FIREBASE_MESSAGING_SCOPE])
        .await
        .map_err(|e| auth_error(format!("token request rejected: {e}")))?;
    token
        .token()
        .map(str::to_string)
        .ok_or_else(|| auth_error("No token available"))
}

#[async_trait]
impl TokenIssuer for ServiceAccountIssuer {
    async fn access_token(&self) -> Result<String, FcmError> {
        let auth = self.authenticator().await?;
        fetch_token(auth).await
    }
}

/// A fixed token, for callers that obtain tokens elsewhere.
#[derive(Clone)]
pub struct StaticTokenIssuer {
    token: String,
}

impl StaticTokenIssuer {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenIssuer for StaticTokenIssuer {
    async fn access_token(&self) -> Result<String, FcmError> {
        Ok(self.token.clone())
    }
}

/// The credential mode of a client instance.
#[derive(Clone)]
pub enum CredentialProvider {
    /// Legacy server key
    ApiKey(String),
    /// OAuth2 bearer tokens for the HTTP v1 API
    ServiceAccount(Arc<dyn TokenIssuer>),
}

impl fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialProvider::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            CredentialProvider::ServiceAccount(_) => f.write_str("ServiceAccount(..)"),
        }
    }
}

impl CredentialProvider {
    /// Fails fast on an empty key.
    pub fn api_key(key: impl Into<String>) -> Result<Self, FcmError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(config_error("Missing FCM API key"));
        }
        Ok(CredentialProvider::ApiKey(key))
    }

    pub fn service_account(source: KeySource) -> Self {
        CredentialProvider::ServiceAccount(Arc::new(ServiceAccountIssuer::new(source)))
    }

    pub fn from_issuer(issuer: Arc<dyn TokenIssuer>) -> Self {
        CredentialProvider::ServiceAccount(issuer)
    }

    /// Headers to attach to every request made with these credentials.
    pub async fn authorization_headers(&self) -> Result<Headers, FcmError> {
        let authorization = match self {
            CredentialProvider::ApiKey(key) => format!("key={}", key),
            CredentialProvider::ServiceAccount(issuer) => {
                let token = issuer.access_token().await.map_err(|e| {
                    error!("Failed to obtain FCM access token: {}", e);
                    e
                })?;
                format!("Bearer {}", token)
            }
        };

        Ok(IndexMap::from([
            ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
            ("Authorization".to_string(), authorization),
        ]))
    }
}
