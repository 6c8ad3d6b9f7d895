use std::fmt;
use thiserror::Error;

/// The error type shared by every FCM crate.
///
/// Remote failures (4xx/5xx answers from Google) are not errors: they come
/// back as a normalized response. Only setup problems, rejected input and
/// transport failures end up here.
#[derive(Error, Debug)]
pub enum FcmError {
    /// Missing API key, credentials or project at construction time
    #[error("Configuration error: {0}")]
    Config(String),

    /// Topic or condition rejected locally; nothing was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The service-account key could not be read or the token issuer refused it
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Timeout or connection failure, after retries
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The caller's message could not be turned into JSON
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for FcmError {
    fn from(err: config::ConfigError) -> Self {
        FcmError::Config(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> FcmError {
    FcmError::Config(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> FcmError {
    FcmError::Validation(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> FcmError {
    FcmError::Auth(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_build_expected_variants() {
        assert!(matches!(config_error("no key"), FcmError::Config(m) if m == "no key"));
        assert!(matches!(validation_error("bad"), FcmError::Validation(_)));
        assert!(matches!(auth_error("denied"), FcmError::Auth(_)));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            config_error("Missing API key").to_string(),
            "Configuration error: Missing API key"
        );
        assert_eq!(
            validation_error("invalid topic").to_string(),
            "Validation error: invalid topic"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: FcmError = config::ConfigError::Message("missing field".to_string()).into();
        assert!(matches!(err, FcmError::Config(m) if m.contains("missing field")));
    }
}
