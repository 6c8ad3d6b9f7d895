use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

const USER_AGENT: &str = concat!("fcm-client/", env!("CARGO_PKG_VERSION"));

/// Creates the HTTP client used for every FCM call.
///
/// `timeout` bounds the whole request, connect included.
pub fn create_client(timeout: Duration) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        assert!(create_client(Duration::from_millis(250)).is_ok());
        assert!(create_client(Duration::from_secs(30)).is_ok());
    }
}
