// --- File: crates/fcm_common/src/lib.rs ---

pub mod error; // Error taxonomy
pub mod http; // HTTP client factory
pub mod logging; // Tracing subscriber setup

pub use error::{auth_error, config_error, validation_error, FcmError};
pub use http::create_client;
pub use logging::{init, init_with_level};
