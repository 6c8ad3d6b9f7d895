use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::Path;
use tracing::debug;

pub mod models;
pub use models::*;

/// Prefix of the environment variables that override file configuration
pub const ENV_PREFIX: &str = "FCM";

/// Separator between nested keys, e.g. `FCM__RETRY__MAX_RETRIES`
pub const ENV_SEPARATOR: &str = "__";

/// Default (optional) configuration file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "config/fcm";

/// Loads configuration from `config/fcm.{toml,yaml,json}` (if present) and
/// `FCM__*` environment variables.
pub fn load_config() -> Result<FcmConfig, ConfigError> {
    ensure_dotenv_loaded();

    let path = env::var("FCM_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    debug!("loading FCM configuration from {path} (optional)");

    Config::builder()
        .add_source(File::with_name(&path).required(false))
        .add_source(env_source())
        .build()?
        .try_deserialize()
}

/// Loads configuration from an explicit file, still honouring `FCM__*` overrides.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<FcmConfig, ConfigError> {
    ensure_dotenv_loaded();

    let path = path.as_ref();
    debug!("loading FCM configuration from {}", path.display());

    Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(env_source())
        .build()?
        .try_deserialize()
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// `DOTENV_OVERRIDE` selects another file; otherwise `.env` is used. A missing
/// file is not an error. Returns the path that was (or would have been) loaded.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
api_key = "server-key"
project_name = "my-project"
timeout_secs = 5

[retry]
max_retries = 4
jitter = false

[endpoints]
fcm_base = "http://localhost:8080"
"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("server-key"));
        assert_eq!(config.project_name.as_deref(), Some("my-project"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.retry.max_retries, 4);
        assert!(!config.retry.jitter);
        assert_eq!(config.retry.initial_backoff_ms, 500);
        assert_eq!(config.endpoints.fcm_base, "http://localhost:8080");
        assert_eq!(
            config.endpoints.instance_id_base,
            DEFAULT_INSTANCE_ID_API
        );
    }

    #[test]
    fn test_load_config_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from(dir.path().join("absent.toml"));
        assert!(result.is_err());
    }
}
