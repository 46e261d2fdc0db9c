//! Engine configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the engine can start with zero
//! configuration against a local development backend.

use std::path::PathBuf;
use std::time::Duration;

use agora_shared::constants::DEFAULT_POLL_INTERVAL_SECS;
use agora_shared::UserId;
use uuid::Uuid;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Authenticated base path of the backend REST API.
    /// Env: `AGORA_BASE_URL`
    /// Default: `http://127.0.0.1:8080/api`
    pub base_url: String,

    /// Bearer token attached to every request.
    /// Env: `AGORA_AUTH_TOKEN`
    /// Default: none.
    pub auth_token: Option<String>,

    /// The signed-in user, needed to tell own messages from others'.
    /// Env: `AGORA_USER_ID` (UUID)
    /// Default: the nil UUID (development only).
    pub current_user: UserId,

    /// Interval between background refresh ticks.
    /// Env: `AGORA_POLL_INTERVAL_SECS`
    /// Default: 5 seconds.
    pub poll_interval: Duration,

    /// Directory holding the local preference database. When unset the
    /// platform data directory is used.
    /// Env: `AGORA_DATA_DIR`
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            auth_token: None,
            current_user: UserId(Uuid::nil()),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("AGORA_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(token) = std::env::var("AGORA_AUTH_TOKEN") {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }

        if let Ok(user) = std::env::var("AGORA_USER_ID") {
            match user.parse() {
                Ok(id) => config.current_user = id,
                Err(e) => {
                    tracing::warn!(value = %user, error = %e, "Invalid AGORA_USER_ID, using default");
                }
            }
        }

        if let Ok(secs) = std::env::var("AGORA_POLL_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(n) if n > 0 => config.poll_interval = Duration::from_secs(n),
                _ => {
                    tracing::warn!(value = %secs, "Invalid AGORA_POLL_INTERVAL_SECS, using default");
                }
            }
        }

        if let Ok(dir) = std::env::var("AGORA_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = Some(PathBuf::from(dir));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
