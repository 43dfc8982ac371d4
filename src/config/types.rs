use serde::{Deserialize, Serialize};

use super::defaults;
use super::logging::LoggingConfig;

/// Root configuration, loadable from `config.json` with env overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// Comma-separated allowed CORS origins, or `*` for permissive.
    pub cors_origins: String,
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            cors_origins: defaults::cors_origins(),
            server: ServerSettings::default(),
            provider: ProviderSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Room lifecycle and dispatch behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Upper bound on one question fetch, including provider retries.
    pub question_fetch_timeout_secs: u64,
    /// How long a room may sit with no players and no connections before
    /// the sweep removes it.
    pub empty_room_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            question_fetch_timeout_secs: defaults::question_fetch_timeout_secs(),
            empty_room_timeout_secs: defaults::empty_room_timeout_secs(),
            sweep_interval_secs: defaults::sweep_interval_secs(),
        }
    }
}

/// Upstream trivia provider endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::provider_base_url(),
            request_timeout_secs: defaults::provider_request_timeout_secs(),
        }
    }
}
