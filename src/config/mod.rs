//! Configuration module.
//!
//! Supports a JSON configuration file, environment variable overrides and
//! sensible defaults, in that order of precedence.

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod types;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use types::{Config, ProviderSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.port, 3573);
        assert_eq!(config.cors_origins, "*");
        assert_eq!(config.server.question_fetch_timeout_secs, 8);
        assert_eq!(config.server.empty_room_timeout_secs, 300);
        assert_eq!(config.server.sweep_interval_secs, 60);
        assert_eq!(config.provider.base_url, "https://the-trivia-api.com/v2");
        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "server.log");
        assert_eq!(config.logging.rotation, "daily");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config.port, deserialized.port);
        assert_eq!(config.cors_origins, deserialized.cors_origins);
        assert_eq!(
            config.server.question_fetch_timeout_secs,
            deserialized.server.question_fetch_timeout_secs
        );
        assert_eq!(config.provider.base_url, deserialized.provider.base_url);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: Config = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(parsed.port, 9000);
        assert_eq!(parsed.server.sweep_interval_secs, 60);
    }

    #[test]
    fn log_level_directives() {
        assert_eq!(LogLevel::Trace.as_str(), "trace");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }
}
