//! Configuration loading: `config.json` if present, merged over code
//! defaults, with a couple of environment overrides for container use.

use std::path::Path;

use super::types::Config;

const CONFIG_FILE: &str = "config.json";

/// Load configuration. Never fails: a malformed file is reported on stderr
/// and the defaults are used instead, matching a server that must come up
/// even with a bad config volume mounted.
pub fn load() -> Config {
    let mut config = load_from_file(Path::new(CONFIG_FILE)).unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

fn load_from_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                eprintln!("Ignoring malformed {}: {err}", path.display());
                None
            }
        },
        Err(err) => {
            eprintln!("Could not read {}: {err}", path.display());
            None
        }
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(port) = std::env::var("PORT") {
        match port.parse() {
            Ok(port) => config.port = port,
            Err(_) => eprintln!("Ignoring non-numeric PORT override: {port}"),
        }
    }
    if let Ok(origins) = std::env::var("CORS_ORIGINS") {
        config.cors_origins = origins;
    }
    if let Ok(base_url) = std::env::var("TRIVIA_API_BASE_URL") {
        config.provider.base_url = base_url;
    }
}
