//! Default configuration values, one function per field so serde defaults
//! and `Default` impls stay in one place.

pub fn port() -> u16 {
    3573
}

pub fn cors_origins() -> String {
    "*".to_string()
}

pub fn question_fetch_timeout_secs() -> u64 {
    8
}

pub fn empty_room_timeout_secs() -> u64 {
    300
}

pub fn sweep_interval_secs() -> u64 {
    60
}

pub fn provider_base_url() -> String {
    "https://the-trivia-api.com/v2".to_string()
}

pub fn provider_request_timeout_secs() -> u64 {
    5
}

pub fn log_dir() -> String {
    "logs".to_string()
}

pub fn log_filename() -> String {
    "server.log".to_string()
}

pub fn log_rotation() -> String {
    "daily".to_string()
}
