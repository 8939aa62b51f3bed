use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TOAST_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub http_timeout: Duration,
    pub session_file: Option<PathBuf>,
    pub toast_duration: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// `.env.local` wins over `.env`; neither overrides the real environment.
    pub fn load_dotenv() {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("HOOPS_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = non_empty("HOOPS_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        let toast_ms = non_empty("HOOPS_TOAST_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TOAST_MS)
            .max(500);

        Self {
            api_url,
            http_timeout: Duration::from_secs(timeout_secs),
            session_file: non_empty("HOOPS_SESSION_FILE").map(PathBuf::from),
            toast_duration: Duration::from_millis(toast_ms),
            log_dir: non_empty("HOOPS_LOG_DIR").map(PathBuf::from),
        }
    }
}
