use crate::time_utils::DisplayZone;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_SESSION_FILE: &str = ".condolink/session.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
    pub zone: DisplayZone,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            zone: DisplayZone::default(),
        }
    }

    /// Reads `CONDOLINK_*` variables. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("CONDOLINK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        );

        if let Ok(path) = std::env::var("CONDOLINK_SESSION_FILE") {
            if !path.trim().is_empty() {
                config.session_file = PathBuf::from(path);
            }
        }

        if let Ok(raw) = std::env::var("CONDOLINK_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring CONDOLINK_TIMEOUT_SECS={:?}, using {}s",
                    raw,
                    DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        if let Ok(raw) = std::env::var("CONDOLINK_TIMEZONE") {
            match DisplayZone::parse(&raw) {
                Some(zone) => config.zone = zone,
                None => tracing::warn!("Unknown CONDOLINK_TIMEZONE {:?}, falling back to UTC", raw),
            }
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}
