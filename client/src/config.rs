//! Viewer configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin without a trailing slash.
    pub base_url: String,
    /// Applied to every request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_owned(), timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS) }
    }
}

impl ClientConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `REGISTROS_BASE_URL`: default `http://localhost:3000`
    /// - `REGISTROS_TIMEOUT_SECS`: default 15
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the base URL is not an absolute
    /// http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match lookup("REGISTROS_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => normalize_base_url(&raw).ok_or(ConfigError::Invalid { var: "REGISTROS_BASE_URL", value: raw })?,
            None => DEFAULT_BASE_URL.to_owned(),
        };

        let timeout_secs = lookup("REGISTROS_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self { base_url, timeout: Duration::from_secs(timeout_secs) })
    }
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return None;
    }
    Some(parsed.as_str().trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
