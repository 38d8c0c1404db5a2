//! Server configuration parsed from environment variables.

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_ADMIN_USER: &str = "admin";
pub const DEFAULT_SESSION_TTL_HOURS: i32 = 12;
pub const DEFAULT_SESSION_PURGE_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} required")]
    Missing(&'static str),
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Operator credentials. Only the SHA-256 digest of the password is held.
#[derive(Clone)]
pub struct AdminCredentials {
    pub user: String,
    /// Lowercase hex SHA-256 of the password.
    pub password_sha256: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("password_sha256", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    /// `None` disables operator login, and with it bulk delete.
    pub admin: Option<AdminCredentials>,
    pub cookie_secure: bool,
    pub session_ttl_hours: i32,
    /// Seconds between sweeps of expired sessions and confirmation tokens.
    pub session_purge_secs: u64,
    /// Optional directory served as the fallback for non-API paths.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `ADMIN_USER`: default `admin`
    /// - `ADMIN_PASSWORD_SHA256`: hex digest; login disabled when absent
    /// - `COOKIE_SECURE`: default false
    /// - `SESSION_TTL_HOURS`: default 12
    /// - `SESSION_PURGE_SECS`: default 600
    /// - `STATIC_DIR`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing database URL or a malformed value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Heroku/Render style URLs use the short scheme.
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .replacen("postgres://", "postgresql://", 1);

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let admin = match lookup("ADMIN_PASSWORD_SHA256") {
            Some(raw) if !raw.trim().is_empty() => {
                let digest = raw.trim().to_ascii_lowercase();
                if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ConfigError::Invalid { var: "ADMIN_PASSWORD_SHA256", value: raw });
                }
                let user = lookup("ADMIN_USER")
                    .map(|u| u.trim().to_owned())
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| DEFAULT_ADMIN_USER.to_owned());
                Some(AdminCredentials { user, password_sha256: digest })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            port,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            admin,
            cookie_secure: lookup("COOKIE_SECURE")
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(false),
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS).max(1),
            session_purge_secs: parse_or(&lookup, "SESSION_PURGE_SECS", DEFAULT_SESSION_PURGE_SECS).max(1),
            static_dir: lookup("STATIC_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
