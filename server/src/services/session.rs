//! Operator sessions and bulk-delete confirmation tokens.
//!
//! ARCHITECTURE
//! ============
//! Operators log in once and carry an `HttpOnly` session cookie. Destructive
//! bulk operations additionally require a one-time confirmation token that
//! is issued to, and only redeemable by, that same session.
//!
//! TRADE-OFFS
//! ==========
//! Token consumption is destructive (`DELETE ... RETURNING`) to guarantee
//! single use; a client that loses the response must request a new token.

use std::fmt::Write;
use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tokio::time::MissedTickBehavior;

use crate::config::AdminCredentials;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Generate a 16-byte hex bulk-delete confirmation token.
#[must_use]
pub(crate) fn generate_confirmation_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Lowercase hex SHA-256 of `input`.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    bytes_to_hex(&Sha256::digest(input.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check a login attempt against the configured operator credentials.
#[must_use]
pub fn verify_credentials(admin: &AdminCredentials, user: &str, password: &str) -> bool {
    let digest = sha256_hex(password);
    // Evaluate both comparisons so timing does not reveal which one failed.
    let user_ok = constant_time_eq(user.trim().as_bytes(), admin.user.as_bytes());
    let password_ok = constant_time_eq(digest.as_bytes(), admin.password_sha256.as_bytes());
    user_ok & password_ok
}

/// Operator row returned from session validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionOperator {
    pub operator: String,
}

/// Create a session for the given operator, returning the token.
pub async fn create_session(pool: &PgPool, operator: &str, ttl_hours: i32) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query(
        "INSERT INTO sessions (token, operator, expires_at)
         VALUES ($1, $2, now() + make_interval(hours => $3))",
    )
    .bind(&token)
    .bind(operator)
    .bind(ttl_hours)
    .execute(pool)
    .await?;
    Ok(token)
}

/// Validate a session token and return the associated operator.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionOperator>, sqlx::Error> {
    let row = sqlx::query("SELECT operator FROM sessions WHERE token = $1 AND expires_at > now()")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| SessionOperator { operator: r.get("operator") }))
}

/// Delete a session by token. Outstanding confirmation tokens cascade.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Issue a short-lived bulk-delete confirmation token bound to `session_token`.
pub async fn create_confirmation_token(pool: &PgPool, session_token: &str) -> Result<String, sqlx::Error> {
    let token = generate_confirmation_token();
    sqlx::query("INSERT INTO delete_tokens (token, session_token) VALUES ($1, $2)")
        .bind(&token)
        .bind(session_token)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Consume a confirmation token atomically. `true` only when it was issued to
/// `session_token` and has not expired.
pub async fn consume_confirmation_token(pool: &PgPool, token: &str, session_token: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        "DELETE FROM delete_tokens
         WHERE token = $1 AND session_token = $2 AND expires_at > now()
         RETURNING token",
    )
    .bind(token)
    .bind(session_token)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Rows removed by one purge sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Purged {
    pub sessions: u64,
    pub confirmation_tokens: u64,
}

/// Delete expired confirmation tokens and sessions.
pub async fn purge_expired(pool: &PgPool) -> Result<Purged, sqlx::Error> {
    let confirmation_tokens = sqlx::query("DELETE FROM delete_tokens WHERE expires_at <= now()")
        .execute(pool)
        .await?
        .rows_affected();
    let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(pool)
        .await?
        .rows_affected();
    Ok(Purged { sessions, confirmation_tokens })
}

/// Spawn the background sweep that keeps `sessions` and `delete_tokens`
/// from growing without bound.
pub fn spawn_purge_worker(pool: PgPool, every: Duration) {
    tracing::info!(interval_secs = every.as_secs(), "session purge worker configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match purge_expired(&pool).await {
                Ok(purged) if purged != Purged::default() => {
                    tracing::debug!(
                        sessions = purged.sessions,
                        confirmation_tokens = purged.confirmation_tokens,
                        "expired sessions purged"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "session purge failed"),
            }
        }
    });
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
