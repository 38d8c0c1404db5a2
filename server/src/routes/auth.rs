//! Auth routes: operator login, logout, and the session extractor.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use records::wire::{LoginRequest, Operator};
use time::Duration;

use crate::services::session;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

fn session_cookie(value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(max_age)
        .build()
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated operator extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthOperator {
    pub operator: String,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthOperator
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let session = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { operator: session.operator, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/login`: check operator credentials, set the session cookie.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let Some(admin) = &state.config.admin else {
        return (StatusCode::SERVICE_UNAVAILABLE, "operator login not configured").into_response();
    };

    if !session::verify_credentials(admin, &body.usuario, &body.senha) {
        tracing::warn!(usuario = %body.usuario, "login rejected");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let token = match session::create_session(&state.pool, &admin.user, state.config.session_ttl_hours).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session").into_response();
        }
    };

    tracing::info!(usuario = %admin.user, "operator logged in");
    let cookie = session_cookie(
        token,
        state.config.cookie_secure,
        Duration::hours(i64::from(state.config.session_ttl_hours)),
    );
    let jar = CookieJar::new().add(cookie);
    (jar, Json(Operator { usuario: admin.user.clone() })).into_response()
}

/// `GET /api/auth/me`: return the current operator.
pub async fn me(auth: AuthOperator) -> Json<Operator> {
    Json(Operator { usuario: auth.operator })
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthOperator) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }

    let cookie = session_cookie(String::new(), state.config.cookie_secure, Duration::ZERO);
    let jar = CookieJar::new().add(cookie);
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
