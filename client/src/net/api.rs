//! REST calls to the record backend.
//!
//! DESIGN
//! ======
//! `RecordApi` is the seam between the viewer and the network. The reqwest
//! implementation keeps URL building and body parsing in pure functions so
//! both are testable without a server.
//!
//! ERROR HANDLING
//! ==============
//! Every request carries the configured timeout; expiry maps to
//! `ApiError::Timeout`. A listing row that does not decode is skipped and
//! counted rather than failing the whole page.

use std::collections::HashSet;

use async_trait::async_trait;
use cookie::Cookie;
use records::wire::{ConfirmationToken, DeleteAllRequest, EditProcedureRequest, LoginRequest, MutationResponse, Operator};
use records::{Filters, Record};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::config::ClientConfig;

pub const LISTING_PATH: &str = "/api/registros";
pub const EXPORT_PATH: &str = "/api/registros/export.xlsx";
pub const SESSION_COOKIE: &str = "session_token";

/// Decoded listing plus the number of rows that had to be dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub skipped: usize,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait]
pub trait RecordApi: Send + Sync {
    /// `GET /api/registros` with the given filters.
    async fn list(&self, filters: &Filters) -> Result<RecordPage, ApiError>;

    /// `POST /api/registros/{id}/procedimento`.
    async fn edit_procedure(&self, id: i64, text: &str) -> Result<MutationResponse, ApiError>;

    /// `POST /api/registros/{id}/delete`.
    async fn delete_record(&self, id: i64) -> Result<MutationResponse, ApiError>;

    /// `POST /api/registros/delete-all/token`, authenticated by session.
    async fn confirmation_token(&self) -> Result<ConfirmationToken, ApiError>;

    /// `POST /api/registros/delete-all`.
    async fn delete_all(&self, confirmation_token: &str) -> Result<MutationResponse, ApiError>;
}

// =============================================================================
// URLS
// =============================================================================

pub(crate) fn listing_url(base_url: &str, filters: &Filters) -> String {
    format!("{base_url}{}", filters.apply_to(LISTING_PATH))
}

pub(crate) fn edit_url(base_url: &str, id: i64) -> String {
    format!("{base_url}/api/registros/{id}/procedimento")
}

pub(crate) fn delete_url(base_url: &str, id: i64) -> String {
    format!("{base_url}/api/registros/{id}/delete")
}

/// Export link for the given filters, relative to the backend origin.
#[must_use]
pub fn export_href(filters: &Filters) -> String {
    filters.apply_to(EXPORT_PATH)
}

// =============================================================================
// PARSING
// =============================================================================

/// Decode a listing body row by row. Rows that fail to decode, and rows
/// repeating an id already seen, are skipped.
pub(crate) fn parse_listing(body: &str) -> Result<RecordPage, ApiError> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(body).map_err(|e| ApiError::decode(&e))?;

    let mut page = RecordPage { records: Vec::with_capacity(rows.len()), skipped: 0 };
    let mut seen = HashSet::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Record>(row) {
            Ok(record) if seen.insert(record.id) => page.records.push(record),
            Ok(record) => {
                tracing::warn!(index, id = record.id, "skipping duplicate record id");
                page.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping undecodable record row");
                page.skipped += 1;
            }
        }
    }
    Ok(page)
}

/// Extract the session token from a `Set-Cookie` header value. A cookie
/// that is already expired (`Max-Age=0`, as sent on logout) yields nothing.
pub(crate) fn session_from_set_cookie(header: &str) -> Option<String> {
    let cookie = Cookie::parse(header).ok()?;
    if cookie.name() != SESSION_COOKIE || cookie.value_trimmed().is_empty() {
        return None;
    }
    if cookie.max_age().is_some_and(|age| !age.is_positive()) {
        return None;
    }
    Some(cookie.value_trimmed().to_owned())
}

/// `Cookie` request header carrying the session token.
pub(crate) fn session_cookie_header(token: &str) -> String {
    Cookie::new(SESSION_COOKIE, token.to_owned()).stripped().to_string()
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpRecordApi {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl HttpRecordApi {
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), session: None })
    }

    /// Attach an existing session token to later requests.
    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Absolute export URL for the given filters.
    #[must_use]
    pub fn export_url(&self, filters: &Filters) -> String {
        format!("{}{}", self.base_url, export_href(filters))
    }

    /// `POST /api/auth/login`; keeps the returned session cookie.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for rejected credentials, or a transport
    /// error.
    pub async fn login(&mut self, usuario: &str, senha: &str) -> Result<Operator, ApiError> {
        let body = LoginRequest { usuario: usuario.to_owned(), senha: senha.to_owned() };
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::transport(&e))?;

        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(session_from_set_cookie);
        let operator: Operator = parse_json(&read_text(response).await?)?;

        self.session = Some(token.ok_or_else(|| ApiError::Decode("login response carried no session cookie".into()))?);
        tracing::info!(usuario = %operator.usuario, "logged in");
        Ok(operator)
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let request = self.http.post(url);
        match &self.session {
            Some(token) => request.header(COOKIE, session_cookie_header(token)),
            None => request,
        }
    }

    async fn send_text(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::transport(&e))?;
        read_text(response).await
    }
}

/// Body text of a 2xx response; anything else becomes [`ApiError::Status`].
async fn read_text(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| ApiError::transport(&e))?;
    if !status.is_success() {
        return Err(ApiError::status(status.as_u16(), &text));
    }
    Ok(text)
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::decode(&e))
}

#[async_trait]
impl RecordApi for HttpRecordApi {
    async fn list(&self, filters: &Filters) -> Result<RecordPage, ApiError> {
        let text = Self::send_text(self.http.get(listing_url(&self.base_url, filters))).await?;
        parse_listing(&text)
    }

    async fn edit_procedure(&self, id: i64, text: &str) -> Result<MutationResponse, ApiError> {
        let body = EditProcedureRequest { procedimento_completo: text.to_owned() };
        let text = Self::send_text(self.post(edit_url(&self.base_url, id)).json(&body)).await?;
        parse_json(&text)
    }

    async fn delete_record(&self, id: i64) -> Result<MutationResponse, ApiError> {
        let text = Self::send_text(self.post(delete_url(&self.base_url, id))).await?;
        parse_json(&text)
    }

    async fn confirmation_token(&self) -> Result<ConfirmationToken, ApiError> {
        let url = format!("{}/api/registros/delete-all/token", self.base_url);
        let text = Self::send_text(self.post(url)).await?;
        parse_json(&text)
    }

    async fn delete_all(&self, confirmation_token: &str) -> Result<MutationResponse, ApiError> {
        let body = DeleteAllRequest { confirmation_token: confirmation_token.to_owned() };
        let url = format!("{}/api/registros/delete-all", self.base_url);
        let text = Self::send_text(self.post(url).json(&body)).await?;
        parse_json(&text)
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;
