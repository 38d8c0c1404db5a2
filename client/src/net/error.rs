//! Transport and protocol failures talking to the backend.

use records::wire::MutationResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("falha de conexão: {0}")]
    Network(String),
    #[error("tempo de resposta esgotado")]
    Timeout,
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("resposta inválida do servidor: {0}")]
    Decode(String),
}

impl ApiError {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Network(err.to_string()) }
    }

    pub(crate) fn decode(err: &serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }

    /// Build a status error, preferring the server's `message` field.
    pub(crate) fn status(status: u16, body: &str) -> Self {
        Self::Status { status, message: failure_message(status, body) }
    }

    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Message to show for a non-2xx response.
pub(crate) fn failure_message(status: u16, body: &str) -> String {
    if let Ok(MutationResponse { message: Some(message), .. }) = serde_json::from_str::<MutationResponse>(body) {
        if !message.trim().is_empty() {
            return message;
        }
    }
    let text = body.trim();
    if text.is_empty() || text.starts_with('<') || text.starts_with('{') {
        format!("erro HTTP {status}")
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
