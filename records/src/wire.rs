//! Request and response bodies exchanged by the viewer and the backend.

use serde::{Deserialize, Serialize};

/// `POST /api/registros/{id}/procedimento`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditProcedureRequest {
    pub procedimento_completo: String,
}

/// Outcome body shared by the mutation endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novo_resumo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u64>,
}

impl MutationResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self { success: true, ..Self::default() }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), ..Self::default() }
    }
}

/// One-time bulk-delete confirmation issued to an authenticated operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationToken {
    pub token: String,
}

/// `POST /api/registros/delete-all`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAllRequest {
    pub confirmation_token: String,
}

/// `POST /api/auth/login`.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub usuario: String,
    pub senha: String,
}

/// Authenticated operator as reported by `/api/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub usuario: String,
}

/// Form option lists served by `GET /api/opcoes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcoes {
    pub postos: Vec<String>,
    pub mesas: Vec<String>,
    pub destinos: Vec<String>,
}

impl Opcoes {
    #[must_use]
    pub fn current() -> Self {
        Self {
            postos: crate::options::POSTOS.iter().map(|s| (*s).to_owned()).collect(),
            mesas: crate::options::opcoes_mesa(),
            destinos: crate::options::RETAGUARDA_DESTINOS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
