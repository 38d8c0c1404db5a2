//! Record routes: listing, registration, export, procedure edits, deletes.
//!
//! ERROR HANDLING
//! ==============
//! Mutation endpoints always answer with a `MutationResponse` body so the
//! viewer can surface the server's message; `RecordError` variants map to
//! 404/400/500 through [`Failure`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use records::wire::{ConfirmationToken, DeleteAllRequest, EditProcedureRequest, MutationResponse, Opcoes};
use records::{Filters, NewRecord, Record};
use serde::Deserialize;

use super::auth::AuthOperator;
use crate::services::export;
use crate::services::record::{self, RecordError};
use crate::services::session;
use crate::state::AppState;

// =============================================================================
// PARAMS / FAILURES
// =============================================================================

/// Raw filter controls as they arrive in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub posto: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub coleta: String,
}

impl FilterParams {
    fn filters(&self) -> Filters {
        Filters::from_controls(&self.posto, &self.data, &self.coleta)
    }
}

/// Error response carrying `{success:false, message}`.
#[derive(Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(MutationResponse::failure(self.message))).into_response()
    }
}

impl From<RecordError> for Failure {
    fn from(err: RecordError) -> Self {
        match &err {
            RecordError::NotFound(id) => Self::new(StatusCode::NOT_FOUND, format!("Registro {id} não encontrado.")),
            RecordError::Invalid(e) => Self::new(StatusCode::BAD_REQUEST, e.to_string()),
            RecordError::EmptyProcedure => {
                Self::new(StatusCode::BAD_REQUEST, "O procedimento não pode ficar vazio.")
            }
            RecordError::Corrupt { .. } | RecordError::Database(_) => {
                tracing::error!(error = %err, "record operation failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno ao acessar os registros.")
            }
        }
    }
}

fn database_failure(err: &sqlx::Error) -> Failure {
    tracing::error!(error = %err, "session query failed");
    Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "Erro interno ao validar a sessão.")
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /api/registros`: filtered listing, newest first.
pub async fn list(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Result<Json<Vec<Record>>, Failure> {
    let records = record::list_records(&state.pool, &params.filters()).await?;
    Ok(Json(records))
}

/// `POST /api/registros`: register a new record.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewRecord>,
) -> Result<(StatusCode, Json<Record>), Failure> {
    let record = record::create_record(&state.pool, body, &record::today_iso()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/registros/export.xlsx`: the filtered listing as a spreadsheet.
pub async fn export_xlsx(State(state): State<AppState>, Query(params): Query<FilterParams>) -> Result<Response, Failure> {
    let records = record::list_records(&state.pool, &params.filters()).await?;
    let export_failed = |e: export::ExportError| {
        tracing::error!(error = %e, "xlsx export failed");
        Failure::new(StatusCode::INTERNAL_SERVER_ERROR, "Erro ao gerar a planilha.")
    };
    let bytes = export::build_workbook(&records).map_err(export_failed)?;
    let filename = export::export_filename(time::OffsetDateTime::now_utc()).map_err(export_failed)?;
    tracing::info!(rows = records.len(), %filename, "export generated");
    Ok((
        [
            (CONTENT_TYPE, export::XLSX_CONTENT_TYPE.to_owned()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}

/// `POST /api/registros/{id}/procedimento`: replace the procedure text and
/// return the new summary.
pub async fn edit_procedure(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EditProcedureRequest>,
) -> Result<Json<MutationResponse>, Failure> {
    let updated = record::update_procedure(&state.pool, id, &body.procedimento_completo).await?;
    Ok(Json(MutationResponse {
        message: Some("Procedimento atualizado.".into()),
        novo_resumo: updated.procedimento_resumo,
        ..MutationResponse::ok()
    }))
}

/// `POST /api/registros/{id}/delete`.
pub async fn delete_record(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<MutationResponse>, Failure> {
    record::delete_record(&state.pool, id).await?;
    Ok(Json(MutationResponse::ok()))
}

/// `POST /api/registros/delete-all/token`: issue a one-time confirmation
/// token bound to the caller's session.
pub async fn delete_all_token(State(state): State<AppState>, auth: AuthOperator) -> Result<Json<ConfirmationToken>, Failure> {
    let token = session::create_confirmation_token(&state.pool, &auth.token)
        .await
        .map_err(|e| database_failure(&e))?;
    tracing::info!(operator = %auth.operator, "bulk delete confirmation issued");
    Ok(Json(ConfirmationToken { token }))
}

/// `POST /api/registros/delete-all`: remove every record once the
/// confirmation token checks out.
pub async fn delete_all(
    State(state): State<AppState>,
    auth: AuthOperator,
    Json(body): Json<DeleteAllRequest>,
) -> Result<Json<MutationResponse>, Failure> {
    if body.confirmation_token.trim().is_empty() {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Confirmação ausente."));
    }

    let confirmed = session::consume_confirmation_token(&state.pool, &body.confirmation_token, &auth.token)
        .await
        .map_err(|e| database_failure(&e))?;
    if !confirmed {
        tracing::warn!(operator = %auth.operator, "bulk delete rejected: bad confirmation");
        return Err(Failure::new(StatusCode::FORBIDDEN, "Confirmação inválida ou expirada."));
    }

    let deleted = record::delete_all_records(&state.pool).await?;
    tracing::warn!(operator = %auth.operator, deleted, "all records deleted");
    Ok(Json(MutationResponse { deleted: Some(deleted), ..MutationResponse::ok() }))
}

/// `GET /api/opcoes`.
pub async fn options() -> Json<Opcoes> {
    Json(Opcoes::current())
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
