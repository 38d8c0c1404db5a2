//! Record service: filtered listing, registration, procedure edits, deletes.
//!
//! DESIGN
//! ======
//! Rows are read with a single column list so every query returns the same
//! `Record` shape, including the precomputed `procedimento_resumo` the
//! viewer shows in the table. Dates are stored as `DATE` and exchanged as
//! `YYYY-MM-DD` text.
//!
//! ERROR HANDLING
//! ==============
//! A row that cannot be mapped back into a `Record` is logged and skipped so
//! one bad row never hides the rest of a listing.

use records::{Filters, NewRecord, Record, SimNao, ValidationError, iso_date, parse_iso_date, summarize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{info, warn};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record not found: {0}")]
    NotFound(i64),
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
    #[error("procedure text must not be empty")]
    EmptyProcedure,
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

const RECORD_COLUMNS: &str = "id, posto, to_char(data, 'YYYY-MM-DD') AS data, mesa_sim_nao, numero_mesa, local, \
     coleta_imagem, computador_coleta, retaguarda_sim_nao, retaguarda_destino, retaguarda_setor, \
     hora_inicio, hora_termino, procedimento";

fn sim_nao_column(row: &PgRow, id: i64, column: &str) -> Result<SimNao, RecordError> {
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|_| RecordError::Corrupt { id, reason: format!("{column} = {raw:?}") })
}

pub(crate) fn record_from_row(row: &PgRow) -> Result<Record, RecordError> {
    let id: i64 = row.try_get("id")?;
    let procedimento: String = row.try_get("procedimento")?;
    Ok(Record {
        id,
        posto: row.try_get("posto")?,
        data: row.try_get("data")?,
        mesa_sim_nao: sim_nao_column(row, id, "mesa_sim_nao")?,
        numero_mesa: row.try_get("numero_mesa")?,
        local: row.try_get("local")?,
        coleta_imagem: sim_nao_column(row, id, "coleta_imagem")?,
        computador_coleta: row.try_get("computador_coleta")?,
        retaguarda_sim_nao: sim_nao_column(row, id, "retaguarda_sim_nao")?,
        retaguarda_destino: row.try_get("retaguarda_destino")?,
        retaguarda_setor: row.try_get("retaguarda_setor")?,
        hora_inicio: row.try_get("hora_inicio")?,
        hora_termino: row.try_get("hora_termino")?,
        procedimento_resumo: Some(summarize(&procedimento)),
        procedimento,
    })
}

/// Today's date as `YYYY-MM-DD` (UTC).
#[must_use]
pub fn today_iso() -> String {
    iso_date(time::OffsetDateTime::now_utc().date())
}

// =============================================================================
// QUERIES
// =============================================================================

/// Build the filtered listing query. An unparsable date filter is ignored
/// rather than rejected.
pub(crate) fn listing_query(filters: &Filters) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {RECORD_COLUMNS} FROM registros WHERE TRUE"));
    if let Some(posto) = &filters.posto {
        builder.push(" AND posto = ").push_bind(posto.clone());
    }
    if let Some(data) = filters.data.as_deref() {
        if parse_iso_date(data).is_some() {
            builder
                .push(" AND data = ")
                .push_bind(data.to_owned())
                .push("::date");
        } else {
            warn!(data, "ignoring unparsable date filter");
        }
    }
    if let Some(coleta) = filters.coleta {
        builder
            .push(" AND coleta_imagem = ")
            .push_bind(coleta.as_str());
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    builder
}

/// List records matching `filters`, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_records(pool: &PgPool, filters: &Filters) -> Result<Vec<Record>, RecordError> {
    let rows = listing_query(filters).build().fetch_all(pool).await?;
    Ok(rows
        .iter()
        .filter_map(|row| match record_from_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping unreadable record row");
                None
            }
        })
        .collect())
}

/// Validate and insert a new record. `data` defaults to `today`.
///
/// # Errors
///
/// Returns [`RecordError::Invalid`] for rejected input, or a database error.
pub async fn create_record(pool: &PgPool, input: NewRecord, today: &str) -> Result<Record, RecordError> {
    let input = input.validate()?;
    let data = input.data.clone().unwrap_or_else(|| today.to_owned());

    let row = sqlx::query(&format!(
        "INSERT INTO registros (posto, data, mesa_sim_nao, numero_mesa, local, coleta_imagem, computador_coleta,
                                retaguarda_sim_nao, retaguarda_destino, retaguarda_setor,
                                hora_inicio, hora_termino, procedimento)
         VALUES ($1, $2::date, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(&input.posto)
    .bind(&data)
    .bind(input.mesa_sim_nao.as_str())
    .bind(&input.numero_mesa)
    .bind(&input.local)
    .bind(input.coleta_imagem.as_str())
    .bind(&input.computador_coleta)
    .bind(input.retaguarda_sim_nao.as_str())
    .bind(&input.retaguarda_destino)
    .bind(&input.retaguarda_setor)
    .bind(&input.hora_inicio)
    .bind(&input.hora_termino)
    .bind(&input.procedimento)
    .fetch_one(pool)
    .await?;

    let record = record_from_row(&row)?;
    info!(id = record.id, posto = %record.posto, "record created");
    Ok(record)
}

/// Replace the procedure text of one record.
///
/// # Errors
///
/// Returns [`RecordError::EmptyProcedure`] for blank text,
/// [`RecordError::NotFound`] for an unknown id, or a database error.
pub async fn update_procedure(pool: &PgPool, id: i64, text: &str) -> Result<Record, RecordError> {
    if text.trim().is_empty() {
        return Err(RecordError::EmptyProcedure);
    }

    let row = sqlx::query(&format!(
        "UPDATE registros SET procedimento = $2 WHERE id = $1 RETURNING {RECORD_COLUMNS}"
    ))
    .bind(id)
    .bind(text)
    .fetch_optional(pool)
    .await?
    .ok_or(RecordError::NotFound(id))?;

    info!(id, "procedure updated");
    record_from_row(&row)
}

/// Delete one record.
///
/// # Errors
///
/// Returns [`RecordError::NotFound`] for an unknown id, or a database error.
pub async fn delete_record(pool: &PgPool, id: i64) -> Result<(), RecordError> {
    let result = sqlx::query("DELETE FROM registros WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RecordError::NotFound(id));
    }
    info!(id, "record deleted");
    Ok(())
}

/// Delete every record, returning how many were removed.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_all_records(pool: &PgPool) -> Result<u64, RecordError> {
    let result = sqlx::query("DELETE FROM registros").execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
