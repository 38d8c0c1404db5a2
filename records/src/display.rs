//! Display-only fields derived from a record for the listing table.
//!
//! All functions operate on raw text. Escaping belongs to whatever renders
//! the cells, so truncation can never split an escape sequence.

use std::borrow::Cow;

use crate::model::Record;

/// Character budget of a procedure summary, excluding the ellipsis.
pub const RESUMO_MAX_CARACTERES: usize = 120;
/// Marker appended to a truncated summary.
pub const ELLIPSIS: &str = "...";
/// Placeholder for a missing value.
pub const NAO_DISPONIVEL: &str = "N/D";

const COLETA_SUFFIX: &str = "Coleta de imagem";

/// Collapse whitespace runs to single spaces and truncate to
/// [`RESUMO_MAX_CARACTERES`] characters.
///
/// Idempotent: a summary fed back in comes out unchanged.
#[must_use]
pub fn summarize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(RESUMO_MAX_CARACTERES) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &collapsed[..cut]),
        None => collapsed,
    }
}

/// The record's summary: the backend's precomputed one when present.
#[must_use]
pub fn record_summary(record: &Record) -> Cow<'_, str> {
    match record.procedimento_resumo.as_deref() {
        Some(resumo) if !resumo.is_empty() => Cow::Borrowed(resumo),
        _ => Cow::Owned(summarize(&record.procedimento)),
    }
}

/// Table/location cell.
#[must_use]
pub fn location_display(record: &Record) -> String {
    if record.coleta_imagem.is_sim() {
        let which = present(record.numero_mesa.as_deref())
            .or_else(|| present(record.local.as_deref()))
            .map_or_else(|| record.id.to_string(), str::to_owned);
        return format!("{which} - {COLETA_SUFFIX}");
    }
    if record.mesa_sim_nao.is_sim() {
        return format!("Mesa {}", present(record.numero_mesa.as_deref()).unwrap_or(NAO_DISPONIVEL));
    }
    present(record.local.as_deref())
        .unwrap_or(NAO_DISPONIVEL)
        .to_owned()
}

/// Backoffice routing cell.
#[must_use]
pub fn routing_display(record: &Record) -> String {
    if !record.retaguarda_sim_nao.is_sim() {
        return record.retaguarda_sim_nao.as_str().to_owned();
    }
    format!(
        "Retaguarda {}",
        present(record.retaguarda_destino.as_deref()).unwrap_or(NAO_DISPONIVEL)
    )
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "display_test.rs"]
mod tests;
