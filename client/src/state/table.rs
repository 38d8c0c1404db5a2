//! Rendered listing: one typed row per record, plus the banner/empty states.

use records::{Record, location_display, record_summary, routing_display, summarize};

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;

/// One table row. Cells hold raw text; the presentation layer escapes them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowView {
    pub id: i64,
    pub posto: String,
    pub data: String,
    pub hora_inicio: String,
    pub hora_termino: String,
    pub location: String,
    pub routing: String,
    pub summary: String,
    /// Shown as the summary cell's tooltip and in the view dialog.
    pub full_text: String,
}

impl RowView {
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            posto: record.posto.clone(),
            data: record.data.clone(),
            hora_inicio: record.hora_inicio.clone(),
            hora_termino: record.hora_termino.clone().unwrap_or_default(),
            location: location_display(record),
            routing: routing_display(record),
            summary: record_summary(record).into_owned(),
            full_text: record.procedimento.clone(),
        }
    }

    /// Refresh the procedure cells after an edit.
    pub fn set_procedure(&mut self, text: &str, summary: Option<&str>) {
        self.summary = summary.map_or_else(|| summarize(text), str::to_owned);
        self.full_text = text.to_owned();
    }
}

/// What the listing area currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Listing {
    #[default]
    Loading,
    /// Inline error banner; the table is hidden.
    Error(String),
    /// Empty indicator; the table is hidden.
    Empty,
    Table(Vec<RowView>),
}

impl Listing {
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Table(records.iter().map(RowView::from_record).collect())
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn empty_visible(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn table_visible(&self) -> bool {
        matches!(self, Self::Table(_))
    }

    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[RowView] {
        match self {
            Self::Table(rows) => rows,
            _ => &[],
        }
    }

    #[must_use]
    pub fn row(&self, id: i64) -> Option<&RowView> {
        self.rows().iter().find(|row| row.id == id)
    }

    pub(crate) fn row_mut(&mut self, id: i64) -> Option<&mut RowView> {
        match self {
            Self::Table(rows) => rows.iter_mut().find(|row| row.id == id),
            _ => None,
        }
    }
}
