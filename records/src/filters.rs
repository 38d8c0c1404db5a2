//! Listing filter and its query-string form.
//!
//! The same query string drives the JSON listing, the export link and the
//! shareable page URL, so all three always describe the same selection.

use crate::model::SimNao;

/// Control value meaning "no constraint on this dimension".
pub const TODOS: &str = "Todos";

/// Three independent, optional filter dimensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub posto: Option<String>,
    /// `YYYY-MM-DD`.
    pub data: Option<String>,
    pub coleta: Option<SimNao>,
}

impl Filters {
    /// Build from raw control values. `"Todos"` and blank mean unconstrained;
    /// an unrecognized `coleta` value is treated the same way.
    #[must_use]
    pub fn from_controls(posto: &str, data: &str, coleta: &str) -> Self {
        Self {
            posto: dimension(posto),
            data: dimension(data),
            coleta: dimension(coleta).and_then(|c| c.parse().ok()),
        }
    }

    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.posto.is_none() && self.data.is_none() && self.coleta.is_none()
    }

    /// Constrained dimensions as `(name, value)` pairs in wire order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(posto) = &self.posto {
            pairs.push(("posto", posto.clone()));
        }
        if let Some(data) = &self.data {
            pairs.push(("data", data.clone()));
        }
        if let Some(coleta) = self.coleta {
            pairs.push(("coleta", coleta.as_str().to_owned()));
        }
        pairs
    }

    /// Form-encoded query without the leading `?`. Empty when unconstrained.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    /// Parse a page query string (leading `?` optional). Unknown keys are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let (mut posto, mut data, mut coleta) = (String::new(), String::new(), String::new());
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "posto" => posto = value.into_owned(),
                "data" => data = value.into_owned(),
                "coleta" => coleta = value.into_owned(),
                _ => {}
            }
        }
        Self::from_controls(&posto, &data, &coleta)
    }

    /// `path` with this filter's query appended, if any.
    #[must_use]
    pub fn apply_to(&self, path: &str) -> String {
        let query = self.to_query();
        if query.is_empty() { path.to_owned() } else { format!("{path}?{query}") }
    }
}

fn dimension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(TODOS) {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;
