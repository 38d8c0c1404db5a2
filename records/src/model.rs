//! Record types and creation-time validation.
//!
//! DESIGN
//! ======
//! Two pairs of fields are mutually exclusive and gated by a SIM/NÃO flag:
//! table number vs. free-text location (`mesa_sim_nao`) and external agency
//! vs. internal sector (`retaguarda_sim_nao`). The wire shape keeps them flat
//! for compatibility with the listing JSON; `NewRecord::validate` is the one
//! place that clears the non-selected alternative so stored rows always
//! satisfy the invariant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};

use crate::options;

// =============================================================================
// SIM / NÃO
// =============================================================================

/// Yes/no flag as stored and transmitted by the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimNao {
    #[serde(rename = "SIM", alias = "Sim", alias = "sim")]
    Sim,
    #[default]
    #[serde(rename = "NÃO", alias = "NAO", alias = "Não", alias = "Nao", alias = "não", alias = "nao")]
    Nao,
}

impl SimNao {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sim => "SIM",
            Self::Nao => "NÃO",
        }
    }

    #[must_use]
    pub fn is_sim(self) -> bool {
        self == Self::Sim
    }
}

impl fmt::Display for SimNao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected SIM or NÃO, got {0:?}")]
pub struct ParseSimNaoError(pub String);

impl FromStr for SimNao {
    type Err = ParseSimNaoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SIM" => Ok(Self::Sim),
            "NÃO" | "NAO" => Ok(Self::Nao),
            _ => Err(ParseSimNaoError(s.to_owned())),
        }
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A stored procedure record as returned by the listing endpoint.
///
/// Every field has a default so a partially populated JSON object still
/// decodes; the viewer renders whatever the backend sends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub id: i64,
    pub posto: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub data: String,
    pub mesa_sim_nao: SimNao,
    pub numero_mesa: Option<String>,
    pub local: Option<String>,
    pub coleta_imagem: SimNao,
    pub computador_coleta: Option<String>,
    #[serde(alias = "retaguarda")]
    pub retaguarda_sim_nao: SimNao,
    pub retaguarda_destino: Option<String>,
    pub retaguarda_setor: Option<String>,
    pub hora_inicio: String,
    /// `None` while the action is still in progress.
    pub hora_termino: Option<String>,
    pub procedimento: String,
    /// Precomputed table summary. Absent when the backend leaves it to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedimento_resumo: Option<String>,
}

// =============================================================================
// NEW RECORD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown posto: {0}")]
    UnknownPosto(String),
    #[error("unknown mesa: {0}")]
    UnknownMesa(String),
    #[error("unknown retaguarda destination: {0}")]
    UnknownDestino(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid time for `{field}`: {value:?} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },
    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Registration input. `data` is optional; the backend fills in today.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewRecord {
    pub posto: String,
    pub data: Option<String>,
    pub mesa_sim_nao: SimNao,
    pub numero_mesa: Option<String>,
    pub local: Option<String>,
    pub coleta_imagem: SimNao,
    pub computador_coleta: Option<String>,
    #[serde(alias = "retaguarda")]
    pub retaguarda_sim_nao: SimNao,
    pub retaguarda_destino: Option<String>,
    pub retaguarda_setor: Option<String>,
    pub hora_inicio: String,
    pub hora_termino: Option<String>,
    pub procedimento: String,
}

impl NewRecord {
    /// Check the input and clear the alternative not selected by each flag.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let posto = self.posto.trim().to_owned();
        if posto.is_empty() {
            return Err(ValidationError::MissingField("posto"));
        }
        if !options::is_known_posto(&posto) {
            return Err(ValidationError::UnknownPosto(posto));
        }

        let data = non_blank(self.data);
        if let Some(d) = data.as_deref() {
            if parse_iso_date(d).is_none() {
                return Err(ValidationError::InvalidDate(d.to_owned()));
            }
        }

        let (numero_mesa, local) = match self.mesa_sim_nao {
            SimNao::Sim => {
                let mesa = non_blank(self.numero_mesa).ok_or(ValidationError::MissingField("numero_mesa"))?;
                if !options::is_known_mesa(&mesa) {
                    return Err(ValidationError::UnknownMesa(mesa));
                }
                (Some(mesa), None)
            }
            SimNao::Nao => (None, Some(non_blank(self.local).ok_or(ValidationError::MissingField("local"))?)),
        };

        let computador_coleta = match self.coleta_imagem {
            SimNao::Sim => non_blank(self.computador_coleta),
            SimNao::Nao => None,
        };

        let (retaguarda_destino, retaguarda_setor) = match self.retaguarda_sim_nao {
            SimNao::Sim => match non_blank(self.retaguarda_destino) {
                Some(destino) => {
                    if !options::is_known_destino(&destino) {
                        return Err(ValidationError::UnknownDestino(destino));
                    }
                    (Some(destino), None)
                }
                None => (
                    None,
                    Some(non_blank(self.retaguarda_setor).ok_or(ValidationError::MissingField("retaguarda_destino"))?),
                ),
            },
            SimNao::Nao => (None, None),
        };

        let hora_inicio = self.hora_inicio.trim().to_owned();
        if hora_inicio.is_empty() {
            return Err(ValidationError::MissingField("hora_inicio"));
        }
        if !is_valid_time(&hora_inicio) {
            return Err(ValidationError::InvalidTime { field: "hora_inicio", value: hora_inicio });
        }
        let hora_termino = non_blank(self.hora_termino);
        if let Some(t) = hora_termino.as_deref() {
            if !is_valid_time(t) {
                return Err(ValidationError::InvalidTime { field: "hora_termino", value: t.to_owned() });
            }
        }

        let procedimento = self.procedimento.trim().to_owned();
        if procedimento.is_empty() {
            return Err(ValidationError::MissingField("procedimento"));
        }

        Ok(Self {
            posto,
            data,
            mesa_sim_nao: self.mesa_sim_nao,
            numero_mesa,
            local,
            coleta_imagem: self.coleta_imagem,
            computador_coleta,
            retaguarda_sim_nao: self.retaguarda_sim_nao,
            retaguarda_destino,
            retaguarda_setor,
            hora_inicio,
            hora_termino,
            procedimento,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

const CLOCK_TIME: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// `HH:MM`, 24-hour clock.
#[must_use]
pub fn is_valid_time(value: &str) -> bool {
    Time::parse(value, CLOCK_TIME).is_ok()
}

/// Parse a `YYYY-MM-DD` calendar date.
#[must_use]
pub fn parse_iso_date(value: &str) -> Option<Date> {
    Date::parse(value, ISO_DATE).ok()
}

/// `date` as `YYYY-MM-DD`.
#[must_use]
pub fn iso_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
