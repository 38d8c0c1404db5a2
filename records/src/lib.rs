//! Shared record model for the procedure log.
//!
//! This crate owns the wire representation used by both `server` and `client`:
//! the `Record` JSON shape, creation validation, the listing filter query and
//! the display rules that turn a record into table cells. Keeping the display
//! rules here means a summary computed by the backend and one computed by the
//! viewer can never disagree.

pub mod display;
pub mod filters;
pub mod model;
pub mod options;
pub mod wire;

pub use display::{ELLIPSIS, NAO_DISPONIVEL, RESUMO_MAX_CARACTERES, location_display, record_summary, routing_display, summarize};
pub use filters::{Filters, TODOS};
pub use model::{NewRecord, ParseSimNaoError, Record, SimNao, ValidationError, is_valid_time, iso_date, parse_iso_date};
