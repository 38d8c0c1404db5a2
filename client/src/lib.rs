//! Filtered record viewer.
//!
//! ARCHITECTURE
//! ============
//! `state::viewer::RecordViewer` is the controller: it owns the active
//! filters, the cached records, the rendered listing and the open dialogs.
//! It reaches the backend only through the `net::api::RecordApi` trait, so
//! any presentation layer can drive it and tests can swap in a mock.
//!
//! The crate renders no HTML. Rows, banners, visibility flags and hrefs are
//! exposed as typed state for a presentation layer that escapes on output.

pub mod config;
pub mod net;
pub mod state;

pub use config::{ClientConfig, ConfigError};
pub use net::api::{HttpRecordApi, RecordApi, RecordPage};
pub use net::error::ApiError;
pub use state::viewer::{DeleteTarget, DeleteTicket, RecordViewer, send_delete};
