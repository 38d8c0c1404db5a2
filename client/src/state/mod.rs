//! Viewer state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `viewer` is the controller; `table` and `dialog` are the plain view
//! models it exposes to a presentation layer.

pub mod dialog;
pub mod table;
pub mod viewer;
