//! Networking for the viewer.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` defines the `RecordApi` seam and its reqwest implementation;
//! `error` holds the transport/protocol failure taxonomy.

pub mod api;
pub mod error;
