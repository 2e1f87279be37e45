//! Core logic of Vellum: turning a cursor-oriented document-store query API
//! into a stateful, multi-tab browsing experience.
//!
//! The crate is pure engine: it owns the session state machines, query
//! translation, pagination bookkeeping and draft editing, and reaches the
//! outside world only through the [`source::DataSource`] trait.

pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod query;
pub mod session;
pub mod source;

// Re-export common error type
pub use error::{Result, VellumError};
