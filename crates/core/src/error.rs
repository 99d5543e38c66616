//! Core error types.

use thiserror::Error;

/// Errors from core parsing and catalog lookups.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown file kind: {0}")]
    UnknownKind(String),
}
