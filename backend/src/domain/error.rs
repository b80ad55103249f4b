//! Domain error taxonomy.
//!
//! Validation and not-found errors are typed so the REST layer can map them
//! to 400/404; everything else stays a plain `anyhow::Error` and maps to 500.
//! Messages are user-facing and shown verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
}

/// Build a validation error ready for `?` in an `anyhow::Result` context.
pub fn validation(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(DomainError::Validation(message.into()))
}

/// Build a not-found error ready for `?` in an `anyhow::Result` context.
pub fn not_found(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(DomainError::NotFound(message.into()))
}
