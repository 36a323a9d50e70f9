//! Error types for dispatchlight.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("technician {0} cannot accept more work")]
    TechnicianUnavailable(String),

    #[error("order number collision persisted after {attempts} attempts for company {company}")]
    OrderNumberConflict { company: String, attempts: u32 },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
