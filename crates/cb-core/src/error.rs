//! # AppError
//!
//! Centralized error handling for corkboard.
//! Maps domain failures to the three outcomes a caller can act on:
//! bad input, missing record, or a broken backend.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// The primary error type for all cb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing parameter (e.g., bad UUID, negative index)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Post or board form rejected, with messages per field
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Well-formed identifier with no matching record (e.g., Board, Image)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Infrastructure failure (e.g., DB down, disk full)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for corkboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
