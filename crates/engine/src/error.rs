//! The module contains the errors the engine can return.
//!
//! Mutation failures propagate unchanged to the caller:
//!
//! - [`Validation`] malformed input, rejected before any I/O.
//! - [`KeyNotFound`] a missing or empty record identifier.
//! - [`StoreUnavailable`] the store could not be reached or rejected the write.
//! - [`CascadeAborted`] a hen cascade delete was rolled back as a whole.
//!
//! Aggregation and financial computations never fail.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
//!  [`CascadeAborted`]: EngineError::CascadeAborted
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Cascade delete of hen \"{hen_id}\" aborted, nothing was removed: {source}")]
    CascadeAborted {
        hen_id: String,
        #[source]
        source: DbErr,
    },
    #[error(transparent)]
    StoreUnavailable(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (
                Self::CascadeAborted {
                    hen_id: a,
                    source: sa,
                },
                Self::CascadeAborted {
                    hen_id: b,
                    source: sb,
                },
            ) => a == b && sa.to_string() == sb.to_string(),
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => {
                a.to_string() == b.to_string()
            }
            _ => false,
        }
    }
}
