//! Error types for saga evaluation.

use thiserror::Error;

pub type SagaResult<T> = Result<T, SagaError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SagaError {
    /// The log has no deploy preparation yet. Fatal for the saga.
    #[error("could not determine job type of saga {saga}: no deploy description found")]
    JobTypeUndetermined { saga: String },

    #[error("unknown job type {0:?}")]
    UnknownJobType(String),
}
