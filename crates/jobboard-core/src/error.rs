use thiserror::Error;

use crate::policy::DenyReason;

/// Every expected failure the core can surface. All variants are
/// recoverable; the HTTP layer maps each kind to a status class and never
/// sees a raw store error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not authorized to access this route")]
    Unauthenticated,

    #[error("{}", .0.message())]
    Forbidden(DenyReason),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you have already applied for this job")]
    DuplicateApplication,

    #[error("job already saved")]
    AlreadySaved,

    #[error("job not found in saved jobs")]
    NotSaved,

    #[error("'{0}' is not a valid application status")]
    InvalidStatus(String),

    #[error("{0}")]
    ValidationFailed(String),

    /// Unexpected store failure, caught at the boundary.
    #[error("service temporarily unavailable")]
    Unavailable(#[source] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::ValidationFailed(msg.into())
    }
}
