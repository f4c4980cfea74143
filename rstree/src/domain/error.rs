//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed input and violated preconditions.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("expected an array of records, found {found}")]
    NotAnArray { found: &'static str },

    #[error("record {index} is not an object (found {found})")]
    NotAnObject { index: usize, found: &'static str },

    #[error("expected an object, found {found}")]
    ExpectedObject { found: &'static str },

    #[error("hierarchy exceeds {limit} levels, parent references may be cyclic")]
    DepthExceeded { limit: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
