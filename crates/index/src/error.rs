use collation::CollationError;
use thiserror::Error;

/// Errors raised while producing index keys, building queries or evaluating them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error(transparent)]
    Collation(#[from] CollationError),
    #[error("value cannot be normalized for approximate matching: {0:?}")]
    UnnormalizableValue(String),
    #[error("substring window length must be at least 1, got {0}")]
    InvalidWindowLength(usize),
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        IndexError::Backend(err.to_string())
    }
}
