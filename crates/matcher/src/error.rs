use collation::CollationError;
use index::IndexError;
use thiserror::Error;

/// Errors produced by the matching-rule layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Locale, filter or assertion encoding failed.
    #[error(transparent)]
    Collation(#[from] CollationError),
    /// Key factory or query construction failed.
    #[error(transparent)]
    Index(IndexError),
    /// The OID or one of the aliases of `oid` is already held by another rule.
    #[error("matching rule {oid}: {name} is already registered by {owner}")]
    RegistrationConflict {
        oid: String,
        name: String,
        owner: String,
    },
    /// No rule is registered under this OID or alias.
    #[error("unknown matching rule: {0}")]
    UnknownRule(String),
    #[error("invalid collation config: {0}")]
    InvalidConfig(String),
}

impl From<IndexError> for MatchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Collation(inner) => MatchError::Collation(inner),
            other => MatchError::Index(other),
        }
    }
}
