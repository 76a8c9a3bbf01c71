use thiserror::Error;

/// Errors raised while building collation keys or encoding substring assertions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollationError {
    #[error("unsupported locale: {0}")]
    UnsupportedLocale(String),
    #[error("malformed collation spec: {0:?}")]
    MalformedLocaleSpec(String),
    #[error("not a substring filter (no wildcard present): {0:?}")]
    NotASubstringFilter(String),
    #[error("encoded fragment is {length} bytes, limit is {max}")]
    FragmentTooLong { length: usize, max: usize },
    #[error("substring assertion has {count} middle fragments, limit is {max}")]
    TooManyFragments { count: usize, max: usize },
    #[error("invalid escape sequence at byte {position}")]
    InvalidEscape { position: usize },
}
