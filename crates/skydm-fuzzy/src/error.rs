//! Error types for fuzzy matching and container lookup.

use thiserror::Error;

/// Errors produced while choosing a best match for a query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    /// The query cannot be used for fuzzy matching at all.
    #[error("invalid fuzzy query {query:?}: {reason}")]
    InvalidInput { query: String, reason: String },

    /// No candidate reached the minimum score.
    #[error("cannot find a good match for {query:?} (minimum score {min_score})")]
    NoGoodMatch { query: String, min_score: u8 },

    /// The two best candidates scored identically.
    #[error("{query:?} is too ambiguous: {candidates:?} all score {score}")]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
        score: u8,
    },
}

impl MatchError {
    /// The query that produced this error.
    pub fn query(&self) -> &str {
        match self {
            Self::InvalidInput { query, .. }
            | Self::NoGoodMatch { query, .. }
            | Self::Ambiguous { query, .. } => query,
        }
    }

    /// Returns `true` for [`MatchError::Ambiguous`].
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// Errors produced by container lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// Neither an exact nor a fuzzy match exists for the key.
    #[error("{key:?} not found: {source}")]
    NotFound {
        key: String,
        #[source]
        source: MatchError,
    },

    /// A positional lookup was past the end of the container.
    #[error("index {index} out of range for container of length {len}")]
    OutOfRange { index: usize, len: usize },
}

impl LookupError {
    /// Returns `true` for [`LookupError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for matching results.
pub type MatchResult<T> = Result<T, MatchError>;

/// Convenience alias for lookup results.
pub type LookupResult<T> = Result<T, LookupError>;
