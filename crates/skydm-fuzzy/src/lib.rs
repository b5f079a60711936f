//! Fuzzy name resolution for SkyDM.
//!
//! Callers refer to products, properties, channels and diffs by loosely
//! spelled names. This crate turns such a name into exactly one element of
//! a collection, or explains why it cannot.
//!
//! # Modules
//!
//! - [`scorer`] — Weighted-ratio string similarity (0..=100)
//! - [`matcher`] — [`best_match`]: threshold, tie and ambiguity policy
//! - [`list`] — [`FuzzyList`]: ordered container keyed by a projection
//! - [`dict`] — [`FuzzyDict`]: ordered map with fuzzy key lookup
//! - [`error`] — [`MatchError`] and [`LookupError`]

pub mod dict;
pub mod error;
pub mod list;
pub mod matcher;
pub mod scorer;

pub use dict::FuzzyDict;
pub use error::{LookupError, LookupResult, MatchError, MatchResult};
pub use list::{FuzzyKey, FuzzyList, Mapper, Named};
pub use matcher::{
    best_match, best_match_index, extract_bests, resolve_position, Match, DEFAULT_MIN_SCORE,
    MIN_QUERY_LEN, RESERVED_SUBSTRINGS,
};
pub use scorer::weighted_ratio;
