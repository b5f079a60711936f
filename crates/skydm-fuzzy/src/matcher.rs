//! Best-match selection.
//!
//! Policy, applied after scoring every candidate with
//! [`weighted_ratio`](crate::scorer::weighted_ratio):
//!
//! - queries shorter than [`MIN_QUERY_LEN`] or containing one of the
//!   [`RESERVED_SUBSTRINGS`] are rejected outright
//! - candidates scoring below the threshold are discarded
//! - none left: no good match
//! - one left: that candidate
//! - several left: the top candidate, unless the top two scores are equal,
//!   in which case the query is ambiguous
//!
//! Ambiguity is never resolved silently.

use tracing::debug;

use crate::error::{LookupError, LookupResult, MatchError, MatchResult};
use crate::scorer::{full_process, weighted_ratio};

/// Default minimum score a candidate needs to be considered.
pub const DEFAULT_MIN_SCORE: u8 = 75;

/// Shortest query accepted for fuzzy matching.
pub const MIN_QUERY_LEN: usize = 3;

/// Suffixes marking variance/mask sub-fields. A query containing one of
/// these is an exact sub-field access, never a fuzzy name.
pub const RESERVED_SUBSTRINGS: &[&str] = &["_ivar", "_mask"];

/// A scored candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match<'a> {
    /// The candidate string as supplied.
    pub candidate: &'a str,
    /// Position of the candidate in the supplied sequence.
    pub index: usize,
    /// Weighted-ratio score, `0..=100`.
    pub score: u8,
}

/// Check that `query` can be used for fuzzy matching.
pub fn validate_query(query: &str) -> MatchResult<()> {
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(MatchError::InvalidInput {
            query: query.to_string(),
            reason: format!("fuzzy queries must be at least {MIN_QUERY_LEN} characters long"),
        });
    }
    if let Some(reserved) = RESERVED_SUBSTRINGS.iter().find(|r| query.contains(*r)) {
        return Err(MatchError::InvalidInput {
            query: query.to_string(),
            reason: format!("{reserved} is not allowed in a fuzzy query"),
        });
    }
    Ok(())
}

/// Score every candidate and return those at or above `min_score`, best
/// first. Candidates with equal scores keep their input order.
pub fn extract_bests<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    min_score: u8,
) -> Vec<Match<'a>> {
    let processed = full_process(query);
    if processed.is_empty() {
        debug!(query, "query is empty after processing; nothing can match");
    }

    let mut bests: Vec<Match<'a>> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let candidate = candidate.as_ref();
            let score = weighted_ratio(&processed, candidate);
            (score >= min_score).then_some(Match {
                candidate,
                index,
                score,
            })
        })
        .collect();
    bests.sort_by(|a, b| b.score.cmp(&a.score));
    bests
}

/// Return the single best candidate for `query`, with its position and score.
pub fn best_match_index<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    min_score: u8,
) -> MatchResult<Match<'a>> {
    validate_query(query)?;

    let bests = extract_bests(query, candidates, min_score);
    match bests.as_slice() {
        [] => Err(MatchError::NoGoodMatch {
            query: query.to_string(),
            min_score,
        }),
        [only] => Ok(*only),
        [first, second, ..] if first.score == second.score => Err(MatchError::Ambiguous {
            query: query.to_string(),
            candidates: bests
                .iter()
                .take_while(|m| m.score == first.score)
                .map(|m| m.candidate.to_string())
                .collect(),
            score: first.score,
        }),
        [first, ..] => Ok(*first),
    }
}

/// Return the single best candidate string for `query`.
///
/// ```
/// use skydm_fuzzy::{best_match, DEFAULT_MIN_SCORE};
///
/// let names = ["emline_gflux", "emline_sflux", "stellar_vel"];
/// assert_eq!(best_match("emline_gflux", &names, DEFAULT_MIN_SCORE).unwrap(), "emline_gflux");
/// assert!(best_match("flux_h", &["flux_ha", "flux_hb"], DEFAULT_MIN_SCORE).is_err());
/// ```
pub fn best_match<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    min_score: u8,
) -> MatchResult<&'a str> {
    best_match_index(query, candidates, min_score).map(|m| m.candidate)
}

/// Resolve `key` to a position in `names`.
///
/// An exact string match wins outright. Otherwise fuzzy matching runs, and
/// if it fails on a key containing spaces it is retried once with the spaces
/// replaced by underscores. The error from the first attempt is reported.
pub fn resolve_position<S: AsRef<str>>(
    key: &str,
    names: &[S],
    min_score: u8,
) -> LookupResult<usize> {
    if let Some(index) = names.iter().position(|n| n.as_ref() == key) {
        return Ok(index);
    }

    let first = match best_match_index(key, names, min_score) {
        Ok(m) => return Ok(m.index),
        Err(e) => e,
    };

    if key.contains(' ') {
        let underscored = key.replace(' ', "_");
        if let Ok(m) = best_match_index(&underscored, names, min_score) {
            return Ok(m.index);
        }
    }

    Err(LookupError::NotFound {
        key: key.to_string(),
        source: first,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NAMES: &[&str] = &["emline_gflux", "emline_sflux", "stellar_vel", "spx_snr"];

    #[test]
    fn unique_candidate_above_threshold() {
        assert_eq!(best_match("stellar_vel", NAMES, DEFAULT_MIN_SCORE).unwrap(), "stellar_vel");
    }

    #[test]
    fn close_spelling_resolves() {
        assert_eq!(best_match("stellar vel", NAMES, DEFAULT_MIN_SCORE).unwrap(), "stellar_vel");
        assert_eq!(best_match("emline_gflx", NAMES, DEFAULT_MIN_SCORE).unwrap(), "emline_gflux");
    }

    #[test]
    fn short_query_rejected() {
        let err = best_match("ab", NAMES, DEFAULT_MIN_SCORE).unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput { .. }));
        assert_eq!(err.query(), "ab");
    }

    #[test]
    fn reserved_substrings_rejected() {
        for query in ["emline_gflux_ivar", "spx_snr_mask"] {
            let err = best_match(query, NAMES, DEFAULT_MIN_SCORE).unwrap_err();
            assert!(matches!(err, MatchError::InvalidInput { .. }), "{query}");
        }
    }

    #[test]
    fn tied_top_scores_are_ambiguous() {
        let err = best_match("flux_h", &["flux_ha", "flux_hb"], DEFAULT_MIN_SCORE).unwrap_err();
        match err {
            MatchError::Ambiguous { candidates, score, .. } => {
                assert_eq!(candidates, vec!["flux_ha".to_string(), "flux_hb".to_string()]);
                assert!(score >= DEFAULT_MIN_SCORE);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_candidates_are_ambiguous() {
        let err = best_match("spx_snr", &["spx_snr", "spx_snr"], DEFAULT_MIN_SCORE).unwrap_err();
        assert!(err.is_ambiguous());
    }

    #[test]
    fn nothing_above_threshold() {
        let err = best_match("zzzzzz", NAMES, DEFAULT_MIN_SCORE).unwrap_err();
        assert!(matches!(err, MatchError::NoGoodMatch { min_score: 75, .. }));
    }

    #[test]
    fn lower_threshold_admits_weaker_matches() {
        assert!(best_match("gflux", NAMES, 95).is_err());
        assert_eq!(best_match("gflux", NAMES, 50).unwrap(), "emline_gflux");
    }

    #[test]
    fn extract_bests_sorted_descending() {
        let bests = extract_bests("emline", NAMES, 0);
        assert_eq!(bests.len(), NAMES.len());
        assert!(bests.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn resolve_prefers_exact_match() {
        let names = ["flux", "flux_ha"];
        assert_eq!(resolve_position("flux", &names, DEFAULT_MIN_SCORE).unwrap(), 0);
        assert_eq!(resolve_position("flux_ha", &names, DEFAULT_MIN_SCORE).unwrap(), 1);
    }

    #[test]
    fn resolve_exact_bypasses_query_rules() {
        let names = ["ha", "hb"];
        assert_eq!(resolve_position("hb", &names, DEFAULT_MIN_SCORE).unwrap(), 1);
    }

    #[test]
    fn resolve_not_found_carries_key() {
        let err = resolve_position("zzzzzz", NAMES, DEFAULT_MIN_SCORE).unwrap_err();
        match err {
            LookupError::NotFound { key, source } => {
                assert_eq!(key, "zzzzzz");
                assert!(matches!(source, MatchError::NoGoodMatch { .. }));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn single_candidate_always_found(name in "[a-z][a-z0-9]{2,12}") {
            let candidates = [name.as_str()];
            prop_assert_eq!(best_match(&name, &candidates, DEFAULT_MIN_SCORE).unwrap(), name.as_str());
        }

        #[test]
        fn short_queries_always_invalid(query in "[a-z]{0,2}") {
            let err = best_match(&query, NAMES, DEFAULT_MIN_SCORE).unwrap_err();
            let is_invalid = matches!(err, MatchError::InvalidInput { .. });
            prop_assert!(is_invalid);
        }
    }
}
