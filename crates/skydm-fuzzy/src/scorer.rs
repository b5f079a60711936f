//! Weighted-ratio string similarity.
//!
//! All scores are integers in `0..=100`. The base measure is the sequence
//! similarity `2M / T` (matched characters over total characters), computed
//! from a character-level alignment produced by `similar`. The weighted
//! ratio combines the plain ratio with partial-window and token-order
//! insensitive variants, scaled down so that an exact plain match always
//! wins over a reordered or partial one.

use std::collections::BTreeSet;

use similar::{DiffOp, TextDiff};

/// Scale applied to the token-based scores.
const UNBASE_SCALE: f64 = 0.95;
/// Scale applied to partial scores when lengths differ moderately.
const PARTIAL_SCALE: f64 = 0.90;
/// Scale applied to partial scores when one string is much longer.
const LONG_PARTIAL_SCALE: f64 = 0.60;
/// Length ratio below which partial matching is not attempted.
const TRY_PARTIAL_RATIO: f64 = 1.5;
/// Length ratio above which the long partial scale applies.
const LONG_RATIO: f64 = 8.0;

/// Normalize a string for scoring: drop non-ASCII, replace anything that is
/// not a letter, digit or underscore with a space, lowercase, and trim.
pub fn full_process(s: &str) -> String {
    let mapped: String = s
        .chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    mapped.trim().to_string()
}

/// Plain sequence similarity of two strings.
pub fn ratio(s1: &str, s2: &str) -> u8 {
    if s1 == s2 {
        return 100;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }
    to_score(sequence_ratio(s1, s2))
}

/// Best similarity of the shorter string against same-length windows of the
/// longer string.
pub fn partial_ratio(s1: &str, s2: &str) -> u8 {
    if s1 == s2 {
        return 100;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0;
    }

    let (shorter, longer) = if s1.chars().count() <= s2.chars().count() {
        (s1, s2)
    } else {
        (s2, s1)
    };
    let short_len = shorter.chars().count();
    let long_chars: Vec<char> = longer.chars().collect();

    let mut best = 0.0f64;
    for (short_start, long_start, _) in matching_blocks(shorter, longer) {
        let window_start = long_start.saturating_sub(short_start);
        let window_end = (window_start + short_len).min(long_chars.len());
        let window: String = long_chars[window_start..window_end].iter().collect();

        let r = sequence_ratio(shorter, &window);
        if r > 0.995 {
            return 100;
        }
        best = best.max(r);
    }
    to_score(best)
}

/// Ratio of the two strings after sorting their whitespace tokens.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u8 {
    token_sort(&full_process(s1), &full_process(s2), false)
}

/// Partial ratio of the two strings after sorting their whitespace tokens.
pub fn partial_token_sort_ratio(s1: &str, s2: &str) -> u8 {
    token_sort(&full_process(s1), &full_process(s2), true)
}

/// Ratio based on the shared and distinct token sets of the two strings.
pub fn token_set_ratio(s1: &str, s2: &str) -> u8 {
    token_set(&full_process(s1), &full_process(s2), false)
}

/// Partial variant of [`token_set_ratio`].
pub fn partial_token_set_ratio(s1: &str, s2: &str) -> u8 {
    token_set(&full_process(s1), &full_process(s2), true)
}

/// Weighted ratio: case and token-order insensitive similarity that picks
/// the best of several scorers depending on the relative string lengths.
pub fn weighted_ratio(s1: &str, s2: &str) -> u8 {
    let p1 = full_process(s1);
    let p2 = full_process(s2);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let base = f64::from(ratio(&p1, &p2));
    let len1 = p1.chars().count() as f64;
    let len2 = p2.chars().count() as f64;
    let len_ratio = len1.max(len2) / len1.min(len2);

    if len_ratio < TRY_PARTIAL_RATIO {
        let tsor = f64::from(token_sort(&p1, &p2, false)) * UNBASE_SCALE;
        let tser = f64::from(token_set(&p1, &p2, false)) * UNBASE_SCALE;
        return to_score_pct(base.max(tsor).max(tser));
    }

    let partial_scale = if len_ratio > LONG_RATIO {
        LONG_PARTIAL_SCALE
    } else {
        PARTIAL_SCALE
    };
    let partial = f64::from(partial_ratio(&p1, &p2)) * partial_scale;
    let ptsor = f64::from(token_sort(&p1, &p2, true)) * UNBASE_SCALE * partial_scale;
    let ptser = f64::from(token_set(&p1, &p2, true)) * UNBASE_SCALE * partial_scale;
    to_score_pct(base.max(partial).max(ptsor).max(ptser))
}

fn token_sort(p1: &str, p2: &str, partial: bool) -> u8 {
    let sorted1 = sort_tokens(p1);
    let sorted2 = sort_tokens(p2);
    if partial {
        partial_ratio(&sorted1, &sorted2)
    } else {
        ratio(&sorted1, &sorted2)
    }
}

fn token_set(p1: &str, p2: &str, partial: bool) -> u8 {
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }
    let tokens1: BTreeSet<&str> = p1.split_whitespace().collect();
    let tokens2: BTreeSet<&str> = p2.split_whitespace().collect();

    let sect = join(tokens1.intersection(&tokens2));
    let diff1to2 = join(tokens1.difference(&tokens2));
    let diff2to1 = join(tokens2.difference(&tokens1));

    let combined_1to2 = format!("{sect} {diff1to2}").trim().to_string();
    let combined_2to1 = format!("{sect} {diff2to1}").trim().to_string();

    let score: fn(&str, &str) -> u8 = if partial { partial_ratio } else { ratio };
    score(&sect, &combined_1to2)
        .max(score(&sect, &combined_2to1))
        .max(score(&combined_1to2, &combined_2to1))
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<S: AsRef<str>>(tokens: impl Iterator<Item = S>) -> String {
    tokens
        .map(|t| t.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2M / T` for a character-level alignment of the two strings.
fn sequence_ratio(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Matching blocks `(start_in_a, start_in_b, len)` of the alignment, with a
/// trailing zero-length block at the end of both strings.
fn matching_blocks(a: &str, b: &str) -> Vec<(usize, usize, usize)> {
    let diff = TextDiff::from_chars(a, b);
    let mut blocks: Vec<(usize, usize, usize)> = diff
        .ops()
        .iter()
        .filter_map(|op| match *op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => Some((old_index, new_index, len)),
            _ => None,
        })
        .collect();
    blocks.push((a.chars().count(), b.chars().count(), 0));
    blocks
}

fn to_score(r: f64) -> u8 {
    to_score_pct(100.0 * r)
}

fn to_score_pct(pct: f64) -> u8 {
    pct.round_ties_even().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_process_normalizes() {
        assert_eq!(full_process("  Flux-Ha! "), "flux ha");
        assert_eq!(full_process("emline_gflux"), "emline_gflux");
        assert_eq!(full_process("Hα line"), "h line");
        assert_eq!(full_process("---"), "");
    }

    #[test]
    fn ratio_identical_and_empty() {
        assert_eq!(ratio("abc", "abc"), 100);
        assert_eq!(ratio("", "abc"), 0);
        assert_eq!(ratio("abc", ""), 0);
    }

    #[test]
    fn ratio_counts_matched_characters() {
        // 6 of 13 characters matched on each side: 2 * 6 / 13.
        assert_eq!(ratio("flux_h", "flux_ha"), 92);
    }

    #[test]
    fn partial_ratio_finds_embedded_substring() {
        assert_eq!(partial_ratio("vel", "stellar_vel"), 100);
        assert_eq!(partial_ratio("stellar_vel", "vel"), 100);
    }

    #[test]
    fn token_sort_ignores_order() {
        assert_eq!(token_sort_ratio("stellar vel", "vel stellar"), 100);
    }

    #[test]
    fn token_set_ignores_duplicates_and_extras() {
        assert_eq!(token_set_ratio("gas flux", "flux gas flux"), 100);
    }

    #[test]
    fn weighted_ratio_exact_is_100() {
        assert_eq!(weighted_ratio("EMLINE_GFLUX", "emline_gflux"), 100);
    }

    #[test]
    fn weighted_ratio_empty_is_zero() {
        assert_eq!(weighted_ratio("", "abc"), 0);
        assert_eq!(weighted_ratio("!!!", "abc"), 0);
    }

    #[test]
    fn weighted_ratio_reordered_tokens_scaled() {
        assert_eq!(weighted_ratio("stellar vel", "vel stellar"), 95);
    }

    #[test]
    fn weighted_ratio_partial_scaled() {
        assert_eq!(weighted_ratio("vel", "stellar_vel"), 90);
    }

    #[test]
    fn weighted_ratio_symmetric_tie() {
        assert_eq!(
            weighted_ratio("flux_h", "flux_ha"),
            weighted_ratio("flux_h", "flux_hb")
        );
    }

    proptest! {
        #[test]
        fn score_is_bounded(a in "[a-zA-Z0-9_ ]{0,16}", b in "[a-zA-Z0-9_ ]{0,16}") {
            let s = weighted_ratio(&a, &b);
            prop_assert!(s <= 100);
        }

        #[test]
        fn self_score_is_perfect(a in "[a-z0-9_]{1,16}") {
            prop_assert_eq!(weighted_ratio(&a, &a), 100);
        }
    }
}
