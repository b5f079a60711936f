//! Header-level diff: compare the keywords of two FITS headers.
//!
//! Comments and commentary cards (`COMMENT`, `HISTORY`, blank) are ignored.
//! Floating-point values are compared with a relative tolerance; every other
//! value must match exactly, except for trailing whitespace in strings.

use skydm_format::{Header, HeaderValue};

/// Default relative tolerance for floating-point header values.
pub const DEFAULT_RTOL: f64 = 10.0;

/// A keyword present in both headers with a different value.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordChange {
    pub keyword: String,
    pub old: HeaderValue,
    pub new: HeaderValue,
}

/// The result of comparing two headers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeaderDiff {
    /// Keywords in the new header but not the old one, in header order.
    pub added: Vec<String>,
    /// Keywords in the old header but not the new one, in header order.
    pub removed: Vec<String>,
    /// Keywords whose values differ beyond the tolerance.
    pub changed: Vec<KeywordChange>,
}

impl HeaderDiff {
    /// Returns `true` if the headers are equivalent.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Returns `true` if the keyword sets differ.
    pub fn keywords_differ(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Compare `old` against `new`.
pub fn diff_headers(old: &Header, new: &Header, rtol: f64) -> HeaderDiff {
    let old_keys = old.keywords();
    let new_keys = new.keywords();

    let added = new_keys
        .iter()
        .filter(|k| !old_keys.contains(k))
        .map(|k| k.to_string())
        .collect();
    let removed = old_keys
        .iter()
        .filter(|k| !new_keys.contains(k))
        .map(|k| k.to_string())
        .collect();

    let changed = old_keys
        .iter()
        .filter_map(|k| {
            let a = old.get(k)?;
            let b = new.get(k)?;
            (!values_match(a, b, rtol)).then(|| KeywordChange {
                keyword: k.to_string(),
                old: a.clone(),
                new: b.clone(),
            })
        })
        .collect();

    HeaderDiff {
        added,
        removed,
        changed,
    }
}

fn values_match(a: &HeaderValue, b: &HeaderValue, rtol: f64) -> bool {
    match (a, b) {
        (HeaderValue::Float(_), _) | (_, HeaderValue::Float(_)) => {
            match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x == y || (x - y).abs() <= rtol * y.abs(),
                _ => false,
            }
        }
        (HeaderValue::Str(x), HeaderValue::Str(y)) => x.trim_end() == y.trim_end(),
        _ => a == b,
    }
}
