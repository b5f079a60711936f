//! Insertion-ordered map with fuzzy key lookup.

use indexmap::IndexMap;

use crate::error::{LookupError, LookupResult};
use crate::matcher::{resolve_position, DEFAULT_MIN_SCORE};

/// A string-keyed map whose entries can be retrieved by an approximately
/// spelled key.
///
/// Lookups try the exact key first and only fall back to fuzzy matching
/// against all keys when it is absent.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyDict<V> {
    entries: IndexMap<String, V>,
    min_score: u8,
}

impl<V> Default for FuzzyDict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FuzzyDict<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Use `min_score` as the fuzzy threshold for lookups.
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    /// Insert or replace the value stored under the exact `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Resolve `key` to the exact stored key.
    pub fn resolve_key(&self, key: &str) -> LookupResult<&str> {
        let index = self.index_of(key)?;
        self.entries
            .get_index(index)
            .map(|(k, _)| k.as_str())
            .ok_or(LookupError::OutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    fn index_of(&self, key: &str) -> LookupResult<usize> {
        if let Some(index) = self.entries.get_index_of(key) {
            return Ok(index);
        }
        let keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        resolve_position(key, &keys, self.min_score)
    }

    /// Look up a value by exact or approximate key.
    pub fn get(&self, key: &str) -> LookupResult<&V> {
        let index = self.index_of(key)?;
        self.get_index(index).map(|(_, v)| v)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, key: &str) -> LookupResult<&mut V> {
        let index = self.index_of(key)?;
        let len = self.entries.len();
        self.entries
            .get_index_mut(index)
            .map(|(_, v)| v)
            .ok_or(LookupError::OutOfRange { index, len })
    }

    /// Entry at an insertion position.
    pub fn get_index(&self, index: usize) -> LookupResult<(&str, &V)> {
        self.entries
            .get_index(index)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or(LookupError::OutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    /// Returns `true` if `key` resolves to an entry.
    pub fn contains(&self, key: &str) -> bool {
        self.index_of(key).is_ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for FuzzyDict<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

impl<V> IntoIterator for FuzzyDict<V> {
    type Item = (String, V);
    type IntoIter = indexmap::map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;

    fn channels() -> FuzzyDict<u32> {
        [("ha_6564", 18), ("hb_4862", 12), ("oiii_5008", 13)]
            .into_iter()
            .collect()
    }

    #[test]
    fn exact_and_fuzzy_lookup() {
        let dict = channels();
        assert_eq!(*dict.get("hb_4862").unwrap(), 12);
        assert_eq!(*dict.get("oiii 5008").unwrap(), 13);
        assert_eq!(dict.resolve_key("ha 6564").unwrap(), "ha_6564");
    }

    #[test]
    fn exact_key_wins_over_fuzzy() {
        let mut dict = FuzzyDict::new();
        dict.insert("flux_ha", 1);
        dict.insert("flux_h", 2);
        dict.insert("flux_hb", 3);
        assert_eq!(*dict.get("flux_h").unwrap(), 2);
    }

    #[test]
    fn ambiguous_key_is_not_found() {
        let mut dict = FuzzyDict::new();
        dict.insert("flux_ha", 1);
        dict.insert("flux_hb", 3);
        match dict.get("flux_h").unwrap_err() {
            LookupError::NotFound { key, source } => {
                assert_eq!(key, "flux_h");
                assert!(matches!(source, MatchError::Ambiguous { .. }));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn preserves_insertion_order() {
        let dict = channels();
        let keys: Vec<&str> = dict.keys().collect();
        assert_eq!(keys, ["ha_6564", "hb_4862", "oiii_5008"]);
        assert_eq!(dict.get_index(1).unwrap(), ("hb_4862", &12));
        assert!(dict.get_index(3).is_err());
    }

    #[test]
    fn get_mut_updates_resolved_entry() {
        let mut dict = channels();
        *dict.get_mut("oiii_500").unwrap() = 99;
        assert_eq!(*dict.get("oiii_5008").unwrap(), 99);
        assert!(dict.contains("oiii"));
        assert!(!dict.contains("nii_6585"));
    }
}
