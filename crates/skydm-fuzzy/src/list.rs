//! Ordered container with fuzzy lookup by a projected name.

use std::fmt;
use std::ops::Index;

use crate::error::{LookupError, LookupResult};
use crate::matcher::{resolve_position, DEFAULT_MIN_SCORE};

/// An entity that can be looked up by name.
pub trait Named {
    /// The string a container matches lookups against.
    fn name(&self) -> &str;
}

/// Projection from an element to the string it is looked up by.
pub type Mapper<T> = fn(&T) -> String;

fn name_of<T: Named>(item: &T) -> String {
    item.name().to_string()
}

/// A lookup key: a loosely spelled name or a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuzzyKey<'a> {
    /// Resolved by exact-then-fuzzy matching against the projected names.
    Name(&'a str),
    /// Direct indexing, no matching.
    Position(usize),
}

impl<'a> From<&'a str> for FuzzyKey<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for FuzzyKey<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for FuzzyKey<'_> {
    fn from(index: usize) -> Self {
        Self::Position(index)
    }
}

/// An ordered list whose elements can be retrieved by an approximately
/// spelled name.
///
/// The list owns its elements. Insertion order is preserved and duplicate
/// names are allowed, though a fuzzy query that lands on duplicates is
/// rejected as ambiguous.
#[derive(Clone)]
pub struct FuzzyList<T> {
    items: Vec<T>,
    mapper: Mapper<T>,
    min_score: u8,
}

impl<T: Named> FuzzyList<T> {
    /// Create an empty list keyed by each element's [`Named::name`].
    pub fn new() -> Self {
        Self::with_mapper(name_of::<T>)
    }
}

impl<T: Named> Default for FuzzyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Named + Clone> FuzzyList<T> {
    /// Create a list holding clones of `items`.
    pub fn from_slice(items: &[T]) -> Self {
        items.iter().cloned().collect()
    }
}

impl<T> FuzzyList<T> {
    /// Create an empty list keyed by `mapper`.
    pub fn with_mapper(mapper: Mapper<T>) -> Self {
        Self {
            items: Vec::new(),
            mapper,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Create a list from owned items keyed by `mapper`.
    pub fn from_items(items: impl IntoIterator<Item = T>, mapper: Mapper<T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            mapper,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Use `min_score` as the fuzzy threshold for lookups.
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    /// Append an owned element.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Append a copy of `item`.
    pub fn append(&mut self, item: &T)
    where
        T: Clone,
    {
        self.items.push(item.clone());
    }

    /// The projected name of every element, in order.
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(self.mapper).collect()
    }

    /// The projected name of a single element.
    pub fn name_of(&self, item: &T) -> String {
        (self.mapper)(item)
    }

    /// Resolve a name to a position: exact match first, then fuzzy.
    pub fn position(&self, key: &str) -> LookupResult<usize> {
        resolve_position(key, &self.names(), self.min_score)
    }

    fn resolve(&self, key: FuzzyKey<'_>) -> LookupResult<usize> {
        match key {
            FuzzyKey::Name(name) => self.position(name),
            FuzzyKey::Position(index) if index < self.items.len() => Ok(index),
            FuzzyKey::Position(index) => Err(LookupError::OutOfRange {
                index,
                len: self.items.len(),
            }),
        }
    }

    /// Look up an element by name or position.
    pub fn get<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> LookupResult<&T> {
        let index = self.resolve(key.into())?;
        Ok(&self.items[index])
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut<'k>(&mut self, key: impl Into<FuzzyKey<'k>>) -> LookupResult<&mut T> {
        let index = self.resolve(key.into())?;
        Ok(&mut self.items[index])
    }

    /// Returns `true` if `key` resolves to an element.
    pub fn contains<'k>(&self, key: impl Into<FuzzyKey<'k>>) -> bool {
        self.resolve(key.into()).is_ok()
    }

    /// Remove and return the element `key` resolves to.
    pub fn remove<'k>(&mut self, key: impl Into<FuzzyKey<'k>>) -> LookupResult<T> {
        let index = self.resolve(key.into())?;
        Ok(self.items.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: fmt::Debug> fmt::Debug for FuzzyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuzzyList")
            .field("items", &self.items)
            .field("min_score", &self.min_score)
            .finish_non_exhaustive()
    }
}

impl<T: PartialEq> PartialEq for FuzzyList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T> Index<usize> for FuzzyList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T: Named> FromIterator<T> for FuzzyList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter, name_of::<T>)
    }
}

impl<T> Extend<T> for FuzzyList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> IntoIterator for FuzzyList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a FuzzyList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Property {
        name: String,
        unit: &'static str,
    }

    impl Property {
        fn new(name: &str, unit: &'static str) -> Self {
            Self {
                name: name.to_string(),
                unit,
            }
        }
    }

    impl Named for Property {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn properties() -> FuzzyList<Property> {
        FuzzyList::from_slice(&[
            Property::new("emline_gflux", "1e-17 erg/s/cm^2"),
            Property::new("stellar_vel", "km/s"),
            Property::new("spx_snr", ""),
        ])
    }

    #[test]
    fn get_by_name_and_position() {
        let list = properties();
        assert_eq!(list.get("stellar vel").unwrap().unit, "km/s");
        assert_eq!(list.get(2).unwrap().name, "spx_snr");
        assert_eq!(list[0].name, "emline_gflux");
    }

    #[test]
    fn get_is_idempotent() {
        let list = properties();
        let first = list.get("emline_gflx").unwrap().clone();
        let second = list.get("emline_gflx").unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn exact_match_short_circuits_fuzzy_scoring() {
        // "flux_h" scores identically against both longer names, but an
        // exact element exists and must win.
        let list = FuzzyList::from_slice(&[
            Property::new("flux_ha", ""),
            Property::new("flux_h", ""),
            Property::new("flux_hb", ""),
        ]);
        assert_eq!(list.get("flux_h").unwrap().name, "flux_h");
    }

    #[test]
    fn spaced_name_resolves_to_underscored() {
        let list = FuzzyList::from_slice(&[Property::new("spx_ellcoo", ""), Property::new("binid", "")]);
        assert_eq!(list.position("spx ellcoo").unwrap(), 0);
    }

    #[test]
    fn not_found_includes_key() {
        let err = properties().get("zzzzzz").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("zzzzzz"));
    }

    #[test]
    fn position_out_of_range() {
        let err = properties().get(7).unwrap_err();
        assert_eq!(err, LookupError::OutOfRange { index: 7, len: 3 });
    }

    #[test]
    fn contains_swallows_errors() {
        let list = properties();
        assert!(list.contains("spx_snr"));
        assert!(!list.contains("ab"));
        assert!(!list.contains("zzzzzz"));
    }

    #[test]
    fn custom_mapper() {
        fn by_unit(p: &Property) -> String {
            p.unit.to_string()
        }
        let list = FuzzyList::from_items(properties(), by_unit);
        assert_eq!(list.get("km/s").unwrap().name, "stellar_vel");
        assert_eq!(list.names(), vec!["1e-17 erg/s/cm^2", "km/s", ""]);
    }

    #[test]
    fn append_stores_independent_copy() {
        let mut list = FuzzyList::new();
        let mut original = Property::new("binid", "");
        list.append(&original);
        original.name.push_str("_changed");
        assert_eq!(list[0].name, "binid");
    }

    #[test]
    fn get_mut_and_remove() {
        let mut list = properties();
        list.get_mut("stellar_vel").unwrap().unit = "m/s";
        assert_eq!(list[1].unit, "m/s");
        let removed = list.remove("spx_snr").unwrap();
        assert_eq!(removed.name, "spx_snr");
        assert_eq!(list.len(), 2);
    }

    proptest! {
        #[test]
        fn round_trip_by_projected_name(
            names in proptest::collection::btree_set("[a-z]{3}_[a-z]{4}[0-9]", 1..8)
        ) {
            let elements: Vec<Property> = names.iter().map(|n| Property::new(n, "")).collect();
            let mut list = FuzzyList::new();
            for element in &elements {
                list.append(element);
            }
            for element in &elements {
                prop_assert_eq!(list.get(element.name.as_str()).unwrap(), element);
            }
        }
    }
}
