//! Ordered map type for canonical mappings.
//!
//! This module provides [`Mapping`], a wrapper around [`IndexMap`] that keeps
//! entries in insertion order. Order is semantically significant for every
//! conversion: reading a JSON object, YAML block mapping, plist dictionary or
//! CSV header row and writing it back out must reproduce the same key order.
//!
//! Keys are unique. Inserting an existing key replaces its value in place, so
//! the key keeps the position of its first occurrence (last write wins).
//!
//! ## Examples
//!
//! ```rust
//! use canonconv::{Mapping, Value};
//!
//! let mut map = Mapping::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::Value;
use indexmap::IndexMap;

/// An insertion-ordered map of text keys to canonical values.
///
/// # Examples
///
/// ```rust
/// use canonconv::{Mapping, Value};
///
/// let mut map = Mapping::new();
/// map.insert("second".to_string(), Value::from(2));
/// map.insert("first".to_string(), Value::from(1));
///
/// // Iteration keeps insertion order
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["second", "first"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mapping(IndexMap<String, Value>);

/// Mappings are equal when they hold the same entries in the same order.
///
/// ```rust
/// use canonconv::value;
///
/// assert_ne!(value!({"a": 1, "b": 2}), value!({"b": 2, "a": 1}));
/// ```
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Mapping {
    /// Creates an empty `Mapping`.
    #[must_use]
    pub fn new() -> Self {
        Mapping(IndexMap::new())
    }

    /// Creates an empty `Mapping` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Mapping(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the value is replaced in place
    /// and the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use canonconv::{Mapping, Value};
    ///
    /// let mut map = Mapping::new();
    /// map.insert("a".to_string(), Value::from(1));
    /// map.insert("b".to_string(), Value::from(2));
    /// assert!(map.insert("a".to_string(), Value::from(3)).is_some());
    ///
    /// let keys: Vec<_> = map.keys().map(String::as_str).collect();
    /// assert_eq!(keys, ["a", "b"]);
    /// assert_eq!(map.get("a"), Some(&Value::from(3)));
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Removes a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns `true` if the map contains the key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns a mutable iterator over the key-value pairs, in insertion order.
    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, String, Value> {
        self.0.iter_mut()
    }

    /// Sorts the entries by key (byte order of the UTF-8 text).
    pub(crate) fn sort_keys(&mut self) {
        self.0.sort_keys();
    }
}

impl IntoIterator for Mapping {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Mapping(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_insert_keeps_first_position() {
        let mut map = Mapping::new();
        map.insert("x".to_string(), Value::from(1));
        map.insert("y".to_string(), Value::from(2));
        map.insert("x".to_string(), Value::from(9));

        let entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        assert_eq!(entries, vec![("x", Value::from(9)), ("y", Value::from(2))]);
    }

    #[test]
    fn test_remove_preserves_order() {
        let map: Mapping = ["a", "b", "c", "d"]
            .iter()
            .map(|k| (k.to_string(), Value::Null))
            .collect();
        let mut map = map;
        assert!(map.remove("b").is_some());
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "c", "d"]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab: Mapping = [("a", 1), ("b", 2)].iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect();
        let ba: Mapping = [("b", 2), ("a", 1)].iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());

        let mut nested_ab = Mapping::new();
        nested_ab.insert("x".to_string(), Value::Mapping(ab));
        let mut nested_ba = Mapping::new();
        nested_ba.insert("x".to_string(), Value::Mapping(ba));
        assert_ne!(Value::Mapping(nested_ab), Value::Mapping(nested_ba));
    }

    #[test]
    fn test_sort_keys() {
        let mut map: Mapping = ["b", "B", "a", "ä"]
            .iter()
            .map(|k| (k.to_string(), Value::Null))
            .collect();
        map.sort_keys();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["B", "a", "b", "ä"]);
    }
}
