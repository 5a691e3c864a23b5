//! Ordered key-value collection.
//!
//! [`Collection`] keeps values in insertion order under unique [`Key`]s, which
//! are either integer indices or names. It is the container the workflows use
//! to push candidate packages through filter and map steps without touching
//! shared state:
//!
//! - [`Collection::map`], [`Collection::filter`] and [`Collection::reject`]
//!   always build a *new* collection, re-indexed densely from `0`.
//! - [`Collection::each`] runs a callback for side effects and hands back the
//!   same collection for chaining.
//! - [`Collection::get`] on an absent key is a [`SkeletonError::KeyNotFound`],
//!   never a default value.
//! - [`Collection::push`] appends after the highest integer key seen so far.
//!
//! # Examples
//!
//! ```rust
//! use skeleton_installer::collection::Collection;
//!
//! let numbers: Collection<i32> = (1..=5).collect();
//! let evens = numbers.filter(|n| n % 2 == 0);
//!
//! assert_eq!(evens.to_vec(), vec![2, 4]);
//! assert_eq!(numbers.len(), 5);
//! assert_eq!(*evens.get(1).unwrap(), 4);
//! ```

use crate::core::SkeletonError;
use serde_json::Value;
use std::fmt;

/// Key of a [`Collection`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Integer position, as assigned by appends
    Index(i64),
    /// Named entry
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Key::Index(index)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Key::Index(i64::from(index))
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

/// Insertion-ordered collection with unique keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<(Key, T)>,
    next_index: i64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Collection<T> {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_index: 0,
        }
    }

    /// Build a collection from key/value pairs.
    ///
    /// A repeated key overwrites the earlier value in place, keeping its
    /// original position.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, T)>,
    {
        let mut collection = Self::new();
        for (key, value) in pairs {
            collection.set(key, value);
        }
        collection
    }

    /// The entries, verbatim and in order.
    #[must_use]
    pub fn as_pairs(&self) -> &[(Key, T)] {
        &self.items
    }

    /// Consume the collection, returning its entries.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(Key, T)> {
        self.items
    }

    /// Consume the collection, returning its values in order.
    #[must_use]
    pub fn into_values(self) -> Vec<T> {
        self.items.into_iter().map(|(_, value)| value).collect()
    }

    /// Invoke `callback` on every value for its side effects.
    pub fn each<F>(&self, mut callback: F) -> &Self
    where
        F: FnMut(&T),
    {
        for (_, value) in &self.items {
            callback(value);
        }
        self
    }

    /// Left fold over the values in order.
    pub fn reduce<A, F>(&self, initial: A, mut callback: F) -> A
    where
        F: FnMut(A, &T) -> A,
    {
        let mut accumulator = initial;
        for (_, value) in &self.items {
            accumulator = callback(accumulator, value);
        }
        accumulator
    }

    /// Left fold that stops at the first error.
    pub fn try_reduce<A, E, F>(&self, initial: A, mut callback: F) -> Result<A, E>
    where
        F: FnMut(A, &T) -> Result<A, E>,
    {
        let mut accumulator = initial;
        for (_, value) in &self.items {
            accumulator = callback(accumulator, value)?;
        }
        Ok(accumulator)
    }

    /// New collection holding `callback(value)` for every value.
    pub fn map<U, F>(&self, mut callback: F) -> Collection<U>
    where
        F: FnMut(&T) -> U,
    {
        self.reduce(Collection::new(), |mut results, value| {
            results.push(callback(value));
            results
        })
    }

    /// Fallible [`map`](Self::map).
    pub fn try_map<U, E, F>(&self, mut callback: F) -> Result<Collection<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        self.try_reduce(Collection::new(), |mut results, value| {
            results.push(callback(value)?);
            Ok(results)
        })
    }

    /// Look up a value; an absent key is an error.
    pub fn get(&self, key: impl Into<Key>) -> Result<&T, SkeletonError> {
        let key = key.into();
        self.position(&key).map(|index| &self.items[index].1).ok_or_else(|| {
            SkeletonError::KeyNotFound {
                key: key.to_string(),
            }
        })
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.position(&key.into()).is_some()
    }

    /// Insert or overwrite the value under `key`.
    pub fn set(&mut self, key: impl Into<Key>, value: T) {
        let key = key.into();
        if let Key::Index(index) = key {
            self.next_index = self.next_index.max(index.saturating_add(1));
        }
        match self.position(&key) {
            Some(position) => self.items[position].1 = value,
            None => self.items.push((key, value)),
        }
    }

    /// Append `value` under the next free integer key.
    pub fn push(&mut self, value: T) {
        let index = self.next_index;
        self.next_index += 1;
        self.items.push((Key::Index(index), value));
    }

    /// Remove the value under `key`, if any.
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<T> {
        let key = key.into();
        self.position(&key).map(|position| self.items.remove(position).1)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &T)> {
        self.items.iter().map(|(key, value)| (key, value))
    }

    /// Iterate over values in order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, value)| value)
    }

    /// Iterate over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.items.iter().map(|(key, _)| key)
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.items.iter().position(|(existing, _)| existing == key)
    }
}

impl<T: Clone> Collection<T> {
    /// The values in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.values().cloned().collect()
    }

    /// New collection holding the values for which `callback` returns true.
    pub fn filter<F>(&self, mut callback: F) -> Collection<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.reduce(Collection::new(), |mut filtered, value| {
            if callback(value) {
                filtered.push(value.clone());
            }
            filtered
        })
    }

    /// Fallible [`filter`](Self::filter).
    pub fn try_filter<E, F>(&self, mut callback: F) -> Result<Collection<T>, E>
    where
        F: FnMut(&T) -> Result<bool, E>,
    {
        self.try_reduce(Collection::new(), |mut filtered, value| {
            if callback(value)? {
                filtered.push(value.clone());
            }
            Ok(filtered)
        })
    }

    /// New collection holding the values for which `callback` returns false.
    pub fn reject<F>(&self, mut callback: F) -> Collection<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.filter(|value| !callback(value))
    }
}

impl Collection<Value> {
    /// Build a collection from a JSON list or object.
    ///
    /// Lists are indexed from `0`; objects keep their member names. Any other
    /// JSON value is a [`SkeletonError::InvalidInput`].
    pub fn from_json(value: &Value) -> Result<Self, SkeletonError> {
        match value {
            Value::Array(items) => Ok(items.iter().cloned().collect()),
            Value::Object(members) => {
                Ok(Self::from_pairs(members.iter().map(|(name, value)| (name, value.clone()))))
            }
            other => Err(SkeletonError::InvalidInput {
                found: json_type_name(other).to_string(),
            }),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<T> FromIterator<T> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for value in iter {
            collection.push(value);
        }
        collection
    }
}

impl<T> Extend<T> for Collection<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = (Key, T);
    type IntoIter = std::vec::IntoIter<(Key, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a (Key, T);
    type IntoIter = std::slice::Iter<'a, (Key, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
