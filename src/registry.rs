//! Insertion-ordered keyed collection.
//!
//! Backs both the command registry (iteration order is dispatch order) and
//! the member registry.

use indexmap::IndexMap;
use indexmap::map::Entry;
use std::hash::Hash;

/// Map with unique keys that iterates in insertion order.
#[derive(Debug, Clone)]
pub struct OrderedRegistry<K, V> {
    entries: IndexMap<K, V>,
}

impl<K: Hash + Eq, V> OrderedRegistry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Insert a new entry.
    ///
    /// Returns the value back if the key is already present; the existing
    /// entry and its position are left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), V> {
        match self.entries.entry(key) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Insert or replace an entry. A replaced entry keeps its original position.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get_mut(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Remove an entry, preserving the order of the remaining ones.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.shift_remove(key)
    }

    /// All values in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Hash + Eq, V> Default for OrderedRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
