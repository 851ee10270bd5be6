// Shard: one lock-guarded partition of the map.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

/// Shard is an independent segment of the sharded map.
///
/// The inner map is only touched through the shard's own lock, and no
/// method holds it after returning.
pub struct Shard<K, V> {
    pub(crate) data: RwLock<HashMap<K, V>>,
    id: usize,
}

impl<K, V> Shard<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new shard.
    pub fn new(id: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            id,
        }
    }

    /// Gets the shard ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Gets the number of items.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Gets a value by key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.data.read().get(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.data.read().contains_key(key)
    }

    /// Sets or updates a key-value pair.
    /// Returns the replaced value, if any.
    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Returns the stored value, inserting the one built by `make` if absent.
    /// Presence check and insert happen under one write lock.
    pub fn get_or_insert_with<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> V,
        V: Clone,
    {
        self.data.write().entry(key).or_insert_with(make).clone()
    }

    /// Removes a key and returns its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.data.write().remove(key)
    }

    /// Replaces the contents with an empty map.
    /// Returns the number of items removed.
    pub fn clear(&self) -> usize {
        let old = std::mem::take(&mut *self.data.write());
        // Drop the old entries after the lock is released.
        old.len()
    }

    /// Walks over items with a read lock.
    /// Returns false if `f` asked to stop.
    pub fn walk_r<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&K, &V) -> bool,
    {
        let data = self.data.read();
        for (k, v) in data.iter() {
            if !f(k, v) {
                return false;
            }
        }
        true
    }
}
