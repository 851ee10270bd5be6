// Sharded concurrent map.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, ConfigTrait};
use crate::hasher::{EncoderPool, KeyHasher, ShardKey};

use super::shard::Shard;

/// Number of shards used when none (or zero) is requested.
pub const DEFAULT_SHARDS: usize = 64;

/// Map is a concurrent map partitioned into independently locked shards.
///
/// Single-key operations lock exactly one shard. Whole-map operations
/// ([`len`](Self::len), [`range`](Self::range), [`reset`](Self::reset)) visit
/// shards one at a time, so they never observe a global snapshot: shards
/// already visited may change behind them, shards not yet visited reflect
/// writes made in the meantime. Callers that need a consistent view must
/// stop writers themselves.
pub struct ShardedMap<K, V> {
    hasher: KeyHasher,
    shards: Box<[Shard<K, V>]>,
}

impl<K, V> ShardedMap<K, V>
where
    K: Eq + Hash + ShardKey,
{
    /// Creates a map with [`DEFAULT_SHARDS`] shards.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Creates a map with `shards` shards; `0` falls back to the default.
    pub fn with_shards(shards: usize) -> Self {
        Self::with_hasher(shards, KeyHasher::new())
    }

    /// Creates a map that routes keys with the given hasher.
    pub fn with_hasher(shards: usize, hasher: KeyHasher) -> Self {
        let count = if shards == 0 { DEFAULT_SHARDS } else { shards };
        let shards: Box<[Shard<K, V>]> = (0..count).map(Shard::new).collect();

        debug!(
            component = "map",
            event = "created",
            shards = count,
            "sharded map created"
        );

        Self { hasher, shards }
    }

    /// Creates a map from the `map` and `pool` config sections.
    /// A non-positive shard count falls back to the default.
    pub fn from_config(cfg: &Config) -> Self {
        let requested = cfg.map().shards;
        let shards = match usize::try_from(requested) {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(
                    component = "map",
                    event = "shards_fallback",
                    requested,
                    fallback = DEFAULT_SHARDS,
                    "non-positive shard count configured, using default"
                );
                DEFAULT_SHARDS
            }
        };

        let pool = cfg.pool();
        let pool = Arc::new(EncoderPool::new(pool.capacity(), pool.max_buffer_size));
        Self::with_hasher(shards, KeyHasher::with_pool(pool))
    }

    /// Gets the number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn hasher(&self) -> &KeyHasher {
        &self.hasher
    }

    /// Gets the shard for a given key.
    pub fn shard<Q>(&self, key: &Q) -> &Shard<K, V>
    where
        Q: ShardKey + ?Sized,
    {
        &self.shards[self.hasher.shard_index(key, self.shards.len())]
    }

    /// Gets a clone of the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ShardKey + ?Sized,
        V: Clone,
    {
        self.shard(key).get(key)
    }

    /// Gets the value stored under `key`, or `V::default()` and `false` on a miss.
    pub fn get_or_default<Q>(&self, key: &Q) -> (V, bool)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ShardKey + ?Sized,
        V: Clone + Default,
    {
        match self.get(key) {
            Some(value) => (value, true),
            None => (V::default(), false),
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ShardKey + ?Sized,
    {
        self.shard(key).contains_key(key)
    }

    /// Sets or overwrites the value for `key`.
    pub fn set(&self, key: K, value: V) {
        self.shard(&key).set(key, value);
    }

    /// Returns the existing value for `key`, or stores and returns `default`.
    ///
    /// The check and the insert run under a single shard write lock, so no
    /// other writer can slip in between. When the key already exists the
    /// stored value is returned and `default` is dropped.
    pub fn get_or_set(&self, key: K, default: V) -> V
    where
        V: Clone,
    {
        self.shard(&key).get_or_insert_with(key, || default)
    }

    /// Like [`get_or_set`](Self::get_or_set), building the default only when needed.
    pub fn get_or_set_with<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> V,
        V: Clone,
    {
        self.shard(&key).get_or_insert_with(key, make)
    }

    /// Removes `key`, returning its value if it was present.
    pub fn del<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ShardKey + ?Sized,
    {
        self.shard(key).remove(key)
    }

    /// Empties every shard, one shard lock at a time.
    pub fn reset(&self) {
        let mut removed = 0;
        for shard in self.shards.iter() {
            removed += shard.clear();
        }

        debug!(
            component = "map",
            event = "reset",
            removed,
            "sharded map reset"
        );
    }

    /// Counts entries shard by shard.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(Shard::is_empty)
    }

    /// Calls `visit` for every entry, shard by shard in index order and in
    /// arbitrary order within a shard. Stops as soon as `visit` returns false.
    ///
    /// `visit` runs while its shard's read lock is held; writing to the same
    /// shard from inside it deadlocks.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        for shard in self.shards.iter() {
            if !shard.walk_r(&mut visit) {
                return;
            }
        }
    }
}

impl<K, V> Default for ShardedMap<K, V>
where
    K: Eq + Hash + ShardKey,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for ShardedMap<K, V>
where
    K: Eq + Hash + ShardKey,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shards", &self.shard_count())
            .field("len", &self.len())
            .finish()
    }
}

impl<K, V> Extend<(K, V)> for ShardedMap<K, V>
where
    K: Eq + Hash + ShardKey,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ShardedMap<K, V>
where
    K: Eq + Hash + ShardKey,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}
