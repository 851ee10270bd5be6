//! Key hashing for shard selection.
//!
//! Every key is reduced to a `u32`; the map picks a shard with
//! `hash % shard_count`. The strategy is chosen per key type through
//! [`ShardKey`]: numbers are cast, text and bytes go through CRC-32,
//! [`KeyId`] types supply their own identity, and structured keys are
//! encoded with bincode into a pooled buffer and hashed with FNV-1a.

pub mod key;
pub mod pool;

#[cfg(test)]
mod hasher_test;

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

pub use key::{KeyId, ShardKey};
pub use pool::{EncoderPool, PoolStats, PooledBuffer};

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Errors produced while hashing a key.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The key's `Serialize` impl refused to encode it.
    #[error("failed to encode key: {0}")]
    Encode(#[from] bincode::Error),
}

/// Computes shard-selection hashes. Cheap to clone; clones share the pool.
#[derive(Debug, Clone, Default)]
pub struct KeyHasher {
    pool: Arc<EncoderPool>,
}

impl KeyHasher {
    /// Creates a hasher with its own default-sized pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hasher that checks scratch buffers out of `pool`.
    pub fn with_pool(pool: Arc<EncoderPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<EncoderPool> {
        &self.pool
    }

    /// Hashes any supported key.
    #[inline]
    pub fn hash<K: ShardKey + ?Sized>(&self, key: &K) -> u32 {
        key.shard_hash(self)
    }

    /// CRC-32/IEEE over raw bytes.
    #[inline]
    pub fn hash_bytes(&self, bytes: &[u8]) -> u32 {
        crc32fast::hash(bytes)
    }

    /// Encodes `key` with bincode and hashes the encoding with FNV-1a.
    ///
    /// A key whose `Serialize` impl fails is a caller bug; this logs it and
    /// hashes whatever was encoded before the failure, which is still
    /// deterministic for a given value.
    pub fn hash_encoded<T: Serialize + ?Sized>(&self, key: &T) -> u32 {
        let mut buf = self.pool.acquire();
        if let Err(err) = bincode::serialize_into(&mut *buf, key) {
            warn!(
                component = "hasher",
                event = "encode_failed",
                key_type = std::any::type_name::<T>(),
                error = %err,
                "key encoding failed, hashing partial encoding"
            );
        }
        fnv32(&buf)
    }

    /// Like [`hash_encoded`](Self::hash_encoded), but reports encoding failures.
    pub fn try_hash_encoded<T: Serialize + ?Sized>(&self, key: &T) -> Result<u32, HashError> {
        let mut buf = self.pool.acquire();
        bincode::serialize_into(&mut *buf, key)?;
        Ok(fnv32(&buf))
    }

    /// Shard index for `key` among `shard_count` shards.
    #[inline]
    pub fn shard_index<K: ShardKey + ?Sized>(&self, key: &K, shard_count: usize) -> usize {
        self.hash(key) as usize % shard_count.max(1)
    }
}

/// FNV-1a, 32-bit.
#[inline]
pub fn fnv32(data: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
    }
    hash
}
