//! Concurrent key-value map that spreads keys over independently locked
//! shards to cut lock contention.
//!
//! ```
//! use safemap::ShardedMap;
//!
//! let m: ShardedMap<String, String> = ShardedMap::new();
//! assert_eq!(m.get_or_set("a".to_string(), "b".to_string()), "b");
//! assert_eq!(m.get("a"), Some("b".to_string()));
//! ```

#[cfg(test)]
mod tests;

pub mod config;
pub mod hasher;
pub mod map;

pub use hasher::{HashError, KeyHasher, KeyId, ShardKey};
pub use map::{ShardedMap, DEFAULT_SHARDS};
