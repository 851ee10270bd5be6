//! Sharded concurrent map: N independent `RwLock<HashMap>` shards, with each
//! key routed to one shard by its [`KeyHasher`](crate::hasher::KeyHasher) hash.

pub mod map;
pub mod shard;


// Re-export main types
pub use map::{ShardedMap, DEFAULT_SHARDS};
pub use shard::Shard;
