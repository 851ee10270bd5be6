// Per-type hashing strategies.

use serde::Serialize;

use super::KeyHasher;

/// A key the map knows how to route to a shard.
///
/// The hash must be deterministic for equal keys within one process. When a
/// map key `K` is looked up through a borrowed form `Q` (`K: Borrow<Q>`),
/// `Q::shard_hash` must return the same value as `K::shard_hash`, just as
/// `Hash` must agree across `Borrow`.
///
/// Keys hashed through their encoding ([`shard_key_by_encoding!`]) are
/// routed by their serialized bytes, so equal keys must serialize
/// identically. Types whose encoding depends on more than their value
/// (a `HashMap` field, for instance) are not suitable keys for that path.
///
/// [`shard_key_by_encoding!`]: crate::shard_key_by_encoding
pub trait ShardKey {
    fn shard_hash(&self, hasher: &KeyHasher) -> u32;
}

/// Capability for keys that carry their own shard identity.
///
/// Implement this and register the type with [`shard_key_by_id!`] to bypass
/// generic hashing entirely.
///
/// [`shard_key_by_id!`]: crate::shard_key_by_id
pub trait KeyId {
    fn key_id(&self) -> u32;
}

/// Routes a [`KeyId`] type by its own identity.
///
/// ```
/// use safemap::{shard_key_by_id, KeyId, ShardedMap};
///
/// #[derive(PartialEq, Eq, Hash)]
/// struct UserId(u64);
///
/// impl KeyId for UserId {
///     fn key_id(&self) -> u32 {
///         (self.0 >> 8) as u32
///     }
/// }
///
/// shard_key_by_id!(UserId);
///
/// let map = ShardedMap::new();
/// map.set(UserId(7), "seven");
/// assert_eq!(map.get(&UserId(7)), Some("seven"));
/// ```
#[macro_export]
macro_rules! shard_key_by_id {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::hasher::ShardKey for $ty {
                #[inline]
                fn shard_hash(&self, _hasher: &$crate::hasher::KeyHasher) -> u32 {
                    $crate::hasher::KeyId::key_id(self)
                }
            }
        )+
    };
}

/// Routes a `serde::Serialize` type by its bincode encoding.
///
/// ```
/// use safemap::{shard_key_by_encoding, ShardedMap};
/// use serde::Serialize;
///
/// #[derive(Serialize, PartialEq, Eq, Hash)]
/// struct Route {
///     method: String,
///     path: String,
/// }
///
/// shard_key_by_encoding!(Route);
///
/// let map = ShardedMap::new();
/// let key = Route { method: "GET".into(), path: "/".into() };
/// map.set(key, 200u16);
/// assert_eq!(map.len(), 1);
/// ```
#[macro_export]
macro_rules! shard_key_by_encoding {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::hasher::ShardKey for $ty {
                #[inline]
                fn shard_hash(&self, hasher: &$crate::hasher::KeyHasher) -> u32 {
                    hasher.hash_encoded(self)
                }
            }
        )+
    };
}

macro_rules! cast_key {
    ($($ty:ty),+) => {
        $(
            impl ShardKey for $ty {
                #[inline]
                fn shard_hash(&self, _hasher: &KeyHasher) -> u32 {
                    *self as u32
                }
            }
        )+
    };
}

cast_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, char);

impl ShardKey for bool {
    #[inline]
    fn shard_hash(&self, _hasher: &KeyHasher) -> u32 {
        u32::from(*self)
    }
}

impl ShardKey for str {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_bytes(self.as_bytes())
    }
}

impl ShardKey for String {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_bytes(self.as_bytes())
    }
}

impl ShardKey for [u8] {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_bytes(self)
    }
}

impl ShardKey for Vec<u8> {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_bytes(self)
    }
}

impl<const N: usize> ShardKey for [u8; N] {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_bytes(self)
    }
}

impl<T: ShardKey + ?Sized> ShardKey for &T {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        (**self).shard_hash(hasher)
    }
}

impl<T: Serialize> ShardKey for Option<T> {
    #[inline]
    fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
        hasher.hash_encoded(self)
    }
}

macro_rules! encoded_tuple_key {
    ($(($($name:ident),+)),+) => {
        $(
            impl<$($name: Serialize),+> ShardKey for ($($name,)+) {
                #[inline]
                fn shard_hash(&self, hasher: &KeyHasher) -> u32 {
                    hasher.hash_encoded(self)
                }
            }
        )+
    };
}

encoded_tuple_key!((A, B), (A, B, C), (A, B, C, D));
