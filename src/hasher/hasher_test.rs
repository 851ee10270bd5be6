//! Tests for key hashing strategies.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Serialize, Serializer};

    use crate::hasher::{fnv32, EncoderPool, HashError, KeyHasher, KeyId};

    #[derive(PartialEq, Eq, Hash)]
    struct Tenant(u32);

    impl KeyId for Tenant {
        fn key_id(&self) -> u32 {
            self.0.rotate_left(7)
        }
    }

    crate::shard_key_by_id!(Tenant);

    #[derive(Serialize, PartialEq, Eq, Hash)]
    struct Composite {
        region: String,
        id: u64,
    }

    crate::shard_key_by_encoding!(Composite);

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not encodable"))
        }
    }

    #[test]
    fn test_fnv32_reference_values() {
        assert_eq!(fnv32(b""), 0x811c_9dc5);
        assert_eq!(fnv32(b"a"), 0xe40c_292c);
        assert_eq!(fnv32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_integers_cast_to_u32() {
        let h = KeyHasher::new();
        assert_eq!(h.hash(&42u8), 42);
        assert_eq!(h.hash(&42i64), 42);
        assert_eq!(h.hash(&(u32::MAX as u64 + 6)), 5, "wide integers keep their low 32 bits");
        assert_eq!(h.hash(&-1i32), u32::MAX);
        assert_eq!(h.hash(&7usize), 7);
        assert_eq!(h.hash(&'A'), 65);
    }

    #[test]
    fn test_floats_truncate() {
        let h = KeyHasher::new();
        assert_eq!(h.hash(&3.9f64), 3);
        assert_eq!(h.hash(&12.0f32), 12);
        assert_eq!(h.hash(&f64::NAN), 0);
    }

    #[test]
    fn test_bool_maps_to_zero_or_one() {
        let h = KeyHasher::new();
        assert_eq!(h.hash(&true), 1);
        assert_eq!(h.hash(&false), 0);
    }

    #[test]
    fn test_text_and_bytes_use_crc32() {
        let h = KeyHasher::new();
        let expected = crc32fast::hash(b"hello");
        assert_eq!(h.hash("hello"), expected);
        assert_eq!(h.hash(&"hello".to_string()), expected);
        assert_eq!(h.hash(&b"hello"[..]), expected);
        assert_eq!(h.hash(&b"hello".to_vec()), expected);
        assert_eq!(h.hash(b"hello"), expected);
    }

    #[test]
    fn test_key_id_is_used_verbatim() {
        let h = KeyHasher::new();
        assert_eq!(h.hash(&Tenant(1)), 1u32.rotate_left(7));
    }

    #[test]
    fn test_structured_keys_hash_their_encoding() {
        let h = KeyHasher::new();
        let key = Composite {
            region: "eu".to_string(),
            id: 9,
        };

        let encoded = bincode::serialize(&key).unwrap();
        assert_eq!(h.hash(&key), fnv32(&encoded));

        let same = Composite {
            region: "eu".to_string(),
            id: 9,
        };
        assert_eq!(h.hash(&key), h.hash(&same));
    }

    #[test]
    fn test_tuples_and_options_use_encoding() {
        let h = KeyHasher::new();
        let tuple = ("a", 1u16);
        assert_eq!(h.hash(&tuple), fnv32(&bincode::serialize(&tuple).unwrap()));

        let none: Option<u8> = None;
        assert_ne!(h.hash(&Some(0u8)), h.hash(&none));
    }

    #[test]
    fn test_encoding_reuses_pooled_buffers() {
        let pool = Arc::new(EncoderPool::new(1, 1024));
        let h = KeyHasher::with_pool(Arc::clone(&pool));

        for id in 0..10u64 {
            h.hash(&("key", id));
        }

        let stats = pool.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 9);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_clones_share_pool() {
        let h = KeyHasher::new();
        let other = h.clone();
        assert!(Arc::ptr_eq(h.pool(), other.pool()));
    }

    #[test]
    fn test_encode_failure_is_reported_and_buffer_returned() {
        let pool = Arc::new(EncoderPool::new(2, 1024));
        let h = KeyHasher::with_pool(Arc::clone(&pool));

        assert!(matches!(h.try_hash_encoded(&Unencodable), Err(HashError::Encode(_))));
        assert_eq!(pool.idle(), 1);

        // The infallible path stays deterministic.
        assert_eq!(h.hash_encoded(&Unencodable), h.hash_encoded(&Unencodable));
        assert_eq!(h.hash_encoded(&Unencodable), fnv32(b""));
    }

    #[test]
    fn test_shard_index_in_range() {
        let h = KeyHasher::new();
        for i in 0..1000u32 {
            assert!(h.shard_index(&i, 64) < 64);
        }
        assert_eq!(h.shard_index(&130u32, 64), 2);
        assert_eq!(h.shard_index("anything", 0), 0);
    }
}
