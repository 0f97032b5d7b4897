//! Key hashing for vector-index point identifiers.
//!
//! Qdrant point ids are numeric; fragment keys are strings. A key's point
//! id is the first 64 bits of its BLAKE3 hash, which makes `insert` an
//! upsert: re-ingesting a key maps to the same point and overwrites it.

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// 64 bits keeps the collision probability negligible at realistic
/// per-partition sizes (birthday bound ~4.3 billion entries), and a
/// collision only overwrites a vector within one user's partition rather
/// than corrupting unrelated data.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Derives the stable point id for a fragment key.
#[inline]
pub fn point_id_for_key(key: &str) -> u64 {
    hash_to_u64(key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_deterministic() {
        assert_eq!(
            point_id_for_key("alice/notes.txt"),
            point_id_for_key("alice/notes.txt")
        );
    }

    #[test]
    fn test_distinct_keys_get_distinct_ids() {
        assert_ne!(
            point_id_for_key("alice/notes.txt"),
            point_id_for_key("alice/notes2.txt")
        );
        assert_ne!(
            point_id_for_key("alice/notes.txt"),
            point_id_for_key("bob/notes.txt")
        );
    }

    #[test]
    fn test_hash_to_u64_uses_leading_bytes() {
        let full = blake3::hash(b"sample");
        let expected = u64::from_le_bytes(full.as_bytes()[0..8].try_into().unwrap());
        assert_eq!(hash_to_u64(b"sample"), expected);
    }
}
