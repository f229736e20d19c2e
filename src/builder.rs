//! Construction-time configuration for `HashTable`.

use crate::hash_table::HashTable;
use crate::policy::{DefaultEq, Identity};
use hashbrown::hash_map::DefaultHashBuilder;

/// Collects the bucket hint and the three policies, then builds a table.
///
/// ```
/// use chained_hashtable::{HashTableBuilder, PairKey};
///
/// let mut t = HashTableBuilder::new()
///     .buckets(100)
///     .key_extract(PairKey)
///     .build::<(u32, &str)>();
/// t.insert_unique((1, "one")).unwrap();
/// assert_eq!(t.bucket_count(), 193);
/// ```
#[derive(Clone, Debug)]
pub struct HashTableBuilder<X = Identity, S = DefaultHashBuilder, E = DefaultEq> {
    bucket_hint: usize,
    extract: X,
    hasher: S,
    key_eq: E,
}

impl HashTableBuilder {
    pub fn new() -> Self {
        Self {
            bucket_hint: 0,
            extract: Identity,
            hasher: DefaultHashBuilder::default(),
            key_eq: DefaultEq,
        }
    }
}

impl Default for HashTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<X, S, E> HashTableBuilder<X, S, E> {
    /// Initial bucket count hint; rounded up to the next listed prime.
    pub fn buckets(mut self, hint: usize) -> Self {
        self.bucket_hint = hint;
        self
    }

    pub fn hasher<S2>(self, hasher: S2) -> HashTableBuilder<X, S2, E> {
        HashTableBuilder {
            bucket_hint: self.bucket_hint,
            extract: self.extract,
            hasher,
            key_eq: self.key_eq,
        }
    }

    pub fn key_eq<E2>(self, key_eq: E2) -> HashTableBuilder<X, S, E2> {
        HashTableBuilder {
            bucket_hint: self.bucket_hint,
            extract: self.extract,
            hasher: self.hasher,
            key_eq,
        }
    }

    pub fn key_extract<X2>(self, extract: X2) -> HashTableBuilder<X2, S, E> {
        HashTableBuilder {
            bucket_hint: self.bucket_hint,
            extract,
            hasher: self.hasher,
            key_eq: self.key_eq,
        }
    }

    pub fn build<T>(self) -> HashTable<T, X, S, E> {
        HashTable::with_parts(self.bucket_hint, self.hasher, self.key_eq, self.extract)
    }
}
