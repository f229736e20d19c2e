//! Map containers over `HashTable<(K, V), PairKey>`: `UnorderedMap` keeps one
//! value per key, `UnorderedMultimap` keeps any number.

use crate::error::TableError;
use crate::hash_table::{Cursor, HashTable};
use crate::policy::{DefaultEq, PairKey};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

type MapTable<K, V, S> = HashTable<(K, V), PairKey, S, DefaultEq>;

pub struct UnorderedMap<K, V, S = DefaultHashBuilder> {
    table: MapTable<K, V, S>,
}

impl<K, V> UnorderedMap<K, V> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_hasher(bucket_hint, DefaultHashBuilder::default())
    }
}

impl<K, V, S> UnorderedMap<K, V, S> {
    pub fn with_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_parts(bucket_hint, hasher, DefaultEq, PairKey),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.table.reserve(additional)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.table.iter_mut().map(|pair| (&pair.0, &mut pair.1))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.table.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.table.iter().map(|(_, v)| v)
    }

    pub fn as_table(&self) -> &MapTable<K, V, S> {
        &self.table
    }
}

impl<K, V, S> UnorderedMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts `key -> value` unless `key` is already mapped, in which case
    /// the stored value is left alone and `false` is returned.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool, TableError> {
        self.table
            .insert_unique((key, value))
            .map(|(_, inserted)| inserted)
    }

    fn locate<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table
            .find_with(self.table.hash_key(q), |(k, _)| k.borrow() == q)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.locate(key).is_end()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(self.locate(key)).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self.locate(key);
        self.table.get_mut(at).map(|(_, v)| v)
    }

    /// Value for `key`, inserting `default()` first if the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> Result<&mut V, TableError>
    where
        F: FnOnce() -> V,
    {
        let mut at = self.table.find(&key);
        if at.is_end() {
            at = self.table.insert_unique((key, default()))?.0;
        }
        let (_, v) = self
            .table
            .get_mut(at)
            .expect("entry must exist after find or successful insert");
        Ok(v)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self.locate(key);
        self.table.erase_at(at).map(|(_, v)| v)
    }
}

impl<K, V> Default for UnorderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for UnorderedMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for UnorderedMap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for UnorderedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

pub struct UnorderedMultimap<K, V, S = DefaultHashBuilder> {
    table: MapTable<K, V, S>,
}

impl<K, V> UnorderedMultimap<K, V> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_hasher(bucket_hint, DefaultHashBuilder::default())
    }
}

impl<K, V, S> UnorderedMultimap<K, V, S> {
    pub fn with_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_parts(bucket_hint, hasher, DefaultEq, PairKey),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.table.iter().map(|(k, v)| (k, v))
    }

    pub fn as_table(&self) -> &MapTable<K, V, S> {
        &self.table
    }
}

impl<K, V, S> UnorderedMultimap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    pub fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.table.insert_equal((key, value)).map(|_| ())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.count(key) > 0
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table
            .count_with(self.table.hash_key(key), |(k, _)| k.borrow() == key)
    }

    /// Every value mapped from `key`.
    pub fn get_all<Q>(&self, key: &Q) -> impl Iterator<Item = &V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (first, last) = self
            .table
            .equal_range_with(self.table.hash_key(key), |(k, _)| k.borrow() == key);
        self.table.range(first, last).map(|(_, v)| v)
    }

    /// Removes every mapping for `key`, returning how many went.
    pub fn remove<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.table.hash_key(key);
        self.table.erase_with(hash, |(k, _)| k.borrow() == key)
    }
}

impl<K, V> Default for UnorderedMultimap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for UnorderedMultimap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for UnorderedMultimap<K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for UnorderedMultimap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
