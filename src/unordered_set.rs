//! Set containers over `HashTable`: `UnorderedSet` rejects duplicates,
//! `UnorderedMultiset` keeps them.

use crate::error::TableError;
use crate::hash_table::{Cursor, HashTable};
use crate::iter::{Iter, Range};
use crate::policy::{DefaultEq, Identity};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

type SetTable<T, S> = HashTable<T, Identity, S, DefaultEq>;

pub struct UnorderedSet<T, S = DefaultHashBuilder> {
    table: SetTable<T, S>,
}

impl<T> UnorderedSet<T> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_hasher(bucket_hint, DefaultHashBuilder::default())
    }
}

impl<T, S> UnorderedSet<T, S> {
    pub fn with_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_parts(bucket_hint, hasher, DefaultEq, Identity),
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

    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    /// The underlying engine, for bucket-level queries.
    pub fn as_table(&self) -> &SetTable<T, S> {
        &self.table
    }
}

impl<T, S> UnorderedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds `value`; returns `false` if an equal value was already present.
    pub fn insert(&mut self, value: T) -> Result<bool, TableError> {
        self.table.insert_unique(value).map(|(_, inserted)| inserted)
    }

    /// Inserts every value, returning how many were new.
    pub fn insert_iter<I>(&mut self, iter: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        self.table.insert_unique_iter(iter)
    }

    fn locate<Q>(&self, q: &Q) -> Cursor
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table
            .find_with(self.table.hash_key(q), |v| v.borrow() == q)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.locate(value).is_end()
    }

    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get(self.locate(value))
    }

    /// Removes `value`; returns whether it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self.locate(value);
        self.table.erase_at(at).is_some()
    }
}

impl<T> Default for UnorderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, S: Clone> Clone for UnorderedSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T: PartialEq, S> PartialEq for UnorderedSet<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<T: fmt::Debug, S> fmt::Debug for UnorderedSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<'a, T, S> IntoIterator for &'a UnorderedSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub struct UnorderedMultiset<T, S = DefaultHashBuilder> {
    table: SetTable<T, S>,
}

impl<T> UnorderedMultiset<T> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_hasher(bucket_hint, DefaultHashBuilder::default())
    }
}

impl<T, S> UnorderedMultiset<T, S> {
    pub fn with_hasher(bucket_hint: usize, hasher: S) -> Self {
        Self {
            table: HashTable::with_parts(bucket_hint, hasher, DefaultEq, Identity),
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

    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    pub fn as_table(&self) -> &SetTable<T, S> {
        &self.table
    }
}

impl<T, S> UnorderedMultiset<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    pub fn insert(&mut self, value: T) -> Result<(), TableError> {
        self.table.insert_equal(value).map(|_| ())
    }

    pub fn insert_iter<I>(&mut self, iter: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        self.table.insert_equal_iter(iter)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self
            .table
            .find_with(self.table.hash_key(value), |v| v.borrow() == value)
            .is_end()
    }

    pub fn count<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table
            .count_with(self.table.hash_key(value), |v| v.borrow() == value)
    }

    /// Every stored copy equal to `value`.
    pub fn get_all<Q>(&self, value: &Q) -> Range<'_, T, Identity, S, DefaultEq>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (first, last) = self
            .table
            .equal_range_with(self.table.hash_key(value), |v| v.borrow() == value);
        self.table.range(first, last)
    }

    /// Removes every copy of `value`, returning how many went.
    pub fn remove<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.table.hash_key(value);
        self.table.erase_with(hash, |v| v.borrow() == value)
    }

    /// Removes a single copy of `value`.
    pub fn remove_one<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let at = self
            .table
            .find_with(self.table.hash_key(value), |v| v.borrow() == value);
        self.table.erase_at(at).is_some()
    }
}

impl<T> Default for UnorderedMultiset<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, S: Clone> Clone for UnorderedMultiset<T, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T: PartialEq, S> PartialEq for UnorderedMultiset<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<T: fmt::Debug, S> fmt::Debug for UnorderedMultiset<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<'a, T, S> IntoIterator for &'a UnorderedMultiset<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
