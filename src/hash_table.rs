//! HashTable: separate-chaining engine with prime-sized buckets and cursors.

use crate::error::TableError;
use crate::iter::{IntoIter, Iter, IterMut, Range};
use crate::policy::{DefaultEq, Identity, KeyEq, KeyExtract};
use crate::primes;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Arena index of a chain node.
    pub(crate) struct NodeKey;
}

/// Upper bound on live nodes imposed by the arena's 32-bit slot indices.
pub const MAX_NODES: usize = (u32::MAX - 1) as usize;

#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) value: T,
    // Full hash of the key, taken once at insertion.
    pub(crate) hash: u64,
    pub(crate) next: Option<NodeKey>,
}

/// Position inside a [`HashTable`]: either a node or the end.
///
/// A cursor is a plain value and does not borrow the table. It is resolved
/// against the table it came from; after the node it names is erased it
/// resolves to `None` and never aliases a later node. Resolving a cursor
/// against a different table is a caller error with unspecified results.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    node: Option<NodeKey>,
}

impl Cursor {
    pub(crate) fn at(k: NodeKey) -> Self {
        Cursor { node: Some(k) }
    }

    pub(crate) fn from_node(node: Option<NodeKey>) -> Self {
        Cursor { node }
    }

    pub(crate) fn node(&self) -> Option<NodeKey> {
        self.node
    }

    /// The past-the-end position shared by every table.
    pub const fn end() -> Self {
        Cursor { node: None }
    }

    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    pub fn get<'a, T, X, S, E>(&self, table: &'a HashTable<T, X, S, E>) -> Option<&'a T> {
        table.get(*self)
    }
}

/// Which duplicate-key discipline an insertion follows.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InsertMode {
    /// Reject the value if an equivalent key is present.
    Unique,
    /// Always insert, next to any equivalent key already in the chain.
    Equal,
}

/// Separate-chaining hash table.
///
/// `T` is the stored value, `X` borrows the key out of it, `S` hashes keys and
/// `E` compares them. The bucket count is always a member of
/// [`primes::PRIME_LIST`] and never shrinks on its own.
pub struct HashTable<T, X = Identity, S = DefaultHashBuilder, E = DefaultEq> {
    buckets: Vec<Option<NodeKey>>,
    nodes: SlotMap<NodeKey, Node<T>>,
    extract: X,
    hasher: S,
    key_eq: E,
    node_limit: usize,
}

impl<T> HashTable<T> {
    pub fn new() -> Self {
        Self::with_buckets(0)
    }

    pub fn with_buckets(bucket_hint: usize) -> Self {
        Self::with_parts(
            bucket_hint,
            DefaultHashBuilder::default(),
            DefaultEq,
            Identity,
        )
    }
}

impl<T, X, S, E> Default for HashTable<T, X, S, E>
where
    X: Default,
    S: Default,
    E: Default,
{
    fn default() -> Self {
        Self::with_parts(0, S::default(), E::default(), X::default())
    }
}

struct ChainKeys<'a, T> {
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    cur: Option<NodeKey>,
}

impl<'a, T> Iterator for ChainKeys<'a, T> {
    type Item = NodeKey;

    #[inline]
    fn next(&mut self) -> Option<NodeKey> {
        let k = self.cur?;
        self.cur = self.nodes.get(k).and_then(|n| n.next);
        Some(k)
    }
}

// Unlinks and drops every node of the chain at `head` that carries `hash` and
// satisfies `eq`. Survivors keep their relative order.
fn erase_chain<T, F>(
    head: &mut Option<NodeKey>,
    nodes: &mut SlotMap<NodeKey, Node<T>>,
    hash: u64,
    mut eq: F,
) -> usize
where
    F: FnMut(&T) -> bool,
{
    let mut removed = 0;
    let mut prev: Option<NodeKey> = None;
    let mut cur = *head;
    while let Some(k) = cur {
        let node = &nodes[k];
        let next = node.next;
        if node.hash == hash && eq(&node.value) {
            match prev {
                Some(p) => nodes[p].next = next,
                None => *head = next,
            }
            nodes.remove(k);
            removed += 1;
        } else {
            prev = Some(k);
        }
        cur = next;
    }
    removed
}

// Structural operations: none of these call hashing or equality code.
impl<T, X, S, E> HashTable<T, X, S, E> {
    /// Builds an empty table whose bucket count is the smallest prime not
    /// less than `bucket_hint`.
    pub fn with_parts(bucket_hint: usize, hasher: S, key_eq: E, extract: X) -> Self {
        Self {
            buckets: vec![None; primes::next_prime(bucket_hint)],
            nodes: SlotMap::with_key(),
            extract,
            hasher,
            key_eq,
            node_limit: MAX_NODES,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn max_bucket_count(&self) -> usize {
        primes::MAX_BUCKETS
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.key_eq
    }

    pub fn key_extract(&self) -> &X {
        &self.extract
    }

    /// Number of nodes chained in bucket `n`.
    ///
    /// # Panics
    /// If `n >= bucket_count()`.
    pub fn elements_in_bucket(&self, n: usize) -> usize {
        self.chain(self.buckets[n]).count()
    }

    #[inline]
    fn index_for(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    fn chain(&self, head: Option<NodeKey>) -> ChainKeys<'_, T> {
        ChainKeys {
            nodes: &self.nodes,
            cur: head,
        }
    }

    /// Head of the first non-empty chain at or after bucket `start`.
    fn first_from(&self, start: usize) -> Option<NodeKey> {
        self.buckets.get(start..)?.iter().find_map(|head| *head)
    }

    pub fn begin(&self) -> Cursor {
        Cursor::from_node(self.first_from(0))
    }

    pub fn end(&self) -> Cursor {
        Cursor::end()
    }

    /// The position after `cursor`.
    ///
    /// Follows the chain if the node has a successor, otherwise scans forward
    /// from the node's own bucket for the next non-empty chain. The end
    /// cursor and stale cursors advance to the end.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        let Some(node) = cursor.node().and_then(|k| self.nodes.get(k)) else {
            return Cursor::end();
        };
        if let Some(next) = node.next {
            return Cursor::at(next);
        }
        let idx = self.index_for(node.hash);
        Cursor::from_node(self.first_from(idx + 1))
    }

    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        cursor
            .node()
            .and_then(|k| self.nodes.get(k))
            .map(|n| &n.value)
    }

    /// Mutable access to the value at `cursor`.
    ///
    /// Changing the value's key through this reference is a logic error: the
    /// node stays in the chain chosen by its original hash.
    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        cursor
            .node()
            .and_then(|k| self.nodes.get_mut(k))
            .map(|n| &mut n.value)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.buckets, &self.nodes)
    }

    /// Mutable traversal. The same key caveat as [`HashTable::get_mut`] applies.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self.nodes.iter_mut())
    }

    /// Values from `first` up to, not including, `last`.
    pub fn range(&self, first: Cursor, last: Cursor) -> Range<'_, T, X, S, E> {
        Range::new(self, first, last)
    }

    fn unlink(&mut self, idx: usize, prev: Option<NodeKey>, next: Option<NodeKey>) {
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.buckets[idx] = next,
        }
    }

    /// Removes the node at `cursor` and returns its value.
    ///
    /// Returns `None` for the end cursor and for cursors whose node is gone.
    /// Other cursors into the table stay valid.
    pub fn erase_at(&mut self, cursor: Cursor) -> Option<T> {
        let k = cursor.node()?;
        let idx = self.index_for(self.nodes.get(k)?.hash);
        let mut prev = None;
        let mut cur = self.buckets[idx];
        while let Some(c) = cur {
            let next = self.nodes[c].next;
            if c == k {
                self.unlink(idx, prev, next);
                return self.nodes.remove(k).map(|n| n.value);
            }
            prev = Some(c);
            cur = next;
        }
        None
    }

    /// Removes every node in `[first, last)` and returns how many went.
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> usize {
        let mut removed = 0;
        let mut cur = first;
        while cur != last && !cur.is_end() {
            let next = self.advance(cur);
            if self.erase_at(cur).is_none() {
                break;
            }
            removed += 1;
            cur = next;
        }
        removed
    }

    /// Drops every node. The bucket count is kept.
    pub fn clear(&mut self) {
        self.buckets.fill(None);
        self.nodes.clear();
    }

    /// Grows the bucket array if the prime selected for `hint` is larger than
    /// the current bucket count. Never shrinks.
    ///
    /// On error the table is untouched.
    pub fn resize(&mut self, hint: usize) -> Result<(), TableError> {
        let target = primes::next_prime(hint);
        if target > self.buckets.len() {
            self.rehash(target)?;
        }
        Ok(())
    }

    /// Makes room for `additional` more elements without rehashing.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.resize(self.len().saturating_add(additional))
    }

    // Relinks every node into a fresh array of `n` buckets. Only `next`
    // fields change; the old array is dropped after the swap.
    //
    // A run of equivalent keys is contiguous in its old chain and all of it
    // lands in one new chain, so pushing each node at the new head keeps the
    // run contiguous (in reverse order).
    fn rehash(&mut self, n: usize) -> Result<(), TableError> {
        let mut fresh: Vec<Option<NodeKey>> = Vec::new();
        fresh
            .try_reserve_exact(n)
            .map_err(|source| TableError::BucketAlloc { buckets: n, source })?;
        fresh.resize(n, None);

        for &head in &self.buckets {
            let mut cur = head;
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                let idx = (node.hash % n as u64) as usize;
                node.next = fresh[idx];
                fresh[idx] = Some(k);
            }
        }

        log::debug!(
            "rehash: {} -> {} buckets ({} nodes)",
            self.buckets.len(),
            n,
            self.nodes.len()
        );
        self.buckets = fresh;
        Ok(())
    }

    /// Exchanges the entire contents of two tables without touching nodes.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// First node in the chain for `hash` whose stored hash is `hash` and
    /// whose value satisfies `eq`, or the end cursor.
    ///
    /// This is the lookup primitive behind the keyed operations. Callers that
    /// query by a borrowed form of the key pass [`HashTable::hash_key`] of
    /// that form and a predicate comparing against it.
    pub fn find_with<F>(&self, hash: u64, mut eq: F) -> Cursor
    where
        F: FnMut(&T) -> bool,
    {
        let head = self.buckets[self.index_for(hash)];
        Cursor::from_node(self.chain(head).find(|&k| {
            let n = &self.nodes[k];
            n.hash == hash && eq(&n.value)
        }))
    }

    pub fn count_with<F>(&self, hash: u64, mut eq: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let head = self.buckets[self.index_for(hash)];
        self.chain(head)
            .filter(|&k| {
                let n = &self.nodes[k];
                n.hash == hash && eq(&n.value)
            })
            .count()
    }

    /// Bounds of the contiguous run matched by `hash` and `eq`.
    ///
    /// When the run ends its chain, the upper bound is the head of the next
    /// non-empty bucket after the run's own bucket, or the end cursor. No
    /// match yields `(end, end)`.
    pub fn equal_range_with<F>(&self, hash: u64, mut eq: F) -> (Cursor, Cursor)
    where
        F: FnMut(&T) -> bool,
    {
        let idx = self.index_for(hash);
        let mut hit = |k: NodeKey| {
            let n = &self.nodes[k];
            n.hash == hash && eq(&n.value)
        };
        let mut chain = self.chain(self.buckets[idx]);
        let Some(first) = chain.find(|&k| hit(k)) else {
            return (Cursor::end(), Cursor::end());
        };
        let upper = match chain.find(|&k| !hit(k)) {
            Some(k) => Some(k),
            None => self.first_from(idx + 1),
        };
        (Cursor::at(first), Cursor::from_node(upper))
    }

    /// Removes every node matched by `hash` and `eq`; returns how many went.
    pub fn erase_with<F>(&mut self, hash: u64, eq: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let idx = self.index_for(hash);
        erase_chain(&mut self.buckets[idx], &mut self.nodes, hash, eq)
    }
}

impl<T, X, S: BuildHasher, E> HashTable<T, X, S, E> {
    /// Hash of `q` under this table's hasher.
    ///
    /// A borrowed form of a key (`&str` for `String`) hashes the same as the
    /// key itself, so the result can be handed to the `*_with` lookups.
    pub fn hash_key<Q: ?Sized + Hash>(&self, q: &Q) -> u64 {
        self.hasher.hash_one(q)
    }
}

// Keyed operations: these call into the hasher and equality policies.
impl<T, X, S, E> HashTable<T, X, S, E>
where
    X: KeyExtract<T>,
    X::Key: Hash,
    S: BuildHasher,
    E: KeyEq<X::Key>,
{
    fn make_hash(&self, key: &X::Key) -> u64 {
        self.hash_key(key)
    }

    #[inline]
    fn key_of(&self, k: NodeKey) -> &X::Key {
        self.extract.key(&self.nodes[k].value)
    }

    #[inline]
    fn matches(&self, k: NodeKey, key: &X::Key) -> bool {
        self.key_eq.eq(self.key_of(k), key)
    }

    /// Index of the bucket `key` belongs to under the current bucket count.
    pub fn bucket(&self, key: &X::Key) -> usize {
        self.index_for(self.make_hash(key))
    }

    // Single-chain insertion. Touches one chain and the node count, never the
    // bucket array length.
    fn insert_no_resize(
        &mut self,
        value: T,
        mode: InsertMode,
    ) -> Result<(Cursor, bool), TableError> {
        let (hash, idx, equal_at) = {
            let key = self.extract.key(&value);
            let hash = self.make_hash(key);
            let idx = self.index_for(hash);
            let found = self
                .chain(self.buckets[idx])
                .find(|&k| self.matches(k, key));
            (hash, idx, found)
        };

        if let (InsertMode::Unique, Some(k)) = (mode, equal_at) {
            return Ok((Cursor::at(k), false));
        }
        if self.nodes.len() >= self.node_limit {
            return Err(TableError::NodeCapacity {
                limit: self.node_limit,
            });
        }

        let k = match equal_at {
            Some(prev) => {
                let next = self.nodes[prev].next;
                let k = self.nodes.insert(Node { value, hash, next });
                self.nodes[prev].next = Some(k);
                k
            }
            None => {
                let next = self.buckets[idx];
                let k = self.nodes.insert(Node { value, hash, next });
                self.buckets[idx] = Some(k);
                k
            }
        };
        Ok((Cursor::at(k), true))
    }

    /// Grows for one more element if needed, then inserts under `mode`.
    ///
    /// Returns the cursor of the new node, or of the existing equivalent node
    /// with `false` when `mode` is [`InsertMode::Unique`] and the key is taken.
    pub fn insert(&mut self, value: T, mode: InsertMode) -> Result<(Cursor, bool), TableError> {
        self.reserve(1)?;
        self.insert_no_resize(value, mode)
    }

    pub fn insert_unique(&mut self, value: T) -> Result<(Cursor, bool), TableError> {
        self.insert(value, InsertMode::Unique)
    }

    pub fn insert_equal(&mut self, value: T) -> Result<Cursor, TableError> {
        self.insert(value, InsertMode::Equal).map(|(c, _)| c)
    }

    /// Inserts every value of `iter` under `mode`, growing once up front for
    /// the iterator's lower size bound. Returns how many were inserted.
    ///
    /// On error, values inserted before the failure stay in the table.
    pub fn insert_iter<I>(&mut self, iter: I, mode: InsertMode) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0)?;
        let mut inserted = 0;
        for value in iter {
            if self.insert(value, mode)?.1 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    pub fn insert_unique_iter<I>(&mut self, iter: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_iter(iter, InsertMode::Unique)
    }

    pub fn insert_equal_iter<I>(&mut self, iter: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        self.insert_iter(iter, InsertMode::Equal)
    }

    /// First node whose key is equivalent to `key`, or the end cursor.
    pub fn find(&self, key: &X::Key) -> Cursor {
        self.find_with(self.make_hash(key), |v| {
            self.key_eq.eq(self.extract.key(v), key)
        })
    }

    pub fn contains(&self, key: &X::Key) -> bool {
        !self.find(key).is_end()
    }

    pub fn count(&self, key: &X::Key) -> usize {
        self.count_with(self.make_hash(key), |v| {
            self.key_eq.eq(self.extract.key(v), key)
        })
    }

    /// Bounds of the contiguous run of nodes equivalent to `key`.
    ///
    /// See [`HashTable::equal_range_with`] for the upper bound at a chain end.
    pub fn equal_range(&self, key: &X::Key) -> (Cursor, Cursor) {
        self.equal_range_with(self.make_hash(key), |v| {
            self.key_eq.eq(self.extract.key(v), key)
        })
    }

    /// Removes every node equivalent to `key` and returns how many went.
    pub fn erase(&mut self, key: &X::Key) -> usize {
        let hash = self.make_hash(key);
        let idx = self.index_for(hash);
        let (extract, key_eq) = (&self.extract, &self.key_eq);
        erase_chain(&mut self.buckets[idx], &mut self.nodes, hash, |v| {
            key_eq.eq(extract.key(v), key)
        })
    }
}

impl<T: Clone, X: Clone, S: Clone, E: Clone> Clone for HashTable<T, X, S, E> {
    // Cloning the arena keeps every slot key, so the cloned bucket heads and
    // links point at the cloned nodes.
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            nodes: self.nodes.clone(),
            extract: self.extract.clone(),
            hasher: self.hasher.clone(),
            key_eq: self.key_eq.clone(),
            node_limit: self.node_limit,
        }
    }
}

/// Equal when both tables have the same bucket count and each pair of
/// same-index chains holds the same values, in any order.
impl<T: PartialEq, X, S, E> PartialEq for HashTable<T, X, S, E> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() || self.bucket_count() != other.bucket_count() {
            return false;
        }
        self.buckets
            .iter()
            .zip(other.buckets.iter())
            .all(|(&a, &b)| {
                let mut rest: Vec<&T> = other.chain(b).map(|k| &other.nodes[k].value).collect();
                for k in self.chain(a) {
                    let v = &self.nodes[k].value;
                    match rest.iter().position(|w| *w == v) {
                        Some(i) => {
                            rest.swap_remove(i);
                        }
                        None => return false,
                    }
                }
                rest.is_empty()
            })
    }
}

impl<T: Eq, X, S, E> Eq for HashTable<T, X, S, E> {}

impl<T: fmt::Debug, X, S, E> fmt::Debug for HashTable<T, X, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T, X, S, E> IntoIterator for &'a HashTable<T, X, S, E> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, X, S, E> IntoIterator for &'a mut HashTable<T, X, S, E> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T, X, S, E> IntoIterator for HashTable<T, X, S, E> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self.nodes.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PairKey;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        // every key lands in bucket 0
        fn finish(&self) -> u64 {
            0
        }
    }

    // Hashes a u64 key to itself so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    #[derive(Default)]
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    fn placed() -> HashTable<u64, Identity, IdentityBuildHasher> {
        HashTable::with_parts(0, IdentityBuildHasher, DefaultEq, Identity)
    }

    fn collide() -> HashTable<String, Identity, ConstBuildHasher> {
        HashTable::with_parts(0, ConstBuildHasher, DefaultEq, Identity)
    }

    /// Invariant: distinct unique-mode insertions are all counted and findable.
    #[test]
    fn unique_inserts_are_findable() {
        let mut t: HashTable<String> = HashTable::new();
        for k in ["a", "b", "c", "d"] {
            let (c, inserted) = t.insert_unique(k.to_string()).unwrap();
            assert!(inserted);
            assert_eq!(c.get(&t).map(String::as_str), Some(k));
        }
        assert_eq!(t.len(), 4);
        for k in ["a", "b", "c", "d"] {
            assert_eq!(t.get(t.find(&k.to_string())).map(String::as_str), Some(k));
        }
        assert!(t.find(&"z".to_string()).is_end());
    }

    /// Invariant: a duplicate under unique mode is rejected without growing
    /// and the returned cursor names the pre-existing node.
    #[test]
    fn duplicate_unique_insert_returns_existing() {
        let mut t: HashTable<(String, i32), PairKey> =
            HashTable::with_parts(0, DefaultHashBuilder::default(), DefaultEq, PairKey);
        let (first, ok) = t.insert_unique(("k".to_string(), 1)).unwrap();
        assert!(ok);
        let (again, ok) = t.insert_unique(("k".to_string(), 2)).unwrap();
        assert!(!ok);
        assert_eq!(first, again);
        assert_eq!(t.len(), 1);
        assert_eq!(again.get(&t), Some(&("k".to_string(), 1)));
    }

    /// Invariant: equal-mode copies of a key stay adjacent in one chain, even
    /// when other keys share that chain.
    #[test]
    fn equal_mode_keeps_run_contiguous() {
        let mut t = collide();
        t.insert_equal("x".to_string()).unwrap();
        t.insert_equal("y".to_string()).unwrap();
        t.insert_equal("x".to_string()).unwrap();
        t.insert_equal("z".to_string()).unwrap();
        t.insert_equal("x".to_string()).unwrap();

        assert_eq!(t.count(&"x".to_string()), 3);
        let order: Vec<&str> = t.iter().map(String::as_str).collect();
        let first = order.iter().position(|s| *s == "x").unwrap();
        assert_eq!(&order[first..first + 3], &["x", "x", "x"]);

        let (lo, hi) = t.equal_range(&"x".to_string());
        let run: Vec<&String> = t.range(lo, hi).collect();
        assert_eq!(run.len(), 3);
        assert!(run.iter().all(|s| s.as_str() == "x"));
    }

    /// Invariant: when a run ends its chain, the upper bound of
    /// `equal_range` is the head of the next non-empty bucket, not the end.
    #[test]
    fn equal_range_upper_bound_crosses_to_next_bucket() {
        let mut t = placed();
        let n = t.bucket_count() as u64;
        // Bucket 2 chains [2 + n, 2]; bucket 5 is the next non-empty one.
        t.insert_equal(2).unwrap();
        t.insert_equal(2 + n).unwrap();
        t.insert_equal(5).unwrap();
        let (lo, hi) = t.equal_range(&2);
        assert_eq!(t.get(lo), Some(&2));
        assert_eq!(t.get(hi), Some(&5));
        assert_eq!(t.range(lo, hi).count(), 1);

        // Run in the last non-empty bucket: upper bound is the end.
        let (lo, hi) = t.equal_range(&5);
        assert_eq!(t.get(lo), Some(&5));
        assert!(hi.is_end());
    }

    /// Invariant: the upper bound is the in-chain successor when the run is
    /// followed by a different key in the same chain.
    #[test]
    fn equal_range_upper_bound_within_chain() {
        let mut t = placed();
        let n = t.bucket_count() as u64;
        t.insert_equal(3 + n).unwrap();
        t.insert_equal(3).unwrap();
        t.insert_equal(3).unwrap();
        // Chain for bucket 3 is [3, 3, 3 + n].
        let (lo, hi) = t.equal_range(&3);
        assert_eq!(t.range(lo, hi).count(), 2);
        assert_eq!(t.get(hi), Some(&(3 + n)));
    }

    #[test]
    fn equal_range_absent_key_is_empty() {
        let mut t = placed();
        t.insert_unique(1).unwrap();
        assert_eq!(t.equal_range(&9), (Cursor::end(), Cursor::end()));
    }

    /// Invariant: advancing past the end of a chain lands on the next
    /// non-empty bucket; traversal visits each node exactly once.
    #[test]
    fn advance_crosses_bucket_boundaries() {
        let mut t = placed();
        let n = t.bucket_count() as u64;
        for k in [1, 1 + n, 7, 40, 40 + 2 * n] {
            t.insert_unique(k).unwrap();
        }
        let mut seen = Vec::new();
        let mut c = t.begin();
        while c != t.end() {
            seen.push(*t.get(c).unwrap());
            c = t.advance(c);
        }
        assert_eq!(seen.len(), 5);
        let buckets: Vec<u64> = seen.iter().map(|k| k % n).collect();
        assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
        let iterated: Vec<u64> = t.iter().copied().collect();
        assert_eq!(seen, iterated);
    }

    /// Invariant: the table grows only when the element count would exceed
    /// the bucket count, and always to a listed prime.
    #[test]
    fn growth_is_prime_and_monotone() {
        let mut t: HashTable<u32> = HashTable::with_buckets(1);
        assert_eq!(t.bucket_count(), 53);
        let mut last = t.bucket_count();
        for i in 0..500u32 {
            t.insert_unique(i).unwrap();
            assert!(t.bucket_count() >= last);
            assert!(primes::is_bucket_count(t.bucket_count()));
            assert!(t.len() <= t.bucket_count());
            last = t.bucket_count();
        }
        assert_eq!(t.bucket_count(), 769);
        for i in 0..500u32 {
            assert!(t.contains(&i));
        }
    }

    /// Invariant: rehash keeps every node reachable from the bucket its hash
    /// selects under the new count and keeps equal runs contiguous.
    #[test]
    fn rehash_relinks_into_correct_buckets() {
        let mut t = placed();
        for k in 0..40u64 {
            t.insert_equal(k).unwrap();
            t.insert_equal(k).unwrap();
        }
        assert_eq!(t.bucket_count(), 97);
        for k in 0..40u64 {
            let idx = t.bucket(&k);
            assert_eq!(idx as u64, k % 97);
            let (lo, hi) = t.equal_range(&k);
            assert_eq!(t.range(lo, hi).count(), 2);
        }
        let total: usize = (0..t.bucket_count()).map(|b| t.elements_in_bucket(b)).sum();
        assert_eq!(total, t.len());
    }

    #[test]
    fn resize_never_shrinks() {
        let mut t: HashTable<u32> = HashTable::with_buckets(1_000);
        assert_eq!(t.bucket_count(), 1_543);
        t.resize(10).unwrap();
        assert_eq!(t.bucket_count(), 1_543);
        t.resize(2_000).unwrap();
        assert_eq!(t.bucket_count(), 3_079);
    }

    /// Invariant: cursors held across a rehash still resolve to their node.
    #[test]
    fn cursors_survive_rehash() {
        let mut t: HashTable<u32> = HashTable::new();
        let (c, _) = t.insert_unique(42).unwrap();
        t.resize(10_000).unwrap();
        assert_eq!(c.get(&t), Some(&42));
        assert_eq!(t.find(&42), c);
    }

    #[test]
    fn erase_by_key_removes_all_equal() {
        let mut t = collide();
        for k in ["a", "b", "a", "c", "a"] {
            t.insert_equal(k.to_string()).unwrap();
        }
        assert_eq!(t.erase(&"a".to_string()), 3);
        assert_eq!(t.len(), 2);
        assert!(t.find(&"a".to_string()).is_end());
        assert_eq!(t.erase(&"a".to_string()), 0);
        assert_eq!(t.len(), 2);
        let rest: BTreeSet<&str> = t.iter().map(String::as_str).collect();
        assert_eq!(rest, ["b", "c"].into_iter().collect());
    }

    /// Invariant: erasing through a cursor removes exactly that node and
    /// leaves other cursors valid; the erased cursor goes stale.
    #[test]
    fn erase_at_only_invalidates_target() {
        let mut t = collide();
        let (a, _) = t.insert_unique("a".to_string()).unwrap();
        let (b, _) = t.insert_unique("b".to_string()).unwrap();
        let (c, _) = t.insert_unique("c".to_string()).unwrap();
        // Chain is [c, b, a]; remove the middle.
        assert_eq!(t.erase_at(b), Some("b".to_string()));
        assert_eq!(b.get(&t), None);
        assert_eq!(t.erase_at(b), None);
        assert_eq!(a.get(&t).map(String::as_str), Some("a"));
        assert_eq!(c.get(&t).map(String::as_str), Some("c"));
        assert_eq!(t.advance(c), a);
        assert_eq!(t.erase_at(Cursor::end()), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn stale_cursor_does_not_alias_new_node() {
        let mut t: HashTable<u32> = HashTable::new();
        let (old, _) = t.insert_unique(1).unwrap();
        t.erase_at(old);
        let (new, _) = t.insert_unique(2).unwrap();
        assert_ne!(old, new);
        assert_eq!(old.get(&t), None);
        assert!(t.advance(old).is_end());
    }

    #[test]
    fn erase_range_removes_half_open_span() {
        let mut t = placed();
        for k in 0..10u64 {
            t.insert_unique(k).unwrap();
        }
        let first = t.find(&2);
        let last = t.find(&6);
        assert_eq!(t.erase_range(first, last), 4);
        let rest: Vec<u64> = t.iter().copied().collect();
        assert_eq!(rest, vec![0, 1, 6, 7, 8, 9]);

        let (b, e) = (t.begin(), t.end());
        assert_eq!(t.erase_range(b, e), 6);
        assert!(t.is_empty());
    }

    /// Invariant: clear empties the table but keeps its bucket count.
    #[test]
    fn clear_keeps_bucket_count() {
        let mut t: HashTable<u32> = HashTable::new();
        t.insert_unique_iter(0..200).unwrap();
        let buckets = t.bucket_count();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.bucket_count(), buckets);
        assert_eq!(t.begin(), t.end());
        assert!((0..t.bucket_count()).all(|b| t.elements_in_bucket(b) == 0));
    }

    #[test]
    fn range_insert_reports_inserted_count() {
        let mut t: HashTable<u32> = HashTable::new();
        assert_eq!(t.insert_unique_iter([1, 2, 2, 3, 3, 3]).unwrap(), 3);
        assert_eq!(t.insert_equal_iter([3, 4]).unwrap(), 2);
        assert_eq!(t.len(), 5);
        assert_eq!(t.count(&3), 2);
    }

    /// Invariant: a clone owns independent nodes; mutating it leaves the
    /// original untouched.
    #[test]
    fn clone_is_deep() {
        let mut a: HashTable<u32> = HashTable::new();
        a.insert_unique_iter(0..10).unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.erase(&3);
        b.insert_unique_iter(100..200).unwrap();
        assert_eq!(a.len(), 10);
        assert_eq!(a.bucket_count(), 53);
        assert!(a.contains(&3));
        assert!(!a.contains(&150));
        assert_ne!(a, b);
    }

    /// Invariant: equality needs the same bucket count, and chain order does
    /// not matter.
    #[test]
    fn equality_is_structural() {
        let mut a = collide();
        let mut b = collide();
        for k in ["p", "q", "r"] {
            a.insert_unique(k.to_string()).unwrap();
        }
        for k in ["r", "p", "q"] {
            b.insert_unique(k.to_string()).unwrap();
        }
        assert_eq!(a, b);

        let mut c: HashTable<String, Identity, ConstBuildHasher> =
            HashTable::with_parts(100, ConstBuildHasher, DefaultEq, Identity);
        for k in ["p", "q", "r"] {
            c.insert_unique(k.to_string()).unwrap();
        }
        assert_ne!(a, c);

        b.insert_equal("p".to_string()).unwrap();
        a.insert_equal("q".to_string()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn swap_exchanges_everything() {
        let mut a: HashTable<u32> = HashTable::new();
        let mut b: HashTable<u32> = HashTable::with_buckets(500);
        a.insert_unique(1).unwrap();
        b.insert_unique_iter([7, 8]).unwrap();
        let (c, _) = a.insert_unique(2).unwrap();
        a.swap(&mut b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.bucket_count(), 769);
        assert_eq!(b.len(), 2);
        assert_eq!(b.bucket_count(), 53);
        assert_eq!(c.get(&b), Some(&2));
    }

    /// Invariant: taking a table moves its nodes and leaves an empty, usable
    /// source.
    #[test]
    fn take_leaves_empty_source() {
        let mut a: HashTable<u32> = HashTable::new();
        a.insert_unique_iter(0..100).unwrap();
        let b = core::mem::take(&mut a);
        assert_eq!(b.len(), 100);
        assert!(a.is_empty());
        a.insert_unique(5).unwrap();
        assert!(a.contains(&5));
    }

    #[test]
    fn get_mut_and_iter_mut_update_values() {
        let mut t: HashTable<(u32, i32), PairKey> =
            HashTable::with_parts(0, DefaultHashBuilder::default(), DefaultEq, PairKey);
        let (c, _) = t.insert_unique((1, 10)).unwrap();
        t.insert_unique((2, 20)).unwrap();
        t.get_mut(c).unwrap().1 += 1;
        for pair in &mut t {
            pair.1 *= 2;
        }
        assert_eq!(t.get(t.find(&1)), Some(&(1, 22)));
        assert_eq!(t.get(t.find(&2)), Some(&(2, 40)));
    }

    #[test]
    fn into_iter_yields_every_value() {
        let mut t: HashTable<u32> = HashTable::new();
        t.insert_equal_iter([1, 1, 2]).unwrap();
        let mut all: Vec<u32> = t.into_iter().collect();
        all.sort();
        assert_eq!(all, vec![1, 1, 2]);
    }

    #[test]
    fn debug_lists_values() {
        let mut t: HashTable<u32> = HashTable::new();
        t.insert_unique(7).unwrap();
        assert_eq!(format!("{:?}", t), "{7}");
    }

    #[test]
    fn load_factor_tracks_len() {
        let mut t: HashTable<u32> = HashTable::new();
        assert_eq!(t.load_factor(), 0.0);
        t.insert_unique_iter(0..53).unwrap();
        assert_eq!(t.bucket_count(), 53);
        assert!((t.load_factor() - 1.0).abs() < f32::EPSILON);
    }

    /// Invariant: the hash-plus-predicate primitives find `String` values by
    /// a `&str` query, since both forms hash alike.
    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: HashTable<String> = HashTable::new();
        t.insert_equal_iter(["hello", "world", "hello"].map(String::from))
            .unwrap();
        let q = "hello";
        let h = t.hash_key(q);
        assert_eq!(h, t.hash_key(&q.to_string()));

        let at = t.find_with(h, |v| v.as_str() == q);
        assert_eq!(t.get(at).map(String::as_str), Some("hello"));
        assert_eq!(t.count_with(h, |v| v.as_str() == q), 2);
        let (lo, hi) = t.equal_range_with(h, |v| v.as_str() == q);
        assert_eq!(t.range(lo, hi).count(), 2);

        let miss = t.hash_key("nope");
        assert!(t.find_with(miss, |v| v.as_str() == "nope").is_end());

        assert_eq!(t.erase_with(h, |v| v.as_str() == q), 2);
        assert_eq!(t.len(), 1);
        assert!(t.find(&"hello".to_string()).is_end());
    }

    /// Invariant: `*_with` predicates only see nodes carrying the given hash,
    /// even when the chain holds other hashes.
    #[test]
    fn predicate_lookups_filter_by_stored_hash() {
        let mut t = placed();
        // 3 and 56 share bucket 3 of 53 but carry different hashes.
        t.insert_unique_iter([3, 56]).unwrap();
        assert_eq!(t.count_with(3, |_| true), 1);
        assert_eq!(t.get(t.find_with(56, |_| true)), Some(&56));
        assert_eq!(t.erase_with(3, |_| true), 1);
        assert!(t.contains(&56));
    }

    /// Invariant: an insert refused at the node limit leaves the table as it
    /// was, while duplicate unique inserts still report the existing node.
    #[test]
    fn node_limit_refusal_leaves_table_unchanged() {
        let mut t = HashTable::<u32>::new().with_node_limit(3);
        t.insert_unique_iter([1, 2, 3]).unwrap();
        let before = t.clone();
        let buckets = t.bucket_count();

        match t.insert_unique(4) {
            Err(TableError::NodeCapacity { limit }) => assert_eq!(limit, 3),
            other => panic!("expected NodeCapacity, got {:?}", other),
        }
        assert!(matches!(
            t.insert_equal(1),
            Err(TableError::NodeCapacity { .. })
        ));
        assert_eq!(t.len(), 3);
        assert_eq!(t.bucket_count(), buckets);
        assert_eq!(t, before);
        assert!(t.find(&4).is_end());

        let (at, inserted) = t.insert_unique(2).unwrap();
        assert!(!inserted);
        assert_eq!(t.get(at), Some(&2));

        t.erase(&1);
        assert!(t.insert_unique(4).unwrap().1);
        assert_eq!(t.len(), 3);
    }
}
