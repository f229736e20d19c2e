//! chained-hashtable: a separate-chaining hash table with prime-sized
//! bucket arrays, stable cursors and two insertion disciplines.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one engine, `HashTable<T, X, S, E>`, that backs set, multiset,
//!   map and multimap containers by switching between "unique" and "equal"
//!   insertion.
//! - Layers:
//!   - `primes`: the fixed ascending list of bucket counts and the
//!     "smallest prime not less than the hint" selection.
//!   - `policy`: key extraction (`Identity`, `PairKey`) and key equality
//!     (`DefaultEq`) seams; hashing is any `BuildHasher`.
//!   - `HashTable`: bucket array of chain heads over a node arena, with the
//!     no-resize insertion primitive, the resizing wrapper, rehash, lookups
//!     and erasure.
//!   - `UnorderedSet`/`UnorderedMultiset`/`UnorderedMap`/`UnorderedMultimap`:
//!     thin wrappers that pick the insertion mode and key extractor.
//!
//! Representation
//! - Nodes live in a `SlotMap` arena; chains link them by generational
//!   `NodeKey` instead of owning pointers. Unlinking and relinking are O(1)
//!   edits of `next` fields, and no node is ever shared or leaked.
//! - The bucket array is `Vec<Option<NodeKey>>`. Its length is always a
//!   member of `primes::PRIME_LIST` and only grows.
//! - Each node stores the full `u64` hash of its key. Bucket indices are
//!   `hash % bucket_count` against the current count and are never cached.
//!
//! Growth
//! - Before an insertion the table asks for `len + pending` buckets. If the
//!   selected prime is larger than the current count, every node is relinked
//!   into a freshly reserved array, which then replaces the old one.
//! - The new array is reserved with `try_reserve_exact` before any link is
//!   touched, and relinking uses the stored hashes, so no user code runs and
//!   nothing can fail once relinking starts. A failed reservation leaves the
//!   table exactly as it was.
//!
//! Cursors
//! - `Cursor` is the table's position type: a `Copy` wrapper over an
//!   optional `NodeKey`, resolved against its table. Advancing past a
//!   chain's tail scans forward through later buckets. Erasing a node makes
//!   its cursor stale (it resolves to `None`) without affecting others;
//!   rehash keeps every cursor valid because node keys never change.
//!
//! Notes and non-goals
//! - Single-threaded; callers synchronize externally.
//! - No open addressing, no persistence, no iteration-order guarantee.
//! - Keys must not change while stored; `get_mut`/`iter_mut` hand out the
//!   whole value and leave that to the caller.

mod builder;
mod error;
pub mod hash_table;
mod hash_table_proptest;
pub mod iter;
pub mod policy;
pub mod primes;
mod unordered_map;
mod unordered_set;

// Public surface
pub use builder::HashTableBuilder;
pub use error::TableError;
pub use hash_table::{Cursor, HashTable, InsertMode};
pub use policy::{DefaultEq, Identity, KeyEq, KeyExtract, PairKey};
pub use unordered_map::{UnorderedMap, UnorderedMultimap};
pub use unordered_set::{UnorderedMultiset, UnorderedSet};
