//! Traversal over a `HashTable`.
//!
//! `Iter` and `Range` walk buckets in index order and each chain front to
//! back, the same order `HashTable::advance` produces. `IterMut` and
//! `IntoIter` walk the node arena directly; iteration order is unspecified
//! for all of them.

use crate::hash_table::{Cursor, HashTable, Node, NodeKey};
use core::iter::FusedIterator;
use slotmap::SlotMap;

/// Iterator over shared references to the stored values.
pub struct Iter<'a, T> {
    buckets: &'a [Option<NodeKey>],
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    bucket: usize,
    node: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(
        buckets: &'a [Option<NodeKey>],
        nodes: &'a SlotMap<NodeKey, Node<T>>,
    ) -> Self {
        Self {
            buckets,
            nodes,
            bucket: 0,
            node: None,
            remaining: nodes.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(k) = self.node {
                let node = self.nodes.get(k)?;
                self.node = node.next;
                self.remaining -= 1;
                return Some(&node.value);
            }
            // Chain exhausted: move to the next bucket head.
            self.node = *self.buckets.get(self.bucket)?;
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            nodes: self.nodes,
            bucket: self.bucket,
            node: self.node,
            remaining: self.remaining,
        }
    }
}

/// Iterator over mutable references to the stored values.
pub struct IterMut<'a, T> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<T>>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(it: slotmap::basic::IterMut<'a, NodeKey, Node<T>>) -> Self {
        Self { it }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<&'a mut T> {
        self.it.next().map(|(_, n)| &mut n.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// Owning iterator; consumes the table.
pub struct IntoIter<T> {
    it: slotmap::basic::IntoIter<NodeKey, Node<T>>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(it: slotmap::basic::IntoIter<NodeKey, Node<T>>) -> Self {
        Self { it }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.it.next().map(|(_, n)| n.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

/// Values in `[first, last)`, stepping with `HashTable::advance`.
///
/// A `last` that is never reached runs to the end of the table.
pub struct Range<'a, T, X, S, E> {
    table: &'a HashTable<T, X, S, E>,
    cur: Cursor,
    last: Cursor,
}

impl<'a, T, X, S, E> Range<'a, T, X, S, E> {
    pub(crate) fn new(table: &'a HashTable<T, X, S, E>, first: Cursor, last: Cursor) -> Self {
        Self {
            table,
            cur: first,
            last,
        }
    }
}

impl<'a, T, X, S, E> Iterator for Range<'a, T, X, S, E> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur == self.last {
            return None;
        }
        let table = self.table;
        let value = table.get(self.cur)?;
        self.cur = table.advance(self.cur);
        Some(value)
    }
}

impl<T, X, S, E> FusedIterator for Range<'_, T, X, S, E> {}
