//! Key extraction and key equality policies.
//!
//! A table stores values of type `T` and looks them up by a key borrowed out
//! of each value. `KeyExtract` says where that key lives; `KeyEq` says when
//! two keys are equivalent. Both must agree with the table's `BuildHasher`:
//! keys that compare equal must hash equal. That contract is not checked.

/// Borrows the lookup key out of a stored value.
pub trait KeyExtract<T> {
    type Key: ?Sized;

    fn key<'a>(&self, value: &'a T) -> &'a Self::Key;
}

/// Set-like extraction: the value is its own key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl<T> KeyExtract<T> for Identity {
    type Key = T;

    #[inline]
    fn key<'a>(&self, value: &'a T) -> &'a T {
        value
    }
}

/// Map-like extraction: the key is the first field of a `(K, V)` pair.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PairKey;

impl<K, V> KeyExtract<(K, V)> for PairKey {
    type Key = K;

    #[inline]
    fn key<'a>(&self, value: &'a (K, V)) -> &'a K {
        &value.0
    }
}

/// Key equivalence predicate.
pub trait KeyEq<K: ?Sized> {
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// Equivalence via the key's own `Eq`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultEq;

impl<K: ?Sized + Eq> KeyEq<K> for DefaultEq {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}
