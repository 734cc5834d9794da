//! Typed membership checks
//!
//! One function per container shape; callers pick the one matching what they hold.

use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Whether `item` appears anywhere in `seq`.
pub fn contains_in_sequence<T, Q>(item: &Q, seq: &[T]) -> bool
where
    T: Borrow<Q>,
    Q: PartialEq + ?Sized,
{
    seq.iter().any(|candidate| candidate.borrow() == item)
}

/// Whether `key` is a key of `map`.
pub fn contains_in_mapping<K, V, Q>(key: &Q, map: &BTreeMap<K, V>) -> bool
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    map.contains_key(key)
}
