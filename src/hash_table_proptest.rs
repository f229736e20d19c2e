#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check
// bucket-level structure alongside the public operations.

use crate::hash_table::{Cursor, HashTable, InsertMode};
use crate::policy::{DefaultEq, PairKey};
use crate::primes;
use hashbrown::hash_map::DefaultHashBuilder;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};

type Table<S> = HashTable<(String, i32), PairKey, S, DefaultEq>;

// Pool-indexed operations: indices shrink to earlier keys, the pool shrinks,
// and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    InsertUnique(usize, i32),
    InsertEqual(usize, i32),
    InsertMany(Vec<(usize, i32)>),
    Erase(usize),
    EraseOne(usize),
    Find(usize),
    Count(usize),
    EqualRange(usize),
    Resize(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertUnique(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertEqual(i, v)),
            1 => proptest::collection::vec((idx.clone(), any::<i32>()), 0..80)
                .prop_map(Op::InsertMany),
            2 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::EraseOne),
            2 => idx.clone().prop_map(Op::Find),
            2 => idx.clone().prop_map(Op::Count),
            2 => idx.clone().prop_map(Op::EqualRange),
            1 => (0usize..400).prop_map(Op::Resize),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: key -> values stored under it, in no particular order.
type Model = HashMap<String, Vec<i32>>;

fn model_len(model: &Model) -> usize {
    model.values().map(Vec::len).sum()
}

fn sorted(mut v: Vec<i32>) -> Vec<i32> {
    v.sort_unstable();
    v
}

// Walk `[first, last)` by cursor and collect the values.
fn run_values<S>(t: &Table<S>, first: Cursor, last: Cursor) -> Vec<(String, i32)> {
    t.range(first, last).cloned().collect()
}

// Invariants exercised after every operation:
// - len parity with the model and len <= bucket_count;
// - bucket_count is a listed prime and never decreases;
// - cursors of erased nodes never resolve again.
// Per operation:
// - unique insert rejects present keys and returns the existing node;
// - equal insert always succeeds and `equal_range` spans exactly the copies
//   of a key as one contiguous run;
// - erase(key) then find(key) yields the end cursor.
fn run_scenario<S: BuildHasher>(
    mut sut: Table<S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: Model = HashMap::new();
    let mut stale: Vec<Cursor> = Vec::new();
    let mut last_buckets = sut.bucket_count();

    for op in ops {
        match op {
            Op::InsertUnique(i, v) => {
                let k = pool[i].clone();
                let already = model.get(&k).is_some_and(|vs| !vs.is_empty());
                let (c, inserted) = sut.insert_unique((k.clone(), v)).unwrap();
                prop_assert_eq!(inserted, !already);
                let at = sut.get(c).expect("returned cursor resolves");
                prop_assert_eq!(&at.0, &k);
                if inserted {
                    prop_assert_eq!(at.1, v);
                    model.entry(k).or_default().push(v);
                }
            }
            Op::InsertEqual(i, v) => {
                let k = pool[i].clone();
                let c = sut.insert_equal((k.clone(), v)).unwrap();
                prop_assert_eq!(sut.get(c), Some(&(k.clone(), v)));
                model.entry(k).or_default().push(v);
            }
            Op::InsertMany(items) => {
                let values: Vec<(String, i32)> =
                    items.iter().map(|&(i, v)| (pool[i].clone(), v)).collect();
                let n = sut.insert_iter(values.clone(), InsertMode::Equal).unwrap();
                prop_assert_eq!(n, values.len());
                for (k, v) in values {
                    model.entry(k).or_default().push(v);
                }
            }
            Op::Erase(i) => {
                let k = &pool[i];
                let expected = model.remove(k).map(|vs| vs.len()).unwrap_or(0);
                prop_assert_eq!(sut.erase(k), expected);
                prop_assert!(sut.find(k).is_end());
                prop_assert_eq!(sut.erase(k), 0);
            }
            Op::EraseOne(i) => {
                let k = &pool[i];
                let c = sut.find(k);
                match sut.erase_at(c) {
                    Some((kk, v)) => {
                        prop_assert_eq!(&kk, k);
                        let vs = model.get_mut(k).expect("model has key");
                        let pos = vs.iter().position(|&x| x == v).expect("model has value");
                        vs.swap_remove(pos);
                        if vs.is_empty() {
                            model.remove(k);
                        }
                        stale.push(c);
                    }
                    None => {
                        prop_assert!(c.is_end());
                        prop_assert!(!model.contains_key(k));
                    }
                }
            }
            Op::Find(i) => {
                let k = &pool[i];
                let c = sut.find(k);
                prop_assert_eq!(!c.is_end(), model.contains_key(k));
                if let Some((kk, _)) = c.get(&sut) {
                    prop_assert_eq!(kk, k);
                }
            }
            Op::Count(i) => {
                let k = &pool[i];
                let expected = model.get(k).map(Vec::len).unwrap_or(0);
                prop_assert_eq!(sut.count(k), expected);
            }
            Op::EqualRange(i) => {
                let k = &pool[i];
                let (lo, hi) = sut.equal_range(k);
                let run = run_values(&sut, lo, hi);
                let expected = model.get(k).cloned().unwrap_or_default();
                prop_assert!(run.iter().all(|(kk, _)| kk == k));
                prop_assert_eq!(
                    sorted(run.into_iter().map(|(_, v)| v).collect()),
                    sorted(expected)
                );
                // The upper bound is whatever follows the run in traversal order.
                if !lo.is_end() {
                    let mut c = lo;
                    for _ in 0..sut.count(k) {
                        c = sut.advance(c);
                    }
                    prop_assert_eq!(c, hi);
                }
            }
            Op::Resize(hint) => {
                sut.resize(hint).unwrap();
                prop_assert!(sut.bucket_count() >= primes::next_prime(hint));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), last_buckets);
            }
            Op::Iterate => {
                let mut seen: BTreeMap<String, Vec<i32>> = BTreeMap::new();
                for (k, v) in sut.iter() {
                    seen.entry(k.clone()).or_default().push(*v);
                }
                let mut via_cursor = 0;
                let mut c = sut.begin();
                while !c.is_end() {
                    via_cursor += 1;
                    c = sut.advance(c);
                }
                prop_assert_eq!(via_cursor, sut.len());
                let want: BTreeMap<String, Vec<i32>> = model
                    .iter()
                    .map(|(k, vs)| (k.clone(), sorted(vs.clone())))
                    .collect();
                let got: BTreeMap<String, Vec<i32>> =
                    seen.into_iter().map(|(k, vs)| (k, sorted(vs))).collect();
                prop_assert_eq!(got, want);
                let per_bucket: usize = (0..sut.bucket_count())
                    .map(|b| sut.elements_in_bucket(b))
                    .sum();
                prop_assert_eq!(per_bucket, sut.len());
            }
        }

        for &c in &stale {
            prop_assert!(c.get(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model_len(&model));
        prop_assert_eq!(sut.is_empty(), model_len(&model) == 0);
        prop_assert!(sut.len() <= sut.bucket_count());
        prop_assert!(primes::is_bucket_count(sut.bucket_count()));
        prop_assert!(sut.bucket_count() >= last_buckets);
        last_buckets = sut.bucket_count();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: Table<DefaultHashBuilder> =
            HashTable::with_parts(1, DefaultHashBuilder::default(), DefaultEq, PairKey);
        run_scenario(sut, &pool, ops)?;
    }
}

// Collision variant: every key hashes to 0, so all nodes share one chain and
// equality alone separates them.
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
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: Table<ConstBuildHasher> =
            HashTable::with_parts(1, ConstBuildHasher, DefaultEq, PairKey);
        run_scenario(sut, &pool, ops)?;
    }
}

// Property: a clone is independent of its source under arbitrary mutation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_clone_is_independent(
        base in proptest::collection::vec(0u16..300, 0..200),
        extra in proptest::collection::vec(0u16..600, 0..400),
    ) {
        let mut a: HashTable<u16> = HashTable::new();
        a.insert_unique_iter(base.iter().copied()).unwrap();
        let mut before: Vec<u16> = a.iter().copied().collect();
        before.sort_unstable();
        let buckets = a.bucket_count();

        let mut b = a.clone();
        prop_assert!(a == b);
        for x in &extra {
            if x % 3 == 0 {
                b.erase(x);
            } else {
                b.insert_unique(*x).unwrap();
            }
        }

        let mut after: Vec<u16> = a.iter().copied().collect();
        after.sort_unstable();
        prop_assert_eq!(before, after);
        prop_assert_eq!(a.bucket_count(), buckets);
    }
}
