//! Grouping and hash joins.
//!
//! Groups are insertion-ordered: the first time a key is seen fixes its
//! position. Joins materialize and group the build side fully before the
//! probe side streams.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Insertion-ordered buckets of values keyed by `K`.
///
/// A hash lookup maps keys to positions in an ordered entry list, so builds
/// are O(1) amortized while iteration follows first-seen key order.
pub struct KeyedBuckets<K, V> {
    lookup: FxHashMap<K, usize>,
    entries: Vec<(K, SmallVec<[V; 2]>)>,
}

impl<K, V> Default for KeyedBuckets<K, V> {
    fn default() -> Self {
        Self {
            lookup: FxHashMap::default(),
            entries: Vec::new(),
        }
    }
}

impl<K, V> KeyedBuckets<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Appends `value` to the bucket for `key`, creating the bucket at the
    /// next position if the key is new.
    pub fn build(&mut self, key: K, value: V) {
        let Self { lookup, entries } = self;
        let index = *lookup.entry(key.clone()).or_insert_with(|| {
            entries.push((key, SmallVec::new()));
            entries.len() - 1
        });
        entries[index].1.push(value);
    }

    /// The bucket for `key`, empty if the key was never built.
    pub fn probe(&self, key: &K) -> &[V] {
        self.lookup
            .get(key)
            .map(|&index| &self.entries[index].1[..])
            .unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys were built.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the buckets in insertion order.
    pub fn into_entries(self) -> Vec<(K, Vec<V>)> {
        self.entries
            .into_iter()
            .map(|(key, bucket)| (key, bucket.into_vec()))
            .collect()
    }
}

/// Single-pass grouping with separate key and value selectors.
pub fn group_by<T, K, V>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
    value: impl Fn(T) -> V,
) -> Vec<(K, Vec<V>)>
where
    K: Eq + Hash + Clone,
{
    let mut buckets = KeyedBuckets::default();
    for item in items {
        buckets.build(key(&item), value(item));
    }
    buckets.into_entries()
}

/// For each outer element, the bucket of inner elements sharing its key.
///
/// The inner side is fully grouped before the outer side streams.
pub fn group_join<L, R, K>(
    outer: impl IntoIterator<Item = L>,
    inner: impl IntoIterator<Item = R>,
    outer_key: impl Fn(&L) -> K,
    inner_key: impl Fn(&R) -> K,
) -> Vec<(L, Vec<R>)>
where
    K: Eq + Hash + Clone,
    R: Clone,
{
    let mut buckets = KeyedBuckets::default();
    for item in inner {
        buckets.build(inner_key(&item), item);
    }
    outer
        .into_iter()
        .map(|item| {
            let matches = buckets.probe(&outer_key(&item)).to_vec();
            (item, matches)
        })
        .collect()
}

/// Inner equi-join: one output pair per key match.
pub fn inner_join<L, R, K>(
    outer: impl IntoIterator<Item = L>,
    inner: impl IntoIterator<Item = R>,
    outer_key: impl Fn(&L) -> K,
    inner_key: impl Fn(&R) -> K,
) -> Vec<(L, R)>
where
    K: Eq + Hash + Clone,
    L: Clone,
    R: Clone,
{
    group_join(outer, inner, outer_key, inner_key)
        .into_iter()
        .flat_map(|(left, matches)| {
            matches
                .into_iter()
                .map(move |right| (left.clone(), right))
        })
        .collect()
}

/// Join with a caller-supplied match predicate. Degrades to a nested-loop
/// comparison across all pairs, since arbitrary predicates cannot be hashed.
pub fn join_by<L, R>(
    outer: impl IntoIterator<Item = L>,
    inner: impl IntoIterator<Item = R>,
    matches: impl Fn(&L, &R) -> bool,
) -> Vec<(L, R)>
where
    L: Clone,
    R: Clone,
{
    let inner: Vec<R> = inner.into_iter().collect();
    let mut out = Vec::new();
    for left in outer {
        for right in &inner {
            if matches(&left, right) {
                out.push((left.clone(), right.clone()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_insertion_ordered() {
        let grouped = group_by([1, 4, 2, 5, 3, 6], |n| n % 3, |n| n);
        assert_eq!(vec![(1, vec![1, 4]), (2, vec![2, 5]), (0, vec![3, 6])], grouped);
    }

    #[test]
    fn group_join_keeps_unmatched_outer() {
        let joined = group_join(
            vec!["ab", "cd", "zz"],
            vec!["apple", "cherry", "cider"],
            |s: &&str| s.as_bytes()[0],
            |s: &&str| s.as_bytes()[0],
        );
        assert_eq!(
            vec![
                ("ab", vec!["apple"]),
                ("cd", vec!["cherry", "cider"]),
                ("zz", vec![]),
            ],
            joined
        );
    }

    #[test]
    fn inner_join_drops_unmatched() {
        let joined = inner_join(
            vec![(1, "a"), (2, "b"), (3, "c")],
            vec![(2, 20), (2, 21), (4, 40)],
            |l: &(i32, &str)| l.0,
            |r: &(i32, i32)| r.0,
        );
        assert_eq!(vec![((2, "b"), (2, 20)), ((2, "b"), (2, 21))], joined);
    }

    #[test]
    fn join_by_nested_loop() {
        let joined = join_by([1, 2, 3], [10, 20], |l, r| r / l == 10);
        assert_eq!(vec![(1, 10), (2, 20)], joined);
    }
}
