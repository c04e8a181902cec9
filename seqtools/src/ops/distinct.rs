use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Lazy first-seen-order deduplication by an extracted identity key.
///
/// Uniqueness is a set-membership test on the key's `Hash + Eq`, never a deep
/// structural comparison of the element.
pub struct DistinctBy<I, F, K> {
    iter: I,
    key: F,
    seen: FxHashSet<K>,
}

/// Creates a [`DistinctBy`] over `iter`, keyed by `key`.
pub fn distinct_by<I, F, K>(iter: I, key: F) -> DistinctBy<I::IntoIter, F, K>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: Eq + Hash,
{
    DistinctBy {
        iter: iter.into_iter(),
        key,
        seen: FxHashSet::default(),
    }
}

impl<I, F, K> Iterator for DistinctBy<I, F, K>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: Eq + Hash,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = self.iter.next()?;
            if self.seen.insert((self.key)(&item)) {
                return Some(item);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_first_seen_order() {
        let out: Vec<_> = distinct_by([5, 3, 5, 1, 3, 2], |x| *x).collect();
        assert_eq!(vec![5, 3, 1, 2], out);
    }

    #[test]
    fn idempotent() {
        let once: Vec<_> = distinct_by([1, 1, 2, 2, 3], |x| *x).collect();
        let twice: Vec<_> = distinct_by(once.clone(), |x| *x).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn custom_identity() {
        let out: Vec<_> = distinct_by(["apple", "avocado", "beet"], |s| s.as_bytes()[0]).collect();
        assert_eq!(vec!["apple", "beet"], out);
    }
}
