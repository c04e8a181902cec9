//! Random and evenly-spread sampling.
//!
//! All random operations work on a freshly materialized buffer; the upstream
//! source is never permuted in place.

use rand::Rng;
use rand::seq::SliceRandom;

/// Fisher–Yates permutation of `items`.
pub fn shuffled<T>(mut items: Vec<T>, rng: &mut impl Rng) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Up to `count` elements drawn uniformly without replacement, in random
/// order.
pub fn take_random<T>(items: Vec<T>, count: usize, rng: &mut impl Rng) -> Vec<T> {
    let mut items = shuffled(items, rng);
    items.truncate(count);
    items
}

/// Removes `count` uniformly chosen elements; the survivors keep their
/// original relative order.
pub fn skip_random<T>(items: Vec<T>, count: usize, rng: &mut impl Rng) -> Vec<T> {
    if count >= items.len() {
        return Vec::new();
    }
    let mut removed = vec![false; items.len()];
    for index in rand::seq::index::sample(rng, items.len(), count) {
        removed[index] = true;
    }
    items
        .into_iter()
        .zip(removed)
        .filter(|(_, gone)| !gone)
        .map(|(item, _)| item)
        .collect()
}

/// Exactly `count` indices evenly spread across `0..len`: every
/// `⌊len/count⌋`-th position, truncated to `count` selections. Degenerate
/// cases: `count == 0` selects nothing, `count >= len` selects everything.
pub fn sparse_indices(len: usize, count: usize) -> Vec<usize> {
    if 0 == count {
        return Vec::new();
    }
    if count >= len {
        return (0..len).collect();
    }
    let step = len / count;
    (0..count).map(|i| i * step).collect()
}

/// Keeps exactly the [`sparse_indices`] positions.
pub fn take_sparse<T>(items: Vec<T>, count: usize) -> Vec<T> {
    let chosen = sparse_indices(items.len(), count);
    let mut keep = vec![false; items.len()];
    for index in chosen {
        keep[index] = true;
    }
    items
        .into_iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(item, _)| item)
        .collect()
}

/// Drops exactly the positions [`take_sparse`] would keep.
pub fn skip_sparse<T>(items: Vec<T>, count: usize) -> Vec<T> {
    let chosen = sparse_indices(items.len(), count);
    let mut keep = vec![true; items.len()];
    for index in chosen {
        keep[index] = false;
    }
    items
        .into_iter()
        .zip(keep)
        .filter(|(_, kept)| *kept)
        .map(|(item, _)| item)
        .collect()
}
