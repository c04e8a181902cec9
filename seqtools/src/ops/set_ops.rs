//! Identity-based set algebra over [`Solid`] containers.
//!
//! Membership throughout is the element's `Hash + Eq`, never deep structural
//! re-interpretation. Intersection probes the cheaper side: a hashed operand
//! is used as the probe set directly; otherwise the smaller side is hashed
//! once and the other side streams against it.

use std::hash::Hash;

use rustc_hash::FxHashSet;

use super::distinct_by;
use crate::solid::Solid;

/// Elements present in both operands.
///
/// When `rhs` probes fast, `lhs` streams in its own order. When only `lhs`
/// probes fast, the sides swap (order then follows `rhs`, which is fine: a
/// hashed `lhs` has no meaningful order of its own). With neither side
/// hashed, the smaller side is materialized into a probe set.
pub fn intersect<T>(lhs: &Solid<T>, rhs: &Solid<T>) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    if rhs.has_fast_membership() {
        lhs.iter().filter(|item| rhs.contains(item)).cloned().collect()
    } else if lhs.has_fast_membership() {
        rhs.iter().filter(|item| lhs.contains(item)).cloned().collect()
    } else if rhs.len() <= lhs.len() {
        let probe: FxHashSet<&T> = rhs.iter().collect();
        lhs.iter().filter(|item| probe.contains(item)).cloned().collect()
    } else {
        let probe: FxHashSet<&T> = lhs.iter().collect();
        rhs.iter().filter(|item| probe.contains(item)).cloned().collect()
    }
}

/// Union: `lhs` then `rhs`, deduplicated in first-seen order.
pub fn union_with<T>(lhs: &Solid<T>, rhs: &Solid<T>) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    distinct_by(lhs.iter().chain(rhs.iter()).cloned(), |item: &T| item.clone()).collect()
}

/// Difference: elements of `lhs` not present in `rhs`, in `lhs` order.
pub fn without<T>(lhs: &Solid<T>, rhs: &Solid<T>) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    if rhs.has_fast_membership() {
        lhs.iter().filter(|item| !rhs.contains(item)).cloned().collect()
    } else {
        let probe: FxHashSet<&T> = rhs.iter().collect();
        lhs.iter().filter(|item| !probe.contains(item)).cloned().collect()
    }
}
