//! [`OrderedSeq`], an ordered sequence extendable with tie-breaking keys.

use std::cmp::Ordering;
use std::ops::Deref;
use std::rc::Rc;

use crate::compare::{Comparator, TotalOrder, descending, fn_comparator, key_comparator};
use crate::seq::Seq;

/// A sequence carrying a stack of ordering keys.
///
/// Produced by [`Seq::order_by`] and friends; each `then_by` call derives a
/// *new* handle whose sort re-runs over the pre-sort base with the extended
/// key list, so tie-breakers refine the earlier keys rather than re-sorting
/// already-sorted output. Dereferences to a plain [`Seq`] for every other
/// operator and terminal.
pub struct OrderedSeq<T> {
    base: Seq<T>,
    specs: Rc<Vec<Comparator<T>>>,
    sorted: Seq<T>,
}

impl<T> Clone for OrderedSeq<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            specs: Rc::clone(&self.specs),
            sorted: self.sorted.clone(),
        }
    }
}

impl<T> Deref for OrderedSeq<T> {
    type Target = Seq<T>;

    fn deref(&self) -> &Seq<T> {
        &self.sorted
    }
}

impl<T> std::fmt::Debug for OrderedSeq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ordered{:?}", self.sorted)
    }
}

impl<T> OrderedSeq<T>
where
    T: Clone + 'static,
{
    pub(crate) fn new(base: Seq<T>, specs: Vec<Comparator<T>>) -> Self {
        let specs = Rc::new(specs);
        let sorted = base.sorted_by_specs(Rc::clone(&specs));
        Self { base, specs, sorted }
    }

    fn extended(&self, next: Comparator<T>) -> Self {
        let mut specs: Vec<Comparator<T>> = self.specs.as_ref().clone();
        specs.push(next);
        Self::new(self.base.clone(), specs)
    }

    /// Adds an ascending tie-breaking key, applied only where all earlier
    /// keys compare equal.
    pub fn then_by<K>(&self, key: impl Fn(&T) -> K + 'static) -> Self
    where
        K: TotalOrder,
    {
        self.extended(key_comparator(key))
    }

    /// Adds a descending tie-breaking key.
    pub fn then_by_descending<K>(&self, key: impl Fn(&T) -> K + 'static) -> Self
    where
        K: TotalOrder,
    {
        self.extended(descending(key_comparator(key)))
    }

    /// Adds a raw comparator as the next tie-breaker.
    pub fn then_with(&self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Self {
        self.extended(fn_comparator(cmp))
    }

    /// The ordered sequence as a plain handle.
    pub fn as_seq(&self) -> &Seq<T> {
        &self.sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn then_by_breaks_ties_only() {
        let seq = Seq::of(vec![(2, 'b'), (1, 'z'), (2, 'a'), (1, 'y')]);
        let out = seq
            .order_by(|pair: &(i32, char)| pair.0)
            .then_by(|pair| pair.1)
            .to_array();
        assert_eq!(vec![(1, 'y'), (1, 'z'), (2, 'a'), (2, 'b')], out);
    }

    #[test]
    fn then_by_descending_reverses_tiebreak() {
        let seq = Seq::of(vec![(1, 2), (2, 1), (1, 1), (2, 2)]);
        let out = seq
            .order_by(|pair: &(i32, i32)| pair.0)
            .then_by_descending(|pair| pair.1)
            .to_array();
        assert_eq!(vec![(1, 2), (1, 1), (2, 2), (2, 1)], out);
    }

    #[test]
    fn extending_does_not_disturb_the_parent() {
        let seq = Seq::of(vec![(1, 'b'), (1, 'a'), (0, 'c')]);
        let by_num = seq.order_by(|pair: &(i32, char)| pair.0);
        let refined = by_num.then_by(|pair| pair.1);
        // The parent keeps the stable source order within equal keys.
        assert_eq!(vec![(0, 'c'), (1, 'b'), (1, 'a')], by_num.to_array());
        assert_eq!(vec![(0, 'c'), (1, 'a'), (1, 'b')], refined.to_array());
    }

    #[test]
    fn ordered_stays_live_to_upstream() {
        use std::cell::RefCell;
        let source = Rc::new(RefCell::new(vec![3, 1, 2]));
        let ordered = Seq::shared(Rc::clone(&source)).order_by(|n: &i32| *n);
        assert_eq!(vec![1, 2, 3], ordered.to_array());
        source.borrow_mut().push(0);
        assert_eq!(vec![0, 1, 2, 3], ordered.to_array());
    }
}
