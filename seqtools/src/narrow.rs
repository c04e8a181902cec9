//! [`Narrowed`], a filter chain built from a growing union of predicates.

use std::ops::Deref;
use std::rc::Rc;

use crate::seq::Seq;

type Pred<T> = Rc<dyn Fn(&T) -> bool>;

/// A sequence filtered by the union of one or more admission predicates.
///
/// Produced by [`Seq::narrow`] and [`Seq::narrow_out`]. Each [`and`]
/// (Narrowed::and) call derives a *new* handle whose filter re-runs over the
/// unfiltered base with the extended predicate list: an element passes when
/// *any* predicate matches (or, for `narrow_out`, when none does).
/// Dereferences to a plain [`Seq`] for every other operator and terminal.
pub struct Narrowed<T> {
    base: Seq<T>,
    preds: Rc<Vec<Pred<T>>>,
    exclude: bool,
    filtered: Seq<T>,
}

impl<T> Clone for Narrowed<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            preds: Rc::clone(&self.preds),
            exclude: self.exclude,
            filtered: self.filtered.clone(),
        }
    }
}

impl<T> Deref for Narrowed<T> {
    type Target = Seq<T>;

    fn deref(&self) -> &Seq<T> {
        &self.filtered
    }
}

impl<T> std::fmt::Debug for Narrowed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Narrowed{:?}", self.filtered)
    }
}

impl<T> Narrowed<T>
where
    T: Clone + 'static,
{
    pub(crate) fn new(base: Seq<T>, preds: Vec<Pred<T>>, exclude: bool) -> Self {
        let preds = Rc::new(preds);
        let admitted = Rc::clone(&preds);
        let tag = if exclude { "narrow_out" } else { "narrow" };
        let filtered = base.filter_tagged(
            move |item| admitted.iter().any(|pred| pred(item)) != exclude,
            tag,
        );
        Self {
            base,
            preds,
            exclude,
            filtered,
        }
    }

    /// Widens the admitted union with another predicate. Under `narrow_out`
    /// this widens the *excluded* union instead.
    pub fn and(&self, pred: impl Fn(&T) -> bool + 'static) -> Self {
        let mut preds: Vec<Pred<T>> = self.preds.as_ref().clone();
        preds.push(Rc::new(pred));
        Self::new(self.base.clone(), preds, self.exclude)
    }

    /// The filtered sequence as a plain handle.
    pub fn as_seq(&self) -> &Seq<T> {
        &self.filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_union() {
        let seq = Seq::of(0..10);
        let narrowed = seq.narrow(|n: &i64| *n < 2).and(|n| *n > 7);
        assert_eq!(vec![0, 1, 8, 9], narrowed.to_array());
    }

    #[test]
    fn and_filters_from_the_base_not_the_parent() {
        let seq = Seq::of(vec![1, 2, 3, 4]);
        let odds = seq.narrow(|n: &i32| n % 2 == 1);
        let widened = odds.and(|n| *n == 2);
        assert_eq!(vec![1, 3], odds.to_array());
        assert_eq!(vec![1, 2, 3], widened.to_array());
    }

    #[test]
    fn narrow_out_excludes_the_union() {
        let seq = Seq::of(0..10);
        let kept = seq.narrow_out(|n: &i64| *n < 2).and(|n| *n > 7);
        assert_eq!(vec![2, 3, 4, 5, 6, 7], kept.to_array());
    }

    #[test]
    fn labels_tag_the_narrowing() {
        let seq = Seq::of(vec![1, 2]);
        let narrowed = seq.narrow(|_: &i32| true);
        assert_eq!(vec!["narrow", "array"], narrowed.labels());
    }
}
