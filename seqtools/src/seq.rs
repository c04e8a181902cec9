//! [`Seq`], the lazy chainable sequence handle.

use std::any::Any;
use std::cell::{OnceCell, RefCell};
use std::cmp::Ordering;
use std::hash::Hash;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::compare::{Comparator, TotalOrder, descending, fn_comparator, key_comparator};
use crate::error::SeqError;
use crate::narrow::Narrowed;
use crate::ops;
use crate::ordered::OrderedSeq;
use crate::plan::{
    ConcatNode, DistinctNode, FilterNode, FlatMapNode, GenNode, GroupByNode, GroupJoinNode,
    InsertNode, JoinByNode, JoinNode, LazySolidNode, MapNode, MergeNode, Produce, RandomNode,
    RandomOp, RemoveNode, RepeatNode, ReverseNode, SetOp, SetOpNode, SkipNode, SkipWhileNode,
    SortNode, SparseNode, TakeNode, TakeWhileNode, ThunkNode, ZipNode,
};
use crate::solid::Solid;

/// The source of a handle: a raw container, a live shared container, or an
/// operator node over upstream handles.
pub(crate) enum Node<T> {
    /// An owned concrete container; the base source of a chain.
    Solid(Solid<T>),
    /// A live view of a shared mutable container. Each pass observes the
    /// container's current state.
    Shared(Rc<RefCell<Vec<T>>>),
    /// An operator or recomputing/generated source.
    Op(Rc<dyn Produce<T>>),
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Solid(solid) => Self::Solid(solid.clone()),
            Self::Shared(cell) => Self::Shared(Rc::clone(cell)),
            Self::Op(node) => Self::Op(Rc::clone(node)),
        }
    }
}

/// Lazily populated materialized views, owned by one handle.
///
/// Populated only when the handle is immutable; a live handle recomputes
/// every materializing access instead.
pub(crate) struct ViewCaches<T> {
    array: OnceCell<Rc<Vec<T>>>,
    set: OnceCell<Rc<FxHashSet<T>>>,
    map: OnceCell<Rc<dyn Any>>,
    solid: OnceCell<Solid<T>>,
}

impl<T> Default for ViewCaches<T> {
    fn default() -> Self {
        Self {
            array: OnceCell::new(),
            set: OnceCell::new(),
            map: OnceCell::new(),
            solid: OnceCell::new(),
        }
    }
}

/// A lazy, chainable sequence over an arbitrary source.
///
/// Every operator returns a *new* handle whose evaluation is deferred until a
/// terminal consumer pulls values; chains stay live to upstream mutation
/// unless an operator's contract says otherwise ([`solidify`](Seq::solidify)).
/// Handles clone in O(1) and never mutate their own fields.
pub struct Seq<T> {
    node: Node<T>,
    one_off: bool,
    immutable: bool,
    caches: Rc<ViewCaches<T>>,
}

impl<T> Clone for Seq<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            one_off: self.one_off,
            immutable: self.immutable,
            caches: Rc::clone(&self.caches),
        }
    }
}

/// One consumer pass over a handle.
pub struct SeqIter<'a, T> {
    inner: Box<dyn Iterator<Item = T> + 'a>,
}

impl<T> Iterator for SeqIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }
}

impl<'a, T> IntoIterator for &'a Seq<T>
where
    T: Clone + 'static,
{
    type Item = T;
    type IntoIter = SeqIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for Seq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl<T> std::fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seq({})", self.labels().join(" <- "))
    }
}

impl<T> Seq<T> {
    fn from_parts(node: Node<T>, one_off: bool, immutable: bool) -> Self {
        Self {
            node,
            one_off,
            immutable,
            caches: Rc::new(ViewCaches::default()),
        }
    }

    pub(crate) fn from_op(node: impl Produce<T> + 'static) -> Self {
        Self::from_parts(Node::Op(Rc::new(node)), false, false)
    }

    /// Wraps an owned snapshot of `items`. The handle owns its container, so
    /// it is immutable and its container is extractable without copying.
    pub fn of(items: impl IntoIterator<Item = T>) -> Self {
        let vec: Vec<T> = items.into_iter().collect();
        Self::from_parts(Node::Solid(Solid::from(vec)), true, true)
    }

    /// Wraps an owned hash set; membership probes against this handle are
    /// O(1).
    pub fn of_set(set: FxHashSet<T>) -> Self {
        Self::from_parts(Node::Solid(Solid::from(set)), true, true)
    }

    /// An immutable snapshot of a literal slice.
    pub fn literal(items: &[T]) -> Self
    where
        T: Clone,
    {
        Self::of(items.to_vec())
    }

    /// The empty sequence; immutable and one-off.
    pub fn empty() -> Self {
        Self::of(Vec::new())
    }

    /// Wraps a live shared container. Each pass observes the container's
    /// state at that moment; nothing is cached.
    pub fn shared(source: Rc<RefCell<Vec<T>>>) -> Self {
        Self::from_parts(Node::Shared(source), false, false)
    }

    /// Wraps a recomputing source thunk, invoked anew on every pass.
    pub fn from_fn(thunk: impl Fn() -> Vec<T> + 'static) -> Self
    where
        T: Clone + 'static,
    {
        Self::from_op(ThunkNode {
            thunk: move || Solid::from(thunk()),
        })
    }

    /// The infinite sequence `f(0), f(1), ...`. Must be bounded by `take` or
    /// a similar operator before any terminal that drains its source.
    pub fn generate(func: impl Fn(usize) -> T + 'static) -> Self
    where
        T: 'static,
    {
        Self::from_op(GenNode { func, limit: None })
    }

    /// The finite sequence `f(0), ..., f(count - 1)`.
    pub fn generate_n(func: impl Fn(usize) -> T + 'static, count: usize) -> Self
    where
        T: 'static,
    {
        Self::from_op(GenNode {
            func,
            limit: Some(count),
        })
    }

    /// Whether repeated passes are guaranteed to observe the same elements,
    /// enabling permanent view caches.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Whether this handle exclusively owns its base container, enabling
    /// zero-copy extraction via [`into_array`](Seq::into_array).
    pub fn is_one_off(&self) -> bool {
        self.one_off
    }

    /// The operator chain's tags, outermost first, without evaluating it.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.describe_into(&mut out);
        out
    }

    pub(crate) fn describe_into(&self, out: &mut Vec<&'static str>) {
        match &self.node {
            Node::Solid(Solid::Indexed(_)) => out.push("array"),
            Node::Solid(Solid::Hashed(_)) => out.push("set"),
            Node::Shared(_) => out.push("shared"),
            Node::Op(node) => node.describe(out),
        }
    }
}

impl Seq<i64> {
    /// The integers of `range`, generated lazily.
    pub fn range(range: std::ops::Range<i64>) -> Self {
        let start = range.start;
        let count = range.end.saturating_sub(start).max(0) as usize;
        Self::generate_n(move |index| start + index as i64, count)
    }
}

impl<T> Seq<T>
where
    T: Clone + 'static,
{
    /// Starts one pass over the sequence.
    ///
    /// Iteration bottoms out at the base source: intermediate handles add no
    /// storage of their own.
    pub fn iter(&self) -> SeqIter<'_, T> {
        let inner: Box<dyn Iterator<Item = T> + '_> = match &self.node {
            Node::Solid(solid) => Box::new(solid.iter().cloned()),
            // Snapshot per pass: holding a borrow across a consumer-driven
            // pass would make any reentrant mutation panic.
            Node::Shared(cell) => Box::new(cell.borrow().clone().into_iter()),
            Node::Op(node) => node.produce(),
        };
        SeqIter { inner }
    }

    // ------------------------------------------------------------------
    // Transformation operators.
    // ------------------------------------------------------------------

    /// Element-wise transformation.
    pub fn map<U>(&self, func: impl Fn(T) -> U + 'static) -> Seq<U>
    where
        U: 'static,
    {
        Seq::from_op(MapNode {
            upstream: self.clone(),
            func: Rc::new(func),
        })
    }

    /// Maps each element to a collection and flattens the results.
    pub fn flat_map<U, I>(&self, func: impl Fn(T) -> I + 'static) -> Seq<U>
    where
        U: 'static,
        I: IntoIterator<Item = U> + 'static,
    {
        Seq::from_op(FlatMapNode {
            upstream: self.clone(),
            func: Rc::new(func),
            _marker: std::marker::PhantomData,
        })
    }

    /// Keeps elements matching `pred`.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Seq<T> {
        Seq::from_op(FilterNode {
            upstream: self.clone(),
            pred: Rc::new(pred),
            tag: "filter",
        })
    }

    pub(crate) fn filter_tagged(
        &self,
        pred: impl Fn(&T) -> bool + 'static,
        tag: &'static str,
    ) -> Seq<T> {
        Seq::from_op(FilterNode {
            upstream: self.clone(),
            pred: Rc::new(pred),
            tag,
        })
    }

    /// First `count` elements; a negative `count` keeps the last `|count|`
    /// elements in their original order.
    pub fn take(&self, count: isize) -> Seq<T> {
        Seq::from_op(TakeNode {
            upstream: self.clone(),
            count,
        })
    }

    /// Drops the first `count` elements; a negative `count` drops the last
    /// `|count|` instead.
    pub fn skip(&self, count: isize) -> Seq<T> {
        Seq::from_op(SkipNode {
            upstream: self.clone(),
            count,
        })
    }

    /// Yields elements while `pred` holds.
    pub fn take_while(&self, pred: impl Fn(&T) -> bool + 'static) -> Seq<T> {
        Seq::from_op(TakeWhileNode {
            upstream: self.clone(),
            pred: Rc::new(pred),
        })
    }

    /// Drops elements while `pred` holds, then yields the rest.
    pub fn skip_while(&self, pred: impl Fn(&T) -> bool + 'static) -> Seq<T> {
        Seq::from_op(SkipWhileNode {
            upstream: self.clone(),
            pred: Rc::new(pred),
        })
    }

    /// Selects exactly `count` elements evenly spread across the sequence.
    pub fn take_sparse(&self, count: usize) -> Seq<T> {
        Seq::from_op(SparseNode {
            upstream: self.clone(),
            count,
            keep: true,
        })
    }

    /// Excludes exactly the elements [`take_sparse`](Seq::take_sparse) would
    /// select.
    pub fn skip_sparse(&self, count: usize) -> Seq<T> {
        Seq::from_op(SparseNode {
            upstream: self.clone(),
            count,
            keep: false,
        })
    }

    /// Reverses the sequence.
    pub fn reverse(&self) -> Seq<T> {
        Seq::from_op(ReverseNode {
            upstream: self.clone(),
        })
    }

    /// Stable sort by the general-purpose total order.
    pub fn sort(&self) -> Seq<T>
    where
        T: TotalOrder,
    {
        self.sorted_by_specs(Rc::new(vec![fn_comparator(|a: &T, b: &T| a.total_cmp(b))]))
    }

    /// Stable sort by a caller-supplied comparator.
    pub fn sort_by(&self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> Seq<T> {
        self.sorted_by_specs(Rc::new(vec![fn_comparator(cmp)]))
    }

    pub(crate) fn sorted_by_specs(&self, specs: Rc<Vec<Comparator<T>>>) -> Seq<T> {
        Seq::from_op(SortNode {
            upstream: self.clone(),
            specs,
        })
    }

    /// Ascending multi-key ordering; extend with
    /// [`then_by`](OrderedSeq::then_by).
    pub fn order_by<K>(&self, key: impl Fn(&T) -> K + 'static) -> OrderedSeq<T>
    where
        K: TotalOrder,
    {
        OrderedSeq::new(self.clone(), vec![key_comparator(key)])
    }

    /// Descending multi-key ordering.
    pub fn order_by_descending<K>(&self, key: impl Fn(&T) -> K + 'static) -> OrderedSeq<T>
    where
        K: TotalOrder,
    {
        OrderedSeq::new(self.clone(), vec![descending(key_comparator(key))])
    }

    /// Multi-key ordering seeded with a raw comparator.
    pub fn order_with(&self, cmp: impl Fn(&T, &T) -> Ordering + 'static) -> OrderedSeq<T> {
        OrderedSeq::new(self.clone(), vec![fn_comparator(cmp)])
    }

    /// First-seen-order deduplication of the elements themselves.
    pub fn distinct(&self) -> Seq<T>
    where
        T: Eq + Hash,
    {
        self.distinct_by(|item: &T| item.clone())
    }

    /// First-seen-order deduplication by an extracted identity key.
    pub fn distinct_by<K>(&self, key: impl Fn(&T) -> K + 'static) -> Seq<T>
    where
        K: Eq + Hash + 'static,
    {
        Seq::from_op(DistinctNode {
            upstream: self.clone(),
            key: Rc::new(key),
        })
    }

    /// This sequence followed by `other`.
    pub fn concat(&self, other: &Seq<T>) -> Seq<T> {
        Seq::from_op(ConcatNode {
            first: self.clone(),
            second: other.clone(),
        })
    }

    /// Alternating interleave with `other`; the longer tail runs out alone.
    pub fn merge(&self, other: &Seq<T>) -> Seq<T> {
        Seq::from_op(MergeNode {
            first: self.clone(),
            second: other.clone(),
        })
    }

    /// Pairs elements positionally with `other`, ending at the shorter side.
    pub fn zip<U>(&self, other: &Seq<U>) -> Seq<(T, U)>
    where
        U: Clone + 'static,
    {
        Seq::from_op(ZipNode {
            left: self.clone(),
            right: other.clone(),
        })
    }

    /// Elements present in both this sequence and `other`.
    pub fn intersect(&self, other: &Seq<T>) -> Seq<T>
    where
        T: Eq + Hash,
    {
        self.set_op(other, SetOp::Intersect)
    }

    /// Union with `other`, deduplicated in first-seen order.
    pub fn union_with(&self, other: &Seq<T>) -> Seq<T>
    where
        T: Eq + Hash,
    {
        self.set_op(other, SetOp::Union)
    }

    /// Elements of this sequence not present in `other`.
    pub fn without(&self, other: &Seq<T>) -> Seq<T>
    where
        T: Eq + Hash,
    {
        self.set_op(other, SetOp::Without)
    }

    fn set_op(&self, other: &Seq<T>, op: SetOp) -> Seq<T>
    where
        T: Eq + Hash,
    {
        Seq::from_op(SetOpNode {
            lhs: self.clone(),
            rhs: other.clone(),
            op,
        })
    }

    /// Random permutation, re-drawn on every pass. The upstream source is
    /// never permuted in place.
    pub fn shuffle(&self) -> Seq<T> {
        self.random_op(RandomOp::Shuffle)
    }

    /// Up to `count` elements drawn uniformly without replacement.
    pub fn take_random(&self, count: usize) -> Seq<T> {
        self.random_op(RandomOp::Take(count))
    }

    /// Drops `count` uniformly chosen elements, keeping the survivors in
    /// their original order.
    pub fn skip_random(&self, count: usize) -> Seq<T> {
        self.random_op(RandomOp::Skip(count))
    }

    fn random_op(&self, op: RandomOp) -> Seq<T> {
        Seq::from_op(RandomNode {
            upstream: self.clone(),
            op,
        })
    }

    /// Replays the sequence `passes` times total, buffering it once per
    /// consumer pass. Negative `passes` repeats from the tail.
    pub fn repeat(&self, passes: isize) -> Seq<T> {
        Seq::from_op(RepeatNode {
            upstream: self.clone(),
            passes,
        })
    }

    /// Inserts one element at `index` (clamped to the length).
    pub fn insert(&self, index: usize, item: T) -> Seq<T> {
        self.insert_all(index, [item])
    }

    /// Inserts elements at `index` (clamped to the length).
    pub fn insert_all(&self, index: usize, items: impl IntoIterator<Item = T>) -> Seq<T> {
        Seq::from_op(InsertNode {
            upstream: self.clone(),
            index,
            items: Rc::new(items.into_iter().collect()),
        })
    }

    /// Removes `delete_count` elements beginning at `start`.
    pub fn remove(&self, start: usize, delete_count: usize) -> Seq<T> {
        Seq::from_op(RemoveNode {
            upstream: self.clone(),
            start,
            delete_count,
        })
    }

    /// Groups elements by key in insertion order.
    pub fn group_by<K>(&self, key: impl Fn(&T) -> K + 'static) -> Seq<(K, Vec<T>)>
    where
        K: Eq + Hash + Clone + 'static,
    {
        self.group_by_values(key, |item| item)
    }

    /// Groups a projection of each element by key in insertion order.
    pub fn group_by_values<K, V>(
        &self,
        key: impl Fn(&T) -> K + 'static,
        value: impl Fn(T) -> V + 'static,
    ) -> Seq<(K, Vec<V>)>
    where
        K: Eq + Hash + Clone + 'static,
        V: Clone + 'static,
    {
        Seq::from_op(GroupByNode {
            upstream: self.clone(),
            key: Rc::new(key),
            value: Rc::new(value),
        })
    }

    /// For each element, the bucket of `inner` elements sharing its key. The
    /// inner side is fully grouped before this side streams.
    pub fn group_join<R, K>(
        &self,
        inner: &Seq<R>,
        outer_key: impl Fn(&T) -> K + 'static,
        inner_key: impl Fn(&R) -> K + 'static,
    ) -> Seq<(T, Vec<R>)>
    where
        R: Clone + 'static,
        K: Eq + Hash + Clone + 'static,
    {
        Seq::from_op(GroupJoinNode {
            outer: self.clone(),
            inner: inner.clone(),
            outer_key: Rc::new(outer_key),
            inner_key: Rc::new(inner_key),
        })
    }

    /// Inner equi-join with `inner`.
    pub fn join<R, K>(
        &self,
        inner: &Seq<R>,
        outer_key: impl Fn(&T) -> K + 'static,
        inner_key: impl Fn(&R) -> K + 'static,
    ) -> Seq<(T, R)>
    where
        R: Clone + 'static,
        K: Eq + Hash + Clone + 'static,
    {
        Seq::from_op(JoinNode {
            outer: self.clone(),
            inner: inner.clone(),
            outer_key: Rc::new(outer_key),
            inner_key: Rc::new(inner_key),
        })
    }

    /// Join by an arbitrary match predicate; degrades to a nested-loop
    /// comparison across all pairs.
    pub fn join_by<R>(
        &self,
        inner: &Seq<R>,
        matches: impl Fn(&T, &R) -> bool + 'static,
    ) -> Seq<(T, R)>
    where
        R: Clone + 'static,
    {
        Seq::from_op(JoinByNode {
            outer: self.clone(),
            inner: inner.clone(),
            matches: Rc::new(matches),
        })
    }

    /// Starts a type-narrowing filter chain admitting elements matching
    /// `pred`; extend the admitted union with [`and`](Narrowed::and).
    pub fn narrow(&self, pred: impl Fn(&T) -> bool + 'static) -> Narrowed<T> {
        Narrowed::new(self.clone(), vec![Rc::new(pred)], false)
    }

    /// Starts a type-narrowing filter chain *excluding* elements matching
    /// `pred` (or any predicate later added with [`and`](Narrowed::and)).
    pub fn narrow_out(&self, pred: impl Fn(&T) -> bool + 'static) -> Narrowed<T> {
        Narrowed::new(self.clone(), vec![Rc::new(pred)], true)
    }

    /// Copies the current elements into a new immutable handle, decoupled
    /// from upstream: later upstream mutation is no longer observed.
    pub fn solidify(&self) -> Seq<T> {
        let snapshot: Vec<T> = self.iter().collect();
        trace!(len = snapshot.len(), "solidified sequence");
        Seq::of(snapshot)
    }

    /// Like [`solidify`](Seq::solidify), but the copy is deferred to the
    /// returned handle's first pass and then shared by all its consumers.
    pub fn lazy_solidify(&self) -> Seq<T> {
        let mut handle = Seq::from_op(LazySolidNode::new(self.clone()));
        handle.immutable = true;
        handle
    }

    // ------------------------------------------------------------------
    // Terminal operators.
    // ------------------------------------------------------------------

    /// Number of elements. O(1) when the base container is already solid and
    /// no operators intervene.
    pub fn count(&self) -> usize {
        match &self.node {
            Node::Solid(solid) => solid.len(),
            Node::Shared(cell) => cell.borrow().len(),
            Node::Op(_) => self.iter().count(),
        }
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<T> {
        self.iter().last()
    }

    /// The element at `index`, if the sequence is long enough.
    pub fn nth(&self, index: usize) -> Option<T> {
        self.iter().nth(index)
    }

    /// Folds with an explicit seed. An empty sequence yields the seed.
    pub fn fold<A>(&self, seed: A, func: impl FnMut(A, T) -> A) -> A {
        self.iter().fold(seed, func)
    }

    /// Reduces without a seed; fails on an empty sequence.
    pub fn reduce(&self, mut func: impl FnMut(T, T) -> T) -> Result<T, SeqError> {
        let mut iter = self.iter();
        let mut accum = iter.next().ok_or(SeqError::EmptyReduction)?;
        for item in iter {
            accum = func(accum, item);
        }
        Ok(accum)
    }

    /// True if every element matches `pred` (vacuously true when empty).
    pub fn every(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.iter().all(|item| pred(&item))
    }

    /// True if any element matches `pred`.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.iter().any(|item| pred(&item))
    }

    /// True if `item` occurs in the sequence.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|held| held == *item)
    }

    /// Element-wise equality with another handle, including length.
    pub fn sequence_eq(&self, other: &Seq<T>) -> bool
    where
        T: PartialEq,
    {
        ops::sequence_eq(self.iter(), other.iter())
    }

    /// Runs `func` on every element.
    pub fn for_each(&self, func: impl FnMut(T)) {
        self.iter().for_each(func);
    }

    /// The sole element; fails if the sequence is empty or has more than one
    /// element.
    pub fn single(&self) -> Result<T, SeqError> {
        let mut iter = self.iter();
        let found = iter.next().ok_or(SeqError::EmptySequence)?;
        match iter.next() {
            None => Ok(found),
            Some(_) => Err(SeqError::Cardinality(2)),
        }
    }

    /// The sole element, or `None` when the count is not exactly one.
    pub fn single_opt(&self) -> Option<T> {
        self.single().ok()
    }

    /// One uniformly chosen element; fails on an empty sequence.
    pub fn random(&self) -> Result<T, SeqError> {
        let buf: Vec<T> = self.iter().collect();
        if buf.is_empty() {
            return Err(SeqError::EmptySequence);
        }
        let mut rng = SmallRng::from_entropy();
        let index = rng.gen_range(0..buf.len());
        Ok(buf.into_iter().nth(index).expect("index drawn from 0..len"))
    }

    /// The minimum by the general-purpose total order.
    pub fn min(&self) -> Option<T>
    where
        T: TotalOrder,
    {
        self.iter().min_by(|a, b| a.total_cmp(b))
    }

    /// The maximum by the general-purpose total order.
    pub fn max(&self) -> Option<T>
    where
        T: TotalOrder,
    {
        self.iter().max_by(|a, b| a.total_cmp(b))
    }

    // ------------------------------------------------------------------
    // Views and extraction.
    // ------------------------------------------------------------------

    /// A read-optimized array view.
    ///
    /// Never copies when the base container is already an array with no
    /// operators in between. Cached permanently iff the handle is immutable;
    /// otherwise recomputed from the live source on every call.
    pub fn as_array(&self) -> Rc<Vec<T>> {
        if let Node::Solid(Solid::Indexed(vec)) = &self.node {
            return Rc::clone(vec);
        }
        if self.immutable {
            Rc::clone(self.caches.array.get_or_init(|| {
                let vec: Vec<T> = self.iter().collect();
                trace!(len = vec.len(), "populated array view cache");
                Rc::new(vec)
            }))
        } else {
            Rc::new(self.iter().collect())
        }
    }

    /// A read-optimized set view; same caching contract as
    /// [`as_array`](Seq::as_array).
    pub fn as_set(&self) -> Rc<FxHashSet<T>>
    where
        T: Eq + Hash,
    {
        if let Node::Solid(Solid::Hashed(set)) = &self.node {
            return Rc::clone(set);
        }
        if self.immutable {
            Rc::clone(self.caches.set.get_or_init(|| {
                let set: FxHashSet<T> = self.iter().collect();
                trace!(len = set.len(), "populated set view cache");
                Rc::new(set)
            }))
        } else {
            Rc::new(self.iter().collect())
        }
    }

    /// The canonical solid view; same caching contract as
    /// [`as_array`](Seq::as_array). Clones in O(1) when the base is already
    /// solid.
    pub fn as_solid(&self) -> Solid<T> {
        if let Node::Solid(solid) = &self.node {
            return solid.clone();
        }
        if self.immutable {
            self.caches
                .solid
                .get_or_init(|| {
                    let solid: Solid<T> = self.iter().collect();
                    trace!(len = solid.len(), "populated solid view cache");
                    solid
                })
                .clone()
        } else {
            self.iter().collect()
        }
    }

    /// A fresh, caller-owned array copy.
    pub fn to_array(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// A fresh, caller-owned set copy.
    pub fn to_set(&self) -> FxHashSet<T>
    where
        T: Eq + Hash,
    {
        self.iter().collect()
    }

    /// Extracts the elements, consuming the handle.
    ///
    /// When the handle is one-off, its base is already an array, and nothing
    /// else aliases that array, ownership transfers without copying.
    pub fn into_array(self) -> Vec<T> {
        let Self {
            node,
            one_off,
            immutable,
            caches,
        } = self;
        drop(caches);
        match node {
            Node::Solid(Solid::Indexed(vec)) if one_off => {
                Rc::try_unwrap(vec).unwrap_or_else(|shared| (*shared).clone())
            }
            node => Self::from_parts(node, one_off, immutable).to_array(),
        }
    }

    /// Extracts the elements as a set, consuming the handle; zero-copy under
    /// the same conditions as [`into_array`](Seq::into_array).
    pub fn into_set(self) -> FxHashSet<T>
    where
        T: Eq + Hash,
    {
        let Self {
            node,
            one_off,
            immutable,
            caches,
        } = self;
        drop(caches);
        match node {
            Node::Solid(Solid::Hashed(set)) if one_off => {
                Rc::try_unwrap(set).unwrap_or_else(|shared| (*shared).clone())
            }
            node => Self::from_parts(node, one_off, immutable).to_set(),
        }
    }
}

impl<K, V> Seq<(K, V)>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Wraps an owned map as a sequence of key-value pairs.
    pub fn of_map(map: FxHashMap<K, V>) -> Self {
        Self::of(map)
    }

    /// A read-optimized map view of the pairs; later pairs win duplicate
    /// keys. Same caching contract as [`as_array`](Seq::as_array).
    pub fn as_map(&self) -> Rc<FxHashMap<K, V>> {
        if self.immutable {
            let cached = self.caches.map.get_or_init(|| {
                let map: FxHashMap<K, V> = self.iter().collect();
                trace!(len = map.len(), "populated map view cache");
                Rc::new(map) as Rc<dyn Any>
            });
            Rc::clone(cached)
                .downcast::<FxHashMap<K, V>>()
                .expect("map cache holds this sequence's pair type")
        } else {
            Rc::new(self.iter().collect())
        }
    }

    /// A fresh, caller-owned map copy; later pairs win duplicate keys.
    pub fn to_map(&self) -> FxHashMap<K, V> {
        self.iter().collect()
    }
}
