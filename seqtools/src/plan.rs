//! Operator plan nodes and the [`Produce`] evaluator seam.
//!
//! Each operator is a tagged node holding its upstream handle(s) plus its
//! parameters; nothing executes until a terminal consumer pulls. The node
//! labels make a chain introspectable without evaluating it.

use std::hash::Hash;
use std::rc::Rc;

use itertools::interleave;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::trace;

use crate::compare::{Comparator, multi_compare};
use crate::lazy::Lazy;
use crate::ops;
use crate::seq::Seq;
use crate::solid::Solid;

/// The evaluator seam: anything that can lazily produce one pass of values.
pub(crate) trait Produce<T> {
    /// Starts one consumer pass over this node's output.
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_>;

    /// The operator tag for this node.
    fn label(&self) -> &'static str;

    /// Appends this node's label and its upstream chain's labels,
    /// outermost first.
    fn describe(&self, out: &mut Vec<&'static str>);
}

/// Recomputing source thunk: invoked anew on every pass.
pub(crate) struct ThunkNode<F> {
    pub(crate) thunk: F,
}

impl<T, F> Produce<T> for ThunkNode<F>
where
    T: Clone + 'static,
    F: Fn() -> Solid<T>,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new((self.thunk)().into_iter_owned())
    }

    fn label(&self) -> &'static str {
        "thunk"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
    }
}

/// Generator source: `f(0), f(1), ...`, optionally bounded.
pub(crate) struct GenNode<F> {
    pub(crate) func: F,
    pub(crate) limit: Option<usize>,
}

impl<T, F> Produce<T> for GenNode<F>
where
    F: Fn(usize) -> T,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let func = &self.func;
        Box::new((0..self.limit.unwrap_or(usize::MAX)).map(move |index| (func)(index)))
    }

    fn label(&self) -> &'static str {
        "generate"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
    }
}

pub(crate) struct MapNode<S, T> {
    pub(crate) upstream: Seq<S>,
    pub(crate) func: Rc<dyn Fn(S) -> T>,
}

impl<S, T> Produce<T> for MapNode<S, T>
where
    S: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let func = Rc::clone(&self.func);
        Box::new(self.upstream.iter().map(move |item| (func)(item)))
    }

    fn label(&self) -> &'static str {
        "map"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct FlatMapNode<S, T, I> {
    pub(crate) upstream: Seq<S>,
    pub(crate) func: Rc<dyn Fn(S) -> I>,
    pub(crate) _marker: std::marker::PhantomData<fn() -> T>,
}

impl<S, T, I> Produce<T> for FlatMapNode<S, T, I>
where
    S: Clone + 'static,
    I: IntoIterator<Item = T>,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let func = Rc::clone(&self.func);
        Box::new(self.upstream.iter().flat_map(move |item| (func)(item)))
    }

    fn label(&self) -> &'static str {
        "flat_map"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct FilterNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) pred: Rc<dyn Fn(&T) -> bool>,
    pub(crate) tag: &'static str,
}

impl<T> Produce<T> for FilterNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let pred = Rc::clone(&self.pred);
        Box::new(self.upstream.iter().filter(move |item| (pred)(item)))
    }

    fn label(&self) -> &'static str {
        self.tag
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct TakeWhileNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) pred: Rc<dyn Fn(&T) -> bool>,
}

impl<T> Produce<T> for TakeWhileNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let pred = Rc::clone(&self.pred);
        Box::new(self.upstream.iter().take_while(move |item| (pred)(item)))
    }

    fn label(&self) -> &'static str {
        "take_while"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct SkipWhileNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) pred: Rc<dyn Fn(&T) -> bool>,
}

impl<T> Produce<T> for SkipWhileNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let pred = Rc::clone(&self.pred);
        Box::new(self.upstream.iter().skip_while(move |item| (pred)(item)))
    }

    fn label(&self) -> &'static str {
        "skip_while"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

/// `take(n)`. Negative `n` keeps the last `|n|` elements in original order
/// (reverse, take, reverse).
pub(crate) struct TakeNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) count: isize,
}

impl<T> Produce<T> for TakeNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        if self.count >= 0 {
            Box::new(self.upstream.iter().take(self.count as usize))
        } else {
            let buf: Vec<T> = self.upstream.iter().collect();
            let from_end = self.count.unsigned_abs();
            let skip = buf.len().saturating_sub(from_end);
            Box::new(buf.into_iter().skip(skip))
        }
    }

    fn label(&self) -> &'static str {
        "take"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

/// `skip(n)`. Negative `n` drops the last `|n|` elements.
pub(crate) struct SkipNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) count: isize,
}

impl<T> Produce<T> for SkipNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        if self.count >= 0 {
            Box::new(self.upstream.iter().skip(self.count as usize))
        } else {
            let buf: Vec<T> = self.upstream.iter().collect();
            let from_end = self.count.unsigned_abs();
            let keep = buf.len().saturating_sub(from_end);
            Box::new(buf.into_iter().take(keep))
        }
    }

    fn label(&self) -> &'static str {
        "skip"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct ReverseNode<T> {
    pub(crate) upstream: Seq<T>,
}

impl<T> Produce<T> for ReverseNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let buf: Vec<T> = self.upstream.iter().collect();
        Box::new(buf.into_iter().rev())
    }

    fn label(&self) -> &'static str {
        "reverse"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

/// Stable multi-key sort. The composite comparator is applied at pass time,
/// never cached.
pub(crate) struct SortNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) specs: Rc<Vec<Comparator<T>>>,
}

impl<T> Produce<T> for SortNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let mut buf: Vec<T> = self.upstream.iter().collect();
        buf.sort_by(|a, b| multi_compare(&self.specs, a, b));
        Box::new(buf.into_iter())
    }

    fn label(&self) -> &'static str {
        "sort"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct DistinctNode<T, K> {
    pub(crate) upstream: Seq<T>,
    pub(crate) key: Rc<dyn Fn(&T) -> K>,
}

impl<T, K> Produce<T> for DistinctNode<T, K>
where
    T: Clone + 'static,
    K: Eq + Hash + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let key = Rc::clone(&self.key);
        Box::new(ops::distinct_by(self.upstream.iter(), move |item| {
            (key)(item)
        }))
    }

    fn label(&self) -> &'static str {
        "distinct"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct ConcatNode<T> {
    pub(crate) first: Seq<T>,
    pub(crate) second: Seq<T>,
}

impl<T> Produce<T> for ConcatNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.first.iter().chain(self.second.iter()))
    }

    fn label(&self) -> &'static str {
        "concat"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.first.describe_into(out);
        self.second.describe_into(out);
    }
}

/// Alternating interleave of two sources.
pub(crate) struct MergeNode<T> {
    pub(crate) first: Seq<T>,
    pub(crate) second: Seq<T>,
}

impl<T> Produce<T> for MergeNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(interleave(self.first.iter(), self.second.iter()))
    }

    fn label(&self) -> &'static str {
        "merge"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.first.describe_into(out);
        self.second.describe_into(out);
    }
}

pub(crate) struct ZipNode<A, B> {
    pub(crate) left: Seq<A>,
    pub(crate) right: Seq<B>,
}

impl<A, B> Produce<(A, B)> for ZipNode<A, B>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = (A, B)> + '_> {
        Box::new(self.left.iter().zip(self.right.iter()))
    }

    fn label(&self) -> &'static str {
        "zip"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.left.describe_into(out);
        self.right.describe_into(out);
    }
}

/// `repeat(n)`: `n` total passes, buffered once. Negative `n` repeats from
/// the tail (reverse, repeat, reverse).
pub(crate) struct RepeatNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) passes: isize,
}

impl<T> Produce<T> for RepeatNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        if self.passes >= 0 {
            Box::new(ops::repeat_iter(self.upstream.iter(), self.passes as usize))
        } else {
            let mut buf: Vec<T> = self.upstream.iter().collect();
            buf.reverse();
            let mut out: Vec<T> =
                ops::repeat_iter(buf.into_iter(), self.passes.unsigned_abs()).collect();
            out.reverse();
            Box::new(out.into_iter())
        }
    }

    fn label(&self) -> &'static str {
        "repeat"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

/// Evenly spread selection or exclusion of `count` elements.
pub(crate) struct SparseNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) count: usize,
    pub(crate) keep: bool,
}

impl<T> Produce<T> for SparseNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let buf: Vec<T> = self.upstream.iter().collect();
        let out = if self.keep {
            ops::take_sparse(buf, self.count)
        } else {
            ops::skip_sparse(buf, self.count)
        };
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        if self.keep { "take_sparse" } else { "skip_sparse" }
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

/// Random operators re-permute on every pass; the upstream is never touched.
pub(crate) enum RandomOp {
    Shuffle,
    Take(usize),
    Skip(usize),
}

pub(crate) struct RandomNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) op: RandomOp,
}

impl<T> Produce<T> for RandomNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let buf: Vec<T> = self.upstream.iter().collect();
        let mut rng = SmallRng::from_entropy();
        let out = match self.op {
            RandomOp::Shuffle => ops::shuffled(buf, &mut rng),
            RandomOp::Take(count) => ops::take_random(buf, count, &mut rng),
            RandomOp::Skip(count) => ops::skip_random(buf, count, &mut rng),
        };
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        match self.op {
            RandomOp::Shuffle => "shuffle",
            RandomOp::Take(_) => "take_random",
            RandomOp::Skip(_) => "skip_random",
        }
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) enum SetOp {
    Intersect,
    Union,
    Without,
}

pub(crate) struct SetOpNode<T> {
    pub(crate) lhs: Seq<T>,
    pub(crate) rhs: Seq<T>,
    pub(crate) op: SetOp,
}

impl<T> Produce<T> for SetOpNode<T>
where
    T: Clone + Eq + Hash + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let lhs = self.lhs.as_solid();
        let rhs = self.rhs.as_solid();
        let out = match self.op {
            SetOp::Intersect => ops::intersect(&lhs, &rhs),
            SetOp::Union => ops::union_with(&lhs, &rhs),
            SetOp::Without => ops::without(&lhs, &rhs),
        };
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        match self.op {
            SetOp::Intersect => "intersect",
            SetOp::Union => "union",
            SetOp::Without => "without",
        }
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.lhs.describe_into(out);
        self.rhs.describe_into(out);
    }
}

pub(crate) struct InsertNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) index: usize,
    pub(crate) items: Rc<Vec<T>>,
}

impl<T> Produce<T> for InsertNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let buf: Vec<T> = self.upstream.iter().collect();
        let out = ops::splice_insert(buf, self.index, (*self.items).clone());
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "insert"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct RemoveNode<T> {
    pub(crate) upstream: Seq<T>,
    pub(crate) start: usize,
    pub(crate) delete_count: usize,
}

impl<T> Produce<T> for RemoveNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        let buf: Vec<T> = self.upstream.iter().collect();
        let out = ops::splice_remove(buf, self.start, self.delete_count);
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "remove"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct GroupByNode<S, K, V> {
    pub(crate) upstream: Seq<S>,
    pub(crate) key: Rc<dyn Fn(&S) -> K>,
    pub(crate) value: Rc<dyn Fn(S) -> V>,
}

impl<S, K, V> Produce<(K, Vec<V>)> for GroupByNode<S, K, V>
where
    S: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = (K, Vec<V>)> + '_> {
        let key = Rc::clone(&self.key);
        let value = Rc::clone(&self.value);
        let out = ops::group_by(self.upstream.iter(), move |item| (key)(item), move |item| {
            (value)(item)
        });
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "group_by"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.upstream.describe_into(out);
    }
}

pub(crate) struct GroupJoinNode<L, R, K> {
    pub(crate) outer: Seq<L>,
    pub(crate) inner: Seq<R>,
    pub(crate) outer_key: Rc<dyn Fn(&L) -> K>,
    pub(crate) inner_key: Rc<dyn Fn(&R) -> K>,
}

impl<L, R, K> Produce<(L, Vec<R>)> for GroupJoinNode<L, R, K>
where
    L: Clone + 'static,
    R: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = (L, Vec<R>)> + '_> {
        let outer_key = Rc::clone(&self.outer_key);
        let inner_key = Rc::clone(&self.inner_key);
        let out = ops::group_join(
            self.outer.iter(),
            self.inner.iter(),
            move |item| (outer_key)(item),
            move |item| (inner_key)(item),
        );
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "group_join"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.outer.describe_into(out);
        self.inner.describe_into(out);
    }
}

pub(crate) struct JoinNode<L, R, K> {
    pub(crate) outer: Seq<L>,
    pub(crate) inner: Seq<R>,
    pub(crate) outer_key: Rc<dyn Fn(&L) -> K>,
    pub(crate) inner_key: Rc<dyn Fn(&R) -> K>,
}

impl<L, R, K> Produce<(L, R)> for JoinNode<L, R, K>
where
    L: Clone + 'static,
    R: Clone + 'static,
    K: Eq + Hash + Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = (L, R)> + '_> {
        let outer_key = Rc::clone(&self.outer_key);
        let inner_key = Rc::clone(&self.inner_key);
        let out = ops::inner_join(
            self.outer.iter(),
            self.inner.iter(),
            move |item| (outer_key)(item),
            move |item| (inner_key)(item),
        );
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "join"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.outer.describe_into(out);
        self.inner.describe_into(out);
    }
}

pub(crate) struct JoinByNode<L, R> {
    pub(crate) outer: Seq<L>,
    pub(crate) inner: Seq<R>,
    pub(crate) matches: Rc<dyn Fn(&L, &R) -> bool>,
}

impl<L, R> Produce<(L, R)> for JoinByNode<L, R>
where
    L: Clone + 'static,
    R: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = (L, R)> + '_> {
        let matches = Rc::clone(&self.matches);
        let out = ops::join_by(self.outer.iter(), self.inner.iter(), move |left, right| {
            (matches)(left, right)
        });
        Box::new(out.into_iter())
    }

    fn label(&self) -> &'static str {
        "join_by"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
        self.outer.describe_into(out);
        self.inner.describe_into(out);
    }
}

/// Deferred snapshot: the upstream is copied on the first pass of this node
/// and the copy is shared by all later consumers.
pub(crate) struct LazySolidNode<T> {
    pub(crate) snapshot: Lazy<Rc<Vec<T>>>,
}

impl<T> LazySolidNode<T>
where
    T: Clone + 'static,
{
    pub(crate) fn new(upstream: Seq<T>) -> Self {
        Self {
            snapshot: Lazy::new(Box::new(move || {
                let snap: Vec<T> = upstream.iter().collect();
                trace!(len = snap.len(), "took deferred solidify snapshot");
                Rc::new(snap)
            })),
        }
    }
}

impl<T> Produce<T> for LazySolidNode<T>
where
    T: Clone + 'static,
{
    fn produce(&self) -> Box<dyn Iterator<Item = T> + '_> {
        Box::new(self.snapshot.force().iter().cloned())
    }

    fn label(&self) -> &'static str {
        "lazy_solidify"
    }

    fn describe(&self, out: &mut Vec<&'static str>) {
        out.push(self.label());
    }
}
