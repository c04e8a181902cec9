//! Stand-alone sequence-algebra primitives, i.e. [`Iterator`] helpers.
//!
//! Everything here is pure and source-agnostic: functions take iterators or
//! [`Solid`](crate::solid::Solid) containers and buffer their input at most
//! once per call. The lazy handle type builds on these.

mod distinct;
pub use distinct::{DistinctBy, distinct_by};

mod set_ops;
pub use set_ops::{intersect, union_with, without};

mod group;
pub use group::{KeyedBuckets, group_by, group_join, inner_join, join_by};

mod sample;
pub use sample::{shuffled, skip_random, skip_sparse, sparse_indices, take_random, take_sparse};

mod sequence;
pub use sequence::{RepeatIter, repeat_iter, sequence_eq, splice_insert, splice_remove};
