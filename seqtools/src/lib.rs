#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod compare;
pub mod error;
pub mod lazy;
mod narrow;
pub mod ops;
mod ordered;
mod plan;
mod seq;
pub mod solid;

pub use compare::{Comparator, TotalOrder, TypeRank, Value};
pub use error::SeqError;
pub use lazy::Lazy;
pub use narrow::Narrowed;
pub use ordered::OrderedSeq;
pub use seq::{Seq, SeqIter};
pub use solid::Solid;
