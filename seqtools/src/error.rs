//! Error types for fallible terminal operations.

/// Errors raised by terminal operations whose contract cannot be expressed in
/// the type system alone.
///
/// Range violations for operators that forbid negative counts do not appear
/// here: those operators take `usize` parameters, so the violation is a
/// compile error instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeqError {
    /// `reduce` was called without a seed on an empty sequence.
    #[error("cannot reduce an empty sequence without a seed value")]
    EmptyReduction,
    /// An operation that requires at least one element was called on an
    /// empty sequence.
    #[error("operation requires a non-empty sequence")]
    EmptySequence,
    /// `single` found more than one element.
    #[error("expected exactly one element, found {0} or more")]
    Cardinality(usize),
}
