//! [`Solid`], the closed union of concrete materialized containers.
//!
//! Fast-path selection (indexed random access vs. hash membership) happens
//! once against this union instead of being re-derived at every call site.

use std::hash::Hash;
use std::rc::Rc;

use itertools::Either;
use rustc_hash::FxHashSet;

/// A concrete, already-materialized container, as opposed to a lazy sequence.
///
/// The containers are behind [`Rc`] so a `Solid` clones in O(1) and a view of
/// an already-solid source never copies elements.
pub enum Solid<T> {
    /// Indexed random-access storage.
    Indexed(Rc<Vec<T>>),
    /// Hash-membership storage. Iteration order is unspecified.
    Hashed(Rc<FxHashSet<T>>),
}

impl<T> Clone for Solid<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Indexed(vec) => Self::Indexed(Rc::clone(vec)),
            Self::Hashed(set) => Self::Hashed(Rc::clone(set)),
        }
    }
}

impl<T> Solid<T> {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Indexed(vec) => vec.len(),
            Self::Hashed(set) => set.len(),
        }
    }

    /// Returns true if no elements are stored.
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns true if this container answers membership probes in O(1).
    pub fn has_fast_membership(&self) -> bool {
        matches!(self, Self::Hashed(_))
    }

    /// Iterates the stored elements by reference.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        match self {
            Self::Indexed(vec) => Either::Left(vec.iter()),
            Self::Hashed(set) => Either::Right(set.iter()),
        }
    }
}

impl<T> Solid<T>
where
    T: Eq + Hash,
{
    /// Membership probe. O(1) for the hashed variant, a linear scan for the
    /// indexed variant.
    pub fn contains(&self, item: &T) -> bool {
        match self {
            Self::Indexed(vec) => vec.iter().any(|held| held == item),
            Self::Hashed(set) => set.contains(item),
        }
    }
}

impl<T> Solid<T>
where
    T: Clone,
{
    /// Copies the elements into a fresh `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Converts into an owned iterator of elements.
    ///
    /// Avoids cloning elements when this `Solid` is the unique owner of its
    /// underlying container.
    pub fn into_iter_owned(self) -> impl Iterator<Item = T> {
        match self {
            Self::Indexed(vec) => {
                let vec = Rc::try_unwrap(vec).unwrap_or_else(|shared| (*shared).clone());
                Either::Left(vec.into_iter())
            }
            Self::Hashed(set) => {
                let set = Rc::try_unwrap(set).unwrap_or_else(|shared| (*shared).clone());
                Either::Right(set.into_iter())
            }
        }
    }
}

impl<T> From<Vec<T>> for Solid<T> {
    fn from(vec: Vec<T>) -> Self {
        Self::Indexed(Rc::new(vec))
    }
}

impl<T> From<FxHashSet<T>> for Solid<T> {
    fn from(set: FxHashSet<T>) -> Self {
        Self::Hashed(Rc::new(set))
    }
}

impl<T> FromIterator<T> for Solid<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T> std::fmt::Debug for Solid<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Indexed(vec) => f.debug_tuple("Indexed").field(vec).finish(),
            Self::Hashed(set) => f.debug_tuple("Hashed").field(set).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_both_variants() {
        let indexed = Solid::from(vec![1, 2, 3]);
        assert!(indexed.contains(&2));
        assert!(!indexed.contains(&9));
        assert!(!indexed.has_fast_membership());

        let hashed = Solid::from([1, 2, 3].into_iter().collect::<FxHashSet<_>>());
        assert!(hashed.contains(&2));
        assert!(!hashed.contains(&9));
        assert!(hashed.has_fast_membership());
    }

    #[test]
    fn into_iter_owned_unique_does_not_clone() {
        // `Rc<Vec<_>>` with a single owner is unwrapped in place.
        let solid = Solid::from(vec![1, 2, 3]);
        assert_eq!(vec![1, 2, 3], solid.into_iter_owned().collect::<Vec<_>>());

        // A shared owner falls back to cloning.
        let solid = Solid::from(vec![4, 5]);
        let alias = solid.clone();
        assert_eq!(vec![4, 5], solid.into_iter_owned().collect::<Vec<_>>());
        assert_eq!(2, alias.len());
    }
}
