//! General-purpose ordering engine: a total order over heterogeneous values,
//! key-selector normalization, and multi-key comparison.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A normalized two-argument comparator over `T`.
pub type Comparator<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

/// Cross-type rank of a [`Value`].
///
/// The exact ranking is a contract: `Func < Array < Object < Symbol < Bool <
/// Number < Text < Null < Undefined`. Cross-type comparisons always resolve
/// by rank first, which makes the comparator a total order even over
/// heterogeneous input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRank {
    /// Callable values.
    Func,
    /// Positional collections.
    Array,
    /// Keyed records.
    Object,
    /// Opaque named tokens.
    Symbol,
    /// Booleans.
    Bool,
    /// Numbers and big integers share one rank.
    Number,
    /// Text.
    Text,
    /// The explicit null value.
    Null,
    /// The absent value; ordered after everything else.
    Undefined,
}

/// A dynamically typed value, for sequences whose elements are not statically
/// typed at the element level.
#[derive(Clone)]
pub enum Value {
    /// A callable value. Compared by rank only; equality and hashing use
    /// pointer identity.
    Func(Rc<dyn Fn(&Value) -> Value>),
    /// A positional collection of values.
    Array(Vec<Value>),
    /// A keyed record, insertion-ordered.
    Object(Vec<(String, Value)>),
    /// An opaque named token, compared by its description.
    Symbol(Rc<str>),
    /// A boolean; `false < true`.
    Bool(bool),
    /// A floating-point number.
    Number(f64),
    /// A big integer. Shares the `Number` rank; mixed comparisons promote the
    /// big integer to a float.
    BigInt(i128),
    /// Text, ordered lexicographically.
    Text(String),
    /// The explicit null value.
    Null,
    /// The absent value.
    Undefined,
}

impl Value {
    /// The cross-type rank of this value.
    pub fn rank(&self) -> TypeRank {
        match self {
            Self::Func(_) => TypeRank::Func,
            Self::Array(_) => TypeRank::Array,
            Self::Object(_) => TypeRank::Object,
            Self::Symbol(_) => TypeRank::Symbol,
            Self::Bool(_) => TypeRank::Bool,
            Self::Number(_) | Self::BigInt(_) => TypeRank::Number,
            Self::Text(_) => TypeRank::Text,
            Self::Null => TypeRank::Null,
            Self::Undefined => TypeRank::Undefined,
        }
    }

    /// Returns true for [`Value::Func`].
    pub fn is_func(&self) -> bool {
        matches!(self, Self::Func(_))
    }

    /// Returns true for [`Value::Array`].
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns true for [`Value::Object`].
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns true for [`Value::Bool`].
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Returns true for [`Value::Number`] or [`Value::BigInt`].
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_) | Self::BigInt(_))
    }

    /// Returns true for [`Value::Text`].
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true for [`Value::Null`] or [`Value::Undefined`].
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Func(func) => write!(f, "Func({:p})", Rc::as_ptr(func)),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Object(fields) => f.debug_tuple("Object").field(fields).finish(),
            Self::Symbol(name) => f.debug_tuple("Symbol").field(name).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::BigInt(n) => f.debug_tuple("BigInt").field(n).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Null => f.write_str("Null"),
            Self::Undefined => f.write_str("Undefined"),
        }
    }
}

/// Identity-based equality: functions compare by pointer, numbers by bit
/// pattern, everything else structurally. `BigInt` and `Number` are never
/// equal to each other even when numerically equal; membership semantics are
/// identity-like, not numeric.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Undefined, Self::Undefined) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Func(func) => Rc::as_ptr(func).hash(state),
            Self::Array(items) => items.hash(state),
            Self::Object(fields) => fields.hash(state),
            Self::Symbol(name) => name.hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Number(n) => {
                // Distinguish Number from BigInt within the shared rank.
                0u8.hash(state);
                n.to_bits().hash(state);
            }
            Self::BigInt(n) => {
                1u8.hash(state);
                n.hash(state);
            }
            Self::Text(s) => s.hash(state),
            Self::Null | Self::Undefined => {}
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i128> for Value {
    fn from(n: i128) -> Self {
        Self::BigInt(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

/// A total order usable for stable sorting without a caller-supplied
/// comparator.
///
/// Key selectors passed to `order_by` extract keys implementing this trait;
/// the keys are then compared on both sides.
pub trait TotalOrder {
    /// Compares two values, yielding a total order.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl TotalOrder for Value {
    fn total_cmp(&self, other: &Self) -> Ordering {
        // Rank decides first; natural comparison only applies within a rank.
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a.len().cmp(&b.len()),
            (Self::Object(a), Self::Object(b)) => a.len().cmp(&b.len()),
            (Self::Symbol(a), Self::Symbol(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::BigInt(a), Self::BigInt(b)) => a.cmp(b),
            // Mixed numerics: promote the big integer to a float.
            (Self::Number(a), Self::BigInt(b)) => a.total_cmp(&(*b as f64)),
            (Self::BigInt(a), Self::Number(b)) => (*a as f64).total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Funcs, nulls, and undefineds tie within their rank.
            _ => Ordering::Equal,
        }
    }
}

macro_rules! total_order_via_ord {
    ( $( $ty:ty ),+ $(,)? ) => {
        $(
            impl TotalOrder for $ty {
                fn total_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }
        )+
    };
}

total_order_via_ord!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String, str,
);

impl TotalOrder for f64 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

impl TotalOrder for f32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl TotalOrder for &str {
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

/// `None` sorts after every `Some`, the same way `Undefined` ranks last.
impl<T> TotalOrder for Option<T>
where
    T: TotalOrder,
{
    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Some(a), Some(b)) => a.total_cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Collections fall back to element-count comparison, not deep structural
/// comparison.
impl<T> TotalOrder for Vec<T> {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.len().cmp(&other.len())
    }
}

impl<A, B> TotalOrder for (A, B)
where
    A: TotalOrder,
    B: TotalOrder,
{
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.0
            .total_cmp(&other.0)
            .then_with(|| self.1.total_cmp(&other.1))
    }
}

/// Normalizes a key selector into a two-argument comparator which extracts
/// the key from both sides and applies the general [`TotalOrder`] comparator.
pub fn key_comparator<T, K, F>(key: F) -> Comparator<T>
where
    F: Fn(&T) -> K + 'static,
    K: TotalOrder,
    T: 'static,
{
    Rc::new(move |a, b| key(a).total_cmp(&key(b)))
}

/// Wraps a caller-supplied comparison function into a [`Comparator`].
pub fn fn_comparator<T, F>(cmp: F) -> Comparator<T>
where
    F: Fn(&T, &T) -> Ordering + 'static,
    T: 'static,
{
    Rc::new(cmp)
}

/// Descending composition: reverses the comparator's *argument order*, not
/// its sign.
pub fn descending<T>(cmp: Comparator<T>) -> Comparator<T>
where
    T: 'static,
{
    Rc::new(move |a, b| cmp(b, a))
}

/// Multi-key comparison: evaluates comparators left to right, short-circuiting
/// at the first non-equal result. An empty list compares everything equal.
pub fn multi_compare<T>(specs: &[Comparator<T>], a: &T, b: &T) -> Ordering {
    for spec in specs {
        let found = spec(a, b);
        if found != Ordering::Equal {
            return found;
        }
    }
    Ordering::Equal
}
