//! # Value & Datom Model
//!
//! The tagged value type that flows through every relation, plus the datom
//! shape the pattern matcher deals in, the query-language `Symbol`, and the
//! `Tuple` / `TupleKey` row types built on top of `Value`.
//!
//! ## Usage
//!
//! ```
//! use relquery::value::{Value, Symbol, Tuple};
//!
//! let row = Tuple::new(vec![
//!     Value::string("Alice"),
//!     Value::Int64(30),
//!     Value::Float64(85.5),
//! ]);
//!
//! let col = Symbol::new("?name");
//! assert_eq!(col.as_str(), "?name");
//! assert_eq!(row.len(), 3);
//! ```

mod key;

pub use key::TupleKey;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A variable name from the query language, e.g. `?age`.
///
/// Two symbols are equal iff their textual forms match. Cheaply clonable
/// since column lists are copied constantly by join/project/collapse.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical aggregate column name, e.g. `(count ?p)`.
    pub fn aggregate(func: &str, arg: &Symbol) -> Self {
        Symbol::new(format!("({} {})", func, arg.as_str()))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(s)
    }
}

/// An opaque, interned namespaced attribute/identifier, e.g. `:person/name`.
///
/// Stored as its canonical namespaced string. No interning pool is
/// maintained (equality is structural) since this crate never indexes by
/// keyword identity, only by value.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct Keyword(Arc<str>);

impl Keyword {
    pub fn new(namespaced: impl AsRef<str>) -> Self {
        Keyword(Arc::from(namespaced.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Keyword {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl PartialOrd for Keyword {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.as_ref().cmp(other.0.as_ref()))
    }
}

impl std::hash::Hash for Keyword {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque entity handle. Equality is by handle, not by any derived
/// string form; `canonical_str` exists only to support the narrow
/// `Identity == String` convenience comparison.
#[derive(Clone, Eq, Serialize, Deserialize)]
pub struct Identity {
    handle: u64,
    canonical_str: Option<Arc<str>>,
}

impl Identity {
    pub fn new(handle: u64) -> Self {
        Identity {
            handle,
            canonical_str: None,
        }
    }

    pub fn with_canonical_str(handle: u64, canonical: impl AsRef<str>) -> Self {
        Identity {
            handle,
            canonical_str: Some(Arc::from(canonical.as_ref())),
        }
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn canonical_str(&self) -> Option<&str> {
        self.canonical_str.as_deref()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl std::hash::Hash for Identity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.handle)
    }
}

/// An unsigned transaction identifier. Read by the executor as an opaque
/// value; transaction-time semantics beyond that are out of scope.
pub type TxId = u64;

/// A tagged heterogeneous value. This is the unit of data that flows
/// through every relation, tuple, and operator in the executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Identity(Identity),
    Keyword(Keyword),
    String(Arc<str>),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    TxId(TxId),
    /// Absence of a value, e.g. a missing symbol in a batched combination
    /// or a non-matching predicate column for a conditional
    /// aggregate.
    Null,
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True when this value is truthy for the purposes of a predicate
    /// column in a conditional aggregate.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    fn numeric_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }
}

/// Variant-aware equality with narrow cross-variant convenience rules:
/// `Identity == String` by canonical form, `Keyword == String` likewise,
/// and `Int64 == TxId` by numeric equality. All other cross-variant
/// comparisons are `false`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Identity(a), Identity(b)) => a == b,
            (Keyword(a), Keyword(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (Float64(a), Float64(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (TxId(a), TxId(b)) => a == b,
            (Null, Null) => true,

            // Narrow convenience rules.
            (Identity(id), String(s)) | (String(s), Identity(id)) => {
                id.canonical_str() == Some(s.as_ref())
            }
            (Keyword(k), String(s)) | (String(s), Keyword(k)) => k.as_str() == s.as_ref(),
            (Int64(i), TxId(t)) | (TxId(t), Int64(i)) => *i >= 0 && *i as u64 == *t,

            _ => false,
        }
    }
}
impl Eq for Value {}

/// Same-variant comparisons use natural order; cross-variant comparisons
/// (other than the numeric Int64/Float64 pair) are unordered (`None`).
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (Float64(a), Float64(b)) => a.partial_cmp(b),
            (String(a), String(b)) => Some(a.as_ref().cmp(b.as_ref())),
            (Keyword(a), Keyword(b)) => a.partial_cmp(b),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (Time(a), Time(b)) => a.partial_cmp(b),
            (TxId(a), TxId(b)) => a.partial_cmp(b),
            (Int64(_), Float64(_)) | (Float64(_), Int64(_)) => {
                self.numeric_f64()?.partial_cmp(&other.numeric_f64()?)
            }
            _ => None,
        }
    }
}

// Tags below distinguish hash "families" rather than variants: every value
// that can compare equal under `Value`'s narrow cross-variant convenience
// rules (`Identity == String`, `Keyword == String`, `Int64 == TxId`) must
// hash into the same family on the same canonical payload, or a `TupleKey`
// built from one variant would never find a bucket built from the other.
const HASH_FAMILY_STRING: u8 = 0;
const HASH_FAMILY_NUMERIC: u8 = 1;
const HASH_FAMILY_IDENTITY_OPAQUE: u8 = 2;
const HASH_FAMILY_INT64_NEGATIVE: u8 = 3;
const HASH_FAMILY_FLOAT64: u8 = 4;
const HASH_FAMILY_BOOL: u8 = 5;
const HASH_FAMILY_TIME: u8 = 6;
const HASH_FAMILY_NULL: u8 = 7;

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            // An Identity with a canonical string form is convenience-equal
            // to a String of that form, so it must hash identically; one
            // with no canonical form can never equal a String and hashes
            // on its opaque handle instead.
            Value::Identity(id) => match id.canonical_str() {
                Some(s) => {
                    HASH_FAMILY_STRING.hash(state);
                    s.hash(state);
                }
                None => {
                    HASH_FAMILY_IDENTITY_OPAQUE.hash(state);
                    id.hash(state);
                }
            },
            Value::Keyword(k) => {
                HASH_FAMILY_STRING.hash(state);
                k.as_str().hash(state);
            }
            Value::String(s) => {
                HASH_FAMILY_STRING.hash(state);
                s.as_ref().hash(state);
            }
            // A non-negative Int64 is convenience-equal to the TxId with
            // the same numeric value, so both hash on that shared value.
            Value::Int64(i) if *i >= 0 => {
                HASH_FAMILY_NUMERIC.hash(state);
                (*i as u64).hash(state);
            }
            Value::Int64(i) => {
                HASH_FAMILY_INT64_NEGATIVE.hash(state);
                i.hash(state);
            }
            Value::TxId(t) => {
                HASH_FAMILY_NUMERIC.hash(state);
                t.hash(state);
            }
            Value::Float64(f) => {
                HASH_FAMILY_FLOAT64.hash(state);
                f.to_bits().hash(state);
            }
            Value::Bool(b) => {
                HASH_FAMILY_BOOL.hash(state);
                b.hash(state);
            }
            Value::Time(t) => {
                HASH_FAMILY_TIME.hash(state);
                t.timestamp_nanos_opt().unwrap_or(i64::MIN).hash(state);
            }
            Value::Null => HASH_FAMILY_NULL.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Identity(id) => write!(f, "{:?}", id),
            Value::Keyword(k) => write!(f, "{}", k),
            Value::String(s) => write!(f, "{}", s),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::TxId(t) => write!(f, "tx{}", t),
            Value::Null => write!(f, "nil"),
        }
    }
}

/// An immutable fact: `(Entity, Attribute, Value, Tx)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Datom {
    pub e: Identity,
    pub a: Keyword,
    pub v: Value,
    pub tx: TxId,
}

impl Datom {
    pub fn new(e: Identity, a: Keyword, v: Value, tx: TxId) -> Self {
        Datom { e, a, v, tx }
    }
}

/// An ordered row of values. Length equals the column count of the
/// enclosing relation.
///
/// A tuple returned from an iterator's `tuple()` is borrowed and valid
/// only until the next `next()` call ("Ownership of tuples").
/// `Tuple` itself is a plain owned value type; callers that need to
/// retain a row past the next advance clone it, which is exactly what
/// "deep-copy it" means here since `Value` has no interior iterator
/// state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tuple(Vec<Value>);

impl Eq for Tuple {}

impl std::hash::Hash for Tuple {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for v in &self.0 {
            v.hash(state);
        }
    }
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Tuple(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Build a new tuple by selecting `indices` from this one, in order.
    /// Duplicate indices are allowed and replicate the source value.
    pub fn project(&self, indices: &[usize]) -> Tuple {
        Tuple(
            indices
                .iter()
                .map(|&i| self.0.get(i).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Append a value, returning a new tuple (used by function evaluation
    /// to append a computed column).
    pub fn appended(&self, value: Value) -> Tuple {
        let mut values = self.0.clone();
        values.push(value);
        Tuple(values)
    }

    /// Concatenate two tuples (used by cross product / joins to build the
    /// combined output row).
    pub fn concat(&self, other: &Tuple) -> Tuple {
        let mut values = self.0.clone();
        values.extend(other.0.iter().cloned());
        Tuple(values)
    }
}

impl std::ops::Index<usize> for Tuple {
    type Output = Value;
    fn index(&self, index: usize) -> &Value {
        &self.0[index]
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Tuple(iter.into_iter().collect())
    }
}
