//! Canonical hash-join bucket key: a fixed-arity projection of a [`Tuple`]
//! over a chosen set of column indices, wrapped so it can live as a
//! `HashMap` key ("TupleKey").

use super::{Tuple, Value};
use std::hash::{Hash, Hasher};

/// A hashable, orderable-by-equality projection of a tuple's join columns.
///
/// Built once per tuple on the build side of a hash join and once per probe
/// tuple on the probe side; the two are compared by `==`/`Hash` without
/// ever touching the non-key columns.
#[derive(Clone, Debug)]
pub struct TupleKey(Vec<Value>);

impl TupleKey {
    /// Project `tuple` over `columns`, in order, into a bucket key.
    pub fn from_tuple(tuple: &Tuple, columns: &[usize]) -> Self {
        TupleKey(
            columns
                .iter()
                .map(|&i| tuple.get(i).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl PartialEq for TupleKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for TupleKey {}

impl Hash for TupleKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in &self.0 {
            v.hash(state);
        }
    }
}
