//! Semi-join and anti-join. Both preserve left row order and
//! emit each left row at most once; they differ only in whether a key
//! match is required or forbidden.

use super::resolve_key_indices;
use crate::error::ExecError;
use crate::relation::{BoxedIterator, Relation, TupleIterator};
use crate::value::{Symbol, Tuple, TupleKey};
use std::collections::HashSet;
use std::sync::Arc;

fn key_set(relation: &Relation, key_idx: &[usize]) -> Result<HashSet<TupleKey>, ExecError> {
    let mut set = HashSet::new();
    let mut iter = relation.iterator()?;
    while iter.next()? {
        set.insert(TupleKey::from_tuple(iter.tuple(), key_idx));
    }
    iter.close();
    Ok(set)
}

/// Emit each left row whose key projection appears in `right`, at most
/// once per left row, in left order.
pub fn semi_join(left: &Relation, right: &Relation, key_cols: &[Symbol]) -> Result<Relation, ExecError> {
    membership_join(left, right, key_cols, true)
}

/// Emit each left row whose key projection does *not* appear in `right`,
/// in left order.
pub fn anti_join(left: &Relation, right: &Relation, key_cols: &[Symbol]) -> Result<Relation, ExecError> {
    membership_join(left, right, key_cols, false)
}

fn membership_join(
    left: &Relation,
    right: &Relation,
    key_cols: &[Symbol],
    keep_matches: bool,
) -> Result<Relation, ExecError> {
    let left_key_idx = resolve_key_indices(left.columns(), key_cols);
    let right_key_idx = resolve_key_indices(right.columns(), key_cols);
    let keys = Arc::new(key_set(right, &right_key_idx)?);

    let iter = MembershipIter {
        source: left.iterator()?,
        key_idx: left_key_idx,
        keys,
        keep_matches,
    };
    Ok(Relation::streaming(left.columns().to_vec(), Box::new(iter), false))
}

struct MembershipIter {
    source: BoxedIterator,
    key_idx: Vec<usize>,
    keys: Arc<HashSet<TupleKey>>,
    keep_matches: bool,
}

impl TupleIterator for MembershipIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        while self.source.next()? {
            let key = TupleKey::from_tuple(self.source.tuple(), &self.key_idx);
            let present = self.keys.contains(&key);
            if present == self.keep_matches {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tuple(&self) -> &Tuple {
        self.source.tuple()
    }

    fn close(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn rel(columns: &[&str], rows: Vec<Vec<Value>>) -> Relation {
        Relation::materialized(
            columns.iter().map(|c| Symbol::new(*c)).collect(),
            rows.into_iter().map(Tuple::new).collect(),
        )
    }

    #[test]
    fn semi_join_preserves_left_order_and_columns() {
        let left = rel(
            &["?x"],
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)], vec![Value::Int64(3)]],
        );
        let right = rel(&["?x"], vec![vec![Value::Int64(2)], vec![Value::Int64(3)]]);
        let out = semi_join(&left, &right, &[Symbol::new("?x")]).unwrap();
        assert_eq!(out.columns(), &[Symbol::new("?x")]);
        assert_eq!(
            out.collect_rows().unwrap(),
            vec![Tuple::new(vec![Value::Int64(2)]), Tuple::new(vec![Value::Int64(3)])]
        );
    }

    #[test]
    fn anti_join_is_complement_of_semi_join() {
        let left = rel(
            &["?x"],
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)], vec![Value::Int64(3)]],
        );
        let right = rel(&["?x"], vec![vec![Value::Int64(2)]]);
        let semi = semi_join(&left, &right, &[Symbol::new("?x")])
            .unwrap()
            .collect_rows()
            .unwrap();
        let anti = anti_join(&left, &right, &[Symbol::new("?x")])
            .unwrap()
            .collect_rows()
            .unwrap();
        let mut combined = semi;
        combined.extend(anti);
        combined.sort_by_key(|t| match t.get(0) {
            Some(Value::Int64(i)) => *i,
            _ => 0,
        });
        assert_eq!(
            combined,
            vec![
                Tuple::new(vec![Value::Int64(1)]),
                Tuple::new(vec![Value::Int64(2)]),
                Tuple::new(vec![Value::Int64(3)]),
            ]
        );
    }
}
