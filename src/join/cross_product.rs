//! Cross product: a join with an empty key list. Emits every
//! `(l, r)` pair in row-major order over `L` then `R`.

use crate::error::ExecError;
use crate::relation::{BoxedIterator, Relation, TupleIterator};
use crate::value::Tuple;
use std::sync::Arc;

pub fn cross_product(left: &Relation, right: &Relation) -> Result<Relation, ExecError> {
    let mut columns = left.columns().to_vec();
    columns.extend(right.columns().iter().cloned());

    let right_rows = Arc::new(right.collect_rows()?);
    let iter = CrossProductIter {
        left_source: left.iterator()?,
        right_rows,
        right_idx: 0,
        left_tuple: None,
        current: None,
    };
    Ok(Relation::streaming(columns, Box::new(iter), false))
}

struct CrossProductIter {
    left_source: BoxedIterator,
    right_rows: Arc<Vec<Tuple>>,
    right_idx: usize,
    left_tuple: Option<Tuple>,
    current: Option<Tuple>,
}

impl TupleIterator for CrossProductIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            if self.left_tuple.is_none() || self.right_idx >= self.right_rows.len() {
                if !self.left_source.next()? {
                    return Ok(false);
                }
                self.left_tuple = Some(self.left_source.tuple().clone());
                self.right_idx = 0;
            }
            if self.right_rows.is_empty() {
                // No right rows: this left row contributes nothing, advance.
                self.left_tuple = None;
                continue;
            }
            let left = self.left_tuple.as_ref().expect("checked above");
            let right = &self.right_rows[self.right_idx];
            self.current = Some(left.concat(right));
            self.right_idx += 1;
            return Ok(true);
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }

    fn close(&mut self) {
        self.left_source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Symbol, Value};

    fn rel(columns: &[&str], rows: Vec<Vec<Value>>) -> Relation {
        Relation::materialized(
            columns.iter().map(|c| Symbol::new(*c)).collect(),
            rows.into_iter().map(Tuple::new).collect(),
        )
    }

    #[test]
    fn cross_product_emits_every_pair_row_major() {
        let left = rel(&["?a"], vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);
        let right = rel(&["?b"], vec![vec![Value::Int64(10)], vec![Value::Int64(20)]]);
        let out = cross_product(&left, &right).unwrap();
        assert_eq!(
            out.collect_rows().unwrap(),
            vec![
                Tuple::new(vec![Value::Int64(1), Value::Int64(10)]),
                Tuple::new(vec![Value::Int64(1), Value::Int64(20)]),
                Tuple::new(vec![Value::Int64(2), Value::Int64(10)]),
                Tuple::new(vec![Value::Int64(2), Value::Int64(20)]),
            ]
        );
    }

    #[test]
    fn cross_product_with_empty_right_is_empty() {
        let left = rel(&["?a"], vec![vec![Value::Int64(1)]]);
        let right = rel(&["?b"], vec![]);
        let out = cross_product(&left, &right).unwrap();
        assert!(out.collect_rows().unwrap().is_empty());
    }
}
