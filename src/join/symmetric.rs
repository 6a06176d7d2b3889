//! Symmetric hash join ("SymmetricHashJoin"): both sides
//! streaming, processed in alternating fixed-size batches so the first
//! output row can appear before either side is fully consumed. A row is
//! probed against the opposite side's table exactly once, at arrival
//! time, and only then inserted into its own table — so a given
//! (left row, right row) pairing is discovered exactly once, by
//! whichever row arrives second. Produces the same multiset of rows as
//! [`super::hash_join`], including repeated output tuples when distinct
//! row occurrences happen to project to the same values.

use super::{combine_left_right, extra_right_indices, join_output_columns, resolve_key_indices, BuildTable};
use crate::error::ExecError;
use crate::relation::{BoxedIterator, Relation, TupleIterator};
use crate::value::{Symbol, Tuple, TupleKey};
use std::collections::VecDeque;

const BATCH_SIZE: usize = 100;

pub fn symmetric_hash_join(
    left: &Relation,
    right: &Relation,
    key_cols: &[Symbol],
) -> Result<Relation, ExecError> {
    let output_columns = join_output_columns(left.columns(), right.columns());
    let extra_right = extra_right_indices(left.columns(), right.columns());
    let left_key_idx = resolve_key_indices(left.columns(), key_cols);
    let right_key_idx = resolve_key_indices(right.columns(), key_cols);

    let iter = SymmetricHashJoinIter {
        left_source: left.iterator()?,
        right_source: right.iterator()?,
        left_table: BuildTable::new(),
        right_table: BuildTable::new(),
        left_key_idx,
        right_key_idx,
        extra_right,
        pending: VecDeque::new(),
        turn: Side::Left,
        left_done: false,
        right_done: false,
        current: None,
    };
    Ok(Relation::streaming(output_columns, Box::new(iter), false))
}

enum Side {
    Left,
    Right,
}

struct SymmetricHashJoinIter {
    left_source: BoxedIterator,
    right_source: BoxedIterator,
    left_table: BuildTable,
    right_table: BuildTable,
    left_key_idx: Vec<usize>,
    right_key_idx: Vec<usize>,
    extra_right: Vec<usize>,
    pending: VecDeque<Tuple>,
    turn: Side,
    left_done: bool,
    right_done: bool,
    current: Option<Tuple>,
}

impl SymmetricHashJoinIter {
    fn process_batch(&mut self) -> Result<(), ExecError> {
        match self.turn {
            Side::Left => {
                self.turn = Side::Right;
                if self.left_done {
                    return Ok(());
                }
                for _ in 0..BATCH_SIZE {
                    if !self.left_source.next()? {
                        self.left_done = true;
                        break;
                    }
                    let row = self.left_source.tuple().clone();
                    let key = TupleKey::from_tuple(&row, &self.left_key_idx);
                    if let Some(matches) = self.right_table.get(&key) {
                        for r in matches {
                            self.pending.push_back(combine_left_right(&row, r, &self.extra_right));
                        }
                    }
                    self.left_table.entry(key).or_default().push(row);
                }
            }
            Side::Right => {
                self.turn = Side::Left;
                if self.right_done {
                    return Ok(());
                }
                for _ in 0..BATCH_SIZE {
                    if !self.right_source.next()? {
                        self.right_done = true;
                        break;
                    }
                    let row = self.right_source.tuple().clone();
                    let key = TupleKey::from_tuple(&row, &self.right_key_idx);
                    if let Some(matches) = self.left_table.get(&key) {
                        for l in matches {
                            self.pending.push_back(combine_left_right(l, &row, &self.extra_right));
                        }
                    }
                    self.right_table.entry(key).or_default().push(row);
                }
            }
        }
        Ok(())
    }
}

impl TupleIterator for SymmetricHashJoinIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            if let Some(t) = self.pending.pop_front() {
                self.current = Some(t);
                return Ok(true);
            }
            if self.left_done && self.right_done {
                return Ok(false);
            }
            self.process_batch()?;
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }

    fn close(&mut self) {
        self.left_source.close();
        self.right_source.close();
    }
}
