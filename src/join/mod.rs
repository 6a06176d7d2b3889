//! Join operators: hash join, symmetric hash join, semi-join,
//! anti-join, and cross product, plus the strategy selector that picks
//! among them.

mod cross_product;
mod hash_join;
mod semi_anti;
mod symmetric;

pub use cross_product::cross_product;
pub use hash_join::hash_join;
pub use semi_anti::{anti_join, semi_join};
pub use symmetric::symmetric_hash_join;

use crate::error::ExecError;
use crate::relation::Relation;
use crate::value::{Symbol, Tuple};
use std::collections::HashMap;

/// Output columns for any binary join: left columns, then right columns
/// that do not already appear on the left, preserving each side's order.
pub fn join_output_columns(left: &[Symbol], right: &[Symbol]) -> Vec<Symbol> {
    let mut out = left.to_vec();
    for col in right {
        if !left.contains(col) {
            out.push(col.clone());
        }
    }
    out
}

/// Column indices in `right` that are not already present in `left`, i.e.
/// the columns a join must append to a left tuple to build its output row.
pub fn extra_right_indices(left: &[Symbol], right: &[Symbol]) -> Vec<usize> {
    right
        .iter()
        .enumerate()
        .filter(|(_, c)| !left.contains(c))
        .map(|(i, _)| i)
        .collect()
}

pub(crate) fn resolve_key_indices(columns: &[Symbol], key_cols: &[Symbol]) -> Vec<usize> {
    key_cols
        .iter()
        .map(|k| {
            columns
                .iter()
                .position(|c| c == k)
                .expect("join key column must be present in the relation it indexes")
        })
        .collect()
}

pub(crate) fn combine_left_right(left: &Tuple, right: &Tuple, extra_right: &[usize]) -> Tuple {
    left.concat(&right.project(extra_right))
}

/// Join strategy chosen for a given pair of inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Both sides streaming, symmetric hash join enabled.
    Symmetric,
    /// Exactly one side streaming: standard hash join, materialized side
    /// builds.
    Asymmetric,
    /// Both sides materialized: standard hash join, smaller side builds.
    Standard,
}

pub fn select_strategy(left: &Relation, right: &Relation, symmetric_enabled: bool) -> JoinStrategy {
    match (left.is_materialized(), right.is_materialized()) {
        (false, false) if symmetric_enabled => JoinStrategy::Symmetric,
        (true, true) => JoinStrategy::Standard,
        _ => JoinStrategy::Asymmetric,
    }
}

/// Run a join using whichever strategy `select_strategy` picks.
pub fn join(
    left: &Relation,
    right: &Relation,
    key_cols: &[Symbol],
    symmetric_enabled: bool,
    default_table_size: usize,
) -> Result<Relation, ExecError> {
    if key_cols.is_empty() {
        return cross_product(left, right);
    }
    match select_strategy(left, right, symmetric_enabled) {
        JoinStrategy::Symmetric => symmetric_hash_join(left, right, key_cols),
        JoinStrategy::Asymmetric | JoinStrategy::Standard => {
            hash_join(left, right, key_cols, default_table_size)
        }
    }
}

pub(crate) type BuildTable = HashMap<crate::value::TupleKey, Vec<Tuple>>;
