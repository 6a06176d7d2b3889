//! Standard hash join ("HashJoin"): eager build, lazy streaming
//! probe. Build side is whichever input has the smaller known size; when
//! exactly one side is streaming, the materialized side always builds;
//! when both are streaming (unknown size), the left side builds.

use super::{combine_left_right, extra_right_indices, join_output_columns, resolve_key_indices, BuildTable};
use crate::error::ExecError;
use crate::relation::{BoxedIterator, Relation, TupleIterator};
use crate::value::{Symbol, Tuple, TupleKey};
use std::sync::Arc;

pub fn hash_join(
    left: &Relation,
    right: &Relation,
    key_cols: &[Symbol],
    default_table_size: usize,
) -> Result<Relation, ExecError> {
    let output_columns = join_output_columns(left.columns(), right.columns());
    let extra_right = extra_right_indices(left.columns(), right.columns());

    let (build, probe, probe_is_left) = choose_build_side(left, right);
    let build_key_idx = resolve_key_indices(build.columns(), key_cols);
    let probe_key_idx = resolve_key_indices(probe.columns(), key_cols);

    let capacity = usize::try_from(build.size()).unwrap_or(default_table_size);
    let mut table: BuildTable = BuildTable::with_capacity(capacity);
    let mut build_iter = build.iterator()?;
    while build_iter.next()? {
        let tuple = build_iter.tuple().clone();
        let key = TupleKey::from_tuple(&tuple, &build_key_idx);
        table.entry(key).or_default().push(tuple);
    }
    build_iter.close();

    let probe_source = probe.iterator()?;
    let iter = HashJoinIter {
        probe_source,
        probe_key_idx,
        table: Arc::new(table),
        probe_is_left,
        extra_right,
        pending_matches: Vec::new(),
        current_probe: None,
        current: None,
    };
    Ok(Relation::streaming(output_columns, Box::new(iter), false))
}

/// Returns `(build, probe, probe_is_left)`.
fn choose_build_side<'a>(left: &'a Relation, right: &'a Relation) -> (&'a Relation, &'a Relation, bool) {
    let (l, r) = (left.size(), right.size());
    if l >= 0 && r >= 0 {
        if l <= r {
            (left, right, false)
        } else {
            (right, left, true)
        }
    } else if l >= 0 {
        (left, right, false)
    } else if r >= 0 {
        (right, left, true)
    } else {
        (left, right, false)
    }
}

struct HashJoinIter {
    probe_source: BoxedIterator,
    probe_key_idx: Vec<usize>,
    table: Arc<BuildTable>,
    probe_is_left: bool,
    extra_right: Vec<usize>,
    pending_matches: Vec<Tuple>,
    current_probe: Option<Tuple>,
    current: Option<Tuple>,
}

impl TupleIterator for HashJoinIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            if let Some(build_tuple) = self.pending_matches.pop() {
                let probe_tuple = self
                    .current_probe
                    .as_ref()
                    .expect("pending match implies a current probe tuple");
                let (l, r) = if self.probe_is_left {
                    (probe_tuple, &build_tuple)
                } else {
                    (&build_tuple, probe_tuple)
                };
                self.current = Some(combine_left_right(l, r, &self.extra_right));
                return Ok(true);
            }
            if !self.probe_source.next()? {
                return Ok(false);
            }
            let probe_tuple = self.probe_source.tuple().clone();
            let key = TupleKey::from_tuple(&probe_tuple, &self.probe_key_idx);
            if let Some(bucket) = self.table.get(&key) {
                self.pending_matches = bucket.clone();
                self.pending_matches.reverse();
            }
            self.current_probe = Some(probe_tuple);
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }

    fn close(&mut self) {
        self.probe_source.close();
    }
}
