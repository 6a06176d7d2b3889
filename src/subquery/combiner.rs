//! Result combiner: merges one subquery result per outer
//! combination back into a single relation.

use crate::error::ExecError;
use crate::relation::Relation;
use crate::value::{Symbol, Tuple};

/// Merge per-combination subquery results. `outer_rows[i]` pairs with
/// `sub_results[i]`; a `None` entry (nil/absent sub-result) contributes no
/// rows. Output columns are `outer_cols ++ binding_output_cols`, taken
/// from the first present sub-result.
pub fn combine_results(
    outer_cols: &[Symbol],
    outer_rows: &[Tuple],
    sub_results: &[Option<Relation>],
) -> Result<Relation, ExecError> {
    let binding_cols = sub_results
        .iter()
        .flatten()
        .next()
        .map(|r| r.columns().to_vec())
        .unwrap_or_default();

    let mut columns = outer_cols.to_vec();
    columns.extend(binding_cols);

    let mut rows = Vec::new();
    for (outer_row, sub_result) in outer_rows.iter().zip(sub_results.iter()) {
        let Some(sub_rel) = sub_result else { continue };
        for sub_row in sub_rel.collect_rows()? {
            rows.push(outer_row.concat(&sub_row));
        }
    }

    Ok(Relation::materialized(columns, rows))
}
