//! Subquery executor: strategy selector, batcher, worker pool,
//! and result combiner, composed into a single entry point the phase
//! executor calls once per correlated subquery clause.

mod batcher;
mod combiner;
mod strategy;
mod worker_pool;

pub use batcher::build_batch_relation;
pub use combiner::combine_results;
pub use strategy::{select_strategy, StrategyOptions, SubqueryStrategy};
pub use worker_pool::{execute_parallel, execute_parallel_batched};

use crate::context::Context;
use crate::error::ExecError;
use crate::relation::Relation;
use crate::value::{Symbol, Tuple, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Executes one inner-query evaluation for a single outer combination.
pub type SingleRunner = Arc<dyn Fn(&HashMap<Symbol, Value>, &Context) -> Result<Relation, ExecError> + Send + Sync>;

/// Executes the inner query once against a batched relation-input.
pub type BatchRunner = Arc<dyn Fn(&Relation, &Context) -> Result<Relation, ExecError> + Send + Sync>;

/// Run a correlated subquery clause against every row of the outer
/// relation's correlation-variable projection.
///
/// `correlation_vars` names, in order, the outer-query symbols the inner
/// query's `:in` clause correlates against; `outer_rows[i]` holds the
/// values for `correlation_vars` that produced combination `i`.
pub fn execute_subqueries(
    ctx: &Context,
    outer_cols: &[Symbol],
    outer_rows: &[Tuple],
    correlation_vars: &[Symbol],
    opts: &StrategyOptions,
    worker_count: usize,
    run_single: SingleRunner,
    run_batched: BatchRunner,
) -> Result<Relation, ExecError> {
    let combinations: Vec<HashMap<Symbol, Value>> = outer_rows
        .iter()
        .map(|row| {
            correlation_vars
                .iter()
                .cloned()
                .zip(row.values().iter().cloned())
                .collect()
        })
        .collect();

    match select_strategy(combinations.len(), opts) {
        SubqueryStrategy::Batched => {
            let batch_relation = build_batch_relation(correlation_vars, &combinations);
            run_batched(&batch_relation, ctx)
        }
        SubqueryStrategy::Parallel => {
            let runner = Arc::clone(&run_single);
            let results = execute_parallel(ctx, combinations, worker_count, move |combo, ctx| {
                runner(combo, ctx)
            })?;
            let wrapped: Vec<Option<Relation>> = results.into_iter().map(Some).collect();
            combine_results(outer_cols, outer_rows, &wrapped)
        }
        SubqueryStrategy::Sequential => {
            let mut results = Vec::with_capacity(combinations.len());
            for combo in &combinations {
                ctx.check()?;
                results.push(Some(run_single(combo, ctx)?));
            }
            combine_results(outer_cols, outer_rows, &results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;

    fn make_single_runner() -> SingleRunner {
        Arc::new(|combo, _ctx| {
            let dept = combo.get(&Symbol::new("?dept")).cloned().unwrap_or(Value::Null);
            let max_score = match &dept {
                Value::String(s) if s.as_ref() == "Eng" => 100,
                _ => 80,
            };
            Ok(Relation::materialized(
                vec![Symbol::new("?max")],
                vec![Tuple::new(vec![Value::Int64(max_score)])],
            ))
        })
    }

    #[test]
    fn sequential_path_combines_per_row_results() {
        let ctx = Context::background();
        let outer_cols = vec![Symbol::new("?dept")];
        let outer_rows = vec![
            Tuple::new(vec![Value::string("Eng")]),
            Tuple::new(vec![Value::string("Sales")]),
        ];
        let opts = StrategyOptions {
            accepts_relation_input: false,
            parallel_enabled: false,
            parallel_threshold: 100,
        };
        let run_batched: BatchRunner = Arc::new(|_rel, _ctx| unreachable!("sequential path"));
        let out = execute_subqueries(
            &ctx,
            &outer_cols,
            &outer_rows,
            &outer_cols,
            &opts,
            4,
            make_single_runner(),
            run_batched,
        )
        .unwrap();
        assert_eq!(out.columns(), &[Symbol::new("?dept"), Symbol::new("?max")]);
        assert_eq!(out.size(), 2);
    }

    #[test]
    fn batched_strategy_delegates_to_batch_runner() {
        let ctx = Context::background();
        let outer_cols = vec![Symbol::new("?dept")];
        let outer_rows = vec![Tuple::new(vec![Value::string("Eng")])];
        let opts = StrategyOptions {
            accepts_relation_input: true,
            parallel_enabled: true,
            parallel_threshold: 1,
        };
        let run_single: SingleRunner = Arc::new(|_combo, _ctx| unreachable!("batched path"));
        let run_batched: BatchRunner = Arc::new(|rel, _ctx| {
            assert_eq!(rel.columns(), &[Symbol::new("?dept")]);
            Ok(Relation::empty(vec![Symbol::new("?dept"), Symbol::new("?max")]))
        });
        let out = execute_subqueries(
            &ctx,
            &outer_cols,
            &outer_rows,
            &outer_cols,
            &opts,
            4,
            run_single,
            run_batched,
        )
        .unwrap();
        assert_eq!(out.size(), 0);
    }
}
