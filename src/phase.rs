//! Phase executor: consumes a planner-produced sequence of phases and
//! drives pattern matching, expression/predicate evaluation, subquery
//! dispatch, and the `Relations.Collapse` join-ordering step
//! between phases, finishing with the aggregation operator.
//!
//! The planner itself is a consumed interface: this crate does not ship
//! one, only the [`Phase`] shape it must produce and the [`PhaseExecutor`]
//! that walks it.

use crate::aggregation::{self, FindSpec};
use crate::config::ExecutorOptions;
use crate::context::Context;
use crate::error::ExecError;
use crate::join;
use crate::matcher::{Pattern, PatternMatcher};
use crate::ops::{Function, Predicate};
use crate::relation::{FilterIter, FunctionEvalIter, ProjectIter, Relation};
use crate::subquery::{self, BatchRunner, SingleRunner, StrategyOptions};
use crate::value::Symbol;
use std::sync::Arc;

/// A function-evaluation clause, carrying its own symbol-to-index resolver
/// so the same clause can run against whichever relation happens to hold
/// its inputs once prior clauses in the phase have run.
pub struct ExpressionClause {
    pub output_symbol: Symbol,
    pub required_symbols: Vec<Symbol>,
    pub resolve: Arc<dyn Fn(&[Symbol]) -> Function + Send + Sync>,
}

/// A predicate clause, scheduled once all of `required_symbols` are present
/// on some active relation.
pub struct PredicateClause {
    pub required_symbols: Vec<Symbol>,
    pub resolve: Arc<dyn Fn(&[Symbol]) -> Predicate + Send + Sync>,
}

/// A correlated subquery clause. `correlation_vars` names the
/// outer symbols the inner query binds against; `run_single`/`run_batched`
/// are supplied by the caller embedding this crate, since evaluating the
/// inner query recursively re-enters the very executor this module defines.
pub struct SubqueryClause {
    pub correlation_vars: Vec<Symbol>,
    pub options: StrategyOptions,
    pub worker_count: usize,
    pub run_single: SingleRunner,
    pub run_batched: BatchRunner,
}

/// One phase: a planner-opaque unit of data patterns, expressions,
/// predicates, and subqueries evaluated together, followed by a collapse of
/// the resulting relations.
#[derive(Default)]
pub struct Phase {
    pub patterns: Vec<Pattern>,
    pub expressions: Vec<ExpressionClause>,
    pub predicates: Vec<PredicateClause>,
    pub subqueries: Vec<SubqueryClause>,
}

/// Consumed interface: a planner turns a find specification (plus whatever
/// surface syntax produced it) into an ordered phase sequence.
pub trait Planner {
    fn plan(&self) -> &[Phase];
}

/// Drives phase evaluation against a [`PatternMatcher`], producing the
/// aggregation operator's output relation.
pub struct PhaseExecutor<'m> {
    matcher: &'m dyn PatternMatcher,
    options: ExecutorOptions,
}

impl<'m> PhaseExecutor<'m> {
    pub fn new(matcher: &'m dyn PatternMatcher, options: ExecutorOptions) -> Self {
        PhaseExecutor { matcher, options }
    }

    /// Run every phase in order, then project onto `find`'s required input
    /// symbols and delegate to [`aggregation::aggregate`].
    pub fn execute(&self, phases: &[Phase], find: &FindSpec, ctx: &Context) -> Result<Relation, ExecError> {
        let mut active: Vec<Relation> = Vec::new();

        for phase in phases {
            ctx.check()?;
            self.run_patterns(phase, &mut active, ctx)?;
            self.run_expressions(phase, &mut active)?;
            self.run_predicates(phase, &mut active)?;
            self.run_subqueries(phase, &mut active, ctx)?;
            active = collapse(active, self.options.enable_symmetric_hash_join, self.options.default_hash_table_size)?;
        }

        let merged = fold_disjoint_groups(active, self.options.enable_symmetric_hash_join, self.options.default_hash_table_size)?;
        let required = find.required_input_symbols();
        let projected = project_columns(&merged, &required)?;
        aggregation::aggregate(&projected, find)
    }

    fn run_patterns(&self, phase: &Phase, active: &mut Vec<Relation>, ctx: &Context) -> Result<(), ExecError> {
        for pattern in &phase.patterns {
            let relation = self.matcher.match_pattern(pattern, active, ctx)?;
            active.push(relation);
        }
        Ok(())
    }

    fn run_expressions(&self, phase: &Phase, active: &mut [Relation]) -> Result<(), ExecError> {
        for clause in &phase.expressions {
            let idx = find_relation_with(active, &clause.required_symbols)
                .ok_or_else(|| ExecError::UserInputError(clause.required_symbols.clone()))?;
            let function = (clause.resolve)(active[idx].columns());
            active[idx] = apply_function(&active[idx], clause.output_symbol.clone(), function)?;
        }
        Ok(())
    }

    fn run_predicates(&self, phase: &Phase, active: &mut [Relation]) -> Result<(), ExecError> {
        for clause in &phase.predicates {
            let idx = find_relation_with(active, &clause.required_symbols)
                .ok_or_else(|| ExecError::UserInputError(clause.required_symbols.clone()))?;
            let predicate = (clause.resolve)(active[idx].columns());
            active[idx] = apply_filter(&active[idx], predicate)?;
        }
        Ok(())
    }

    fn run_subqueries(&self, phase: &Phase, active: &mut Vec<Relation>, ctx: &Context) -> Result<(), ExecError> {
        for clause in &phase.subqueries {
            let idx = find_relation_with(active, &clause.correlation_vars)
                .ok_or_else(|| ExecError::UserInputError(clause.correlation_vars.clone()))?;
            let source = active[idx].clone();
            // `execute_subqueries` requires `outer_rows[i]` to hold exactly the
            // `correlation_vars` values, positionally zipped; project down to
            // that subset before collecting, rather than passing the source
            // relation's full (and differently-ordered) row shape.
            let correlation_relation = project_columns(&source, &clause.correlation_vars)?;
            let outer_rows = correlation_relation.collect_rows()?;
            let sub_relation = subquery::execute_subqueries(
                ctx,
                correlation_relation.columns(),
                &outer_rows,
                &clause.correlation_vars,
                &clause.options,
                clause.worker_count,
                Arc::clone(&clause.run_single),
                Arc::clone(&clause.run_batched),
            )?;
            active[idx] = join::hash_join(&source, &sub_relation, &clause.correlation_vars, self.options.default_hash_table_size)?;
        }
        Ok(())
    }
}

fn find_relation_with(active: &[Relation], required: &[Symbol]) -> Option<usize> {
    active
        .iter()
        .position(|r| required.iter().all(|s| r.columns().contains(s)))
}

fn apply_function(relation: &Relation, output: Symbol, function: Function) -> Result<Relation, ExecError> {
    let mut columns = relation.columns().to_vec();
    columns.push(output);
    let source = relation.iterator()?;
    let iter = FunctionEvalIter::new(source, Box::new(move |t| function.apply(t)));
    Ok(Relation::streaming(columns, Box::new(iter), false))
}

fn apply_filter(relation: &Relation, predicate: Predicate) -> Result<Relation, ExecError> {
    let columns = relation.columns().to_vec();
    let source = relation.iterator()?;
    let iter = FilterIter::new(source, Box::new(move |t| predicate.evaluate(t)));
    Ok(Relation::streaming(columns, Box::new(iter), false))
}

fn project_columns(relation: &Relation, columns: &[Symbol]) -> Result<Relation, ExecError> {
    let indices: Vec<usize> = columns
        .iter()
        .map(|s| {
            relation
                .columns()
                .iter()
                .position(|c| c == s)
                .ok_or_else(|| ExecError::UserInputError(vec![s.clone()]))
        })
        .collect::<Result<_, _>>()?;
    let source = relation.iterator()?;
    let iter = ProjectIter::new(source, indices);
    Ok(Relation::streaming(columns.to_vec(), Box::new(iter), false))
}

fn shared_symbols(a: &[Symbol], b: &[Symbol]) -> Vec<Symbol> {
    a.iter().filter(|s| b.contains(s)).cloned().collect()
}

/// `Relations.Collapse`: group relations into connected
/// components under shared columns, then join each component's relations
/// together in smaller-first order (unknown-size streaming relations sort
/// last). Handles the empty set, a passthrough singleton, a component with
/// no matching rows (the join naturally returns an empty relation), and
/// multiple disjoint components (returned as separate entries).
pub fn collapse(relations: Vec<Relation>, symmetric_enabled: bool, default_table_size: usize) -> Result<Vec<Relation>, ExecError> {
    let n = relations.len();
    if n <= 1 {
        return Ok(relations);
    }

    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    fn union(parent: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            parent[ra] = rb;
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if relations[i].columns().iter().any(|c| relations[j].columns().contains(c)) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut components: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        components.entry(root).or_default().push(i);
    }

    let mut order: Vec<usize> = components.keys().copied().collect();
    order.sort_unstable();

    let mut output = Vec::with_capacity(order.len());
    for root in order {
        let mut members = components.remove(&root).expect("root was just collected above");
        if members.len() == 1 {
            output.push(relations[members[0]].clone());
            continue;
        }
        members.sort_by_key(|&i| {
            let size = relations[i].size();
            if size < 0 {
                i64::MAX
            } else {
                size
            }
        });
        let mut acc = relations[members[0]].clone();
        for &idx in &members[1..] {
            let key_cols = shared_symbols(acc.columns(), relations[idx].columns());
            acc = join::join(&acc, &relations[idx], &key_cols, symmetric_enabled, default_table_size)?;
        }
        output.push(acc);
    }
    Ok(output)
}

/// Fold any remaining disjoint groups (patterns over entirely unrelated
/// variables) into a single relation via cross product before the final
/// find-specification projection.
fn fold_disjoint_groups(groups: Vec<Relation>, symmetric_enabled: bool, default_table_size: usize) -> Result<Relation, ExecError> {
    let mut iter = groups.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(Relation::empty(Vec::new()));
    };
    for group in iter {
        let key_cols = shared_symbols(acc.columns(), group.columns());
        acc = join::join(&acc, &group, &key_cols, symmetric_enabled, default_table_size)?;
    }
    Ok(acc)
}
