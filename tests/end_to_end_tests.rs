//! End-to-end scenarios exercised against the public API
//! directly, without a pattern matcher, to pin down literal input/output
//! rows for each operator in combination.

use relquery::aggregation::{aggregate, AggregateFunc, FindAggregate, FindElement, FindSpec};
use relquery::context::Context;
use relquery::decorrelation::{analyze, DecorrelationUnit, SubqueryClause};
use relquery::join::hash_join;
use relquery::relation::Relation;
use relquery::subquery::{execute_subqueries, BatchRunner, SingleRunner, StrategyOptions};
use relquery::value::{Symbol, Tuple, Value};
use std::collections::HashSet;
use std::sync::Arc;

fn rel(columns: &[&str], rows: Vec<Vec<Value>>) -> Relation {
    Relation::materialized(
        columns.iter().map(|c| Symbol::new(*c)).collect(),
        rows.into_iter().map(Tuple::new).collect(),
    )
}

#[test]
fn scenario_1_hash_join_on_shared_column() {
    let left = rel(
        &["?person", "?dept"],
        vec![
            vec![Value::string("Alice"), Value::string("Eng")],
            vec![Value::string("Bob"), Value::string("Sales")],
            vec![Value::string("Charlie"), Value::string("Eng")],
        ],
    );
    let right = rel(
        &["?dept", "?loc"],
        vec![
            vec![Value::string("Eng"), Value::string("A")],
            vec![Value::string("Sales"), Value::string("B")],
            vec![Value::string("Mkt"), Value::string("C")],
        ],
    );
    let out = hash_join(&left, &right, &[Symbol::new("?dept")], 16).unwrap();
    assert_eq!(out.columns(), &[Symbol::new("?person"), Symbol::new("?dept"), Symbol::new("?loc")]);
    let rows = out.collect_rows().unwrap();
    let expected: HashSet<Vec<Value>> = [
        vec![Value::string("Alice"), Value::string("Eng"), Value::string("A")],
        vec![Value::string("Bob"), Value::string("Sales"), Value::string("B")],
        vec![Value::string("Charlie"), Value::string("Eng"), Value::string("A")],
    ]
    .into_iter()
    .collect();
    let actual: HashSet<Vec<Value>> = rows.into_iter().map(|t| t.into_values()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn scenario_2_grouped_aggregation() {
    let input = rel(
        &["?name", "?age", "?score"],
        vec![
            vec![Value::string("Alice"), Value::Int64(30), Value::Float64(85.5)],
            vec![Value::string("Bob"), Value::Int64(25), Value::Float64(92.0)],
            vec![Value::string("Charlie"), Value::Int64(35), Value::Float64(78.5)],
            vec![Value::string("Dave"), Value::Int64(25), Value::Float64(88.0)],
        ],
    );
    let find = FindSpec::new(vec![
        FindElement::Variable(Symbol::new("?age")),
        FindElement::Aggregate(FindAggregate::new(AggregateFunc::Count, Symbol::new("?name"))),
        FindElement::Aggregate(FindAggregate::new(AggregateFunc::Avg, Symbol::new("?score"))),
    ]);
    let out = aggregate(&input, &find).unwrap();
    let rows = out.collect_rows().unwrap();
    assert_eq!(rows.len(), 3);
    let row25 = rows.iter().find(|r| r.get(0) == Some(&Value::Int64(25))).unwrap();
    assert_eq!(row25.get(1), Some(&Value::Int64(2)));
    assert_eq!(row25.get(2), Some(&Value::Float64(90.0)));
}

#[test]
fn scenario_3_empty_input_aggregation_yields_zero_rows() {
    let input = rel(&["?x"], vec![]);
    let find = FindSpec::new(vec![FindElement::Aggregate(FindAggregate::new(AggregateFunc::Count, Symbol::new("?x")))]);
    let out = aggregate(&input, &find).unwrap();
    assert_eq!(out.size(), 0);
}

#[test]
fn scenario_4_parallel_and_sequential_subqueries_agree_on_result_set() {
    let ctx = Context::background();
    let outer_cols = vec![Symbol::new("?group")];
    let outer_rows: Vec<Tuple> = (0..20).map(|i| Tuple::new(vec![Value::Int64(i % 4)])).collect();

    let run_single: SingleRunner = Arc::new(|combo, _ctx| {
        let group = combo.get(&Symbol::new("?group")).cloned().unwrap_or(Value::Null);
        let max = match group {
            Value::Int64(g) => g * 10 + 5,
            _ => 0,
        };
        Ok(Relation::materialized(vec![Symbol::new("?max")], vec![Tuple::new(vec![Value::Int64(max)])]))
    });
    let run_batched: BatchRunner = Arc::new(|_rel, _ctx| unreachable!());

    let sequential_opts = StrategyOptions { accepts_relation_input: false, parallel_enabled: false, parallel_threshold: 1000 };
    let parallel_opts = StrategyOptions { accepts_relation_input: false, parallel_enabled: true, parallel_threshold: 1 };

    let sequential = execute_subqueries(&ctx, &outer_cols, &outer_rows, &outer_cols, &sequential_opts, 1, run_single.clone(), run_batched.clone())
        .unwrap()
        .collect_rows()
        .unwrap();
    let parallel = execute_subqueries(&ctx, &outer_cols, &outer_rows, &outer_cols, &parallel_opts, 4, run_single, run_batched)
        .unwrap()
        .collect_rows()
        .unwrap();

    let as_set = |rows: Vec<Tuple>| -> HashSet<Vec<Value>> { rows.into_iter().map(|t| t.into_values()).collect() };
    assert_eq!(as_set(sequential), as_set(parallel));
}

#[test]
fn scenario_6_decorrelation_grouping() {
    let same_signature = vec![
        SubqueryClause {
            id: 1,
            input_vars: vec![Symbol::new("?dept")],
            has_grouping: true,
            has_aggregates: true,
            accepts_relation_input: true,
        },
        SubqueryClause {
            id: 2,
            input_vars: vec![Symbol::new("?dept")],
            has_grouping: true,
            has_aggregates: true,
            accepts_relation_input: true,
        },
    ];
    assert_eq!(analyze(&same_signature, true), vec![DecorrelationUnit::Group(vec![1, 2])]);

    let different_signature = vec![
        SubqueryClause { id: 1, input_vars: vec![Symbol::new("?dept")], has_grouping: true, has_aggregates: true, accepts_relation_input: true },
        SubqueryClause { id: 2, input_vars: vec![Symbol::new("?loc")], has_grouping: true, has_aggregates: true, accepts_relation_input: true },
    ];
    let units = analyze(&different_signature, true);
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| matches!(u, DecorrelationUnit::Individual(_))));

    let pure_aggregates = vec![
        SubqueryClause { id: 1, input_vars: vec![Symbol::new("?dept")], has_grouping: false, has_aggregates: true, accepts_relation_input: true },
        SubqueryClause { id: 2, input_vars: vec![Symbol::new("?dept")], has_grouping: false, has_aggregates: true, accepts_relation_input: true },
    ];
    let units = analyze(&pure_aggregates, true);
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| matches!(u, DecorrelationUnit::Individual(_))));
}
