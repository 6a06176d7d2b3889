//! Black-box coverage of the relation abstraction's materialized/streaming
//! contract.

use relquery::relation::{BoxedIterator, Relation, SliceIter, TupleIterator};
use relquery::value::{Symbol, Tuple, Value};
use std::sync::Arc;

fn columns() -> Vec<Symbol> {
    vec![Symbol::new("?x")]
}

fn row(v: i64) -> Tuple {
    Tuple::new(vec![Value::Int64(v)])
}

#[test]
fn materialized_relation_supports_many_independent_readers() {
    let rel = Relation::materialized(columns(), vec![row(1), row(2), row(3)]);
    let readers: Vec<Vec<Tuple>> = (0..5).map(|_| rel.collect_rows().unwrap()).collect();
    for rows in &readers {
        assert_eq!(rows.len(), 3);
    }
}

#[test]
fn single_use_streaming_relation_rejects_second_iterator() {
    let source: BoxedIterator = Box::new(SliceIter::new(Arc::new(vec![row(1)])));
    let rel = Relation::streaming(columns(), source, true);
    rel.iterator().unwrap();
    assert!(rel.iterator().is_err());
}

#[test]
fn non_single_use_streaming_relation_auto_materializes_for_replay() {
    let source: BoxedIterator = Box::new(SliceIter::new(Arc::new(vec![row(1), row(2)])));
    let rel = Relation::streaming(columns(), source, false);
    let first = rel.collect_rows().unwrap();
    let second = rel.collect_rows().unwrap();
    assert_eq!(first, second);
}

#[test]
fn sorted_produces_deterministic_order_regardless_of_insertion_order() {
    let rel = Relation::materialized(columns(), vec![row(3), row(1), row(2)]);
    assert_eq!(rel.sorted().unwrap(), vec![row(1), row(2), row(3)]);
}
