//! Batcher: builds a relation-input from a list of outer
//! input combinations for a batched subquery run.

use crate::relation::Relation;
use crate::value::{Symbol, Tuple, Value};
use std::collections::HashMap;

/// Build a relation with one column per input symbol (excluding the
/// implicit `$` database argument) and one row per combination. A symbol
/// missing from a given combination becomes `Value::Null` in that row.
pub fn build_batch_relation(
    input_symbols: &[Symbol],
    combinations: &[HashMap<Symbol, Value>],
) -> Relation {
    let columns: Vec<Symbol> = input_symbols
        .iter()
        .filter(|s| s.as_str() != "$")
        .cloned()
        .collect();

    let rows = combinations
        .iter()
        .map(|combo| {
            Tuple::new(
                columns
                    .iter()
                    .map(|c| combo.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            )
        })
        .collect();

    Relation::materialized(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_dollar_and_counts_rows() {
        let symbols = vec![Symbol::new("$"), Symbol::new("?a"), Symbol::new("?b")];
        let combos = vec![
            HashMap::from([(Symbol::new("?a"), Value::Int64(1)), (Symbol::new("?b"), Value::Int64(2))]),
            HashMap::from([(Symbol::new("?a"), Value::Int64(3)), (Symbol::new("?b"), Value::Int64(4))]),
        ];
        let rel = build_batch_relation(&symbols, &combos);
        assert_eq!(rel.columns(), &[Symbol::new("?a"), Symbol::new("?b")]);
        assert_eq!(rel.size(), 2);
    }

    #[test]
    fn missing_symbol_in_combination_becomes_null() {
        let symbols = vec![Symbol::new("?a"), Symbol::new("?b")];
        let combos = vec![HashMap::from([(Symbol::new("?a"), Value::Int64(1))])];
        let rel = build_batch_relation(&symbols, &combos);
        let rows = rel.collect_rows().unwrap();
        assert_eq!(rows[0].get(1), Some(&Value::Null));
    }

    #[test]
    fn empty_combinations_yield_empty_relation_with_correct_columns() {
        let symbols = vec![Symbol::new("?a")];
        let rel = build_batch_relation(&symbols, &[]);
        assert_eq!(rel.columns(), &[Symbol::new("?a")]);
        assert_eq!(rel.size(), 0);
    }
}
