//! Decorrelation analyzer: groups correlated subqueries that
//! share a correlation signature into batched filter groups. Pure
//! aggregates (aggregates with no grouping variables) are never
//! decorrelated, since merging their inner queries would not preserve
//! per-outer-row isolation.

use crate::value::Symbol;
use std::collections::HashMap;

/// `{input-vars (in order), is-grouped-aggregate}`. Two subqueries share
/// a signature iff both fields match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationSignature {
    pub input_vars: Vec<Symbol>,
    pub is_grouped_aggregate: bool,
}

/// A correlated subquery clause as seen by the analyzer. `has_grouping`
/// and `has_aggregates` describe the inner find specification;
/// `is_grouped_aggregate` is true only when both are set (an inner find
/// with grouping variables *and* aggregates, as opposed to a pure
/// aggregate with no grouping).
#[derive(Debug, Clone)]
pub struct SubqueryClause {
    pub id: usize,
    pub input_vars: Vec<Symbol>,
    pub has_grouping: bool,
    pub has_aggregates: bool,
    pub accepts_relation_input: bool,
}

impl SubqueryClause {
    fn is_grouped_aggregate(&self) -> bool {
        self.has_grouping && self.has_aggregates
    }

    fn is_pure_aggregate(&self) -> bool {
        self.has_aggregates && !self.has_grouping
    }

    fn signature(&self) -> CorrelationSignature {
        CorrelationSignature {
            input_vars: self.input_vars.clone(),
            is_grouped_aggregate: self.is_grouped_aggregate(),
        }
    }
}

/// The outcome of analysis for one clause or group of clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorrelationUnit {
    /// Two or more batchable subqueries sharing a signature, evaluated
    /// together as one filter group.
    Group(Vec<usize>),
    /// A subquery evaluated individually under the strategy selector.
    Individual(usize),
}

/// Group `clauses` into decorrelation units. When `enabled` is false,
/// every clause is evaluated individually.
pub fn analyze(clauses: &[SubqueryClause], enabled: bool) -> Vec<DecorrelationUnit> {
    if !enabled {
        return clauses.iter().map(|c| DecorrelationUnit::Individual(c.id)).collect();
    }

    let mut groups: HashMap<CorrelationSignature, Vec<usize>> = HashMap::new();
    let mut signature_order: Vec<CorrelationSignature> = Vec::new();
    let mut individuals = Vec::new();

    for clause in clauses {
        if clause.is_pure_aggregate() || !clause.accepts_relation_input {
            individuals.push(clause.id);
            continue;
        }
        let signature = clause.signature();
        groups
            .entry(signature.clone())
            .or_insert_with(|| {
                signature_order.push(signature.clone());
                Vec::new()
            })
            .push(clause.id);
    }

    let mut units = Vec::new();
    for signature in signature_order {
        let ids = groups.remove(&signature).expect("signature was just inserted above");
        if ids.len() >= 2 {
            units.push(DecorrelationUnit::Group(ids));
        } else {
            units.extend(ids.into_iter().map(DecorrelationUnit::Individual));
        }
    }
    units.extend(individuals.into_iter().map(DecorrelationUnit::Individual));
    units
}
