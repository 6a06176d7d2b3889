//! Pattern matcher interface and the capability traits a matcher
//! implementation may optionally support.
//!
//! This crate does not ship a storage engine; it consumes whatever
//! implements [`PatternMatcher`]. Tests use an in-memory double (see
//! `tests/common`).

use crate::context::Context;
use crate::error::ExecError;
use crate::relation::Relation;
use crate::value::{Symbol, Value};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One element of a data pattern: a variable to bind, a literal to match
/// against, or a wildcard that matches anything and binds nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternElement {
    Var(Symbol),
    Bound(Value),
    Blank,
}

/// A data pattern over (entity, attribute, value, optional tx).
#[derive(Debug, Clone)]
pub struct Pattern {
    pub e: PatternElement,
    pub a: PatternElement,
    pub v: PatternElement,
    pub tx: Option<PatternElement>,
}

impl Pattern {
    /// The variables this pattern would bind, in (E, A, V, Tx) order.
    pub fn output_columns(&self) -> Vec<Symbol> {
        [Some(&self.e), Some(&self.a), Some(&self.v), self.tx.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|el| match el {
                PatternElement::Var(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Consumed interface: return the relation of all datoms matching
/// `pattern` after substituting any variables bound by `bindings`.
pub trait PatternMatcher: Send + Sync {
    fn match_pattern(
        &self,
        pattern: &Pattern,
        bindings: &[Relation],
        ctx: &Context,
    ) -> Result<Relation, ExecError>;
}

/// A predicate pushdown a matcher may use to prune a scan. Honoring these
/// is optional; correctness does not depend on it.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConstraint {
    Range {
        column: usize,
        lo: Option<Value>,
        hi: Option<Value>,
    },
    Equality {
        column: usize,
        value: Value,
    },
    Membership {
        column: usize,
        values: Vec<Value>,
    },
}

/// Optional capability: the matcher accepts storage-level constraints.
pub trait ConstraintAware: PatternMatcher {
    fn match_with_constraints(
        &self,
        pattern: &Pattern,
        bindings: &[Relation],
        constraints: &[StorageConstraint],
        ctx: &Context,
    ) -> Result<Relation, ExecError>;
}

/// Optional capability: the matcher accepts a time-range hint for
/// optimization (e.g. partition pruning on `Tx`/`Time` columns).
pub trait TimeRangeAware: PatternMatcher {
    fn with_time_range(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>);
}

/// A telemetry event reported to an [`AnnotationHandler`], e.g. so tests
/// can assert that subquery batching or decorrelation occurred.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub data: HashMap<String, Value>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Event {
            name: name.into(),
            data: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

pub trait AnnotationHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

/// Optional capability: the matcher exposes a telemetry sink.
pub trait HandlerProvider {
    fn handler(&self) -> Option<&dyn AnnotationHandler>;
}

/// Per-position score used to pick the most selective binding relation
/// when a matcher receives more than one.
const SCORE_ENTITY: i64 = 100;
const SCORE_ATTRIBUTE: i64 = 10;
const SCORE_VALUE: i64 = 1;
const SCORE_TX: i64 = 1;

/// Score a candidate binding relation against a pattern: sum of per-position
/// weights for every pattern variable the relation's columns bind.
pub fn score_binding(pattern: &Pattern, binding: &Relation) -> i64 {
    let weighted = [
        (&pattern.e, SCORE_ENTITY),
        (&pattern.a, SCORE_ATTRIBUTE),
        (&pattern.v, SCORE_VALUE),
    ];
    let mut score = 0;
    for (element, weight) in weighted {
        if let PatternElement::Var(sym) = element {
            if binding.columns().contains(sym) {
                score += weight;
            }
        }
    }
    if let Some(PatternElement::Var(sym)) = &pattern.tx {
        if binding.columns().contains(sym) {
            score += SCORE_TX;
        }
    }
    score
}

/// Pick the most selective binding relation for `pattern` out of
/// `bindings`: highest score wins; ties prefer smaller size, then fewer
/// columns.
pub fn select_binding<'a>(pattern: &Pattern, bindings: &'a [Relation]) -> Option<&'a Relation> {
    bindings.iter().max_by(|a, b| {
        let score_a = score_binding(pattern, a);
        let score_b = score_binding(pattern, b);
        score_a
            .cmp(&score_b)
            .then_with(|| b.size().cmp(&a.size()))
            .then_with(|| b.columns().len().cmp(&a.columns().len()))
    })
}
