//! Filter predicates and function-evaluation expressions.
//!
//! Both operate over column indices rather than symbols; the phase
//! executor resolves a clause's symbols to indices against the current
//! relation's column list before building one of these.

use crate::value::{Tuple, Value};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::HashSet;

/// A structured row predicate. Comparisons follow `Value`'s variant-aware
/// rules: same-variant natural order, narrow cross-variant convenience
/// equalities, everything else incomparable (false).
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(usize, Value),
    Ne(usize, Value),
    Gt(usize, Value),
    Lt(usize, Value),
    Ge(usize, Value),
    Le(usize, Value),
    ColumnsEq(usize, usize),
    ColumnsNe(usize, usize),
    StartsWith(usize, String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    True,
    False,
}

impl Predicate {
    pub fn referenced_columns(&self) -> HashSet<usize> {
        let mut cols = HashSet::new();
        self.collect_columns(&mut cols);
        cols
    }

    fn collect_columns(&self, cols: &mut HashSet<usize>) {
        match self {
            Predicate::Eq(c, _)
            | Predicate::Ne(c, _)
            | Predicate::Gt(c, _)
            | Predicate::Lt(c, _)
            | Predicate::Ge(c, _)
            | Predicate::Le(c, _)
            | Predicate::StartsWith(c, _) => {
                cols.insert(*c);
            }
            Predicate::ColumnsEq(a, b) | Predicate::ColumnsNe(a, b) => {
                cols.insert(*a);
                cols.insert(*b);
            }
            Predicate::And(p, q) | Predicate::Or(p, q) => {
                p.collect_columns(cols);
                q.collect_columns(cols);
            }
            Predicate::Not(p) => p.collect_columns(cols),
            Predicate::True | Predicate::False => {}
        }
    }

    pub fn evaluate(&self, tuple: &Tuple) -> bool {
        match self {
            Predicate::Eq(c, v) => tuple.get(*c).is_some_and(|x| x == v),
            Predicate::Ne(c, v) => tuple.get(*c).is_some_and(|x| x != v),
            Predicate::Gt(c, v) => matches!(
                tuple.get(*c).and_then(|x| x.partial_cmp(v)),
                Some(std::cmp::Ordering::Greater)
            ),
            Predicate::Lt(c, v) => matches!(
                tuple.get(*c).and_then(|x| x.partial_cmp(v)),
                Some(std::cmp::Ordering::Less)
            ),
            Predicate::Ge(c, v) => matches!(
                tuple.get(*c).and_then(|x| x.partial_cmp(v)),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ),
            Predicate::Le(c, v) => matches!(
                tuple.get(*c).and_then(|x| x.partial_cmp(v)),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ),
            Predicate::ColumnsEq(a, b) => match (tuple.get(*a), tuple.get(*b)) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            Predicate::ColumnsNe(a, b) => match (tuple.get(*a), tuple.get(*b)) {
                (Some(x), Some(y)) => x != y,
                _ => false,
            },
            Predicate::StartsWith(c, prefix) => matches!(
                tuple.get(*c),
                Some(Value::String(s)) if s.starts_with(prefix.as_str())
            ),
            Predicate::And(p, q) => p.evaluate(tuple) && q.evaluate(tuple),
            Predicate::Or(p, q) => p.evaluate(tuple) || q.evaluate(tuple),
            Predicate::Not(p) => !p.evaluate(tuple),
            Predicate::True => true,
            Predicate::False => false,
        }
    }
}

/// A function-evaluation expression: computes one new column from existing
/// ones. `Function::apply` is total; arguments of the wrong
/// type produce `Value::Null` rather than panicking, matching the
/// `Filter`-before-`Function` scheduling the planner already guarantees
/// for predicate clauses but does not guarantee for expression clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    Add(usize, usize),
    Sub(usize, usize),
    Mul(usize, usize),
    Div(usize, usize),
    StrConcat(Vec<usize>),
    StrStartsWith(usize, String),
    Year(usize),
    Month(usize),
    Day(usize),
    Hour(usize),
    Minute(usize),
    Second(usize),
}

impl Function {
    pub fn referenced_columns(&self) -> Vec<usize> {
        match self {
            Function::Add(a, b)
            | Function::Sub(a, b)
            | Function::Mul(a, b)
            | Function::Div(a, b) => vec![*a, *b],
            Function::StrConcat(cols) => cols.clone(),
            Function::StrStartsWith(c, _)
            | Function::Year(c)
            | Function::Month(c)
            | Function::Day(c)
            | Function::Hour(c)
            | Function::Minute(c)
            | Function::Second(c) => vec![*c],
        }
    }

    pub fn apply(&self, tuple: &Tuple) -> Value {
        match self {
            Function::Add(a, b) => numeric_binop(tuple, *a, *b, |x, y| x + y, |x, y| x + y),
            Function::Sub(a, b) => numeric_binop(tuple, *a, *b, |x, y| x - y, |x, y| x - y),
            Function::Mul(a, b) => numeric_binop(tuple, *a, *b, |x, y| x * y, |x, y| x * y),
            Function::Div(a, b) => match (tuple.get(*a), tuple.get(*b)) {
                (Some(l), Some(r)) => match (as_f64(l), as_f64(r)) {
                    (Some(x), Some(y)) => Value::Float64(x / y),
                    _ => Value::Null,
                },
                _ => Value::Null,
            },
            Function::StrConcat(cols) => {
                let mut out = String::new();
                for &c in cols {
                    if let Some(v) = tuple.get(c) {
                        out.push_str(&v.to_string());
                    }
                }
                Value::string(out)
            }
            Function::StrStartsWith(c, prefix) => match tuple.get(*c) {
                Some(Value::String(s)) => Value::Bool(s.starts_with(prefix.as_str())),
                _ => Value::Bool(false),
            },
            Function::Year(c) => time_part(tuple, *c, |t| t.year() as i64),
            Function::Month(c) => time_part(tuple, *c, |t| t.month() as i64),
            Function::Day(c) => time_part(tuple, *c, |t| t.day() as i64),
            Function::Hour(c) => time_part(tuple, *c, |t| t.hour() as i64),
            Function::Minute(c) => time_part(tuple, *c, |t| t.minute() as i64),
            Function::Second(c) => time_part(tuple, *c, |t| t.second() as i64),
        }
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int64(i) => Some(*i as f64),
        Value::Float64(f) => Some(*f),
        _ => None,
    }
}

fn numeric_binop(
    tuple: &Tuple,
    a: usize,
    b: usize,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    match (tuple.get(a), tuple.get(b)) {
        (Some(Value::Int64(x)), Some(Value::Int64(y))) => Value::Int64(int_op(*x, *y)),
        (Some(l), Some(r)) => match (as_f64(l), as_f64(r)) {
            (Some(x), Some(y)) => Value::Float64(float_op(x, y)),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn time_part(tuple: &Tuple, col: usize, extract: impl Fn(&DateTime<Utc>) -> i64) -> Value {
    match tuple.get(col) {
        Some(Value::Time(t)) => Value::Int64(extract(t)),
        _ => Value::Null,
    }
}
