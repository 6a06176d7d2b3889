//! Aggregation operator: group-by over the pass-through
//! columns in a find specification, with `count`/`sum`/`avg`/`min`/`max`
//! and an internal conditional-aggregate predicate column.

use crate::error::ExecError;
use crate::relation::Relation;
use crate::value::{Symbol, Tuple, TupleKey, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// One `(function, arg)` aggregate in a find specification, with an
/// optional conditional-aggregate predicate column. The predicate column
/// is never exposed through surface query syntax; it is produced
/// internally by query rewriting, e.g. decorrelation.
#[derive(Debug, Clone, PartialEq)]
pub struct FindAggregate {
    pub func: AggregateFunc,
    pub arg: Symbol,
    pub predicate: Option<Symbol>,
}

impl FindAggregate {
    pub fn new(func: AggregateFunc, arg: Symbol) -> Self {
        FindAggregate {
            func,
            arg,
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Symbol) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Canonical output column name, e.g. `(count ?p)`.
    pub fn output_symbol(&self) -> Symbol {
        let name = match self.func {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        };
        Symbol::aggregate(name, &self.arg)
    }
}

/// One element of a find specification: a pass-through grouping variable,
/// or an aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum FindElement {
    Variable(Symbol),
    Aggregate(FindAggregate),
}

pub struct FindSpec(Vec<FindElement>);

impl FindSpec {
    pub fn new(elements: Vec<FindElement>) -> Self {
        FindSpec(elements)
    }

    fn group_vars(&self) -> Vec<&Symbol> {
        self.0
            .iter()
            .filter_map(|e| match e {
                FindElement::Variable(s) => Some(s),
                FindElement::Aggregate(_) => None,
            })
            .collect()
    }

    fn aggregates(&self) -> Vec<&FindAggregate> {
        self.0
            .iter()
            .filter_map(|e| match e {
                FindElement::Aggregate(a) => Some(a),
                FindElement::Variable(_) => None,
            })
            .collect()
    }

    fn output_columns(&self) -> Vec<Symbol> {
        self.0
            .iter()
            .map(|e| match e {
                FindElement::Variable(s) => s.clone(),
                FindElement::Aggregate(a) => a.output_symbol(),
            })
            .collect()
    }

    /// Every symbol this find specification reads from its input relation:
    /// group variables, then each aggregate's argument and (if present)
    /// conditional predicate column, deduplicated in first-use order. The
    /// phase executor projects onto this set before calling [`aggregate`].
    pub fn required_input_symbols(&self) -> Vec<Symbol> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for element in &self.0 {
            match element {
                FindElement::Variable(s) => {
                    if seen.insert(s.clone()) {
                        out.push(s.clone());
                    }
                }
                FindElement::Aggregate(a) => {
                    if seen.insert(a.arg.clone()) {
                        out.push(a.arg.clone());
                    }
                    if let Some(p) = &a.predicate {
                        if seen.insert(p.clone()) {
                            out.push(p.clone());
                        }
                    }
                }
            }
        }
        out
    }
}

struct Accumulator {
    func: AggregateFunc,
    arg_idx: usize,
    predicate_idx: Option<usize>,
    matched_count: u64,
    all_int: bool,
    int_sum: i64,
    float_sum: f64,
    extreme: Option<Value>,
}

impl Accumulator {
    fn new(agg: &FindAggregate, columns: &[Symbol]) -> Result<Self, ExecError> {
        let arg_idx = index_of(columns, &agg.arg)?;
        let predicate_idx = agg.predicate.as_ref().map(|p| index_of(columns, p)).transpose()?;
        Ok(Accumulator {
            func: agg.func,
            arg_idx,
            predicate_idx,
            matched_count: 0,
            all_int: true,
            int_sum: 0,
            float_sum: 0.0,
            extreme: None,
        })
    }

    fn accept(&mut self, row: &Tuple) {
        if let Some(p) = self.predicate_idx {
            if !row.get(p).is_some_and(Value::is_truthy) {
                return;
            }
        }
        let Some(value) = row.get(self.arg_idx) else {
            return;
        };
        if value.is_null() {
            return;
        }
        self.matched_count += 1;
        match self.func {
            AggregateFunc::Count => {}
            AggregateFunc::Sum | AggregateFunc::Avg => match value {
                Value::Int64(i) => {
                    self.int_sum += i;
                    self.float_sum += *i as f64;
                }
                Value::Float64(f) => {
                    self.all_int = false;
                    self.float_sum += f;
                }
                _ => {}
            },
            AggregateFunc::Min => {
                if self
                    .extreme
                    .as_ref()
                    .and_then(|cur| value.partial_cmp(cur))
                    .is_none_or(|ord| ord == std::cmp::Ordering::Less)
                {
                    self.extreme = Some(value.clone());
                }
            }
            AggregateFunc::Max => {
                if self
                    .extreme
                    .as_ref()
                    .and_then(|cur| value.partial_cmp(cur))
                    .is_none_or(|ord| ord == std::cmp::Ordering::Greater)
                {
                    self.extreme = Some(value.clone());
                }
            }
        }
    }

    fn finish(&self) -> Value {
        match self.func {
            AggregateFunc::Count => Value::Int64(self.matched_count as i64),
            AggregateFunc::Sum => {
                if self.all_int {
                    Value::Int64(self.int_sum)
                } else {
                    Value::Float64(self.float_sum)
                }
            }
            AggregateFunc::Avg => Value::Float64(self.float_sum / self.matched_count as f64),
            AggregateFunc::Min | AggregateFunc::Max => {
                self.extreme.clone().unwrap_or(Value::Null)
            }
        }
    }
}

fn index_of(columns: &[Symbol], symbol: &Symbol) -> Result<usize, ExecError> {
    columns
        .iter()
        .position(|c| c == symbol)
        .ok_or_else(|| ExecError::UserInputError(vec![symbol.clone()]))
}

/// Run the aggregation operator over `input`.
pub fn aggregate(input: &Relation, find: &FindSpec) -> Result<Relation, ExecError> {
    let group_vars = find.group_vars();
    let aggregates = find.aggregates();
    let output_columns = find.output_columns();

    if aggregates.is_empty() {
        let group_idx: Vec<usize> = group_vars
            .iter()
            .map(|s| index_of(input.columns(), s))
            .collect::<Result<_, _>>()?;
        let mut iter = input.iterator()?;
        let mut rows = Vec::new();
        while iter.next()? {
            rows.push(iter.tuple().project(&group_idx));
        }
        iter.close();
        return Ok(Relation::materialized(output_columns, rows));
    }

    let group_idx: Vec<usize> = group_vars
        .iter()
        .map(|s| index_of(input.columns(), s))
        .collect::<Result<_, _>>()?;

    let mut order: Vec<TupleKey> = Vec::new();
    let mut group_keys: HashMap<TupleKey, Tuple> = HashMap::new();
    let mut group_index: HashMap<TupleKey, usize> = HashMap::new();
    let mut accumulators: Vec<Vec<Accumulator>> = Vec::new();

    let mut iter = input.iterator()?;
    while iter.next()? {
        let row = iter.tuple();
        let key = TupleKey::from_tuple(row, &group_idx);
        let idx = match group_index.get(&key) {
            Some(&idx) => idx,
            None => {
                let accs = aggregates
                    .iter()
                    .map(|a| Accumulator::new(a, input.columns()))
                    .collect::<Result<Vec<_>, _>>()?;
                let idx = accumulators.len();
                order.push(key.clone());
                group_keys.insert(key.clone(), row.project(&group_idx));
                accumulators.push(accs);
                group_index.insert(key.clone(), idx);
                idx
            }
        };
        for acc in &mut accumulators[idx] {
            acc.accept(row);
        }
    }
    iter.close();

    let mut rows = Vec::with_capacity(order.len());
    for key in &order {
        let idx = group_index[key];
        let accs = &accumulators[idx];
        if accs.iter().any(|a| a.matched_count == 0) {
            continue;
        }
        let mut values = group_keys[key].values().to_vec();
        values.extend(accs.iter().map(Accumulator::finish));
        rows.push(Tuple::new(values));
    }

    Ok(Relation::materialized(output_columns, rows))
}
