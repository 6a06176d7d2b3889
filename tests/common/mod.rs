//! In-memory `PatternMatcher` test double shared by the integration tests.
//! Stores datoms as plain `(Identity, Keyword, Value, TxId)` rows and
//! answers a pattern by scanning and substituting bound/blank elements,
//! ignoring any supplied bindings (the fixture is small enough that a
//! linear scan suffices; real matchers use the bindings to prune first).

use relquery::context::Context;
use relquery::error::ExecError;
use relquery::matcher::{Pattern, PatternElement, PatternMatcher};
use relquery::relation::Relation;
use relquery::value::{Datom, Identity, Keyword, Symbol, Tuple, TxId, Value};

pub struct FactStore {
    datoms: Vec<Datom>,
}

impl FactStore {
    pub fn new() -> Self {
        FactStore { datoms: Vec::new() }
    }

    pub fn assert(mut self, e: u64, a: &str, v: Value, tx: TxId) -> Self {
        self.datoms.push(Datom::new(Identity::new(e), Keyword::new(a), v, tx));
        self
    }
}

impl PatternMatcher for FactStore {
    fn match_pattern(&self, pattern: &Pattern, _bindings: &[Relation], _ctx: &Context) -> Result<Relation, ExecError> {
        let columns = pattern.output_columns();
        let mut rows = Vec::new();

        for datom in &self.datoms {
            let e_val = Value::Identity(datom.e.clone());
            let a_val = Value::string(datom.a.as_str());
            let v_val = datom.v.clone();
            let tx_val = Value::TxId(datom.tx);

            if !element_matches(&pattern.e, &e_val) || !element_matches(&pattern.a, &a_val) || !element_matches(&pattern.v, &v_val) {
                continue;
            }
            if let Some(tx_el) = &pattern.tx {
                if !element_matches(tx_el, &tx_val) {
                    continue;
                }
            }

            let mut values = Vec::new();
            for (element, value) in [(&pattern.e, &e_val), (&pattern.a, &a_val), (&pattern.v, &v_val)] {
                if matches!(element, PatternElement::Var(_)) {
                    values.push(value.clone());
                }
            }
            if let Some(tx_el) = &pattern.tx {
                if matches!(tx_el, PatternElement::Var(_)) {
                    values.push(tx_val.clone());
                }
            }
            rows.push(Tuple::new(values));
        }

        Ok(Relation::materialized(columns, rows))
    }
}

fn element_matches(element: &PatternElement, value: &Value) -> bool {
    match element {
        PatternElement::Var(_) | PatternElement::Blank => true,
        PatternElement::Bound(bound) => bound == value,
    }
}

pub fn var(name: &str) -> PatternElement {
    PatternElement::Var(Symbol::new(name))
}

pub fn bound_str(s: &str) -> PatternElement {
    PatternElement::Bound(Value::string(s))
}
