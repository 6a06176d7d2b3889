//! # relquery
//!
//! A relational query executor for a Datalog-style engine over an immutable
//! datom store `(Entity, Attribute, Value, Tx)`.
//!
//! This crate does not parse query syntax and does not ship a storage
//! engine; it consumes whatever implements [`matcher::PatternMatcher`] and
//! executes the planner-produced phase sequence against it. The pipeline:
//!
//! ```text
//! Pattern (matcher::Pattern)
//!     -> PatternMatcher::match_pattern   -> Relation
//!     -> join / semi-join / anti-join    -> Relation   (phase::collapse)
//!     -> function / predicate clauses    -> Relation
//!     -> correlated subqueries           -> Relation   (subquery, decorrelation)
//!     -> aggregation::aggregate          -> Relation
//! ```
//!
//! [`phase::PhaseExecutor`] drives this pipeline one planner-produced
//! [`phase::Phase`] at a time; [`value`], [`relation`], [`ops`], [`join`],
//! and [`aggregation`] are independently usable building blocks.
//!
//! ## Example
//!
//! ```
//! use relquery::aggregation::{aggregate, AggregateFunc, FindAggregate, FindElement, FindSpec};
//! use relquery::relation::Relation;
//! use relquery::value::{Symbol, Tuple, Value};
//!
//! let input = Relation::materialized(
//!     vec![Symbol::new("?dept"), Symbol::new("?name")],
//!     vec![
//!         Tuple::new(vec![Value::string("Eng"), Value::string("Alice")]),
//!         Tuple::new(vec![Value::string("Eng"), Value::string("Bob")]),
//!     ],
//! );
//! let find = FindSpec::new(vec![
//!     FindElement::Variable(Symbol::new("?dept")),
//!     FindElement::Aggregate(FindAggregate::new(AggregateFunc::Count, Symbol::new("?name"))),
//! ]);
//! let out = aggregate(&input, &find).unwrap();
//! assert_eq!(out.size(), 1);
//! ```

pub mod aggregation;
pub mod config;
pub mod context;
pub mod decorrelation;
pub mod error;
pub mod join;
pub mod logging;
pub mod matcher;
pub mod ops;
pub mod phase;
pub mod relation;
pub mod subquery;
pub mod value;

pub use config::{Config, ExecutorOptions};
pub use context::Context;
pub use error::{ExecError, ExecResult};
pub use phase::{Phase, PhaseExecutor, Planner};
pub use relation::Relation;
