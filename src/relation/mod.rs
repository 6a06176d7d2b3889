//! # Relation Abstraction
//!
//! A `Relation` is an ordered, named set of columns over a sequence of
//! [`Tuple`](crate::value::Tuple) rows, produced by a matcher or operator
//! and consumed by the next operator or the find-phase.
//!
//! Two concrete forms:
//!   - [`Materialized`] owns its row vector. Cheap to re-iterate; safe for
//!     any number of concurrent iterators.
//!   - [`Streaming`] wraps a single-pass source. In single-use mode a
//!     second `iterator()` call is a [`ExecError::ContractViolation`];
//!     otherwise the relation auto-materializes on first iteration and
//!     replays for subsequent callers.

pub mod iterator;

pub use iterator::{
    BoxedIterator, BufferedIter, FilterIter, FunctionEvalIter, ProjectIter, SliceIter,
    TupleIterator,
};

use crate::error::ExecError;
use crate::value::{Symbol, Tuple};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Returned by [`Relation::size`] when the row count is not known without
/// consuming the source.
pub const UNKNOWN_SIZE: i64 = -1;

/// A relation: named columns plus a row source, either fully materialized
/// or streaming.
#[derive(Clone)]
pub enum Relation {
    Materialized(Arc<MaterializedRelation>),
    Streaming(Arc<StreamingRelation>),
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Materialized(_) => f.write_str("Relation::Materialized(..)"),
            Relation::Streaming(_) => f.write_str("Relation::Streaming(..)"),
        }
    }
}

impl Relation {
    pub fn materialized(columns: Vec<Symbol>, rows: Vec<Tuple>) -> Self {
        Relation::Materialized(Arc::new(MaterializedRelation {
            columns,
            rows: Arc::new(rows),
        }))
    }

    /// Wrap a one-shot iterator source. `single_use` mirrors
    /// `enable_true_streaming`: when true, a second `iterator()` call is a
    /// contract violation; when false, the first iteration transparently
    /// buffers and later callers replay the buffer.
    pub fn streaming(
        columns: Vec<Symbol>,
        source: BoxedIterator,
        single_use: bool,
    ) -> Self {
        Relation::Streaming(Arc::new(StreamingRelation {
            columns,
            single_use,
            state: Mutex::new(StreamingState::Fresh(Some(source))),
        }))
    }

    pub fn empty(columns: Vec<Symbol>) -> Self {
        Relation::materialized(columns, Vec::new())
    }

    pub fn columns(&self) -> &[Symbol] {
        match self {
            Relation::Materialized(m) => &m.columns,
            Relation::Streaming(s) => &s.columns,
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, Relation::Materialized(_))
    }

    /// Exact row count for materialized relations; [`UNKNOWN_SIZE`] for
    /// streaming relations (does not force consumption).
    pub fn size(&self) -> i64 {
        match self {
            Relation::Materialized(m) => m.rows.len() as i64,
            Relation::Streaming(_) => UNKNOWN_SIZE,
        }
    }

    /// Cheap emptiness check. For streaming relations this peeks at most
    /// one tuple and must not force full consumption.
    pub fn is_empty(&self) -> Result<bool, ExecError> {
        match self {
            Relation::Materialized(m) => Ok(m.rows.is_empty()),
            Relation::Streaming(_) => {
                let mut iter = self.iterator()?;
                let empty = !iter.next()?;
                iter.close();
                Ok(empty)
            }
        }
    }

    /// Obtain a fresh iterator. For a single-use streaming relation this
    /// may be called at most once.
    pub fn iterator(&self) -> Result<BoxedIterator, ExecError> {
        match self {
            Relation::Materialized(m) => Ok(Box::new(SliceIter::new(Arc::clone(&m.rows)))),
            Relation::Streaming(s) => s.iterator(),
        }
    }

    /// Deterministic row order for tests and dedup. Forces full
    /// consumption.
    pub fn sorted(&self) -> Result<Vec<Tuple>, ExecError> {
        let mut rows = self.collect_rows()?;
        rows.sort_by(|a, b| {
            for (va, vb) in a.values().iter().zip(b.values().iter()) {
                match va.partial_cmp(vb) {
                    Some(std::cmp::Ordering::Equal) | None => continue,
                    Some(ord) => return ord,
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(rows)
    }

    pub fn collect_rows(&self) -> Result<Vec<Tuple>, ExecError> {
        match self {
            Relation::Materialized(m) => Ok(m.rows.as_ref().clone()),
            Relation::Streaming(_) => {
                let mut iter = self.iterator()?;
                let mut rows = Vec::new();
                while iter.next()? {
                    rows.push(iter.tuple().clone());
                }
                iter.close();
                Ok(rows)
            }
        }
    }
}

pub struct MaterializedRelation {
    columns: Vec<Symbol>,
    rows: Arc<Vec<Tuple>>,
}

enum StreamingState {
    Fresh(Option<BoxedIterator>),
    Buffering(BufferedIter),
    Consumed,
}

pub struct StreamingRelation {
    columns: Vec<Symbol>,
    single_use: bool,
    state: Mutex<StreamingState>,
}

impl StreamingRelation {
    fn iterator(&self) -> Result<BoxedIterator, ExecError> {
        let mut guard = self.state.lock().expect("streaming relation state poisoned");
        match &mut *guard {
            StreamingState::Fresh(slot) => {
                let source = slot.take().expect("fresh state always holds a source");
                if self.single_use {
                    *guard = StreamingState::Consumed;
                    Ok(source)
                } else {
                    let buffered = BufferedIter::new(source);
                    *guard = StreamingState::Buffering(buffered.clone());
                    Ok(Box::new(buffered))
                }
            }
            StreamingState::Buffering(buffered) => Ok(Box::new(buffered.clone())),
            StreamingState::Consumed => Err(ExecError::ContractViolation(
                "second iterator() call on a single-use streaming relation".into(),
            )),
        }
    }
}
