//! Error taxonomy for the query executor.

use crate::value::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// The query references a column not produced by any phase, a
    /// predicate requires a symbol not yet available, an aggregate names
    /// an unknown variable, or a projection requests a missing column.
    #[error("unknown symbol(s) referenced: {}", format_symbols(.0))]
    UserInputError(Vec<Symbol>),

    /// Propagated verbatim from the pattern matcher, typically I/O.
    #[error("pattern matcher error: {0}")]
    MatcherError(String),

    /// An inner subquery execution failed; `index` identifies which input
    /// combination failed when running under the worker pool.
    #[error("subquery failed at input index {index}: {source}")]
    SubqueryError {
        index: usize,
        #[source]
        source: Box<ExecError>,
    },

    /// Fatal, non-recoverable misuse: second `iterator()` call on a
    /// single-use streaming relation, or an operator receiving mismatched
    /// column arity.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Context cancellation or timeout surfaced after in-flight work
    /// terminated.
    #[error("query was cancelled")]
    Cancelled,
}

fn format_symbols(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type ExecResult<T> = Result<T, ExecError>;
