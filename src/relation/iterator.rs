//! Iterator primitives: a single-pass row producer contract
//! plus composable wrappers layered on top of it.

use crate::error::ExecError;
use crate::value::{Tuple, Value};
use std::sync::{Arc, Mutex};

/// A finite, lazy sequence of tuples.
///
/// `tuple()` returns a reference valid only until the next `next()` call;
/// callers that need to retain a row past that point must clone it.
/// `close()` releases resources on all exit paths and must be idempotent.
pub trait TupleIterator: Send {
    fn next(&mut self) -> Result<bool, ExecError>;
    fn tuple(&self) -> &Tuple;
    fn close(&mut self) {}
}

pub type BoxedIterator = Box<dyn TupleIterator>;

/// Iterates the rows of an in-memory slice, without copying on construction.
pub struct SliceIter {
    rows: Arc<Vec<Tuple>>,
    idx: usize,
}

impl SliceIter {
    pub fn new(rows: Arc<Vec<Tuple>>) -> Self {
        SliceIter { rows, idx: 0 }
    }
}

impl TupleIterator for SliceIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        if self.idx < self.rows.len() {
            self.idx += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn tuple(&self) -> &Tuple {
        &self.rows[self.idx - 1]
    }
}

/// Wraps a source iterator, skipping rows the predicate rejects.
pub struct FilterIter {
    source: BoxedIterator,
    predicate: Box<dyn Fn(&Tuple) -> bool + Send>,
}

impl FilterIter {
    pub fn new(source: BoxedIterator, predicate: Box<dyn Fn(&Tuple) -> bool + Send>) -> Self {
        FilterIter { source, predicate }
    }
}

impl TupleIterator for FilterIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        while self.source.next()? {
            if (self.predicate)(self.source.tuple()) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn tuple(&self) -> &Tuple {
        self.source.tuple()
    }

    fn close(&mut self) {
        self.source.close();
    }
}

/// Wraps a source iterator, projecting each row onto a fixed column list.
pub struct ProjectIter {
    source: BoxedIterator,
    indices: Vec<usize>,
    current: Option<Tuple>,
}

impl ProjectIter {
    pub fn new(source: BoxedIterator, indices: Vec<usize>) -> Self {
        ProjectIter {
            source,
            indices,
            current: None,
        }
    }
}

impl TupleIterator for ProjectIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        if self.source.next()? {
            self.current = Some(self.source.tuple().project(&self.indices));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }

    fn close(&mut self) {
        self.source.close();
    }
}

/// Wraps a source iterator, appending a computed column to every row.
pub struct FunctionEvalIter {
    source: BoxedIterator,
    func: Box<dyn Fn(&Tuple) -> Value + Send>,
    current: Option<Tuple>,
}

impl FunctionEvalIter {
    pub fn new(source: BoxedIterator, func: Box<dyn Fn(&Tuple) -> Value + Send>) -> Self {
        FunctionEvalIter {
            source,
            func,
            current: None,
        }
    }
}

impl TupleIterator for FunctionEvalIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        if self.source.next()? {
            let value = (self.func)(self.source.tuple());
            self.current = Some(self.source.tuple().appended(value));
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }

    fn close(&mut self) {
        self.source.close();
    }
}

struct BufferedCore {
    source: Option<BoxedIterator>,
    buffer: Vec<Tuple>,
}

/// A replayable cursor over a source iterator. The first cursor to be
/// constructed owns the underlying source; every `clone()` shares the same
/// buffer and pulls further rows from the source at most once regardless
/// of how many cursors are reading concurrently.
///
/// This is the mechanism by which a non-single-use [`crate::relation::Relation::Streaming`]
/// implements re-iteration: the first consumer's pass fills the buffer,
/// and later consumers replay it.
pub struct BufferedIter {
    core: Arc<Mutex<BufferedCore>>,
    pos: usize,
    current: Option<Tuple>,
}

impl BufferedIter {
    pub fn new(source: BoxedIterator) -> Self {
        BufferedIter {
            core: Arc::new(Mutex::new(BufferedCore {
                source: Some(source),
                buffer: Vec::new(),
            })),
            pos: 0,
            current: None,
        }
    }

    /// Rewind this cursor to the start of the buffer without touching the
    /// source or other cursors.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.current = None;
    }

    /// Row count, forcing full consumption of the source if necessary.
    pub fn size(&self) -> Result<usize, ExecError> {
        let mut core = self.core.lock().expect("buffered iterator state poisoned");
        Self::drain(&mut core)?;
        Ok(core.buffer.len())
    }

    /// Peeks at most one tuple from the source; does not force full
    /// consumption.
    pub fn is_empty(&self) -> Result<bool, ExecError> {
        let mut core = self.core.lock().expect("buffered iterator state poisoned");
        if core.buffer.is_empty() {
            Self::pull_one(&mut core)?;
        }
        Ok(core.buffer.is_empty())
    }

    fn pull_one(core: &mut BufferedCore) -> Result<bool, ExecError> {
        let Some(src) = core.source.as_mut() else {
            return Ok(false);
        };
        if src.next()? {
            core.buffer.push(src.tuple().clone());
            Ok(true)
        } else {
            core.source = None;
            Ok(false)
        }
    }

    fn drain(core: &mut BufferedCore) -> Result<(), ExecError> {
        while Self::pull_one(core)? {}
        Ok(())
    }
}

impl Clone for BufferedIter {
    fn clone(&self) -> Self {
        BufferedIter {
            core: Arc::clone(&self.core),
            pos: self.pos,
            current: self.current.clone(),
        }
    }
}

impl TupleIterator for BufferedIter {
    fn next(&mut self) -> Result<bool, ExecError> {
        loop {
            let mut core = self.core.lock().expect("buffered iterator state poisoned");
            if self.pos < core.buffer.len() {
                self.current = Some(core.buffer[self.pos].clone());
                self.pos += 1;
                return Ok(true);
            }
            if !Self::pull_one(&mut core)? {
                return Ok(false);
            }
        }
    }

    fn tuple(&self) -> &Tuple {
        self.current
            .as_ref()
            .expect("tuple() called before next() returned true")
    }
}
