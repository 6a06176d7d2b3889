//! Order-preserving parallel fan-out over a crossbeam-channel worker pool.
//!
//! Workers communicate results back over a channel rather than through a
//! shared mutable structure; the caller reassembles the channel's
//! arbitrarily-ordered responses into a pre-sized, input-ordered output
//! vector.

use crate::context::Context;
use crate::error::ExecError;
use crossbeam_channel as channel;
use std::sync::Arc;
use std::thread;

/// Spawn `worker_count` workers (0 = hardware thread count) over `inputs`,
/// applying `op` to each. Returns outputs in input order, or the first
/// error tagged with its input index.
pub fn execute_parallel<T, R, F>(
    ctx: &Context,
    inputs: Vec<T>,
    worker_count: usize,
    op: F,
) -> Result<Vec<R>, ExecError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(&T, &Context) -> Result<R, ExecError> + Send + Sync + 'static,
{
    let total = inputs.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let worker_count = if worker_count == 0 {
        thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    } else {
        worker_count
    }
    .min(total);

    let (job_tx, job_rx) = channel::unbounded::<(usize, T)>();
    let (res_tx, res_rx) = channel::unbounded::<(usize, Result<R, ExecError>)>();

    for job in inputs.into_iter().enumerate() {
        job_tx.send(job).expect("job channel receiver outlives every send");
    }
    drop(job_tx);

    let op = Arc::new(op);
    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let job_rx = job_rx.clone();
        let res_tx = res_tx.clone();
        let op = Arc::clone(&op);
        let ctx = ctx.clone();
        handles.push(thread::spawn(move || {
            while let Ok((index, input)) = job_rx.recv() {
                if ctx.is_cancelled() {
                    let _ = res_tx.send((index, Err(ExecError::Cancelled)));
                    continue;
                }
                let result = op(&input, &ctx);
                if result.is_err() {
                    ctx.cancel();
                }
                let _ = res_tx.send((index, result));
            }
        }));
    }
    drop(res_tx);

    let mut slots: Vec<Option<Result<R, ExecError>>> = (0..total).map(|_| None).collect();
    for (index, result) in res_rx.iter() {
        slots[index] = Some(result);
    }
    for handle in handles {
        let _ = handle.join();
    }

    let mut outputs = Vec::with_capacity(total);
    for (index, slot) in slots.into_iter().enumerate() {
        match slot.expect("every scheduled job sends exactly one response") {
            Ok(value) => outputs.push(value),
            Err(source) => {
                return Err(ExecError::SubqueryError {
                    index,
                    source: Box::new(source),
                })
            }
        }
    }
    Ok(outputs)
}

/// Groups `inputs` into fixed-size batches and applies `op` to each batch,
/// flattening the per-batch output vectors back into input order.
pub fn execute_parallel_batched<T, R, F>(
    ctx: &Context,
    inputs: Vec<T>,
    batch_size: usize,
    worker_count: usize,
    op: F,
) -> Result<Vec<R>, ExecError>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(&[T], &Context) -> Result<Vec<R>, ExecError> + Send + Sync + 'static,
{
    let batch_size = batch_size.max(1);
    let mut batches: Vec<Vec<T>> = Vec::new();
    for item in inputs {
        match batches.last_mut() {
            Some(batch) if batch.len() < batch_size => batch.push(item),
            _ => batches.push(vec![item]),
        }
    }

    let results = execute_parallel(ctx, batches, worker_count, move |batch, ctx| op(batch, ctx))?;
    Ok(results.into_iter().flatten().collect())
}
