//! Write workers fanning out over the shared batch channel.

use crate::batch::Batch;
use crate::errors::{BatchWriteError, Result, StressError};
use crate::writer::BatchWriter;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// Receiving half of the batch channel, shared by every worker.
pub type SharedReceiver = Arc<Mutex<mpsc::Receiver<Batch>>>;

/// Per-worker counters, summed by [`WorkerPool::join`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Batches taken off the channel
    pub batches: u64,
    /// Batches the writer accepted
    pub written: u64,
    pub failed: u64,
    /// Points in accepted batches
    pub points: u64,
}

impl WorkerStats {
    fn merge(&mut self, other: WorkerStats) {
        self.batches += other.batches;
        self.written += other.written;
        self.failed += other.failed;
        self.points += other.points;
    }
}

/// A fixed set of worker tasks draining one batch channel.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// Spawns `concurrency` workers. Each holds its own clone of `errors`;
    /// the caller keeps the original and closes the channel after [`join`].
    ///
    /// [`join`]: WorkerPool::join
    pub fn spawn(
        concurrency: usize,
        input: mpsc::Receiver<Batch>,
        writer: Arc<dyn BatchWriter>,
        errors: &mpsc::Sender<BatchWriteError>,
        cancel: &CancellationToken,
    ) -> Self {
        let input: SharedReceiver = Arc::new(Mutex::new(input));

        let handles = (0..concurrency)
            .map(|id| {
                let span = info_span!("worker", id);
                tokio::spawn(
                    drain(
                        Arc::clone(&input),
                        Arc::clone(&writer),
                        errors.clone(),
                        cancel.clone(),
                    )
                    .instrument(span),
                )
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every worker to exit and sums their counters.
    ///
    /// All workers are awaited even if one of them panicked.
    pub async fn join(self) -> Result<WorkerStats> {
        let mut total = WorkerStats::default();
        let mut failure = None;

        for handle in self.handles {
            match handle.await {
                Ok(stats) => total.merge(stats),
                Err(e) => {
                    error!("Worker task failed: {}", e);
                    if failure.is_none() {
                        failure = Some(StressError::WorkerPanicked(e.to_string()));
                    }
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }
}

/// Worker loop: take batches until the channel is closed and drained or the
/// run is cancelled, writing each one once.
///
/// Failures go to `errors` and never stop the loop.
pub async fn drain(
    input: SharedReceiver,
    writer: Arc<dyn BatchWriter>,
    errors: mpsc::Sender<BatchWriteError>,
    cancel: CancellationToken,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    info!("writer created");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            batch = async { input.lock().await.recv().await } => batch,
        };
        let Some(batch) = next else {
            break;
        };

        stats.batches += 1;
        info!(sequence = batch.sequence, points = batch.len(), "writing batch");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = writer.write(&batch) => result,
        };

        match result {
            Ok(()) => {
                stats.written += 1;
                stats.points += batch.len() as u64;
            }
            Err(source) => {
                stats.failed += 1;
                let err = BatchWriteError {
                    sequence: batch.sequence,
                    points: batch.len(),
                    source,
                };
                // Blocks while the error channel is full.
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    sent = errors.send(err) => {
                        if let Err(mpsc::error::SendError(err)) = sent {
                            error!(error = %err, "failed to write batch");
                        }
                    }
                }
            }
        }
    }

    stats
}
