//! Single producer feeding the batch channel.

use crate::batch::{Batch, BatchFactory};
use crate::errors::{Result, StressError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct Producer {
    factory: BatchFactory,
}

impl Producer {
    pub fn new(factory: BatchFactory) -> Self {
        Self { factory }
    }

    /// Sends `batch_count` batches of `points_per_batch` points onto `output`,
    /// in sequence order, and returns how many were sent.
    ///
    /// Suspends while `output` is full. `output` is consumed, so the channel
    /// is closed on every return path and workers always see end-of-stream.
    pub async fn run(
        self,
        batch_count: u64,
        points_per_batch: usize,
        output: mpsc::Sender<Batch>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        for sequence in 0..batch_count {
            if cancel.is_cancelled() {
                return Err(StressError::Cancelled);
            }

            let batch = self.factory.create(sequence, points_per_batch)?;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StressError::Cancelled),
                sent = output.send(batch) => {
                    if sent.is_err() {
                        return Err(StressError::ChannelClosed);
                    }
                }
            }
            debug!(sequence, "queued batch");
        }

        Ok(batch_count)
    }
}
