//! Error types and the error sink.
//!
//! Fatal errors (`StressError`) end the run. Per-batch write failures
//! (`BatchWriteError`) travel over the error channel to a single draining
//! task that logs and counts them.

use crate::writer::WriteError;
use rusts_core::CoreError;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

#[derive(Error, Debug)]
pub enum StressError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to create writer: {0}")]
    Writer(#[from] WriteError),

    #[error("Failed to build point: {0}")]
    Point(#[from] CoreError),

    #[error("Batch channel closed before all batches were sent")]
    ChannelClosed,

    #[error("Run cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}

pub type Result<T> = std::result::Result<T, StressError>;

/// A write failure for one batch, wrapped with the batch it belonged to.
#[derive(Error, Debug)]
#[error("failed to write batch {sequence} ({points} points): {source}")]
pub struct BatchWriteError {
    pub sequence: u64,
    pub points: usize,
    #[source]
    pub source: WriteError,
}

/// Drains the error channel for the duration of a run.
pub struct ErrorSink {
    handle: JoinHandle<u64>,
}

impl ErrorSink {
    /// Spawns the draining task. It exits once every sender is dropped.
    pub fn spawn(mut receiver: mpsc::Receiver<BatchWriteError>) -> Self {
        let handle = tokio::spawn(async move {
            let mut reported = 0u64;
            while let Some(err) = receiver.recv().await {
                reported += 1;
                error!(
                    sequence = err.sequence,
                    points = err.points,
                    error = %err,
                    "failed to write batch"
                );
            }
            reported
        });

        Self { handle }
    }

    /// Waits for the channel to close and returns how many failures were reported.
    ///
    /// Callers must drop their senders first or this never returns.
    pub async fn finish(self) -> Result<u64> {
        self.handle
            .await
            .map_err(|e| StressError::WorkerPanicked(format!("error sink: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_failure(sequence: u64) -> BatchWriteError {
        BatchWriteError {
            sequence,
            points: 3,
            source: WriteError::Server {
                status: 500,
                body: "boom".to_string(),
            },
        }
    }

    #[test]
    fn test_batch_write_error_display() {
        assert_eq!(
            write_failure(7).to_string(),
            "failed to write batch 7 (3 points): Server returned error: 500 - boom"
        );
    }

    #[tokio::test]
    async fn test_sink_counts_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        let sink = ErrorSink::spawn(rx);

        for i in 0..10 {
            tx.send(write_failure(i)).await.unwrap();
        }
        drop(tx);

        assert_eq!(sink.finish().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_sink_with_no_errors() {
        let (tx, rx) = mpsc::channel::<BatchWriteError>(1);
        let sink = ErrorSink::spawn(rx);
        drop(tx);

        assert_eq!(sink.finish().await.unwrap(), 0);
    }
}
