//! Run orchestration: producer, worker pool and error sink wired together.

use crate::batch::BatchFactory;
use crate::config::StressConfig;
use crate::errors::{ErrorSink, Result, StressError};
use crate::producer::Producer;
use crate::worker::WorkerPool;
use crate::writer::{BatchWriter, HttpBatchWriter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub batches_produced: u64,
    /// Batches picked up by a worker
    pub batches_consumed: u64,
    pub batches_written: u64,
    pub batches_failed: u64,
    pub points_written: u64,
    /// Failures drained from the error channel
    pub errors_reported: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn points_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.points_written as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        info!(
            batches = self.batches_produced,
            written = self.batches_written,
            failed = self.batches_failed,
            points = self.points_written,
            errors = self.errors_reported,
            elapsed_ms = self.elapsed.as_millis() as u64,
            points_per_sec = self.points_per_second().round(),
            "stress run complete"
        );
    }
}

/// Drives one stress run against a writer.
pub struct Stresser {
    config: Arc<StressConfig>,
    writer: Arc<dyn BatchWriter>,
}

impl Stresser {
    /// Validates `config` and connects an HTTP writer to the configured server.
    pub fn new(config: StressConfig) -> Result<Self> {
        let config = config.validate()?;
        let writer = HttpBatchWriter::new(&config)?;
        info!(url = %writer.write_url(), database = %config.database, "created write client");
        Self::with_writer(config, Arc::new(writer))
    }

    /// Validates `config` and uses the given writer instead of connecting over HTTP.
    pub fn with_writer(config: StressConfig, writer: Arc<dyn BatchWriter>) -> Result<Self> {
        Ok(Self {
            config: Arc::new(config.validate()?),
            writer,
        })
    }

    /// Runs to completion.
    ///
    /// Per-batch write failures are logged and counted but never fail the run.
    /// A producer failure or cancellation is returned once every task has exited.
    /// Cancellation that arrives after every batch was handled does not fail the run.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary> {
        let cfg = &self.config;
        let start = Instant::now();

        let (batch_tx, batch_rx) = mpsc::channel(cfg.queue_depth);
        let (error_tx, error_rx) = mpsc::channel(cfg.error_buffer);

        // The sink must exist before any worker can fail.
        let sink = ErrorSink::spawn(error_rx);
        let pool = WorkerPool::spawn(
            cfg.concurrency,
            batch_rx,
            Arc::clone(&self.writer),
            &error_tx,
            cancel,
        );
        info!(
            workers = pool.len(),
            batches = cfg.batches,
            points = cfg.points,
            "started workers"
        );

        let producer = Producer::new(BatchFactory::new(cfg.database.clone()));
        let produced = producer.run(cfg.batches, cfg.points, batch_tx, cancel).await;
        match &produced {
            Ok(count) => info!(batches = count, "finished batch list"),
            Err(e) => error!("Producer stopped: {}", e),
        }

        let workers = pool.join().await;

        // Last sender; dropping it lets the sink finish.
        drop(error_tx);
        let errors_reported = sink.finish().await?;

        let batches_produced = produced?;
        let stats = workers?;

        // A batch picked up but neither written nor failed, or a failure that
        // never reached the sink, means a worker was cut short.
        let interrupted = stats.written + stats.failed < batches_produced
            || errors_reported < stats.failed;
        if cancel.is_cancelled() && interrupted {
            return Err(StressError::Cancelled);
        }

        Ok(RunSummary {
            batches_produced,
            batches_consumed: stats.batches,
            batches_written: stats.written,
            batches_failed: stats.failed,
            points_written: stats.points,
            errors_reported,
            elapsed: start.elapsed(),
        })
    }
}
