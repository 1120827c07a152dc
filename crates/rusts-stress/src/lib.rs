//! Write-path stress generator for RusTs and other InfluxDB-compatible servers.
//!
//! A single producer generates batches of `cpu_usage` points onto a bounded
//! channel; a pool of workers writes them concurrently through a
//! [`BatchWriter`]. Write failures are forwarded to an error sink that logs
//! them without stalling the write path. Failed batches are not retried.
//!
//! # Usage
//! ```bash
//! rusts-stress --database stress --concurrency 8 --batches 1000 --points 50
//!
//! # Same, configured from the environment
//! STRESS_DATABASE=stress STRESS_HOST=tsdb.local rusts-stress
//! ```

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod producer;
pub mod worker;
pub mod writer;

pub use batch::{Batch, BatchFactory};
pub use config::StressConfig;
pub use coordinator::{RunSummary, Stresser};
pub use errors::{BatchWriteError, ErrorSink, StressError};
pub use producer::Producer;
pub use worker::{WorkerPool, WorkerStats};
pub use writer::{BatchWriter, HttpBatchWriter, WriteError};
