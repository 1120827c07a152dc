//! Configuration for a stress run.

use crate::errors::StressError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fully resolved configuration for a stress run.
///
/// Built once by the CLI (or a test) and shared read-only behind an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Target database name (required)
    pub database: String,

    pub host: String,

    pub port: u16,

    /// Basic auth user; no auth header is sent when absent
    pub user: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Number of concurrent write workers
    pub concurrency: usize,

    /// Number of batches to send
    pub batches: u64,

    /// Points per batch
    pub points: usize,

    /// Capacity of the batch channel (max batches generated but not yet picked up)
    pub queue_depth: usize,

    /// Capacity of the error channel
    pub error_buffer: usize,

    /// HTTP request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            host: "localhost".to_string(),
            port: 8086,
            user: None,
            password: None,
            concurrency: 4,
            batches: 100,
            points: 20,
            queue_depth: 1000,
            error_buffer: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

impl StressConfig {
    /// Loads a YAML config file. Missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, StressError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StressError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            StressError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Base URL of the target server, e.g. `http://localhost:8086`.
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Normalizes optional credentials and checks the invariants the
    /// pipeline relies on.
    pub fn validate(mut self) -> Result<Self, StressError> {
        self.user = self.user.filter(|u| !u.is_empty());
        self.password = self.password.filter(|p| !p.is_empty());

        if self.database.trim().is_empty() {
            return Err(StressError::Config("database must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(StressError::Config("host must not be empty".to_string()));
        }
        if self.concurrency == 0 {
            return Err(StressError::Config("concurrency must be at least 1".to_string()));
        }
        if self.queue_depth == 0 {
            return Err(StressError::Config("queue depth must be at least 1".to_string()));
        }
        if self.error_buffer == 0 {
            return Err(StressError::Config("error buffer must be at least 1".to_string()));
        }
        Ok(self)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
