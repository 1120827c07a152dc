//! Write collaborator: sends batches to an InfluxDB-compatible `/write` endpoint.

use crate::batch::Batch;
use crate::config::StressConfig;
use async_trait::async_trait;
use rusts_core::encode_points;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Invalid server address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned error: {status} - {body}")]
    Server { status: u16, body: String },
}

/// Anything that can durably write a batch.
///
/// Workers share one instance, so implementations must be safe to call
/// concurrently.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn write(&self, batch: &Batch) -> Result<(), WriteError>;
}

/// Writer that posts line protocol over HTTP.
#[derive(Clone)]
pub struct HttpBatchWriter {
    client: reqwest::Client,
    write_url: reqwest::Url,
    user: Option<String>,
    password: Option<String>,
}

impl HttpBatchWriter {
    pub fn new(config: &StressConfig) -> Result<Self, WriteError> {
        let address = format!("{}/write", config.server_url());
        let write_url = reqwest::Url::parse(&address).map_err(|e| WriteError::InvalidAddress {
            address: address.clone(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            write_url,
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    pub fn write_url(&self) -> &reqwest::Url {
        &self.write_url
    }
}

#[async_trait]
impl BatchWriter for HttpBatchWriter {
    async fn write(&self, batch: &Batch) -> Result<(), WriteError> {
        if batch.is_empty() {
            return Ok(());
        }

        let body = encode_points(&batch.points);

        let mut request = self
            .client
            .post(self.write_url.clone())
            .query(&[("db", batch.database.as_str()), ("precision", "ns")])
            .header("Content-Type", "text/plain")
            .body(body);

        if let Some(user) = &self.user {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let response = request.send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(WriteError::Server { status, body })
        }
    }
}
