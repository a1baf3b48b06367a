//! HTTP implementation of [`BlobStorage`].

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{BlobStorage, PutRequest, StorageResponse};
use crate::config::{ClientConfig, ConfigError, RetryPolicy};
use crate::error::TransferError;
use crate::retry::{retry_send, Replay};

/// Block storage reached over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpStorage {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpStorage {
    /// Create a storage client honouring the timeout, TLS and retry settings.
    ///
    /// The timeout bounds connecting and each gap between reads, not the
    /// whole transfer.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: config.storage_http_client()?,
            retry: config.retry,
        })
    }
}

#[async_trait]
impl BlobStorage for HttpStorage {
    async fn put(&self, request: PutRequest) -> Result<u16, TransferError> {
        let resp = retry_send(&self.retry, Replay::Idempotent, "block storage PUT", || {
            let mut builder = self.http.put(request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(*name, value.as_str());
            }
            builder.body(request.body.clone()).send()
        })
        .await
        .map_err(|e| TransferError::Http {
            operation: "put",
            source: Box::new(e),
        })?;

        let status = resp.status().as_u16();
        tracing::debug!(status, bytes = request.body.len(), "Block storage PUT");
        Ok(status)
    }

    async fn get(&self, url: &str) -> Result<StorageResponse, TransferError> {
        let resp = retry_send(&self.retry, Replay::Idempotent, "block storage GET", || {
            self.http.get(url).send()
        })
        .await
        .map_err(|e| TransferError::Http {
            operation: "download",
            source: Box::new(e),
        })?;

        let status = resp.status().as_u16();
        let content_length = resp.content_length();
        tracing::debug!(status, ?content_length, "Block storage GET");

        let body = resp
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| TransferError::Http {
                    operation: "download",
                    source: Box::new(e),
                })
            })
            .boxed();

        Ok(StorageResponse {
            status,
            content_length,
            body,
        })
    }
}
