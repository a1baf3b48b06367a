//! Block-storage channel abstraction.
//!
//! Blob content never travels through the REST API. The API hands out a
//! pre-signed URI and the bytes go straight to block storage: one PUT per
//! block, a final PUT that commits the block list, and a GET for reads.
//!
//! [`BlobStorage`] is the HTTP primitive the transfer engine needs and
//! nothing more; request shapes are built here so both implementations
//! agree on them.

mod http;
mod mock;

pub use http::HttpStorage;
pub use mock::{MockStorage, RecordedPut};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use sft_core::TransferBlock;

use crate::error::TransferError;

/// Storage service version sent with every write.
pub const STORAGE_API_VERSION: &str = "2012-02-12";

/// Status block storage answers an accepted block or commit with.
pub const STATUS_CREATED: u16 = 201;

/// A PUT to block storage.
#[derive(Clone)]
pub struct PutRequest {
    /// Full pre-signed URL including the operation query.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
    /// Request body.
    pub body: Bytes,
}

impl std::fmt::Debug for PutRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PutRequest")
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &format!("[{} bytes]", self.body.len()))
            .finish()
    }
}

impl PutRequest {
    /// PUT for one block of a block blob.
    pub fn block(sas_uri: &str, block: TransferBlock) -> Self {
        Self {
            url: format!("{}&comp=block&blockid={}", sas_uri, block.id.encoded()),
            headers: vec![
                ("content-type", "application/octet-stream".to_string()),
                ("x-ms-blob-type", "BlockBlob".to_string()),
                ("x-ms-version", STORAGE_API_VERSION.to_string()),
            ],
            body: Bytes::from(block.payload),
        }
    }

    /// PUT that commits a block list.
    pub fn commit(sas_uri: &str, block_list_xml: String) -> Self {
        Self {
            url: format!("{}&comp=blockList", sas_uri),
            headers: vec![
                ("content-type", "text/xml".to_string()),
                ("x-ms-version", STORAGE_API_VERSION.to_string()),
            ],
            body: Bytes::from(block_list_xml),
        }
    }
}

/// An answered GET: status, declared length and a body stream.
pub struct StorageResponse {
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Length`, if any.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: BoxStream<'static, Result<Bytes, TransferError>>,
}

impl std::fmt::Debug for StorageResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// HTTP primitive over pre-signed block-storage URLs.
///
/// Implementations return any answered status as `Ok`; only a request
/// that produced no response is an error.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Send a PUT and return the response status.
    async fn put(&self, request: PutRequest) -> Result<u16, TransferError>;

    /// Send a GET and return the streaming response.
    async fn get(&self, url: &str) -> Result<StorageResponse, TransferError>;
}
