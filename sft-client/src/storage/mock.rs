//! Mock block storage for testing.
//!
//! Stages blocks per blob path, assembles them on commit in block-list
//! order, and serves committed blobs back on GET. Every PUT is recorded
//! so tests can inspect URLs, headers and bodies.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BlobStorage, PutRequest, StorageResponse, STATUS_CREATED};
use crate::error::TransferError;

/// Bytes per chunk of a mock GET body.
const MOCK_CHUNK: usize = 1024;

/// A PUT as the mock received it.
#[derive(Debug, Clone)]
pub struct RecordedPut {
    /// Full request URL.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(&'static str, String)>,
    /// Request body.
    pub body: Bytes,
}

impl RecordedPut {
    /// Value of the header `name`, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether this PUT committed a block list.
    pub fn is_commit(&self) -> bool {
        self.url.ends_with("&comp=blockList")
    }
}

/// Mock block storage for testing.
#[derive(Debug, Default)]
pub struct MockStorage {
    inner: Arc<Mutex<MockStorageInner>>,
}

#[derive(Debug, Default)]
struct MockStorageInner {
    puts: Vec<RecordedPut>,
    gets: Vec<String>,
    staged: HashMap<String, HashMap<String, Bytes>>,
    committed: HashMap<String, Bytes>,
    fail_put: Option<(usize, u16)>,
    fail_next_put_transport: Option<String>,
    get_status: Option<u16>,
    omit_content_length: bool,
}

impl MockStorage {
    /// Create empty mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the `n`th PUT from now (zero-based) with `status`.
    pub fn fail_put(&self, n: usize, status: u16) {
        let mut inner = self.inner.lock().unwrap();
        let offset = inner.puts.len();
        inner.fail_put = Some((offset + n, status));
    }

    /// Cause the next PUT to fail before any response.
    pub fn fail_next_put_transport(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_put_transport = Some(error.to_string());
    }

    /// Answer every GET with `status` and an empty body.
    pub fn set_get_status(&self, status: u16) {
        self.inner.lock().unwrap().get_status = Some(status);
    }

    /// Leave `content_length` unset on GET responses.
    pub fn omit_content_length(&self) {
        self.inner.lock().unwrap().omit_content_length = true;
    }

    /// Store a committed blob at `url` (query ignored).
    pub fn insert_blob(&self, url: &str, data: impl Into<Bytes>) {
        let mut inner = self.inner.lock().unwrap();
        inner.committed.insert(blob_path(url).to_string(), data.into());
    }

    /// Committed content at `url` (query ignored).
    pub fn committed(&self, url: &str) -> Option<Bytes> {
        let inner = self.inner.lock().unwrap();
        inner.committed.get(blob_path(url)).cloned()
    }

    /// Every PUT received, in order.
    pub fn puts(&self) -> Vec<RecordedPut> {
        self.inner.lock().unwrap().puts.clone()
    }

    /// Every GET URL received, in order.
    pub fn gets(&self) -> Vec<String> {
        self.inner.lock().unwrap().gets.clone()
    }
}

impl Clone for MockStorage {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn blob_path(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn latest_ids(xml: &str) -> Vec<String> {
    xml.split("<Latest>")
        .skip(1)
        .filter_map(|part| part.split_once("</Latest>"))
        .map(|(id, _)| id.to_string())
        .collect()
}

#[async_trait]
impl BlobStorage for MockStorage {
    async fn put(&self, request: PutRequest) -> Result<u16, TransferError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(error) = inner.fail_next_put_transport.take() {
            return Err(TransferError::Http {
                operation: "put",
                source: error.into(),
            });
        }

        let seq = inner.puts.len();
        inner.puts.push(RecordedPut {
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        if let Some((n, status)) = inner.fail_put {
            if n == seq {
                inner.fail_put = None;
                return Ok(status);
            }
        }

        let path = blob_path(&request.url).to_string();
        match query_param(&request.url, "comp") {
            Some("block") => {
                let Some(block_id) = query_param(&request.url, "blockid") else {
                    return Ok(400);
                };
                inner
                    .staged
                    .entry(path)
                    .or_default()
                    .insert(block_id.to_string(), request.body);
            }
            Some("blockList") => {
                let xml = String::from_utf8_lossy(&request.body);
                let staged = inner.staged.remove(&path).unwrap_or_default();
                let mut assembled = Vec::new();
                for id in latest_ids(&xml) {
                    match staged.get(&id) {
                        Some(block) => assembled.extend_from_slice(block),
                        None => return Ok(400),
                    }
                }
                inner.committed.insert(path, Bytes::from(assembled));
            }
            _ => {
                inner.committed.insert(path, request.body);
            }
        }
        Ok(STATUS_CREATED)
    }

    async fn get(&self, url: &str) -> Result<StorageResponse, TransferError> {
        let mut inner = self.inner.lock().unwrap();
        inner.gets.push(url.to_string());

        let (status, data) = match (inner.get_status, inner.committed.get(blob_path(url))) {
            (Some(status), _) => (status, Bytes::new()),
            (None, Some(data)) => (200, data.clone()),
            (None, None) => (404, Bytes::new()),
        };
        let content_length = if inner.omit_content_length {
            None
        } else {
            Some(data.len() as u64)
        };

        let chunks: Vec<Result<Bytes, TransferError>> = (0..data.len())
            .step_by(MOCK_CHUNK)
            .map(|start| Ok(data.slice(start..(start + MOCK_CHUNK).min(data.len()))))
            .collect();

        Ok(StorageResponse {
            status,
            content_length,
            body: stream::iter(chunks).boxed(),
        })
    }
}
