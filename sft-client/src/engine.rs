//! Chunked transfer engine.
//!
//! Moves a local file to or from a pre-signed block-storage URI.
//!
//! # Upload
//!
//! The file is read sequentially in blocks of `block_size` bytes. Each block
//! is PUT under a fixed-width identifier, with up to `upload_concurrency`
//! PUTs in flight. Once every block is accepted, a single commit PUT lists
//! the identifiers in file order, so the blob's byte order never depends on
//! completion order.
//!
//! ```text
//! file ─read─► block 0 ─PUT─┐
//!        ├───► block 1 ─PUT─┼─► all 201? ─► PUT block list ─► 201?
//!        └───► block n ─PUT─┘
//! ```
//!
//! # Download
//!
//! A single GET whose body is written to a new file in chunks of
//! `download_chunk_size` bytes.

use futures_util::stream::{self, StreamExt};
use sft_core::{block_list_xml, BlockPlan, BlockSpan, Direction, Progress, TransferBlock};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::TransferSettings;
use crate::error::TransferError;
use crate::progress::{NoProgress, ProgressObserver};
use crate::storage::{BlobStorage, PutRequest, STATUS_CREATED};

/// Status block storage answers a successful GET with.
const STATUS_OK: u16 = 200;

/// Moves files over a [`BlobStorage`] channel.
pub struct TransferEngine<S: BlobStorage> {
    storage: S,
    settings: TransferSettings,
    observer: Arc<dyn ProgressObserver>,
}

impl<S: BlobStorage> std::fmt::Debug for TransferEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S: BlobStorage> TransferEngine<S> {
    /// Create an engine with no progress observer.
    pub fn new(storage: S, settings: TransferSettings) -> Self {
        Self {
            storage,
            settings,
            observer: Arc::new(NoProgress),
        }
    }

    /// Report progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the transfer settings.
    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The storage channel.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The transfer settings.
    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Upload `file` as a block blob at `sas_uri`.
    ///
    /// Returns `Ok(false)` when storage rejects a block (nothing is
    /// committed) or rejects the commit. Errors are local I/O failures and
    /// requests that got no response.
    pub async fn upload_blocks(&self, file: &Path, sas_uri: &str) -> Result<bool, TransferError> {
        let total = tokio::fs::metadata(file)
            .await
            .map_err(|e| TransferError::io("inspecting", file, e))?
            .len();
        let plan = BlockPlan::new(total, self.settings.block_size)?;
        let reader = File::open(file)
            .await
            .map_err(|e| TransferError::io("opening", file, e))?;

        tracing::debug!(
            blocks = plan.block_count(),
            bytes = total,
            concurrency = self.settings.upload_concurrency,
            "Uploading blocks"
        );

        let spans: Vec<BlockSpan> = plan.spans().collect();
        let blocks = stream::unfold(
            (reader, spans.into_iter()),
            move |(mut reader, mut spans)| async move {
                let Some(span) = spans.next() else {
                    return None;
                };
                let mut payload = vec![0u8; span.len];
                let block = match reader.read_exact(&mut payload).await {
                    Ok(_) => Ok(TransferBlock::new(span.index, payload)),
                    Err(e) => Err(TransferError::io("reading", file, e)),
                };
                Some((block, (reader, spans)))
            },
        );

        let storage = &self.storage;
        let puts = blocks
            .map(|block| async move {
                let block = block?;
                let index = block.index;
                let len = block.payload.len() as u64;
                let status = storage.put(PutRequest::block(sas_uri, block)).await?;
                Ok::<_, TransferError>((index, len, status))
            })
            .buffer_unordered(self.settings.upload_concurrency.max(1));
        let mut puts = std::pin::pin!(puts);

        let mut progress = Progress::new(0, total);
        while let Some(result) = puts.next().await {
            let (index, len, status) = result?;
            if status != STATUS_CREATED {
                tracing::warn!(block = index, status, "Block rejected, upload aborted");
                return Ok(false);
            }
            progress.advance(len);
            self.observer.on_progress(Direction::Upload, progress);
            tracing::debug!(block = index, bytes = len, "Block accepted");
        }

        let xml = block_list_xml(&plan.block_ids());
        let status = self.storage.put(PutRequest::commit(sas_uri, xml)).await?;
        if status != STATUS_CREATED {
            tracing::warn!(status, "Block list commit rejected");
            return Ok(false);
        }

        tracing::debug!(blocks = plan.block_count(), "Block list committed");
        Ok(true)
    }

    /// Stream the blob at `sas_uri` into the new file `dest`.
    ///
    /// Returns the number of bytes written. An existing `dest` is never
    /// overwritten.
    pub async fn download_stream(&self, sas_uri: &str, dest: &Path) -> Result<u64, TransferError> {
        let exists = tokio::fs::try_exists(dest)
            .await
            .map_err(|e| TransferError::io("inspecting", dest, e))?;
        if exists {
            return Err(TransferError::DestinationExists(dest.to_path_buf()));
        }

        let response = self.storage.get(sas_uri).await?;
        if response.status != STATUS_OK {
            tracing::warn!(status = response.status, "Download rejected");
            return Err(TransferError::Status {
                operation: "download",
                status: response.status,
            });
        }

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    TransferError::DestinationExists(dest.to_path_buf())
                }
                _ => TransferError::io("creating", dest, e),
            })?;

        let mut progress = match response.content_length {
            Some(total) => Progress::new(0, total),
            None => Progress::unbounded(0),
        };
        let chunk_size = self.settings.download_chunk_size.max(1);
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for piece in chunk.chunks(chunk_size) {
                out.write_all(piece)
                    .await
                    .map_err(|e| TransferError::io("writing", dest, e))?;
                progress.advance(piece.len() as u64);
                self.observer.on_progress(Direction::Download, progress);
            }
        }
        out.flush()
            .await
            .map_err(|e| TransferError::io("flushing", dest, e))?;

        tracing::debug!(bytes = progress.done, "Download complete");
        Ok(progress.done)
    }
}
