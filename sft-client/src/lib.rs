//! # sft-client
//!
//! Client library for sealbox secure-file-transfer containers.
//!
//! This is the main library that applications use to move files in and out
//! of containers.
//!
//! ## Features
//!
//! - **Client-side encryption**: files are sealed with the container key
//!   before they leave the machine and opened only after they arrive
//! - **Block uploads**: fixed-size blocks with bounded concurrency, committed
//!   in file order
//! - **API abstraction**: pluggable REST API and block-storage channels
//!   (HTTP, mock)
//! - **Pure state machines**: uses sft-core for pipeline ordering
//!
//! ## Example
//!
//! ```ignore
//! use sft_client::{ClientConfig, TransferOptions, VaultClient};
//!
//! let config = ClientConfig::new("https://api.example.com", "me@example.com", "secret")?;
//! let client = VaultClient::from_config(&config)?;
//!
//! // Seal and upload
//! let handle = client.upload_file(container, path, "report.pdf", &TransferOptions::default()).await?;
//!
//! // Download and open
//! client.download_blob(container, &handle.blob_id, dest, &TransferOptions::default()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
mod retry;
pub mod storage;

pub use api::{endpoints, HttpApi, MockApi, VaultApi};
pub use client::{TransferOptions, VaultClient, ENCRYPTED_SUFFIX, SEALED_SUFFIX};
pub use config::{ClientConfig, ConfigError, RetryPolicy, TransferSettings, DEFAULT_TIMEOUT};
pub use engine::TransferEngine;
pub use error::{ApiError, BoxError, ClientError, ErrorKind, TransferError};
pub use progress::{NoProgress, ProgressObserver};
pub use storage::{BlobStorage, HttpStorage, MockStorage, PutRequest, StorageResponse};

// Types callers need alongside the client.
pub use sft_core::{Direction, Progress};
pub use sft_types::{
    BlobHandle, BlobId, BlobInfo, BlobState, ContainerId, ContainerInfo, ContainerType,
    ContextSetting, EntityType, SftContainerConfig,
};
