//! VaultClient - the main interface for sealbox.
//!
//! This module provides [`VaultClient`], the primary API for applications
//! to move files in and out of secure-file-transfer containers.
//!
//! # Architecture
//!
//! VaultClient uses pure state machines (from sft-core) for pipeline
//! ordering and interprets their actions to perform the actual I/O through
//! the [`VaultApi`] and [`BlobStorage`] traits.
//!
//! ```text
//! Application → VaultClient → VaultApi    → REST API
//!                   ↓       → BlobStorage → block storage
//!              sft-core (pure state machines)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sft_client::{ClientConfig, TransferOptions, VaultClient};
//!
//! let config = ClientConfig::new("https://api.example.com", "me@example.com", "secret")?;
//! let client = VaultClient::from_config(&config)?;
//!
//! let handle = client
//!     .upload_file(ContainerId::new(7), Path::new("report.pdf"), "report.pdf", &TransferOptions::default())
//!     .await?;
//! client
//!     .download_blob(handle.container_id, &handle.blob_id, Path::new("copy.pdf"), &TransferOptions::default())
//!     .await?;
//! ```

use sft_content::{decrypt_file, encrypt_file, CipherKey};
use sft_core::{
    AbortReason, DownloadAction, DownloadEvent, DownloadState, UploadAction, UploadEvent,
    UploadState,
};
use sft_types::{
    BlobHandle, BlobId, BlobInfo, BlobState, CheckOutGrant, ContainerId, ContainerInfo,
    ContainerKeyMaterial, ContainerType, ContextSetting, ReadGrant, SftContainerConfig,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{HttpApi, VaultApi};
use crate::config::{ClientConfig, ConfigError, TransferSettings};
use crate::engine::TransferEngine;
use crate::error::ClientError;
use crate::progress::ProgressObserver;
use crate::storage::{BlobStorage, HttpStorage};

/// Suffix of the ciphertext written next to an upload source.
pub const SEALED_SUFFIX: &str = ".sealed";

/// Suffix of the ciphertext written next to a download destination.
pub const ENCRYPTED_SUFFIX: &str = ".encrypted";

/// Per-call options for whole-file transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Overall time limit for the whole pipeline.
    pub deadline: Option<Duration>,
}

impl TransferOptions {
    /// Options with an overall time limit.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }
}

/// Outcome of one pipeline step.
enum Step<E, T> {
    /// Feed this event to the state machine.
    Next(E),
    /// Pipeline finished with this value.
    Done(T),
}

/// Working data of one upload.
struct UploadJob<'a> {
    container_id: ContainerId,
    source: &'a Path,
    sealed: PathBuf,
    blob_name: &'a str,
    plaintext_len: u64,
    key: Option<CipherKey>,
    grant: Option<CheckOutGrant>,
}

/// Working data of one download.
struct DownloadJob<'a> {
    container_id: ContainerId,
    blob_id: &'a BlobId,
    dest: &'a Path,
    encrypted: PathBuf,
    key: Option<CipherKey>,
    grant: Option<ReadGrant>,
    plaintext_len: u64,
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn abort_error(reason: AbortReason, context: &str) -> ClientError {
    match reason {
        AbortReason::ServiceUnavailable => {
            ClientError::ServiceUnavailable(format!("{}: liveness probe failed", context))
        }
        AbortReason::BlocksRejected => {
            ClientError::transport(format!("{}: block storage rejected the upload", context))
        }
        AbortReason::CheckInRejected => {
            ClientError::remote(format!("{}: server refused the check-in", context))
        }
    }
}

async fn with_deadline<T, F>(options: &TransferOptions, fut: F) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
{
    match options.deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?limit, "Transfer deadline exceeded");
                Err(ClientError::transport(format!(
                    "deadline exceeded after {:?}",
                    limit
                )))
            }
        },
    }
}

/// The main sealbox client.
///
/// Holds no per-transfer state, so one client can run independent
/// transfers concurrently.
pub struct VaultClient<A: VaultApi, S: BlobStorage> {
    api: A,
    engine: TransferEngine<S>,
}

impl<A: VaultApi + std::fmt::Debug, S: BlobStorage> std::fmt::Debug for VaultClient<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("api", &self.api)
            .field("engine", &self.engine)
            .finish()
    }
}

impl VaultClient<HttpApi, HttpStorage> {
    /// Create an HTTP client from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.transfer.validate()?;
        let api = HttpApi::new(config)?;
        let storage = HttpStorage::new(config)?;
        Ok(Self::new(api, storage).with_settings(config.transfer))
    }
}

impl<A: VaultApi, S: BlobStorage> VaultClient<A, S> {
    /// Create a client over the given API and storage channel.
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            engine: TransferEngine::new(storage, TransferSettings::default()),
        }
    }

    /// Set the block-storage tuning.
    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.engine = self.engine.with_settings(settings);
        self
    }

    /// Report transfer progress to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.engine = self.engine.with_observer(observer);
        self
    }

    /// The REST API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The block-storage channel.
    pub fn storage(&self) -> &S {
        self.engine.storage()
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<bool, ClientError> {
        self.api
            .ping()
            .await
            .map_err(|e| ClientError::api("checking service liveness", e))
    }

    /// Fetch the key material of a container. Never cached.
    pub async fn fetch_key_material(
        &self,
        container_id: ContainerId,
    ) -> Result<ContainerKeyMaterial, ClientError> {
        self.api
            .container_key_data(container_id)
            .await
            .map_err(|e| {
                ClientError::api(
                    format!("fetching key material for container {}", container_id),
                    e,
                )
            })
    }

    async fn fetch_cipher_key(&self, container_id: ContainerId) -> Result<CipherKey, ClientError> {
        let material = self.fetch_key_material(container_id).await?;
        CipherKey::from_material(&material).map_err(|e| {
            ClientError::cipher(format!("key material for container {}", container_id), e)
        })
    }

    // ===========================================
    // Upload
    // ===========================================

    /// Encrypt `source` and upload it to `container_id` as `blob_name`.
    ///
    /// The ciphertext is written to `<source>.sealed` and removed once the
    /// blob is checked in. On failure it is left in place, and the remote
    /// blob stays in whatever state it reached.
    pub async fn upload_file(
        &self,
        container_id: ContainerId,
        source: &Path,
        blob_name: &str,
        options: &TransferOptions,
    ) -> Result<BlobHandle, ClientError> {
        let metadata = tokio::fs::metadata(source).await.map_err(|e| {
            ClientError::Input(format!("file not found: {}: {}", source.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::Input(format!(
                "not a regular file: {}",
                source.display()
            )));
        }

        let job = UploadJob {
            container_id,
            source,
            sealed: sibling(source, SEALED_SUFFIX),
            blob_name,
            plaintext_len: metadata.len(),
            key: None,
            grant: None,
        };
        with_deadline(options, self.run_upload(job)).await
    }

    async fn run_upload(&self, mut job: UploadJob<'_>) -> Result<BlobHandle, ClientError> {
        let mut state = UploadState::new();
        let mut event = UploadEvent::Start;
        loop {
            let (next, actions) = state.on_event(event);
            state = next;
            let Some(action) = actions.into_iter().next() else {
                return Err(ClientError::protocol(format!(
                    "upload stalled in stage {}",
                    state.stage()
                )));
            };

            match self.upload_step(action, &mut job).await {
                Ok(Step::Next(e)) => event = e,
                Ok(Step::Done(handle)) => return Ok(handle),
                Err(err) => {
                    let (failed, _) = state.on_event(UploadEvent::StepFailed);
                    tracing::warn!(
                        stage = failed.stage(),
                        container = %job.container_id,
                        "Upload failed: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn upload_step(
        &self,
        action: UploadAction,
        job: &mut UploadJob<'_>,
    ) -> Result<Step<UploadEvent, BlobHandle>, ClientError> {
        let cid = job.container_id;
        match action {
            UploadAction::Probe => {
                let alive = match self.api.ping().await {
                    Ok(alive) => alive,
                    Err(e) => {
                        tracing::warn!("Liveness probe failed: {}", e);
                        false
                    }
                };
                if alive {
                    tracing::info!("Service is up, starting upload");
                }
                Ok(Step::Next(UploadEvent::ProbeCompleted { alive }))
            }

            UploadAction::FetchKey => {
                job.key = Some(self.fetch_cipher_key(cid).await?);
                tracing::debug!(container = %cid, "Retrieved container key material");
                Ok(Step::Next(UploadEvent::KeyFetched))
            }

            UploadAction::CreateBlob => {
                let blob_id = self
                    .api
                    .create_blob(cid, job.blob_name)
                    .await
                    .map_err(|e| {
                        ClientError::api(
                            format!("creating blob {:?} in container {}", job.blob_name, cid),
                            e,
                        )
                    })?;
                Ok(Step::Next(UploadEvent::BlobCreated { blob_id }))
            }

            UploadAction::CheckOut { blob_id } => {
                let grant = self.api.check_out_blob(cid, &blob_id).await.map_err(|e| {
                    ClientError::api(format!("checking out blob {}", blob_id), e)
                })?;
                job.grant = Some(grant);
                Ok(Step::Next(UploadEvent::CheckedOut))
            }

            UploadAction::Encrypt => {
                let key = job
                    .key
                    .as_ref()
                    .ok_or_else(|| ClientError::protocol("encrypt requested before key fetch"))?;
                tracing::info!(file = %job.source.display(), "Encrypting file");
                encrypt_file(job.source, &job.sealed, key)
                    .await
                    .map_err(|e| {
                        ClientError::cipher(format!("encrypting {}", job.source.display()), e)
                    })?;
                Ok(Step::Next(UploadEvent::Encrypted))
            }

            UploadAction::SendBlocks => {
                let grant = job
                    .grant
                    .as_ref()
                    .ok_or_else(|| ClientError::protocol("transfer requested before check-out"))?;
                tracing::info!(file = %job.sealed.display(), "Uploading encrypted file");
                let committed = self
                    .engine
                    .upload_blocks(&job.sealed, &grant.shared_access_uri)
                    .await
                    .map_err(|e| {
                        ClientError::transfer(format!("uploading {}", job.sealed.display()), e)
                    })?;
                Ok(Step::Next(UploadEvent::BlocksSent { committed }))
            }

            UploadAction::CheckIn { blob_id } => {
                let grant = job
                    .grant
                    .as_ref()
                    .ok_or_else(|| ClientError::protocol("check-in requested before check-out"))?;
                let accepted = self
                    .api
                    .check_in_blob(cid, &blob_id, job.plaintext_len, &grant.check_in_token)
                    .await
                    .map_err(|e| ClientError::api(format!("checking in blob {}", blob_id), e))?;
                Ok(Step::Next(UploadEvent::CheckedIn { accepted }))
            }

            UploadAction::RemoveCiphertext => {
                tracing::info!("Upload completed, cleaning up");
                if let Err(e) = tokio::fs::remove_file(&job.sealed).await {
                    tracing::warn!(file = %job.sealed.display(), "Could not remove ciphertext: {}", e);
                }
                Ok(Step::Next(UploadEvent::CiphertextRemoved))
            }

            UploadAction::Finish { blob_id } => Ok(Step::Done(BlobHandle {
                container_id: cid,
                blob_id,
                name: job.blob_name.to_string(),
            })),

            UploadAction::Abort(reason) => Err(abort_error(
                reason,
                &format!("uploading {}", job.source.display()),
            )),
        }
    }

    // ===========================================
    // Download
    // ===========================================

    /// Download and decrypt a blob into the new file `dest`.
    ///
    /// The ciphertext is streamed to `<dest>.encrypted` and removed once
    /// decrypted. Returns the plaintext length.
    pub async fn download_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
        dest: &Path,
        options: &TransferOptions,
    ) -> Result<u64, ClientError> {
        let exists = tokio::fs::try_exists(dest).await.map_err(|e| {
            ClientError::Input(format!("cannot inspect {}: {}", dest.display(), e))
        })?;
        if exists {
            return Err(ClientError::Input(format!(
                "destination already exists: {}",
                dest.display()
            )));
        }

        let job = DownloadJob {
            container_id,
            blob_id,
            dest,
            encrypted: sibling(dest, ENCRYPTED_SUFFIX),
            key: None,
            grant: None,
            plaintext_len: 0,
        };
        with_deadline(options, self.run_download(job)).await
    }

    async fn run_download(&self, mut job: DownloadJob<'_>) -> Result<u64, ClientError> {
        let mut state = DownloadState::new();
        let mut event = DownloadEvent::Start;
        loop {
            let (next, actions) = state.on_event(event);
            state = next;
            let Some(action) = actions.into_iter().next() else {
                return Err(ClientError::protocol(format!(
                    "download stalled in stage {}",
                    state.stage()
                )));
            };

            match self.download_step(action, &mut job).await {
                Ok(Step::Next(e)) => event = e,
                Ok(Step::Done(len)) => return Ok(len),
                Err(err) => {
                    let (failed, _) = state.on_event(DownloadEvent::StepFailed);
                    tracing::warn!(
                        stage = failed.stage(),
                        blob = %job.blob_id,
                        "Download failed: {}",
                        err
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn download_step(
        &self,
        action: DownloadAction,
        job: &mut DownloadJob<'_>,
    ) -> Result<Step<DownloadEvent, u64>, ClientError> {
        let cid = job.container_id;
        match action {
            DownloadAction::Probe => {
                let alive = match self.api.ping().await {
                    Ok(alive) => alive,
                    Err(e) => {
                        tracing::warn!("Liveness probe failed: {}", e);
                        false
                    }
                };
                if alive {
                    tracing::info!(dest = %job.dest.display(), "Service is up, starting download");
                }
                Ok(Step::Next(DownloadEvent::ProbeCompleted { alive }))
            }

            DownloadAction::FetchKey => {
                job.key = Some(self.fetch_cipher_key(cid).await?);
                tracing::debug!(container = %cid, "Retrieved container key material");
                Ok(Step::Next(DownloadEvent::KeyFetched))
            }

            DownloadAction::RequestRead => {
                let grant = self.api.read_blob(cid, job.blob_id).await.map_err(|e| {
                    ClientError::api(format!("requesting read access to blob {}", job.blob_id), e)
                })?;
                tracing::debug!(blob = %job.blob_id, "Retrieved read grant");
                job.grant = Some(grant);
                Ok(Step::Next(DownloadEvent::ReadGranted))
            }

            DownloadAction::Fetch => {
                let grant = job
                    .grant
                    .as_ref()
                    .ok_or_else(|| ClientError::protocol("fetch requested before read grant"))?;
                self.engine
                    .download_stream(&grant.shared_access_uri, &job.encrypted)
                    .await
                    .map_err(|e| {
                        ClientError::transfer(format!("downloading blob {}", job.blob_id), e)
                    })?;
                Ok(Step::Next(DownloadEvent::Transferred))
            }

            DownloadAction::Decrypt => {
                let key = job
                    .key
                    .as_ref()
                    .ok_or_else(|| ClientError::protocol("decrypt requested before key fetch"))?;
                tracing::info!("Decrypting downloaded blob");
                job.plaintext_len = decrypt_file(&job.encrypted, job.dest, key)
                    .await
                    .map_err(|e| {
                        ClientError::cipher(format!("decrypting blob {}", job.blob_id), e)
                    })?;
                Ok(Step::Next(DownloadEvent::Decrypted))
            }

            DownloadAction::RemoveCiphertext => {
                tracing::info!(file = %job.encrypted.display(), "Done, cleaning up");
                if let Err(e) = tokio::fs::remove_file(&job.encrypted).await {
                    tracing::warn!(file = %job.encrypted.display(), "Could not remove ciphertext: {}", e);
                }
                Ok(Step::Next(DownloadEvent::CiphertextRemoved))
            }

            DownloadAction::Finish => Ok(Step::Done(job.plaintext_len)),

            DownloadAction::Abort(reason) => Err(abort_error(
                reason,
                &format!("downloading blob {}", job.blob_id),
            )),
        }
    }

    // ===========================================
    // Container and blob management
    // ===========================================

    /// List the blobs of a container in `state`.
    pub async fn list_blobs(
        &self,
        container_id: ContainerId,
        state: BlobState,
    ) -> Result<Vec<BlobInfo>, ClientError> {
        self.api
            .blobs_by_state(container_id, state)
            .await
            .map_err(|e| {
                ClientError::api(
                    format!("listing {} blobs of container {}", state, container_id),
                    e,
                )
            })
    }

    /// Create a secure-file-transfer container.
    pub async fn create_container(
        &self,
        context: &str,
        name: &str,
        description: &str,
    ) -> Result<SftContainerConfig, ClientError> {
        self.api
            .create_sft_container(context, name, description)
            .await
            .map_err(|e| ClientError::api(format!("creating container {:?}", name), e))
    }

    /// List the containers of a context.
    pub async fn list_containers(
        &self,
        context: &str,
        container_type: ContainerType,
    ) -> Result<Vec<ContainerInfo>, ClientError> {
        self.api
            .containers_by_context(context, container_type)
            .await
            .map_err(|e| ClientError::api(format!("listing containers of {:?}", context), e))
    }

    /// Resolve a container's friendly ID.
    pub async fn resolve_friendly_id(&self, friendly_id: &str) -> Result<ContainerId, ClientError> {
        self.api
            .container_id_from_friendly_id(friendly_id)
            .await
            .map_err(|e| ClientError::api(format!("resolving friendly ID {:?}", friendly_id), e))
    }

    /// Resolve every container carrying `name`.
    pub async fn resolve_name(&self, name: &str) -> Result<Vec<ContainerId>, ClientError> {
        self.api
            .container_ids_from_name(name)
            .await
            .map_err(|e| ClientError::api(format!("resolving container name {:?}", name), e))
    }

    /// Read a context-level setting.
    pub async fn context_setting(
        &self,
        context: &str,
        setting: ContextSetting,
    ) -> Result<String, ClientError> {
        self.api
            .context_setting(context, setting)
            .await
            .map_err(|e| ClientError::api(format!("reading {:?} of {:?}", setting, context), e))
    }

    /// Remove a container and its blobs.
    pub async fn remove_container(&self, container_id: ContainerId) -> Result<bool, ClientError> {
        self.api
            .remove_container(container_id)
            .await
            .map_err(|e| ClientError::api(format!("removing container {}", container_id), e))
    }

    /// Remove one blob from a container.
    pub async fn remove_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<bool, ClientError> {
        self.api
            .remove_blob(container_id, blob_id)
            .await
            .map_err(|e| ClientError::api(format!("removing blob {}", blob_id), e))
    }
}
