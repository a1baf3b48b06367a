//! Mock API for testing.
//!
//! Keeps containers and blobs in memory and walks blobs through the same
//! created / uploading / ready lifecycle the service does. Grants point at
//! a configurable storage base URL so that [`MockStorage`] can serve them.
//!
//! [`MockStorage`]: crate::storage::MockStorage

use async_trait::async_trait;
use sft_types::{
    BlobId, BlobInfo, BlobState, CheckOutGrant, ContainerId, ContainerInfo, ContainerKeyMaterial,
    ContainerType, ContextSetting, ReadGrant, SftContainerConfig,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::endpoints::*;
use super::VaultApi;
use crate::error::ApiError;

/// Storage base URL used when none is configured.
pub const DEFAULT_STORAGE_BASE: &str = "https://storage.mock.invalid/";

/// Mock API for testing.
///
/// Records every call and lets tests force the next call to an endpoint
/// to fail.
#[derive(Debug)]
pub struct MockApi {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug)]
struct MockApiInner {
    alive: bool,
    storage_base: String,
    next_id: i64,
    containers: Vec<MockContainer>,
    blobs: Vec<MockBlob>,
    settings: HashMap<(String, ContextSetting), String>,
    calls: Vec<&'static str>,
    fail_next: HashMap<&'static str, MockFailure>,
    refuse_next_check_in: bool,
}

#[derive(Debug)]
struct MockContainer {
    id: ContainerId,
    context: String,
    name: String,
    friendly_id: String,
    key: Option<ContainerKeyMaterial>,
}

#[derive(Debug, Clone)]
struct MockBlob {
    container_id: ContainerId,
    id: BlobId,
    name: String,
    state: BlobState,
    size: u64,
    check_in_token: Option<String>,
}

#[derive(Debug, Clone)]
enum MockFailure {
    Status(u16),
    Transport(String),
}

impl Default for MockApiInner {
    fn default() -> Self {
        Self {
            alive: true,
            storage_base: DEFAULT_STORAGE_BASE.to_string(),
            next_id: 1000,
            containers: Vec::new(),
            blobs: Vec::new(),
            settings: HashMap::new(),
            calls: Vec::new(),
            fail_next: HashMap::new(),
            refuse_next_check_in: false,
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Create a new, reachable mock API with no containers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockApiInner::default())),
        }
    }

    /// Issue grants under `base` (must end in `/`).
    pub fn with_storage_base(self, base: &str) -> Self {
        self.inner.lock().unwrap().storage_base = base.to_string();
        self
    }

    /// Make the liveness probe succeed or fail.
    pub fn set_alive(&self, alive: bool) {
        self.inner.lock().unwrap().alive = alive;
    }

    /// Register a container the entity is a member of.
    pub fn add_container(
        &self,
        container_id: ContainerId,
        context: &str,
        name: &str,
        key: ContainerKeyMaterial,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.containers.push(MockContainer {
            id: container_id,
            context: context.to_string(),
            name: name.to_string(),
            friendly_id: format!("SFT-{}", container_id),
            key: Some(key),
        });
    }

    /// Set a context-level setting.
    pub fn set_context_setting(&self, context: &str, setting: ContextSetting, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .settings
            .insert((context.to_string(), setting), value.to_string());
    }

    /// Cause the next call to `endpoint` to answer with `status`.
    pub fn fail_next(&self, endpoint: &'static str, status: u16) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next.insert(endpoint, MockFailure::Status(status));
    }

    /// Cause the next call to `endpoint` to fail before any response.
    pub fn fail_next_transport(&self, endpoint: &'static str, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .fail_next
            .insert(endpoint, MockFailure::Transport(error.to_string()));
    }

    /// Cause the next check-in to answer `false`.
    pub fn refuse_next_check_in(&self) {
        self.inner.lock().unwrap().refuse_next_check_in = true;
    }

    /// Every endpoint called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// How many times `endpoint` was called.
    pub fn call_count(&self, endpoint: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.iter().filter(|c| **c == endpoint).count()
    }

    /// State and recorded size of a blob, if it exists.
    pub fn blob_status(&self, blob_id: &BlobId) -> Option<(BlobState, u64)> {
        let inner = self.inner.lock().unwrap();
        inner
            .blobs
            .iter()
            .find(|b| &b.id == blob_id)
            .map(|b| (b.state, b.size))
    }

    /// Name a blob was created with.
    pub fn blob_name(&self, blob_id: &BlobId) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .blobs
            .iter()
            .find(|b| &b.id == blob_id)
            .map(|b| b.name.clone())
    }

    /// Clear all state and make the API reachable again.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        let storage_base = std::mem::take(&mut inner.storage_base);
        *inner = MockApiInner {
            storage_base,
            ..MockApiInner::default()
        };
    }
}

impl Clone for MockApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn rejected(endpoint: &'static str, status: u16, body: &str) -> ApiError {
    ApiError::Status {
        endpoint,
        status,
        body: body.to_string(),
    }
}

impl MockApiInner {
    /// Log the call and apply any forced failure.
    fn enter(&mut self, endpoint: &'static str) -> Result<(), ApiError> {
        self.calls.push(endpoint);
        match self.fail_next.remove(endpoint) {
            None => Ok(()),
            Some(MockFailure::Status(status)) => Err(rejected(endpoint, status, "forced failure")),
            Some(MockFailure::Transport(error)) => Err(ApiError::Transport {
                endpoint,
                source: error.into(),
            }),
        }
    }

    fn container(
        &self,
        endpoint: &'static str,
        id: ContainerId,
    ) -> Result<&MockContainer, ApiError> {
        self.containers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| rejected(endpoint, 404, "unknown container"))
    }

    fn blob_mut(
        &mut self,
        endpoint: &'static str,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<&mut MockBlob, ApiError> {
        self.blobs
            .iter_mut()
            .find(|b| b.container_id == container_id && &b.id == blob_id)
            .ok_or_else(|| rejected(endpoint, 404, "unknown blob"))
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn storage_container(&self, container_id: ContainerId) -> String {
        format!("container-{}", container_id)
    }

    fn signature(&self, container_id: ContainerId, blob_id: &BlobId) -> String {
        format!(
            "{}{}/{}?sv=2012-02-12&sr=b&sig=mock",
            self.storage_base,
            self.storage_container(container_id),
            blob_id
        )
    }
}

#[async_trait]
impl VaultApi for MockApi {
    async fn ping(&self) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(PING)?;
        Ok(inner.alive)
    }

    async fn container_key_data(
        &self,
        container_id: ContainerId,
    ) -> Result<ContainerKeyMaterial, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CONTAINER_KEY_DATA)?;
        inner
            .container(CONTAINER_KEY_DATA, container_id)?
            .key
            .clone()
            .ok_or_else(|| rejected(CONTAINER_KEY_DATA, 403, "no key for entity"))
    }

    async fn create_blob(
        &self,
        container_id: ContainerId,
        blob_name: &str,
    ) -> Result<BlobId, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CREATE_BLOB)?;
        inner.container(CREATE_BLOB, container_id)?;
        let id = BlobId::new(&format!("blob-{}", inner.allocate_id()));
        inner.blobs.push(MockBlob {
            container_id,
            id: id.clone(),
            name: blob_name.to_string(),
            state: BlobState::Created,
            size: 0,
            check_in_token: None,
        });
        Ok(id)
    }

    async fn check_out_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<CheckOutGrant, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CHECK_OUT_BLOB)?;
        let serial = inner.allocate_id();
        let storage_container = inner.storage_container(container_id);
        let signature = inner.signature(container_id, blob_id);
        let storage_uri = inner.storage_base.clone();
        let token = format!("token-{}", serial);

        let blob = inner.blob_mut(CHECK_OUT_BLOB, container_id, blob_id)?;
        if blob.state == BlobState::Uploading {
            return Err(rejected(CHECK_OUT_BLOB, 409, "blob already checked out"));
        }
        blob.state = BlobState::Uploading;
        blob.check_in_token = Some(token.clone());

        Ok(CheckOutGrant {
            check_in_token: token,
            storage_container_name: storage_container,
            storage_type: "1".to_string(),
            shared_access_uri: signature.clone(),
            shared_access_signature: signature,
            storage_uri,
        })
    }

    async fn check_in_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
        blob_size_bytes: u64,
        check_in_token: &str,
    ) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CHECK_IN_BLOB)?;
        if std::mem::take(&mut inner.refuse_next_check_in) {
            return Ok(false);
        }
        let blob = inner.blob_mut(CHECK_IN_BLOB, container_id, blob_id)?;
        if blob.state != BlobState::Uploading
            || blob.check_in_token.as_deref() != Some(check_in_token)
        {
            return Ok(false);
        }
        blob.state = BlobState::Ready;
        blob.size = blob_size_bytes;
        blob.check_in_token = None;
        Ok(true)
    }

    async fn read_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<ReadGrant, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(READ_BLOB)?;
        let storage_container = inner.storage_container(container_id);
        let signature = inner.signature(container_id, blob_id);
        let storage_uri = inner.storage_base.clone();

        let blob = inner.blob_mut(READ_BLOB, container_id, blob_id)?;
        if blob.state != BlobState::Ready {
            return Err(rejected(READ_BLOB, 409, "blob not ready"));
        }

        Ok(ReadGrant {
            storage_container_name: storage_container,
            storage_type: "1".to_string(),
            shared_access_uri: signature.clone(),
            shared_access_signature: signature,
            storage_uri,
        })
    }

    async fn blobs_by_state(
        &self,
        container_id: ContainerId,
        state: BlobState,
    ) -> Result<Vec<BlobInfo>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(BLOBS_BY_STATE)?;
        inner.container(BLOBS_BY_STATE, container_id)?;
        Ok(inner
            .blobs
            .iter()
            .filter(|b| b.container_id == container_id && b.state == state)
            .map(|b| BlobInfo {
                blob_id: b.id.clone(),
                blob_name: b.name.clone(),
            })
            .collect())
    }

    async fn create_sft_container(
        &self,
        context: &str,
        name: &str,
        description: &str,
    ) -> Result<SftContainerConfig, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CREATE_SFT_CONTAINER)?;
        let id = ContainerId::new(inner.allocate_id());
        let friendly_id = format!("SFT-{}", id);
        inner.containers.push(MockContainer {
            id,
            context: context.to_string(),
            name: name.to_string(),
            friendly_id: friendly_id.clone(),
            key: None,
        });
        Ok(SftContainerConfig {
            container_id: id,
            description: description.to_string(),
            friendly_id,
            name: name.to_string(),
        })
    }

    async fn containers_by_context(
        &self,
        context: &str,
        _container_type: ContainerType,
    ) -> Result<Vec<ContainerInfo>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CONTAINERS_BY_CONTEXT)?;
        Ok(inner
            .containers
            .iter()
            .filter(|c| c.context == context)
            .map(|c| ContainerInfo {
                container_id: c.id,
                container_name: c.name.clone(),
            })
            .collect())
    }

    async fn container_id_from_friendly_id(
        &self,
        friendly_id: &str,
    ) -> Result<ContainerId, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CONTAINER_ID_FROM_FRIENDLY_ID)?;
        inner
            .containers
            .iter()
            .find(|c| c.friendly_id == friendly_id)
            .map(|c| c.id)
            .ok_or_else(|| rejected(CONTAINER_ID_FROM_FRIENDLY_ID, 404, "unknown friendly ID"))
    }

    async fn container_ids_from_name(&self, name: &str) -> Result<Vec<ContainerId>, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CONTAINER_IDS_FROM_NAME)?;
        Ok(inner
            .containers
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.id)
            .collect())
    }

    async fn context_setting(
        &self,
        context: &str,
        setting: ContextSetting,
    ) -> Result<String, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(CONTEXT_SETTING)?;
        inner
            .settings
            .get(&(context.to_string(), setting))
            .cloned()
            .ok_or_else(|| rejected(CONTEXT_SETTING, 404, "setting not found"))
    }

    async fn remove_container(&self, container_id: ContainerId) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(REMOVE_CONTAINER)?;
        let before = inner.containers.len();
        inner.containers.retain(|c| c.id != container_id);
        if inner.containers.len() == before {
            return Ok(false);
        }
        inner.blobs.retain(|b| b.container_id != container_id);
        Ok(true)
    }

    async fn remove_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.enter(REMOVE_BLOB)?;
        let before = inner.blobs.len();
        inner
            .blobs
            .retain(|b| !(b.container_id == container_id && &b.id == blob_id));
        Ok(inner.blobs.len() != before)
    }
}
