//! REST API abstraction for sealbox.
//!
//! This module provides a pluggable API layer that abstracts the remote
//! service (HTTP, in-memory mock for testing).
//!
//! # Design
//!
//! Every operation is one authenticated call. The trait is the only seam
//! the transfer coordinator talks to, so pipelines can be tested against
//! [`MockApi`] without a network.
//!
//! # Example
//!
//! ```ignore
//! let api = HttpApi::new(&config)?;
//! if api.ping().await? {
//!     let blobs = api.blobs_by_state(ContainerId::new(7), BlobState::Ready).await?;
//! }
//! ```

mod http;
mod mock;

pub use http::HttpApi;
pub use mock::MockApi;

use async_trait::async_trait;
use sft_types::{
    BlobId, BlobInfo, BlobState, CheckOutGrant, ContainerId, ContainerInfo, ContainerKeyMaterial,
    ContainerType, ContextSetting, ReadGrant, SftContainerConfig,
};

use crate::error::ApiError;

/// REST endpoint names, relative to the versioned API root.
pub mod endpoints {
    /// `Ping`
    pub const PING: &str = "Ping";
    /// `ContainerKeyData`
    pub const CONTAINER_KEY_DATA: &str = "ContainerKeyData";
    /// `CreateEntityContainerBlob`
    pub const CREATE_BLOB: &str = "CreateEntityContainerBlob";
    /// `CheckOutEntityContainerBlob`
    pub const CHECK_OUT_BLOB: &str = "CheckOutEntityContainerBlob";
    /// `CheckInEntityContainerBlob`
    pub const CHECK_IN_BLOB: &str = "CheckInEntityContainerBlob";
    /// `ReadEntityContainerBlob`
    pub const READ_BLOB: &str = "ReadEntityContainerBlob";
    /// `GetContainerBlobInfoListByState`
    pub const BLOBS_BY_STATE: &str = "GetContainerBlobInfoListByState";
    /// `CreateEntitySFTContainer`
    pub const CREATE_SFT_CONTAINER: &str = "CreateEntitySFTContainer";
    /// `GetContainerInfoListByContext`
    pub const CONTAINERS_BY_CONTEXT: &str = "GetContainerInfoListByContext";
    /// `GetContainerIDFromFriendlyID`
    pub const CONTAINER_ID_FROM_FRIENDLY_ID: &str = "GetContainerIDFromFriendlyID";
    /// `GetContainerIDsFromName`
    pub const CONTAINER_IDS_FROM_NAME: &str = "GetContainerIDsFromName";
    /// `GetContextSetting`
    pub const CONTEXT_SETTING: &str = "GetContextSetting";
    /// `RemoveEntityContainer`
    pub const REMOVE_CONTAINER: &str = "RemoveEntityContainer";
    /// `RemoveEntityContainerBlob`
    pub const REMOVE_BLOB: &str = "RemoveEntityContainerBlob";

    /// Endpoints whose effect repeats when the request is sent twice.
    pub const STATE_CHANGING: [&str; 6] = [
        CREATE_BLOB,
        CHECK_OUT_BLOB,
        CHECK_IN_BLOB,
        CREATE_SFT_CONTAINER,
        REMOVE_CONTAINER,
        REMOVE_BLOB,
    ];

    /// Whether a second delivery of a request to `endpoint` could act again
    /// (a new blob, a spent check-in token).
    pub fn changes_state(endpoint: &str) -> bool {
        STATE_CHANGING.contains(&endpoint)
    }
}

/// Operations offered by the secure-file-container REST API.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// Liveness probe. `Ok(true)` only when the service answers OK.
    async fn ping(&self) -> Result<bool, ApiError>;

    /// Fetch the symmetric key material for a container.
    async fn container_key_data(
        &self,
        container_id: ContainerId,
    ) -> Result<ContainerKeyMaterial, ApiError>;

    /// Create a blob entry and return its server-issued ID.
    async fn create_blob(
        &self,
        container_id: ContainerId,
        blob_name: &str,
    ) -> Result<BlobId, ApiError>;

    /// Check a blob out for writing.
    async fn check_out_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<CheckOutGrant, ApiError>;

    /// Check a blob back in, recording its plaintext length.
    async fn check_in_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
        blob_size_bytes: u64,
        check_in_token: &str,
    ) -> Result<bool, ApiError>;

    /// Request read access to a blob.
    async fn read_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<ReadGrant, ApiError>;

    /// List the blobs of a container that are in `state`.
    async fn blobs_by_state(
        &self,
        container_id: ContainerId,
        state: BlobState,
    ) -> Result<Vec<BlobInfo>, ApiError>;

    /// Create a secure-file-transfer container in a context.
    async fn create_sft_container(
        &self,
        context: &str,
        name: &str,
        description: &str,
    ) -> Result<SftContainerConfig, ApiError>;

    /// List the containers of a context.
    async fn containers_by_context(
        &self,
        context: &str,
        container_type: ContainerType,
    ) -> Result<Vec<ContainerInfo>, ApiError>;

    /// Resolve a container's friendly ID.
    async fn container_id_from_friendly_id(
        &self,
        friendly_id: &str,
    ) -> Result<ContainerId, ApiError>;

    /// Resolve every container carrying `name`.
    async fn container_ids_from_name(&self, name: &str) -> Result<Vec<ContainerId>, ApiError>;

    /// Read a context-level setting.
    async fn context_setting(
        &self,
        context: &str,
        setting: ContextSetting,
    ) -> Result<String, ApiError>;

    /// Remove a container.
    async fn remove_container(&self, container_id: ContainerId) -> Result<bool, ApiError>;

    /// Remove a blob from a container.
    async fn remove_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<bool, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::endpoints::*;

    #[test]
    fn writes_change_state_reads_do_not() {
        for endpoint in [CREATE_BLOB, CHECK_IN_BLOB, CHECK_OUT_BLOB, REMOVE_BLOB] {
            assert!(changes_state(endpoint), "{endpoint}");
        }
        for endpoint in [PING, CONTAINER_KEY_DATA, READ_BLOB, BLOBS_BY_STATE, CONTEXT_SETTING] {
            assert!(!changes_state(endpoint), "{endpoint}");
        }
    }
}
