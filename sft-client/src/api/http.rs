//! HTTP implementation of [`VaultApi`].
//!
//! Every call is a form-encoded POST to `{base}/{version}/{Endpoint}` that
//! carries the entity credentials, except the liveness probe which is a
//! plain GET.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use sft_types::scalar::{parse_bool, parse_i64, parse_i64_list, unquote};
use sft_types::{
    BlobId, BlobInfo, BlobState, CheckOutGrant, ContainerId, ContainerInfo, ContainerKeyMaterial,
    ContainerType, ContextSetting, EntityType, ReadGrant, SftContainerConfig, WireError,
};
use url::Url;
use zeroize::Zeroizing;

use super::endpoints::*;
use super::VaultApi;
use crate::config::{ClientConfig, ConfigError, RetryPolicy};
use crate::error::ApiError;
use crate::retry::{retry_send, Replay};

/// REST API client over HTTP.
///
/// Holds no per-call state; one instance can serve concurrent transfers.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    root: Url,
    entity: String,
    entity_type: EntityType,
    entity_password: Zeroizing<String>,
    accept: &'static str,
    retry: RetryPolicy,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("root", &self.root.as_str())
            .field("entity", &self.entity)
            .field("entity_type", &self.entity_type)
            .field("entity_password", &"[REDACTED]")
            .finish()
    }
}

impl HttpApi {
    /// Create an API client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            http: config.http_client()?,
            root: config.api_root()?,
            entity: config.entity.clone(),
            entity_type: config.entity_type,
            entity_password: config.entity_password.clone(),
            accept: config.content_format.as_wire(),
            retry: config.retry,
        })
    }

    fn url(&self, endpoint: &'static str) -> Result<Url, ApiError> {
        self.root.join(endpoint).map_err(|e| ApiError::Transport {
            endpoint,
            source: Box::new(e),
        })
    }

    /// POST the credentials plus `fields` to `endpoint` and return the body.
    async fn post(
        &self,
        endpoint: &'static str,
        fields: &[(&'static str, String)],
    ) -> Result<String, ApiError> {
        let url = self.url(endpoint)?;
        let mut form: Vec<(&str, &str)> = vec![
            ("Entity", self.entity.as_str()),
            ("EntityType", self.entity_type.as_wire()),
            ("EntityPassword", self.entity_password.as_str()),
        ];
        form.extend(fields.iter().map(|(k, v)| (*k, v.as_str())));

        let replay = if changes_state(endpoint) {
            Replay::ConnectFailureOnly
        } else {
            Replay::Idempotent
        };
        let resp = retry_send(&self.retry, replay, endpoint, || {
            self.http
                .post(url.clone())
                .header(ACCEPT, self.accept)
                .form(&form)
                .send()
        })
        .await
        .map_err(|e| ApiError::Transport {
            endpoint,
            source: Box::new(e),
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Transport {
            endpoint,
            source: Box::new(e),
        })?;

        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "API call rejected");
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(endpoint, status = status.as_u16(), "API call succeeded");
        Ok(body)
    }
}

fn wire<T>(endpoint: &'static str, result: Result<T, WireError>) -> Result<T, ApiError> {
    result.map_err(|source| ApiError::Wire { endpoint, source })
}

fn container_field(id: ContainerId) -> (&'static str, String) {
    ("ContainerID", id.to_string())
}

fn blob_field(id: &BlobId) -> (&'static str, String) {
    ("BlobIDName", id.as_str().to_string())
}

#[async_trait]
impl VaultApi for HttpApi {
    async fn ping(&self) -> Result<bool, ApiError> {
        let url = self.url(PING)?;
        let resp = retry_send(&self.retry, Replay::Idempotent, PING, || {
            self.http.get(url.clone()).send()
        })
        .await
        .map_err(|e| ApiError::Transport {
            endpoint: PING,
            source: Box::new(e),
        })?;
        let alive = resp.status() == reqwest::StatusCode::OK;
        tracing::debug!(status = resp.status().as_u16(), alive, "Ping");
        Ok(alive)
    }

    async fn container_key_data(
        &self,
        container_id: ContainerId,
    ) -> Result<ContainerKeyMaterial, ApiError> {
        let body = Zeroizing::new(
            self.post(CONTAINER_KEY_DATA, &[container_field(container_id)])
                .await?,
        );
        wire(CONTAINER_KEY_DATA, ContainerKeyMaterial::from_json(&body))
    }

    async fn create_blob(
        &self,
        container_id: ContainerId,
        blob_name: &str,
    ) -> Result<BlobId, ApiError> {
        let body = self
            .post(
                CREATE_BLOB,
                &[
                    container_field(container_id),
                    ("BlobName", blob_name.to_string()),
                ],
            )
            .await?;
        let blob_id = BlobId::new(body.as_str());
        if blob_id.as_str().is_empty() {
            return Err(ApiError::Wire {
                endpoint: CREATE_BLOB,
                source: WireError::InvalidScalar {
                    expected: "blob ID",
                    value: body,
                },
            });
        }
        Ok(blob_id)
    }

    async fn check_out_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<CheckOutGrant, ApiError> {
        let body = self
            .post(
                CHECK_OUT_BLOB,
                &[container_field(container_id), blob_field(blob_id)],
            )
            .await?;
        wire(CHECK_OUT_BLOB, CheckOutGrant::from_json(&body))
    }

    async fn check_in_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
        blob_size_bytes: u64,
        check_in_token: &str,
    ) -> Result<bool, ApiError> {
        let body = self
            .post(
                CHECK_IN_BLOB,
                &[
                    container_field(container_id),
                    blob_field(blob_id),
                    ("BlobSizeBytes", blob_size_bytes.to_string()),
                    ("BlobCheckInToken", check_in_token.to_string()),
                ],
            )
            .await?;
        wire(CHECK_IN_BLOB, parse_bool(&body))
    }

    async fn read_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<ReadGrant, ApiError> {
        let body = self
            .post(READ_BLOB, &[container_field(container_id), blob_field(blob_id)])
            .await?;
        wire(READ_BLOB, ReadGrant::from_json(&body))
    }

    async fn blobs_by_state(
        &self,
        container_id: ContainerId,
        state: BlobState,
    ) -> Result<Vec<BlobInfo>, ApiError> {
        let body = self
            .post(
                BLOBS_BY_STATE,
                &[
                    container_field(container_id),
                    ("BlobState", state.as_wire().to_string()),
                ],
            )
            .await?;
        wire(BLOBS_BY_STATE, BlobInfo::list_from_json(&body))
    }

    async fn create_sft_container(
        &self,
        context: &str,
        name: &str,
        description: &str,
    ) -> Result<SftContainerConfig, ApiError> {
        let body = self
            .post(
                CREATE_SFT_CONTAINER,
                &[
                    ("Context", context.to_string()),
                    ("Name", name.to_string()),
                    ("Description", description.to_string()),
                ],
            )
            .await?;
        wire(CREATE_SFT_CONTAINER, SftContainerConfig::from_json(&body))
    }

    async fn containers_by_context(
        &self,
        context: &str,
        container_type: ContainerType,
    ) -> Result<Vec<ContainerInfo>, ApiError> {
        let body = self
            .post(
                CONTAINERS_BY_CONTEXT,
                &[
                    ("Context", context.to_string()),
                    ("ContainerType", container_type.as_wire().to_string()),
                ],
            )
            .await?;
        wire(CONTAINERS_BY_CONTEXT, ContainerInfo::list_from_json(&body))
    }

    async fn container_id_from_friendly_id(
        &self,
        friendly_id: &str,
    ) -> Result<ContainerId, ApiError> {
        let body = self
            .post(
                CONTAINER_ID_FROM_FRIENDLY_ID,
                &[("ContainerFriendlyID", friendly_id.to_string())],
            )
            .await?;
        wire(CONTAINER_ID_FROM_FRIENDLY_ID, parse_i64(&body)).map(ContainerId::new)
    }

    async fn container_ids_from_name(&self, name: &str) -> Result<Vec<ContainerId>, ApiError> {
        let body = self
            .post(CONTAINER_IDS_FROM_NAME, &[("ContainerName", name.to_string())])
            .await?;
        let ids = wire(CONTAINER_IDS_FROM_NAME, parse_i64_list(&body))?;
        Ok(ids.into_iter().map(ContainerId::new).collect())
    }

    async fn context_setting(
        &self,
        context: &str,
        setting: ContextSetting,
    ) -> Result<String, ApiError> {
        let body = self
            .post(
                CONTEXT_SETTING,
                &[
                    ("Context", context.to_string()),
                    ("ContextSetting", setting.as_wire().to_string()),
                ],
            )
            .await?;
        Ok(unquote(&body))
    }

    async fn remove_container(&self, container_id: ContainerId) -> Result<bool, ApiError> {
        let body = self
            .post(REMOVE_CONTAINER, &[container_field(container_id)])
            .await?;
        wire(REMOVE_CONTAINER, parse_bool(&body))
    }

    async fn remove_blob(
        &self,
        container_id: ContainerId,
        blob_id: &BlobId,
    ) -> Result<bool, ApiError> {
        let body = self
            .post(REMOVE_BLOB, &[container_field(container_id), blob_field(blob_id)])
            .await?;
        wire(REMOVE_BLOB, parse_bool(&body))
    }
}
