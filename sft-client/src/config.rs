//! Client configuration.
//!
//! [`ClientConfig`] identifies the entity and points at the REST API.
//! [`TransferSettings`] and [`RetryPolicy`] tune the block-storage channel
//! and the transport retry loop.

use sft_core::BLOCK_SIZE;
use sft_types::{ApiVersion, ContentFormat, EntityType};
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The API base URL could not be parsed.
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A tuning value is out of range.
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Retry policy for transient transport failures.
///
/// Only requests that never produced a response are retried; an HTTP error
/// status is an answer and is returned as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay, doubled on every retry (plus jitter).
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Tuning for the block-storage channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSettings {
    /// Bytes per upload block (at most 4 MiB).
    pub block_size: usize,
    /// Block PUTs allowed in flight at once.
    pub upload_concurrency: usize,
    /// Bytes written per step while streaming a download.
    pub download_chunk_size: usize,
}

impl TransferSettings {
    /// Check every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 || self.block_size > BLOCK_SIZE {
            return Err(ConfigError::InvalidSetting {
                name: "block_size",
                reason: format!("must be between 1 and {} bytes", BLOCK_SIZE),
            });
        }
        if self.upload_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "upload_concurrency",
                reason: "must be at least 1".into(),
            });
        }
        if self.download_chunk_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "download_chunk_size",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            upload_concurrency: 4,
            download_chunk_size: 64 * 1024,
        }
    }
}

/// Configuration for connecting to the REST API.
///
/// Custom `Debug` implementation redacts the entity password.
#[derive(Clone)]
pub struct ClientConfig {
    /// Authenticating entity (email, name identifier or entity ID).
    pub entity: String,
    /// How `entity` should be interpreted.
    pub entity_type: EntityType,
    /// Entity password, sent with every call.
    pub entity_password: Zeroizing<String>,
    /// API version path segment.
    pub api_version: ApiVersion,
    /// Response format requested through `Accept`.
    pub content_format: ContentFormat,
    /// Base URL of the API (without version segment).
    pub base_url: Url,
    /// Verify TLS certificates. Turning this off is for testing only.
    pub verify_tls: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Retry policy for transport failures.
    pub retry: RetryPolicy,
    /// Block-storage tuning.
    pub transfer: TransferSettings,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("entity", &self.entity)
            .field("entity_type", &self.entity_type)
            .field("entity_password", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("content_format", &self.content_format)
            .field("base_url", &self.base_url.as_str())
            .field("verify_tls", &self.verify_tls)
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .field("transfer", &self.transfer)
            .finish()
    }
}

impl ClientConfig {
    /// Create a configuration with default settings.
    pub fn new(base_url: &str, entity: &str, entity_password: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".into(),
            });
        }

        Ok(Self {
            entity: entity.to_string(),
            entity_type: EntityType::default(),
            entity_password: Zeroizing::new(entity_password.to_string()),
            api_version: ApiVersion::default(),
            content_format: ContentFormat::default(),
            base_url,
            verify_tls: true,
            request_timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            transfer: TransferSettings::default(),
        })
    }

    /// Set how the entity is identified.
    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the block-storage tuning.
    pub fn with_transfer(mut self, transfer: TransferSettings) -> Self {
        self.transfer = transfer;
        self
    }

    /// Versioned API root, always ending in `/`.
    pub fn api_root(&self) -> Result<Url, ConfigError> {
        let root = format!(
            "{}/{}/",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_version.as_wire()
        );
        Url::parse(&root).map_err(|e| ConfigError::InvalidUrl {
            url: root,
            reason: e.to_string(),
        })
    }

    /// Build the `reqwest::Client` for service calls. The timeout bounds
    /// each whole request.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()?;
        Ok(client)
    }

    /// Build the `reqwest::Client` for block storage. Blocks and blob
    /// bodies can take far longer than any single service call, so the
    /// timeout bounds connecting and each stall between reads instead.
    pub fn storage_http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.request_timeout)
            .read_timeout(self.request_timeout)
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()?;
        Ok(client)
    }
}
