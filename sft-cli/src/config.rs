//! Configuration management for sealbox.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sft_client::{ClientConfig, RetryPolicy, TransferSettings};
use sft_types::{ApiVersion, EntityType};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted for the entity password.
pub const PASSWORD_ENV: &str = "SEALBOX_PASSWORD";

/// File name of the config inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Settings stored in `config.toml`.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Service base URL, without the API version segment.
    pub base_url: String,
    /// Entity name used to authenticate.
    pub entity: String,
    /// How the entity name is interpreted (`email`, `name`, `id`).
    #[serde(default = "default_entity_type")]
    pub entity_type: String,
    /// Entity password. Optional; prefer the environment or the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Verify the server TLS certificate.
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for requests that never reached the server.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upload block size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<usize>,
    /// Block uploads in flight at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_concurrency: Option<usize>,
}

fn default_entity_type() -> String {
    "email".to_string()
}

fn default_api_version() -> String {
    ApiVersion::default().as_wire().to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    sft_client::DEFAULT_TIMEOUT.as_secs()
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_retries
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("base_url", &self.base_url)
            .field("entity", &self.entity)
            .field("entity_type", &self.entity_type)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("api_version", &self.api_version)
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("block_size", &self.block_size)
            .field("upload_concurrency", &self.upload_concurrency)
            .finish()
    }
}

impl CliConfig {
    /// Create a configuration with defaults for everything but the target.
    pub fn new(base_url: &str, entity: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            entity: entity.to_string(),
            entity_type: default_entity_type(),
            password: None,
            api_version: default_api_version(),
            verify_tls: true,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            block_size: None,
            upload_concurrency: None,
        }
    }

    /// Load configuration from a file.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.with_context(|| {
            format!(
                "No configuration at {}. Run 'sealbox init' first.",
                path.display()
            )
        })?;
        toml::from_str(&contents).context("Invalid configuration file")
    }

    /// Save configuration to a file, owner-readable only.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to encode configuration")?;
        tokio::fs::write(path, contents)
            .await
            .context("Failed to save configuration")?;
        set_file_permissions_0600(path).await?;
        Ok(())
    }

    /// Check if a config file exists.
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Transfer settings with any overrides from the file applied.
    pub fn transfer_settings(&self) -> TransferSettings {
        let mut settings = TransferSettings::default();
        if let Some(block_size) = self.block_size {
            settings.block_size = block_size;
        }
        if let Some(concurrency) = self.upload_concurrency {
            settings.upload_concurrency = concurrency;
        }
        settings
    }

    /// Build a library config using `password`.
    pub fn client_config(&self, password: &str) -> Result<ClientConfig> {
        let entity_type: EntityType = self
            .entity_type
            .parse()
            .with_context(|| format!("Invalid entity_type {:?}", self.entity_type))?;
        let api_version: ApiVersion = self
            .api_version
            .parse()
            .with_context(|| format!("Invalid api_version {:?}", self.api_version))?;
        let retry = RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        };

        let config = ClientConfig::new(&self.base_url, &self.entity, password)
            .context("Invalid service settings")?
            .with_entity_type(entity_type)
            .with_api_version(api_version)
            .with_verify_tls(self.verify_tls)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(retry)
            .with_transfer(self.transfer_settings());
        Ok(config)
    }
}

/// Pick the password: environment first, then the config file, then a
/// prompt when allowed.
pub fn resolve_password(
    config: &CliConfig,
    env_value: Option<String>,
    prompt: impl FnOnce() -> Result<String>,
) -> Result<String> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    if let Some(value) = config.password.clone().filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    prompt()
}

/// Prompt on the terminal without echo.
pub fn prompt_password(entity: &str) -> Result<String> {
    rpassword::prompt_password(format!("Password for {}: ", entity))
        .context("Failed to read password")
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
