//! Write the config file.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::config::CliConfig;

/// Arguments for `sealbox init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Service base URL (without the API version segment)
    #[arg(long)]
    pub base_url: String,

    /// Entity to authenticate as
    #[arg(long, short)]
    pub entity: String,

    /// How the entity is identified: email, name or id
    #[arg(long, default_value = "email")]
    pub entity_type: String,

    /// API version path segment
    #[arg(long, default_value = "latest")]
    pub api_version: String,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Store the password in the config file (prompted)
    #[arg(long)]
    pub save_password: bool,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub async fn run(config_path: &Path, args: InitArgs, password: Option<String>) -> Result<()> {
    if CliConfig::exists(config_path) && !args.force {
        anyhow::bail!(
            "Already initialized. Use --force to overwrite {}.",
            config_path.display()
        );
    }

    let mut config = CliConfig::new(&args.base_url, &args.entity);
    config.entity_type = args.entity_type;
    config.api_version = args.api_version;
    config.verify_tls = !args.insecure;
    config.password = password;

    // Reject bad values now rather than on first use.
    config.client_config("validation")?;
    config.save(config_path).await?;

    println!("Configuration written.");
    println!();
    println!("  Service: {}", config.base_url);
    println!("  Entity:  {} ({})", config.entity, config.entity_type);
    println!("  File:    {}", config_path.display());
    if config.password.is_none() {
        println!();
        println!("The password will be read from $SEALBOX_PASSWORD or prompted.");
    }
    println!();
    println!("Next: sealbox ping");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(base_url: &str) -> InitArgs {
        InitArgs {
            base_url: base_url.to_string(),
            entity: "me@example.com".to_string(),
            entity_type: "email".to_string(),
            api_version: "latest".to_string(),
            insecure: false,
            save_password: false,
            force: false,
        }
    }

    #[tokio::test]
    async fn init_writes_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        run(&path, args("https://vault.example.com"), None)
            .await
            .unwrap();

        let config = CliConfig::load(&path).await.unwrap();
        assert_eq!(config.base_url, "https://vault.example.com");
        assert_eq!(config.entity, "me@example.com");
        assert!(config.password.is_none());
    }

    #[tokio::test]
    async fn init_stores_password_when_given() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        run(&path, args("https://vault.example.com"), Some("pw".into()))
            .await
            .unwrap();

        let config = CliConfig::load(&path).await.unwrap();
        assert_eq!(config.password.as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn init_fails_if_already_initialized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        run(&path, args("https://one.example.com"), None)
            .await
            .unwrap();
        assert!(run(&path, args("https://two.example.com"), None)
            .await
            .is_err());

        let mut forced = args("https://two.example.com");
        forced.force = true;
        run(&path, forced, None).await.unwrap();
        let config = CliConfig::load(&path).await.unwrap();
        assert_eq!(config.base_url, "https://two.example.com");
    }

    #[tokio::test]
    async fn init_rejects_bad_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(run(&path, args("not a url"), None).await.is_err());
        assert!(!path.exists());
    }
}
