//! # sealbox
//!
//! Command-line client for secure file transfer containers.
//!
//! ## Commands
//!
//! - `init`: Write the config file
//! - `ping`: Check that the service answers
//! - `upload` / `download`: Move a file in or out of a container
//! - `list`: List blobs in a container by state
//! - `containers`, `create-container`, `remove-container`: Manage containers
//! - `remove-blob`: Remove one blob
//! - `resolve`: Look up container IDs by friendly ID or name
//! - `setting`: Read a context setting
//!
//! ## Example
//!
//! ```bash
//! # Point the CLI at a service
//! sealbox init --base-url https://vault.example.com --entity me@example.com
//!
//! # Seal and upload a file
//! sealbox upload 42 report.pdf
//!
//! # See what is ready, then fetch it back
//! sealbox list 42
//! sealbox download 42 <blob-id> report-copy.pdf
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sft_client::{HttpApi, HttpStorage, VaultClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod progress;

use commands::{blobs, containers, init, ping, transfer};
use config::{CliConfig, CONFIG_FILE, PASSWORD_ENV};
use progress::ProgressBar;

/// Command-line client for secure file transfer containers.
#[derive(Parser, Debug)]
#[command(name = "sealbox")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use this service base URL instead of the configured one
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Authenticate as this entity instead of the configured one
    #[arg(long, global = true)]
    as_entity: Option<String>,

    /// Never prompt for a password
    #[arg(long, global = true)]
    no_prompt: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the config file
    Init(init::InitArgs),

    /// Check that the service answers
    Ping,

    /// Seal a file and upload it into a container
    Upload(transfer::UploadArgs),

    /// Download a blob and open it
    Download(transfer::DownloadArgs),

    /// List blobs in a container
    List(blobs::ListArgs),

    /// List containers in a context
    Containers(containers::ListArgs),

    /// Create a secure file transfer container
    CreateContainer(containers::CreateArgs),

    /// Remove a container and its blobs
    RemoveContainer(containers::RemoveArgs),

    /// Remove a blob
    RemoveBlob(blobs::RemoveBlobArgs),

    /// Look up container IDs
    Resolve(containers::ResolveArgs),

    /// Read a context setting
    Setting(containers::SettingArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Init(args) => {
            let password = if args.save_password {
                Some(config::prompt_password(&args.entity)?)
            } else {
                None
            };
            init::run(&config_path, args, password).await
        }
        command => {
            let overrides = Overrides {
                base_url: cli.service_url,
                entity: cli.as_entity,
                no_prompt: cli.no_prompt,
            };
            let bar = Arc::new(ProgressBar::new());
            let client = connect(&config_path, overrides, bar.clone()).await?;
            dispatch(&client, &bar, command).await
        }
    }
}

/// Command-line values that replace config file values.
struct Overrides {
    base_url: Option<String>,
    entity: Option<String>,
    no_prompt: bool,
}

/// Load the config, resolve the password and build an HTTP client.
async fn connect(
    config_path: &Path,
    overrides: Overrides,
    bar: Arc<ProgressBar>,
) -> Result<VaultClient<HttpApi, HttpStorage>> {
    let mut file_config = CliConfig::load(config_path).await?;
    if let Some(base_url) = overrides.base_url {
        file_config.base_url = base_url;
    }
    if let Some(entity) = overrides.entity {
        file_config.entity = entity;
    }

    let env_password = std::env::var(PASSWORD_ENV).ok();
    let password = config::resolve_password(&file_config, env_password, || {
        if overrides.no_prompt {
            anyhow::bail!(
                "No password: set {} or run 'sealbox init --save-password'",
                PASSWORD_ENV
            );
        }
        config::prompt_password(&file_config.entity)
    })?;

    let client_config = file_config.client_config(&password)?;
    tracing::debug!(?client_config, "loaded configuration");

    let client = VaultClient::from_config(&client_config)
        .context("Failed to build the HTTP client")?
        .with_observer(bar);
    Ok(client)
}

/// Run a command that talks to the service.
async fn dispatch(
    client: &VaultClient<HttpApi, HttpStorage>,
    bar: &ProgressBar,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Init(_) => anyhow::bail!("init does not talk to the service"),
        Commands::Ping => ping::run(client).await?,
        Commands::Upload(args) => {
            let result = transfer::upload(client, args).await;
            bar.finish();
            transfer::report_upload(&result?);
        }
        Commands::Download(args) => {
            let dest = args.dest.clone();
            let result = transfer::download(client, args).await;
            bar.finish();
            transfer::report_download(&dest, result?);
        }
        Commands::List(args) => blobs::list(client, args).await?,
        Commands::Containers(args) => containers::list(client, args).await?,
        Commands::CreateContainer(args) => {
            containers::create(client, args).await?;
        }
        Commands::RemoveContainer(args) => containers::remove(client, args).await?,
        Commands::RemoveBlob(args) => blobs::remove(client, args).await?,
        Commands::Resolve(args) => {
            containers::resolve(client, args).await?;
        }
        Commands::Setting(args) => {
            containers::setting(client, args).await?;
        }
    }
    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default config file path for sealbox.
fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "sealbox", "sealbox")
        .context("Could not determine home directory")?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
