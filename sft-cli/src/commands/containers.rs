//! Container management: list, create, remove, resolve, context settings.

use anyhow::Result;
use clap::Args;
use sft_client::{
    BlobStorage, ContainerId, ContainerInfo, ContainerType, ContextSetting, VaultApi, VaultClient,
};

/// Arguments for `sealbox containers`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Context (organisation) to list containers for
    pub context: String,
}

/// Arguments for `sealbox create-container`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Context (organisation) that will own the container
    pub context: String,

    /// Container name
    pub name: String,

    /// Free-form description
    #[arg(long, short, default_value = "")]
    pub description: String,
}

/// Arguments for `sealbox remove-container`.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Container to remove, with every blob in it
    pub container: i64,

    /// Confirm the removal
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for `sealbox resolve`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ResolveArgs {
    /// Friendly ID shown to users
    #[arg(long)]
    pub friendly_id: Option<String>,

    /// Container name (may match several containers)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for `sealbox setting`.
#[derive(Args, Debug)]
pub struct SettingArgs {
    /// Context (organisation)
    pub context: String,

    /// Setting: company-name or company-logo-url
    pub setting: ContextSetting,
}

/// Format a container listing as `ID  NAME` rows.
pub fn format_containers(containers: &[ContainerInfo]) -> String {
    let width = containers
        .iter()
        .map(|c| c.container_id.to_string().len())
        .max()
        .unwrap_or(0)
        .max("ID".len());

    let mut out = format!("{:>width$}  NAME\n", "ID", width = width);
    for container in containers {
        out.push_str(&format!(
            "{:>width$}  {}\n",
            container.container_id.to_string(),
            container.container_name,
            width = width
        ));
    }
    out
}

/// Run the containers command.
pub async fn list<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: ListArgs,
) -> Result<()> {
    let containers = client
        .list_containers(&args.context, ContainerType::Default)
        .await?;
    if containers.is_empty() {
        println!("No containers in context {}.", args.context);
    } else {
        print!("{}", format_containers(&containers));
    }
    Ok(())
}

/// Run the create-container command. Returns the new container's ID.
pub async fn create<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: CreateArgs,
) -> Result<ContainerId> {
    let created = client
        .create_container(&args.context, &args.name, &args.description)
        .await?;

    println!("Created container {}.", created.name);
    println!("  ID:          {}", created.container_id);
    println!("  Friendly ID: {}", created.friendly_id);
    Ok(created.container_id)
}

/// Run the remove-container command.
pub async fn remove<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: RemoveArgs,
) -> Result<()> {
    if !args.yes {
        anyhow::bail!(
            "Removing container {} deletes every blob in it. Pass --yes to confirm.",
            args.container
        );
    }
    if !client.remove_container(ContainerId::new(args.container)).await? {
        anyhow::bail!("Container {} was not removed", args.container);
    }
    println!("Removed container {}.", args.container);
    Ok(())
}

/// Run the resolve command. Returns the matching IDs.
pub async fn resolve<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: ResolveArgs,
) -> Result<Vec<ContainerId>> {
    let ids = match (args.friendly_id, args.name) {
        (Some(friendly_id), _) => vec![client.resolve_friendly_id(&friendly_id).await?],
        (None, Some(name)) => client.resolve_name(&name).await?,
        (None, None) => anyhow::bail!("Pass --friendly-id or --name"),
    };

    if ids.is_empty() {
        println!("No matching containers.");
    }
    for id in &ids {
        println!("{}", id);
    }
    Ok(ids)
}

/// Run the setting command.
pub async fn setting<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: SettingArgs,
) -> Result<String> {
    let value = client.context_setting(&args.context, args.setting).await?;
    println!("{}", value);
    Ok(value)
}
