//! List and remove blobs.

use anyhow::Result;
use clap::Args;
use sft_client::{BlobId, BlobInfo, BlobState, BlobStorage, ContainerId, VaultApi, VaultClient};

/// Arguments for `sealbox list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Container to list
    pub container: i64,

    /// Blob state: created, uploading, ready, checked-out, modifying, none
    #[arg(long, default_value = "ready")]
    pub state: BlobState,
}

/// Arguments for `sealbox remove-blob`.
#[derive(Args, Debug)]
pub struct RemoveBlobArgs {
    /// Container holding the blob
    pub container: i64,

    /// Blob ID
    pub blob: String,
}

/// Format a blob listing as aligned rows.
pub fn format_blobs(blobs: &[BlobInfo]) -> String {
    let width = blobs
        .iter()
        .map(|b| b.blob_id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("BLOB ID".len());

    let mut out = format!("{:<width$}  NAME\n", "BLOB ID", width = width);
    for blob in blobs {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            blob.blob_id.as_str(),
            blob.blob_name,
            width = width
        ));
    }
    out
}

/// Run the list command.
pub async fn list<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: ListArgs,
) -> Result<()> {
    let blobs = client
        .list_blobs(ContainerId::new(args.container), args.state)
        .await?;

    if blobs.is_empty() {
        println!(
            "No {} blobs in container {}.",
            args.state, args.container
        );
    } else {
        print!("{}", format_blobs(&blobs));
    }
    Ok(())
}

/// Run the remove-blob command.
pub async fn remove<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: RemoveBlobArgs,
) -> Result<()> {
    let removed = client
        .remove_blob(ContainerId::new(args.container), &BlobId::new(args.blob.as_str()))
        .await?;
    if !removed {
        anyhow::bail!("Blob {} was not removed", args.blob);
    }
    println!("Removed blob {}.", args.blob);
    Ok(())
}
