//! Upload and download files.

use anyhow::{Context, Result};
use clap::Args;
use sft_client::{
    BlobHandle, BlobId, BlobStorage, ContainerId, TransferOptions, VaultApi, VaultClient,
};
use std::path::PathBuf;
use std::time::Duration;

use crate::progress::format_bytes;

/// Arguments for `sealbox upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Container to upload into
    pub container: i64,

    /// File to seal and upload
    pub file: PathBuf,

    /// Blob name (defaults to the file name)
    #[arg(long, short)]
    pub name: Option<String>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Arguments for `sealbox download`.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Container holding the blob
    pub container: i64,

    /// Blob ID
    pub blob: String,

    /// Destination file (must not exist)
    pub dest: PathBuf,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

fn options(timeout_secs: Option<u64>) -> TransferOptions {
    match timeout_secs {
        Some(secs) => TransferOptions::with_deadline(Duration::from_secs(secs)),
        None => TransferOptions::default(),
    }
}

/// Run the upload command.
pub async fn upload<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: UploadArgs,
) -> Result<BlobHandle> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Cannot derive a blob name from the path; pass --name")?,
    };

    let handle = client
        .upload_file(
            ContainerId::new(args.container),
            &args.file,
            &name,
            &options(args.timeout_secs),
        )
        .await?;

    Ok(handle)
}

/// Run the download command. Returns the plaintext size.
pub async fn download<A: VaultApi, S: BlobStorage>(
    client: &VaultClient<A, S>,
    args: DownloadArgs,
) -> Result<u64> {
    let written = client
        .download_blob(
            ContainerId::new(args.container),
            &BlobId::new(args.blob),
            &args.dest,
            &options(args.timeout_secs),
        )
        .await?;

    Ok(written)
}

/// Print an upload summary.
pub fn report_upload(handle: &BlobHandle) {
    println!("Uploaded {} to container {}.", handle.name, handle.container_id);
    println!("  Blob ID: {}", handle.blob_id);
}

/// Print a download summary.
pub fn report_download(dest: &std::path::Path, written: u64) {
    println!("Downloaded {} to {}.", format_bytes(written), dest.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use sft_client::{BlobState, MockApi, MockStorage};
    use sft_types::{ContainerKeyMaterial, SymmetricKeyStrength};
    use tempfile::tempdir;

    fn client() -> (VaultClient<MockApi, MockStorage>, MockApi) {
        let api = MockApi::new();
        api.add_container(
            ContainerId::new(5),
            "acme",
            "inbox",
            ContainerKeyMaterial::new(
                "AAECAwQFBgcICQoLDA0ODw==",
                "Dw4NDAsKCQgHBgUEAwIBAA==",
                SymmetricKeyStrength::Aes128,
            ),
        );
        (VaultClient::new(api.clone(), MockStorage::new()), api)
    }

    #[tokio::test]
    async fn upload_names_blob_after_file() {
        let (client, api) = client();
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.pdf");
        std::fs::write(&file, b"%PDF-1.7").unwrap();

        let handle = upload(
            &client,
            UploadArgs {
                container: 5,
                file,
                name: None,
                timeout_secs: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(handle.name, "report.pdf");
        assert_eq!(api.blob_name(&handle.blob_id).as_deref(), Some("report.pdf"));
        assert_eq!(
            api.blob_status(&handle.blob_id),
            Some((BlobState::Ready, 8))
        );
    }

    #[tokio::test]
    async fn upload_then_download_restores_file() {
        let (client, _api) = client();
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"meeting at noon").unwrap();

        let handle = upload(
            &client,
            UploadArgs {
                container: 5,
                file,
                name: Some("renamed.txt".into()),
                timeout_secs: Some(30),
            },
        )
        .await
        .unwrap();
        assert_eq!(handle.name, "renamed.txt");

        let dest = dir.path().join("copy.txt");
        let written = download(
            &client,
            DownloadArgs {
                container: 5,
                blob: handle.blob_id.to_string(),
                dest: dest.clone(),
                timeout_secs: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(written, 15);
        assert_eq!(std::fs::read(&dest).unwrap(), b"meeting at noon");
    }

    #[tokio::test]
    async fn download_refuses_existing_destination() {
        let (client, _api) = client();
        let dir = tempdir().unwrap();
        let dest = dir.path().join("exists.txt");
        std::fs::write(&dest, b"keep me").unwrap();

        let result = download(
            &client,
            DownloadArgs {
                container: 5,
                blob: "blob-1".into(),
                dest: dest.clone(),
                timeout_secs: None,
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read(&dest).unwrap(), b"keep me");
    }
}
