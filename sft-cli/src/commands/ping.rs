//! Check that the service answers.

use anyhow::Result;
use sft_client::{BlobStorage, VaultApi, VaultClient};

/// Run the ping command.
pub async fn run<A: VaultApi, S: BlobStorage>(client: &VaultClient<A, S>) -> Result<()> {
    if !client.ping().await? {
        anyhow::bail!("Service is not answering");
    }
    println!("Service is up.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sft_client::{MockApi, MockStorage};

    #[tokio::test]
    async fn ping_succeeds_when_alive() {
        let client = VaultClient::new(MockApi::new(), MockStorage::new());
        assert!(run(&client).await.is_ok());
    }

    #[tokio::test]
    async fn ping_fails_when_down() {
        let api = MockApi::new();
        api.set_alive(false);
        let client = VaultClient::new(api, MockStorage::new());
        assert!(run(&client).await.is_err());
    }
}
