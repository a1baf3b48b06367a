//! End-to-end transfer scenarios.
//!
//! The first group runs the whole pipeline against the in-memory doubles.
//! The last test runs it over real HTTP against a mock server that stages
//! and commits blocks like block storage does.

use md5::{Digest, Md5};
use sft_client::{
    endpoints, BlobState, ClientConfig, ContainerId, ErrorKind, HttpApi, HttpStorage, MockApi,
    MockStorage, RetryPolicy, TransferEngine, TransferOptions, TransferSettings, VaultClient,
};
use sft_core::BLOCK_SIZE;
use sft_types::{ContainerKeyMaterial, SymmetricKeyStrength};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CONTAINER: i64 = 42;
const KEY_B64: &str = "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA=";
const IV_B64: &str = "AAECAwQFBgcICQoLDA0ODw==";

fn key_material() -> ContainerKeyMaterial {
    ContainerKeyMaterial::new(KEY_B64, IV_B64, SymmetricKeyStrength::Aes256)
}

fn mock_client() -> (VaultClient<MockApi, MockStorage>, MockApi, MockStorage) {
    let api = MockApi::new();
    api.add_container(ContainerId::new(CONTAINER), "acme", "inbox", key_material());
    let storage = MockStorage::new();
    (VaultClient::new(api.clone(), storage.clone()), api, storage)
}

fn md5_of(data: &[u8]) -> Vec<u8> {
    Md5::digest(data).to_vec()
}

// ===========================================
// Pipeline Scenarios (in-memory)
// ===========================================

#[tokio::test]
async fn small_file_round_trip_preserves_md5() {
    let (client, _api, _storage) = mock_client();
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..32u8).collect();
    let src = dir.path().join("hello.bin");
    std::fs::write(&src, &data).unwrap();
    let id = ContainerId::new(CONTAINER);

    let handle = client
        .upload_file(id, &src, "hello.bin", &TransferOptions::default())
        .await
        .unwrap();

    let ready = client.list_blobs(id, BlobState::Ready).await.unwrap();
    assert!(ready
        .iter()
        .any(|b| b.blob_id == handle.blob_id && b.blob_name == "hello.bin"));

    let dest = dir.path().join("hello.copy");
    client
        .download_blob(id, &handle.blob_id, &dest, &TransferOptions::default())
        .await
        .unwrap();

    assert_eq!(md5_of(&std::fs::read(&dest).unwrap()), md5_of(&data));
}

#[tokio::test]
async fn refetched_key_decrypts_earlier_ciphertext() {
    let (client, api, _storage) = mock_client();
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("doc.txt");
    std::fs::write(&src, b"quarterly numbers").unwrap();
    let id = ContainerId::new(CONTAINER);

    let handle = client
        .upload_file(id, &src, "doc.txt", &TransferOptions::default())
        .await
        .unwrap();
    let dest = dir.path().join("doc.copy");
    client
        .download_blob(id, &handle.blob_id, &dest, &TransferOptions::default())
        .await
        .unwrap();

    assert_eq!(api.call_count(endpoints::CONTAINER_KEY_DATA), 2);
    assert_eq!(std::fs::read(&dest).unwrap(), b"quarterly numbers");
}

#[tokio::test]
async fn five_mib_plus_remainder_is_two_blocks() {
    let dir = TempDir::new().unwrap();
    let len = 5 * 1024 * 1024 + 37;
    let data: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
    let file = dir.path().join("big.bin");
    std::fs::write(&file, &data).unwrap();
    let storage = MockStorage::new();
    let engine = TransferEngine::new(storage.clone(), TransferSettings::default());
    let sas = "https://storage.mock.invalid/container-42/blob-big?sv=2012-02-12&sig=mock";

    assert!(engine.upload_blocks(&file, sas).await.unwrap());

    let blocks: Vec<_> = storage
        .puts()
        .into_iter()
        .filter(|p| !p.is_commit())
        .collect();
    assert_eq!(blocks.len(), 2);
    let mut sizes: Vec<usize> = blocks.iter().map(|p| p.body.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![len - BLOCK_SIZE, BLOCK_SIZE]);
    assert_eq!(md5_of(&storage.committed(sas).unwrap()), md5_of(&data));
}

#[tokio::test]
async fn large_upload_round_trips_through_several_blocks() {
    let (client, api, storage) = mock_client();
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..(BLOCK_SIZE * 2 + 1234))
        .map(|i| (i * 7 % 256) as u8)
        .collect();
    let src = dir.path().join("big.bin");
    std::fs::write(&src, &data).unwrap();
    let id = ContainerId::new(CONTAINER);

    let handle = client
        .upload_file(id, &src, "big.bin", &TransferOptions::default())
        .await
        .unwrap();
    // Plaintext length is checked in, not the padded ciphertext length.
    assert_eq!(
        api.blob_status(&handle.blob_id),
        Some((BlobState::Ready, data.len() as u64))
    );
    assert_eq!(storage.puts().iter().filter(|p| !p.is_commit()).count(), 3);

    let dest = dir.path().join("big.copy");
    let len = client
        .download_blob(id, &handle.blob_id, &dest, &TransferOptions::default())
        .await
        .unwrap();
    assert_eq!(len, data.len() as u64);
    assert_eq!(md5_of(&std::fs::read(&dest).unwrap()), md5_of(&data));
}

#[tokio::test]
async fn refused_block_means_failure_and_no_commit() {
    let (client, api, storage) = mock_client();
    storage.fail_put(0, 500);
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.bin");
    std::fs::write(&src, [0u8; 64]).unwrap();

    let err = client
        .upload_file(
            ContainerId::new(CONTAINER),
            &src,
            "a.bin",
            &TransferOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!storage.puts().iter().any(|p| p.is_commit()));
    assert_eq!(api.call_count(endpoints::CHECK_IN_BLOB), 0);
}

#[tokio::test]
async fn failed_probe_makes_no_key_checkout_or_read_calls() {
    let (client, api, storage) = mock_client();
    api.set_alive(false);
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("a.bin");
    std::fs::write(&src, b"abc").unwrap();
    let id = ContainerId::new(CONTAINER);

    let up = client
        .upload_file(id, &src, "a.bin", &TransferOptions::default())
        .await
        .unwrap_err();
    let down = client
        .download_blob(
            id,
            &sft_client::BlobId::new("blob-1"),
            &dir.path().join("out"),
            &TransferOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(up.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(down.kind(), ErrorKind::ServiceUnavailable);
    assert_eq!(api.calls(), vec![endpoints::PING, endpoints::PING]);
    assert!(storage.puts().is_empty());
    assert!(storage.gets().is_empty());
}

// ===========================================
// Pipeline Scenario (HTTP)
// ===========================================

/// Block storage on the mock server: stages blocks, commits lists,
/// serves the committed blob.
#[derive(Clone, Default)]
struct StagingStore {
    inner: Arc<Mutex<(HashMap<String, Vec<u8>>, Vec<u8>)>>,
}

impl Respond for StagingStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut inner = self.inner.lock().unwrap();
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };

        match param("comp").as_deref() {
            Some("block") => {
                let Some(id) = param("blockid") else {
                    return ResponseTemplate::new(400);
                };
                inner.0.insert(id, request.body.clone());
                ResponseTemplate::new(201)
            }
            Some("blockList") => {
                let xml = String::from_utf8_lossy(&request.body).into_owned();
                let mut blob = Vec::new();
                for part in xml.split("<Latest>").skip(1) {
                    let Some((id, _)) = part.split_once("</Latest>") else {
                        return ResponseTemplate::new(400);
                    };
                    match inner.0.get(id) {
                        Some(block) => blob.extend_from_slice(block),
                        None => return ResponseTemplate::new(400),
                    }
                }
                inner.1 = blob;
                ResponseTemplate::new(201)
            }
            _ => ResponseTemplate::new(200).set_body_bytes(inner.1.clone()),
        }
    }
}

#[tokio::test]
async fn http_pipeline_round_trip_preserves_md5() {
    let server = MockServer::start().await;
    let sas_uri = format!("{}/storage/c42/blob-1?sv=2012-02-12&sr=b&sig=x", server.uri());

    Mock::given(method("GET"))
        .and(path("/latest/Ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/ContainerKeyData"))
        .and(body_string_contains("ContainerID=42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "SessionKeyBase64": KEY_B64,
            "SessionIVBase64": IV_B64,
            "SymmetricKeyStrength": 2
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/CreateEntityContainerBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"blob-1\""))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckOutEntityContainerBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "CheckInToken": "tok-1",
            "ContainerStorageName": "c42",
            "SharedAccessSignature": "?sv=2012-02-12&sr=b&sig=x",
            "SharedAccessSignatureUri": sas_uri,
            "StorageType": 1,
            "StorageUri": server.uri()
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckInEntityContainerBlob"))
        .and(body_string_contains("BlobSizeBytes=32"))
        .and(body_string_contains("BlobCheckInToken=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/GetContainerBlobInfoListByState"))
        .and(body_string_contains("BlobState=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "BlobInfoArray": [{ "BlobID": "blob-1", "BlobName": "hello.bin" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/latest/ReadEntityContainerBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ContainerStorageName": "c42",
            "SharedAccessSignature": "?sv=2012-02-12&sr=b&sig=x",
            "SharedAccessSignatureUri": sas_uri,
            "StorageType": 1,
            "StorageUri": server.uri()
        })))
        .expect(1)
        .mount(&server)
        .await;
    let store = StagingStore::default();
    Mock::given(path("/storage/c42/blob-1"))
        .respond_with(store.clone())
        .mount(&server)
        .await;

    let config = ClientConfig::new(&server.uri(), "me@example.com", "s3cret")
        .unwrap()
        .with_retry(RetryPolicy::none());
    let client = VaultClient::new(
        HttpApi::new(&config).unwrap(),
        HttpStorage::new(&config).unwrap(),
    );

    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (100..132u8).collect();
    let src = dir.path().join("hello.bin");
    std::fs::write(&src, &data).unwrap();
    let id = ContainerId::new(CONTAINER);

    let handle = client
        .upload_file(id, &src, "hello.bin", &TransferOptions::default())
        .await
        .unwrap();
    assert_eq!(handle.blob_id.as_str(), "blob-1");

    let ready = client.list_blobs(id, BlobState::Ready).await.unwrap();
    assert_eq!(ready[0].blob_name, "hello.bin");

    let dest = dir.path().join("hello.copy");
    client
        .download_blob(id, &handle.blob_id, &dest, &TransferOptions::default())
        .await
        .unwrap();

    assert_eq!(md5_of(&std::fs::read(&dest).unwrap()), md5_of(&data));
    // 32 plaintext bytes are 48 ciphertext bytes in storage.
    assert_eq!(store.inner.lock().unwrap().1.len(), 48);
}
