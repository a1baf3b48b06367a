//! Wire-format tests for HttpApi against a local mock server.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET    | `/{version}/Ping` | `ping_*` |
//! | POST   | `/{version}/ContainerKeyData` | `key_data_*`, `post_*` |
//! | POST   | `/{version}/CreateEntityContainerBlob` | `create_blob_*`, `timed_out_*` |
//! | POST   | `/{version}/CheckOutEntityContainerBlob` | `check_out_*` |
//! | POST   | `/{version}/CheckInEntityContainerBlob` | `check_in_*`, `timed_out_*` |
//! | POST   | `/{version}/GetContainerBlobInfoListByState` | `blobs_by_state_*` |
//! | POST   | `/{version}/GetContainerIDsFromName` | `container_ids_*` |
//! | POST   | `/{version}/GetContextSetting` | `context_setting_*`, `timed_out_*` |
//! | POST   | `/{version}/RemoveEntityContainerBlob` | `remove_blob_*` |

use sft_client::{
    ApiError, BlobId, BlobState, ClientConfig, ContainerId, ContextSetting, HttpApi, RetryPolicy,
    VaultApi,
};
use sft_types::{ApiVersion, SymmetricKeyStrength};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(&server.uri(), "me@example.com", "s3cret")
        .unwrap()
        .with_retry(RetryPolicy::none())
}

fn test_api(server: &MockServer) -> HttpApi {
    HttpApi::new(&test_config(server)).unwrap()
}

// ── GET /latest/Ping ─────────────────────────────────────────────────

#[tokio::test]
async fn ping_is_a_get_and_true_on_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/Ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(test_api(&server).ping().await.unwrap());
}

#[tokio::test]
async fn ping_is_false_on_other_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/Ping"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    assert!(!test_api(&server).ping().await.unwrap());
}

#[tokio::test]
async fn ping_uses_configured_api_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/Ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server).with_api_version(ApiVersion::V2);
    assert!(HttpApi::new(&config).unwrap().ping().await.unwrap());
}

#[tokio::test]
async fn ping_without_server_is_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:1", "e", "p")
        .unwrap()
        .with_retry(RetryPolicy::none());
    let err = HttpApi::new(&config).unwrap().ping().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport { endpoint: "Ping", .. }));
}

// ── POST /latest/ContainerKeyData ────────────────────────────────────

#[tokio::test]
async fn post_carries_credentials_and_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/ContainerKeyData"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("Entity=me%40example.com"))
        .and(body_string_contains("EntityType=0"))
        .and(body_string_contains("EntityPassword=s3cret"))
        .and(body_string_contains("ContainerID=7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "SessionKeyBase64": "AAECAwQFBgcICQoLDA0ODw==",
            "SessionIVBase64": "AAECAwQFBgcICQoLDA0ODw==",
            "SymmetricKeyStrength": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let material = test_api(&server)
        .container_key_data(ContainerId::new(7))
        .await
        .unwrap();
    assert_eq!(material.strength(), SymmetricKeyStrength::Aes128);
    assert_eq!(material.key_base64(), "AAECAwQFBgcICQoLDA0ODw==");
}

#[tokio::test]
async fn key_data_rejection_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/ContainerKeyData"))
        .respond_with(ResponseTemplate::new(403).set_body_string("not a member"))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .container_key_data(ContainerId::new(7))
        .await
        .unwrap_err();
    match err {
        ApiError::Status {
            endpoint,
            status,
            body,
        } => {
            assert_eq!(endpoint, "ContainerKeyData");
            assert_eq!(status, 403);
            assert_eq!(body, "not a member");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn key_data_with_unknown_strength_is_wire_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/ContainerKeyData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "SessionKeyBase64": "AAECAwQFBgcICQoLDA0ODw==",
            "SessionIVBase64": "AAECAwQFBgcICQoLDA0ODw==",
            "SymmetricKeyStrength": "9"
        })))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .container_key_data(ContainerId::new(7))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Wire { .. }));
}

// ── POST /latest/CreateEntityContainerBlob ───────────────────────────

#[tokio::test]
async fn create_blob_strips_json_quotes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CreateEntityContainerBlob"))
        .and(body_string_contains("BlobName=hello.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"blob-123\""))
        .expect(1)
        .mount(&server)
        .await;

    let blob_id = test_api(&server)
        .create_blob(ContainerId::new(7), "hello.txt")
        .await
        .unwrap();
    assert_eq!(blob_id.as_str(), "blob-123");
}

#[tokio::test]
async fn create_blob_with_empty_body_is_wire_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CreateEntityContainerBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"\""))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .create_blob(ContainerId::new(7), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Wire { .. }));
}

// ── POST /latest/CheckOutEntityContainerBlob ─────────────────────────

#[tokio::test]
async fn check_out_returns_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckOutEntityContainerBlob"))
        .and(body_string_contains("BlobIDName=blob-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "CheckInToken": "tok-1",
            "ContainerStorageName": "c7",
            "SharedAccessSignature": "?sv=2012-02-12&sig=abc",
            "SharedAccessSignatureUri": "https://acct.blob.example.net/c7/blob-123?sv=2012-02-12&sig=abc",
            "StorageType": 1,
            "StorageUri": "https://acct.blob.example.net/"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = test_api(&server)
        .check_out_blob(ContainerId::new(7), &BlobId::new("blob-123"))
        .await
        .unwrap();
    assert_eq!(grant.check_in_token, "tok-1");
    assert_eq!(grant.storage_type, "1");
    assert!(grant.shared_access_uri.ends_with("sig=abc"));
}

#[tokio::test]
async fn check_out_without_token_is_wire_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckOutEntityContainerBlob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ContainerStorageName": "c7",
            "SharedAccessSignature": "?sv=1",
            "SharedAccessSignatureUri": "https://acct.blob.example.net/c7/b?sv=1",
            "StorageType": 1,
            "StorageUri": "https://acct.blob.example.net/"
        })))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .check_out_blob(ContainerId::new(7), &BlobId::new("b"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ApiError::Wire {
            endpoint: "CheckOutEntityContainerBlob",
            ..
        }
    ));
}

// ── POST /latest/CheckInEntityContainerBlob ──────────────────────────

#[tokio::test]
async fn check_in_sends_size_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckInEntityContainerBlob"))
        .and(body_string_contains("BlobIDName=blob-123"))
        .and(body_string_contains("BlobSizeBytes=32"))
        .and(body_string_contains("BlobCheckInToken=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    let accepted = test_api(&server)
        .check_in_blob(ContainerId::new(7), &BlobId::new("blob-123"), 32, "tok-1")
        .await
        .unwrap();
    assert!(accepted);
}

// ── POST /latest/GetContainerBlobInfoListByState ─────────────────────

#[tokio::test]
async fn blobs_by_state_sends_state_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/GetContainerBlobInfoListByState"))
        .and(body_string_contains("BlobState=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "BlobInfoArray": [
                { "BlobID": "blob-1", "BlobName": "a.txt" },
                { "BlobID": "blob-2", "BlobName": "b.txt" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let blobs = test_api(&server)
        .blobs_by_state(ContainerId::new(7), BlobState::Ready)
        .await
        .unwrap();
    let names: Vec<_> = blobs.iter().map(|b| b.blob_name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}

// ── POST /latest/GetContainerIDsFromName ─────────────────────────────

#[tokio::test]
async fn container_ids_from_name_parses_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/GetContainerIDsFromName"))
        .and(body_string_contains("ContainerName=inbox"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"3,17,42\""))
        .mount(&server)
        .await;

    let ids = test_api(&server)
        .container_ids_from_name("inbox")
        .await
        .unwrap();
    assert_eq!(
        ids,
        vec![ContainerId::new(3), ContainerId::new(17), ContainerId::new(42)]
    );
}

// ── POST /latest/GetContextSetting ───────────────────────────────────

#[tokio::test]
async fn context_setting_is_unquoted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/GetContextSetting"))
        .and(body_string_contains("Context=acme.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"Acme Corp\""))
        .mount(&server)
        .await;

    let value = test_api(&server)
        .context_setting("acme.example.com", ContextSetting::CompanyName)
        .await
        .unwrap();
    assert_eq!(value, "Acme Corp");
}

// ── POST /latest/RemoveEntityContainerBlob ───────────────────────────

#[tokio::test]
async fn remove_blob_posts_to_blob_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/RemoveEntityContainerBlob"))
        .and(body_string_contains("BlobIDName=blob-9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(test_api(&server)
        .remove_blob(ContainerId::new(7), &BlobId::new("blob-9"))
        .await
        .unwrap());
}

#[tokio::test]
async fn non_boolean_answer_is_wire_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/RemoveEntityContainer"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maybe"))
        .mount(&server)
        .await;

    let err = test_api(&server)
        .remove_container(ContainerId::new(7))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Wire { .. }));
}

// ── Retry on timeout ─────────────────────────────────────────────────

fn impatient_api(server: &MockServer, max_retries: u32) -> HttpApi {
    let config = ClientConfig::new(&server.uri(), "me@example.com", "s3cret")
        .unwrap()
        .with_timeout(Duration::from_millis(300))
        .with_retry(RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(10),
        });
    HttpApi::new(&config).unwrap()
}

#[tokio::test]
async fn timed_out_create_blob_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CreateEntityContainerBlob"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("\"blob-1\"")
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = impatient_api(&server, 3)
        .create_blob(ContainerId::new(42), "a.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport { .. }));
}

#[tokio::test]
async fn timed_out_check_in_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/CheckInEntityContainerBlob"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("true")
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = impatient_api(&server, 3)
        .check_in_blob(ContainerId::new(42), &BlobId::new("blob-1"), 32, "tok-1")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn timed_out_read_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/latest/GetContextSetting"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("\"Acme\"")
                .set_delay(Duration::from_millis(1500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = impatient_api(&server, 1)
        .context_setting("acme", ContextSetting::CompanyName)
        .await;
    assert!(result.is_err());
}
