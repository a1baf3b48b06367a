//! Records returned by the REST API.
//!
//! Responses are JSON objects with PascalCase keys. Several scalar fields
//! (`SymmetricKeyStrength`, `StorageType`, `ContainerID`) arrive either as
//! JSON strings or as bare numbers, so they are read as literals first and
//! then decoded.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WireError;
use crate::ids::{BlobId, ContainerId};
use crate::wire::SymmetricKeyStrength;

/// Render a JSON value as the literal the server meant.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode<'a, T: Deserialize<'a>>(what: &'static str, body: &'a str) -> Result<T, WireError> {
    serde_json::from_str(body).map_err(|source| WireError::Json { what, source })
}

fn checked_uri(field: &'static str, value: String) -> Result<String, WireError> {
    Url::parse(&value).map_err(|e| WireError::InvalidUri {
        field,
        reason: e.to_string(),
    })?;
    Ok(value)
}

fn parse_container_id(value: &Value) -> Result<ContainerId, WireError> {
    let raw = literal(value);
    raw.trim()
        .parse::<i64>()
        .map(ContainerId::new)
        .map_err(|_| WireError::InvalidScalar {
            expected: "container ID",
            value: raw,
        })
}

/// Symmetric key material issued for one container.
///
/// Fetched fresh for every transfer and never persisted. Key and IV are kept
/// Base64-encoded exactly as issued; the cipher engine decodes them. Memory
/// is zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ContainerKeyMaterial {
    symmetric_key_base64: String,
    iv_base64: String,
    #[zeroize(skip)]
    strength: SymmetricKeyStrength,
}

#[derive(Deserialize)]
struct RawKeyMaterial {
    #[serde(rename = "SessionKeyBase64")]
    key: String,
    #[serde(rename = "SessionIVBase64")]
    iv: String,
    #[serde(rename = "SymmetricKeyStrength")]
    strength: Value,
}

impl ContainerKeyMaterial {
    /// Build key material from its parts.
    pub fn new(
        symmetric_key_base64: impl Into<String>,
        iv_base64: impl Into<String>,
        strength: SymmetricKeyStrength,
    ) -> Self {
        Self {
            symmetric_key_base64: symmetric_key_base64.into(),
            iv_base64: iv_base64.into(),
            strength,
        }
    }

    /// Decode a `ContainerKeyData` response body.
    pub fn from_json(body: &str) -> Result<Self, WireError> {
        let raw: RawKeyMaterial = decode("ContainerKeyData", body)?;
        let strength = SymmetricKeyStrength::from_wire(&literal(&raw.strength))?;
        Ok(Self::new(raw.key, raw.iv, strength))
    }

    /// Base64-encoded symmetric key.
    pub fn key_base64(&self) -> &str {
        &self.symmetric_key_base64
    }

    /// Base64-encoded initialisation vector.
    pub fn iv_base64(&self) -> &str {
        &self.iv_base64
    }

    /// Declared key strength.
    pub fn strength(&self) -> SymmetricKeyStrength {
        self.strength
    }
}

impl fmt::Debug for ContainerKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerKeyMaterial")
            .field("symmetric_key_base64", &"[REDACTED]")
            .field("iv_base64", &"[REDACTED]")
            .field("strength", &self.strength)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStorageGrant {
    #[serde(default)]
    check_in_token: Option<String>,
    container_storage_name: String,
    shared_access_signature: String,
    shared_access_signature_uri: String,
    storage_type: Value,
    storage_uri: String,
}

/// One-time write capability returned by a blob check-out.
///
/// Valid until the matching check-in consumes the token or the server-side
/// lease expires.
#[derive(Clone, PartialEq, Eq)]
pub struct CheckOutGrant {
    /// Token that authorises the matching check-in.
    pub check_in_token: String,
    /// Name of the storage container holding the ciphertext.
    pub storage_container_name: String,
    /// Storage backend type code.
    pub storage_type: String,
    /// Pre-signed URI to the ciphertext blob (SAS query included).
    pub shared_access_uri: String,
    /// The shared-access signature on its own.
    pub shared_access_signature: String,
    /// Storage endpoint URI without signature.
    pub storage_uri: String,
}

impl CheckOutGrant {
    /// Decode a `CheckOutEntityContainerBlob` response body.
    pub fn from_json(body: &str) -> Result<Self, WireError> {
        let raw: RawStorageGrant = decode("CheckOutEntityContainerBlob", body)?;
        let check_in_token = raw.check_in_token.ok_or_else(|| WireError::Json {
            what: "CheckOutEntityContainerBlob",
            source: <serde_json::Error as serde::de::Error>::missing_field("CheckInToken"),
        })?;
        Ok(Self {
            check_in_token,
            storage_container_name: raw.container_storage_name,
            storage_type: literal(&raw.storage_type),
            shared_access_uri: checked_uri(
                "SharedAccessSignatureUri",
                raw.shared_access_signature_uri,
            )?,
            shared_access_signature: raw.shared_access_signature,
            storage_uri: checked_uri("StorageUri", raw.storage_uri)?,
        })
    }
}

impl fmt::Debug for CheckOutGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckOutGrant")
            .field("check_in_token", &"[REDACTED]")
            .field("storage_container_name", &self.storage_container_name)
            .field("storage_type", &self.storage_type)
            .field("shared_access_uri", &"[REDACTED]")
            .field("shared_access_signature", &"[REDACTED]")
            .field("storage_uri", &self.storage_uri)
            .finish()
    }
}

/// Read-only capability to fetch ciphertext directly from storage.
#[derive(Clone, PartialEq, Eq)]
pub struct ReadGrant {
    /// Name of the storage container holding the ciphertext.
    pub storage_container_name: String,
    /// Storage backend type code.
    pub storage_type: String,
    /// Pre-signed URI to the ciphertext blob (SAS query included).
    pub shared_access_uri: String,
    /// The shared-access signature on its own.
    pub shared_access_signature: String,
    /// Storage endpoint URI without signature.
    pub storage_uri: String,
}

impl ReadGrant {
    /// Decode a `ReadEntityContainerBlob` response body.
    pub fn from_json(body: &str) -> Result<Self, WireError> {
        let raw: RawStorageGrant = decode("ReadEntityContainerBlob", body)?;
        Ok(Self {
            storage_container_name: raw.container_storage_name,
            storage_type: literal(&raw.storage_type),
            shared_access_uri: checked_uri(
                "SharedAccessSignatureUri",
                raw.shared_access_signature_uri,
            )?,
            shared_access_signature: raw.shared_access_signature,
            storage_uri: checked_uri("StorageUri", raw.storage_uri)?,
        })
    }
}

impl fmt::Debug for ReadGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadGrant")
            .field("storage_container_name", &self.storage_container_name)
            .field("storage_type", &self.storage_type)
            .field("shared_access_uri", &"[REDACTED]")
            .field("shared_access_signature", &"[REDACTED]")
            .field("storage_uri", &self.storage_uri)
            .finish()
    }
}

/// A blob listed by `GetContainerBlobInfoListByState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    /// Server-issued blob ID.
    pub blob_id: BlobId,
    /// Display name.
    pub blob_name: String,
}

#[derive(Deserialize)]
struct RawBlobInfo {
    #[serde(rename = "BlobID")]
    blob_id: Value,
    #[serde(rename = "BlobName")]
    blob_name: String,
}

#[derive(Deserialize)]
struct RawBlobInfoArray {
    #[serde(rename = "BlobInfoArray")]
    items: Vec<RawBlobInfo>,
}

impl BlobInfo {
    /// Decode a `{"BlobInfoArray": [...]}` response body.
    pub fn list_from_json(body: &str) -> Result<Vec<Self>, WireError> {
        let raw: RawBlobInfoArray = decode("BlobInfoArray", body)?;
        Ok(raw
            .items
            .into_iter()
            .map(|item| Self {
                blob_id: BlobId::new(literal(&item.blob_id)),
                blob_name: item.blob_name,
            })
            .collect())
    }
}

/// A container listed by `GetContainerInfoListByContext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Container ID.
    pub container_id: ContainerId,
    /// Container display name.
    pub container_name: String,
}

#[derive(Deserialize)]
struct RawContainerInfo {
    #[serde(rename = "ContainerID")]
    container_id: Value,
    #[serde(rename = "ContainerName")]
    container_name: String,
}

#[derive(Deserialize)]
struct RawContainerInfoArray {
    #[serde(rename = "ContainerInfoArray")]
    items: Vec<RawContainerInfo>,
}

impl ContainerInfo {
    /// Decode a `{"ContainerInfoArray": [...]}` response body.
    pub fn list_from_json(body: &str) -> Result<Vec<Self>, WireError> {
        let raw: RawContainerInfoArray = decode("ContainerInfoArray", body)?;
        raw.items
            .into_iter()
            .map(|item| {
                Ok(Self {
                    container_id: parse_container_id(&item.container_id)?,
                    container_name: item.container_name,
                })
            })
            .collect()
    }
}

/// Configuration of a newly created secure-file-transfer container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftContainerConfig {
    /// Container ID.
    pub container_id: ContainerId,
    /// Free-form description.
    pub description: String,
    /// Human-friendly ID.
    pub friendly_id: String,
    /// Container name.
    pub name: String,
}

#[derive(Deserialize)]
struct RawSftContainerConfig {
    #[serde(rename = "ContainerID")]
    container_id: Value,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "FriendlyID")]
    friendly_id: Value,
    #[serde(rename = "Name")]
    name: String,
}

impl SftContainerConfig {
    /// Decode a `CreateEntitySFTContainer` response body.
    pub fn from_json(body: &str) -> Result<Self, WireError> {
        let raw: RawSftContainerConfig = decode("CreateEntitySFTContainer", body)?;
        Ok(Self {
            container_id: parse_container_id(&raw.container_id)?,
            description: raw.description.unwrap_or_default(),
            friendly_id: literal(&raw.friendly_id),
            name: raw.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANT: &str = r#"{
        "CheckInToken": "tok-1",
        "ContainerStorageName": "c0001",
        "SharedAccessSignature": "sv=2012-02-12&sig=abc",
        "SharedAccessSignatureUri": "https://store.example.net/c0001/blob?sv=2012-02-12&sig=abc",
        "StorageType": 1,
        "StorageUri": "https://store.example.net/"
    }"#;

    #[test]
    fn key_material_accepts_numeric_strength() {
        let body = r#"{"SessionKeyBase64":"a2V5","SessionIVBase64":"aXY=","SymmetricKeyStrength":2}"#;
        let km = ContainerKeyMaterial::from_json(body).unwrap();
        assert_eq!(km.key_base64(), "a2V5");
        assert_eq!(km.iv_base64(), "aXY=");
        assert_eq!(km.strength(), SymmetricKeyStrength::Aes256);
    }

    #[test]
    fn key_material_accepts_string_strength() {
        let body = r#"{"SessionKeyBase64":"k","SessionIVBase64":"i","SymmetricKeyStrength":"1"}"#;
        let km = ContainerKeyMaterial::from_json(body).unwrap();
        assert_eq!(km.strength(), SymmetricKeyStrength::Aes128);
    }

    #[test]
    fn key_material_rejects_unknown_strength() {
        let body = r#"{"SessionKeyBase64":"k","SessionIVBase64":"i","SymmetricKeyStrength":9}"#;
        assert!(matches!(
            ContainerKeyMaterial::from_json(body),
            Err(WireError::UnknownCode { .. })
        ));
    }

    #[test]
    fn key_material_missing_field_is_error() {
        let body = r#"{"SessionKeyBase64":"k","SymmetricKeyStrength":2}"#;
        let err = ContainerKeyMaterial::from_json(body).unwrap_err();
        assert!(err.to_string().contains("SessionIVBase64"), "got: {}", err);
    }

    #[test]
    fn key_material_debug_redacts_secrets() {
        let km = ContainerKeyMaterial::new("SECRETKEY", "SECRETIV", SymmetricKeyStrength::Aes256);
        let debug = format!("{:?}", km);
        assert!(!debug.contains("SECRETKEY"));
        assert!(!debug.contains("SECRETIV"));
        assert!(debug.contains("Aes256"));
    }

    #[test]
    fn check_out_grant_parses_all_fields() {
        let grant = CheckOutGrant::from_json(GRANT).unwrap();
        assert_eq!(grant.check_in_token, "tok-1");
        assert_eq!(grant.storage_container_name, "c0001");
        assert_eq!(grant.storage_type, "1");
        assert!(grant.shared_access_uri.ends_with("sig=abc"));
        assert_eq!(grant.storage_uri, "https://store.example.net/");
    }

    #[test]
    fn check_out_grant_requires_token() {
        let body = GRANT.replace("\"CheckInToken\": \"tok-1\",", "");
        let err = CheckOutGrant::from_json(&body).unwrap_err();
        assert!(err.to_string().contains("CheckInToken"), "got: {}", err);
    }

    #[test]
    fn grant_rejects_invalid_uri() {
        let body = GRANT.replace(
            "https://store.example.net/c0001/blob?sv=2012-02-12&sig=abc",
            "not a uri",
        );
        assert!(matches!(
            CheckOutGrant::from_json(&body),
            Err(WireError::InvalidUri { field: "SharedAccessSignatureUri", .. })
        ));
    }

    #[test]
    fn read_grant_ignores_check_in_token() {
        let grant = ReadGrant::from_json(GRANT).unwrap();
        assert_eq!(grant.storage_container_name, "c0001");
        let debug = format!("{:?}", grant);
        assert!(!debug.contains("sig=abc"));
    }

    #[test]
    fn blob_info_list_parses() {
        let body = r#"{"BlobInfoArray":[{"BlobID":"b-1","BlobName":"a.txt"},{"BlobID":"b-2","BlobName":"b.txt"}]}"#;
        let list = BlobInfo::list_from_json(body).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].blob_id.as_str(), "b-2");
        assert_eq!(list[1].blob_name, "b.txt");
    }

    #[test]
    fn blob_info_list_requires_wrapper_key() {
        assert!(BlobInfo::list_from_json("[]").is_err());
        assert!(BlobInfo::list_from_json(r#"{"BlobInfoArray":[]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn container_info_accepts_string_or_number_ids() {
        let body = r#"{"ContainerInfoArray":[{"ContainerID":12,"ContainerName":"x"},{"ContainerID":"13","ContainerName":"y"}]}"#;
        let list = ContainerInfo::list_from_json(body).unwrap();
        assert_eq!(list[0].container_id, ContainerId::new(12));
        assert_eq!(list[1].container_id, ContainerId::new(13));
    }

    #[test]
    fn container_info_rejects_non_numeric_id() {
        let body = r#"{"ContainerInfoArray":[{"ContainerID":"abc","ContainerName":"x"}]}"#;
        assert!(matches!(
            ContainerInfo::list_from_json(body),
            Err(WireError::InvalidScalar { .. })
        ));
    }

    #[test]
    fn sft_container_config_parses() {
        let body = r#"{"ContainerID":99,"Description":"d","FriendlyID":"ABC123","Name":"n"}"#;
        let cfg = SftContainerConfig::from_json(body).unwrap();
        assert_eq!(cfg.container_id.value(), 99);
        assert_eq!(cfg.friendly_id, "ABC123");
        assert_eq!(cfg.description, "d");
    }
}
