//! Closed enums and their wire representations.
//!
//! Each enum maps exhaustively to the literal the REST API expects (or
//! returns). Decoding an unknown literal is an error, never a silent default.

use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// How the authenticating entity is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntityType {
    /// Entity is identified by email address.
    #[default]
    EmailAddress,
    /// Entity is identified by a name identifier.
    NameIdentifier,
    /// Entity is identified by its numeric entity ID.
    EntityId,
}

impl EntityType {
    /// All variants, in wire-code order.
    pub const ALL: [Self; 3] = [Self::EmailAddress, Self::NameIdentifier, Self::EntityId];

    /// Wire code sent in the `EntityType` form field.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::EmailAddress => "0",
            Self::NameIdentifier => "1",
            Self::EntityId => "2",
        }
    }

    /// Decode a wire code.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "EntityType", value)
    }
}

impl FromStr for EntityType {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "email" | "email-address" => Ok(Self::EmailAddress),
            "name" | "name-identifier" => Ok(Self::NameIdentifier),
            "id" | "entity-id" => Ok(Self::EntityId),
            _ => Self::from_wire(s),
        }
    }
}

/// Server-side lifecycle state of a blob.
///
/// Authoritative only on the server: the client passes a state as a list
/// filter and never tracks transitions locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobState {
    /// Blob entry created, no content yet.
    Created,
    /// Entity is uploading (blob is checked out for writing).
    Uploading,
    /// Content committed and checked in.
    Ready,
    /// Checked out.
    CheckedOut,
    /// Entity is modifying.
    Modifying,
    /// No state.
    None,
}

impl BlobState {
    /// All variants, in wire-code order.
    pub const ALL: [Self; 6] = [
        Self::Created,
        Self::Uploading,
        Self::Ready,
        Self::CheckedOut,
        Self::Modifying,
        Self::None,
    ];

    /// Wire code sent in the `BlobState` form field.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Created => "0",
            Self::Uploading => "1",
            Self::Ready => "2",
            Self::CheckedOut => "3",
            Self::Modifying => "4",
            Self::None => "5",
        }
    }

    /// Decode a wire code.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "BlobState", value)
    }

    /// Lower-case name used on the command line and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Uploading => "uploading",
            Self::Ready => "ready",
            Self::CheckedOut => "checked-out",
            Self::Modifying => "modifying",
            Self::None => "none",
        }
    }
}

impl fmt::Display for BlobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlobState {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name() == lowered)
            .map_or_else(|| Self::from_wire(s), Ok)
    }
}

/// Strength of the symmetric key issued for a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricKeyStrength {
    /// No key material.
    None,
    /// AES with a 128-bit key.
    Aes128,
    /// AES with a 256-bit key.
    Aes256,
}

impl SymmetricKeyStrength {
    /// All variants, in wire-code order.
    pub const ALL: [Self; 3] = [Self::None, Self::Aes128, Self::Aes256];

    /// Wire code.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::None => "0",
            Self::Aes128 => "1",
            Self::Aes256 => "2",
        }
    }

    /// Decode a wire code.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "SymmetricKeyStrength", value)
    }

    /// Expected raw key length in bytes, `None` when no key is issued.
    pub fn key_len(&self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Aes128 => Some(16),
            Self::Aes256 => Some(32),
        }
    }
}

/// Container type filter for container listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContainerType {
    /// Default container type.
    #[default]
    Default,
}

impl ContainerType {
    /// All variants.
    pub const ALL: [Self; 1] = [Self::Default];

    /// Wire code.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Default => "5",
        }
    }

    /// Decode a wire code.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "ContainerType", value)
    }
}

/// Context-level settings that can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextSetting {
    /// Company display name.
    CompanyName,
    /// URL of the company logo.
    CompanyLogoUrl,
}

impl ContextSetting {
    /// All variants.
    pub const ALL: [Self; 2] = [Self::CompanyName, Self::CompanyLogoUrl];

    /// Wire value.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::CompanyName => "CompanyName",
            Self::CompanyLogoUrl => "CompanyLogoUrl",
        }
    }

    /// Decode a wire value.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "ContextSetting", value)
    }
}

impl FromStr for ContextSetting {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "company-name" => Ok(Self::CompanyName),
            "company-logo-url" => Ok(Self::CompanyLogoUrl),
            _ => Self::from_wire(s),
        }
    }
}

/// API version path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApiVersion {
    /// Whatever the server currently considers latest.
    #[default]
    Latest,
    /// Version 2.
    V2,
}

impl ApiVersion {
    /// All variants.
    pub const ALL: [Self; 2] = [Self::Latest, Self::V2];

    /// Path segment inserted after the base URL.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::V2 => "v2",
        }
    }

    /// Decode a path segment.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "ApiVersion", value)
    }
}

impl FromStr for ApiVersion {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(&s.to_ascii_lowercase())
    }
}

/// Response content format requested through the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentFormat {
    /// JSON bodies.
    #[default]
    Json,
}

impl ContentFormat {
    /// All variants.
    pub const ALL: [Self; 1] = [Self::Json];

    /// MIME type.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
        }
    }

    /// Decode a MIME type.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        lookup(&Self::ALL, Self::as_wire, "ContentFormat", value)
    }
}

fn lookup<T: Copy>(
    all: &[T],
    as_wire: fn(&T) -> &'static str,
    kind: &'static str,
    value: &str,
) -> Result<T, WireError> {
    let trimmed = value.trim().trim_matches('"');
    all.iter()
        .copied()
        .find(|v| as_wire(v) == trimmed)
        .ok_or_else(|| WireError::UnknownCode {
            kind,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_state_codes_are_sequential() {
        let codes: Vec<&str> = BlobState::ALL.iter().map(BlobState::as_wire).collect();
        assert_eq!(codes, vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn every_variant_decodes_from_its_own_code() {
        for state in BlobState::ALL {
            assert_eq!(BlobState::from_wire(state.as_wire()).unwrap(), state);
        }
        for entity in EntityType::ALL {
            assert_eq!(EntityType::from_wire(entity.as_wire()).unwrap(), entity);
        }
        for strength in SymmetricKeyStrength::ALL {
            assert_eq!(
                SymmetricKeyStrength::from_wire(strength.as_wire()).unwrap(),
                strength
            );
        }
        for setting in ContextSetting::ALL {
            assert_eq!(ContextSetting::from_wire(setting.as_wire()).unwrap(), setting);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = SymmetricKeyStrength::from_wire("7").unwrap_err();
        assert!(matches!(
            err,
            WireError::UnknownCode { kind: "SymmetricKeyStrength", .. }
        ));
        assert!(BlobState::from_wire("").is_err());
        assert!(ContainerType::from_wire("0").is_err());
    }

    #[test]
    fn quoted_codes_are_accepted() {
        assert_eq!(
            SymmetricKeyStrength::from_wire("\"2\"").unwrap(),
            SymmetricKeyStrength::Aes256
        );
    }

    #[test]
    fn key_len_matches_strength() {
        assert_eq!(SymmetricKeyStrength::None.key_len(), None);
        assert_eq!(SymmetricKeyStrength::Aes128.key_len(), Some(16));
        assert_eq!(SymmetricKeyStrength::Aes256.key_len(), Some(32));
    }

    #[test]
    fn blob_state_parses_names_and_codes() {
        assert_eq!("ready".parse::<BlobState>().unwrap(), BlobState::Ready);
        assert_eq!("Checked-Out".parse::<BlobState>().unwrap(), BlobState::CheckedOut);
        assert_eq!("2".parse::<BlobState>().unwrap(), BlobState::Ready);
        assert!("finished".parse::<BlobState>().is_err());
    }

    #[test]
    fn entity_type_parses_aliases() {
        assert_eq!("email".parse::<EntityType>().unwrap(), EntityType::EmailAddress);
        assert_eq!("entity-id".parse::<EntityType>().unwrap(), EntityType::EntityId);
        assert_eq!("1".parse::<EntityType>().unwrap(), EntityType::NameIdentifier);
    }

    #[test]
    fn api_version_path_segments() {
        assert_eq!(ApiVersion::Latest.as_wire(), "latest");
        assert_eq!("V2".parse::<ApiVersion>().unwrap(), ApiVersion::V2);
        assert_eq!(ContentFormat::Json.as_wire(), "application/json");
        assert_eq!(ContainerType::Default.as_wire(), "5");
    }
}
