//! # sft-types
//!
//! Wire format types for the sealbox secure file transfer client.
//!
//! This crate provides the foundational types used across all sealbox crates:
//! - [`ContainerId`], [`BlobId`], [`BlobHandle`] - Identity types
//! - [`EntityType`], [`BlobState`], [`SymmetricKeyStrength`] and friends -
//!   closed enums with an exhaustive mapping to their wire codes
//! - [`ContainerKeyMaterial`], [`CheckOutGrant`], [`ReadGrant`] - records
//!   returned by the REST API
//! - [`scalar`] - coercion of the literal values returned by scalar calls
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod records;
pub mod scalar;
mod wire;

pub use error::WireError;
pub use ids::{BlobHandle, BlobId, ContainerId};
pub use records::{
    BlobInfo, CheckOutGrant, ContainerInfo, ContainerKeyMaterial, ReadGrant, SftContainerConfig,
};
pub use wire::{
    ApiVersion, BlobState, ContainerType, ContentFormat, ContextSetting, EntityType,
    SymmetricKeyStrength,
};
