//! CLI command implementations.

pub mod blobs;
pub mod containers;
pub mod init;
pub mod ping;
pub mod transfer;
