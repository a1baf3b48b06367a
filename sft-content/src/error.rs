//! Error types for sft-content.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while encrypting or decrypting a file.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Key material is unusable (bad Base64, wrong length, no strength).
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Source and destination are the same file.
    #[error("source and destination are the same file: {}", path.display())]
    SamePath {
        /// The shared path.
        path: PathBuf,
    },

    /// Reading or writing a file failed.
    #[error("{action} {} failed: {source}", path.display())]
    Io {
        /// What was being done ("reading", "creating", ...).
        action: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Ciphertext length is not a positive multiple of the cipher block.
    #[error("ciphertext of {len} bytes is truncated")]
    Truncated {
        /// Bytes of ciphertext read.
        len: u64,
    },

    /// Padding check failed after decryption.
    /// No details provided to prevent padding oracle attacks.
    #[error("decryption failed")]
    DecryptionFailed,
}

impl CipherError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
