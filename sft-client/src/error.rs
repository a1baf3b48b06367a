//! Error types for sft-client.
//!
//! Each layer has its own error: [`ApiError`] for the REST API,
//! [`TransferError`] for the block-storage channel, and [`ClientError`] for
//! the whole-file operations. `ClientError` sorts every failure into one of
//! six [`ErrorKind`]s and keeps the first root cause as its source.

use sft_content::CipherError;
use sft_core::PlanError;
use sft_types::WireError;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used where the cause comes from different HTTP stacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from REST API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("HTTP error calling {endpoint}: {source}")]
    Transport {
        /// Endpoint name.
        endpoint: &'static str,
        /// Underlying transport failure.
        #[source]
        source: BoxError,
    },

    /// The API answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// Endpoint name.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The API answered, but the body could not be interpreted.
    #[error("unexpected response from {endpoint}: {source}")]
    Wire {
        /// Endpoint name.
        endpoint: &'static str,
        /// Decoding failure.
        #[source]
        source: WireError,
    },
}

impl ApiError {
    /// Endpoint the error came from.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Wire { endpoint, .. } => endpoint,
        }
    }
}

/// Errors from the block-storage channel.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The request never produced a response.
    #[error("{operation} request failed: {source}")]
    Http {
        /// Operation being performed ("put block", "download", ...).
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: BoxError,
    },

    /// Storage answered a download with something other than 200 OK.
    #[error("{operation} returned HTTP {status}")]
    Status {
        /// Operation being performed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The download destination already exists.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Reading or writing a local file failed.
    #[error("{action} {} failed: {source}", path.display())]
    Io {
        /// What was being done.
        action: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file cannot be split into an acceptable block list.
    #[error("cannot plan upload: {0}")]
    Plan(#[from] PlanError),
}

impl TransferError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Broad classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied an unusable argument (missing file, existing destination).
    Input,
    /// The liveness probe failed.
    ServiceUnavailable,
    /// The API rejected a call.
    Remote,
    /// A network exchange failed.
    Transport,
    /// Key material or the cipher failed.
    Crypto,
    /// A response did not have the expected shape.
    Protocol,
}

/// Errors from whole-file operations.
///
/// The message names the operation that failed; the source is the first
/// root cause.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller supplied an unusable argument.
    #[error("invalid input: {0}")]
    Input(String),

    /// The service did not answer the liveness probe.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The API rejected a call.
    #[error("remote error: {message}")]
    Remote {
        /// Operation and cause.
        message: String,
        /// Root cause, when there is one.
        #[source]
        source: Option<ApiError>,
    },

    /// A network exchange failed.
    #[error("transport error: {message}")]
    Transport {
        /// Operation and cause.
        message: String,
        /// Root cause, when there is one.
        #[source]
        source: Option<BoxError>,
    },

    /// Key material or the cipher failed.
    #[error("crypto error: {message}")]
    Crypto {
        /// Operation and cause.
        message: String,
        /// Root cause.
        #[source]
        source: Option<CipherError>,
    },

    /// A response did not have the expected shape.
    #[error("protocol error: {message}")]
    Protocol {
        /// Operation and cause.
        message: String,
        /// Root cause, when there is one.
        #[source]
        source: Option<WireError>,
    },
}

impl ClientError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Crypto { .. } => ErrorKind::Crypto,
            Self::Protocol { .. } => ErrorKind::Protocol,
        }
    }

    /// A transport error without an underlying cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// A remote error without an underlying cause.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            source: None,
        }
    }

    /// A protocol error without an underlying cause.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an API error with the operation that was attempted.
    pub fn api(context: impl std::fmt::Display, err: ApiError) -> Self {
        let message = format!("{}: {}", context, err);
        match err {
            ApiError::Transport { source, .. } => Self::Transport {
                message,
                source: Some(source),
            },
            ApiError::Status { .. } => Self::Remote {
                message,
                source: Some(err),
            },
            ApiError::Wire { source, .. } => Self::Protocol {
                message,
                source: Some(source),
            },
        }
    }

    /// Wrap a block-storage error with the operation that was attempted.
    pub fn transfer(context: impl std::fmt::Display, err: TransferError) -> Self {
        let message = format!("{}: {}", context, err);
        match err {
            TransferError::Plan(_) => Self::Input(message),
            other => Self::Transport {
                message,
                source: Some(Box::new(other)),
            },
        }
    }

    /// Wrap a cipher error with the operation that was attempted.
    pub fn cipher(context: impl std::fmt::Display, err: CipherError) -> Self {
        Self::Crypto {
            message: format!("{}: {}", context, err),
            source: Some(err),
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        Self::api(err.endpoint(), err)
    }
}

impl From<TransferError> for ClientError {
    fn from(err: TransferError) -> Self {
        Self::transfer("block storage", err)
    }
}

impl From<CipherError> for ClientError {
    fn from(err: CipherError) -> Self {
        Self::cipher("cipher", err)
    }
}
