//! Error types for sealbox wire data.

use thiserror::Error;

/// Errors raised while interpreting data received from the REST API.
///
/// Every variant describes a malformed or unexpected server response; none
/// of them are retryable.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON body could not be decoded into the expected record.
    #[error("malformed {what} response: {source}")]
    Json {
        /// Which record was being decoded.
        what: &'static str,
        /// Underlying serde_json error (includes missing-field details).
        #[source]
        source: serde_json::Error,
    },

    /// A wire code did not match any variant of a closed enum.
    #[error("unknown {kind} wire value: {value:?}")]
    UnknownCode {
        /// Enum being decoded.
        kind: &'static str,
        /// The value the server sent.
        value: String,
    },

    /// A scalar literal could not be coerced to the expected type.
    #[error("invalid {expected} literal: {value:?}")]
    InvalidScalar {
        /// Expected scalar type.
        expected: &'static str,
        /// Raw literal from the response body.
        value: String,
    },

    /// A URI field could not be parsed.
    #[error("invalid URI in field {field}: {reason}")]
    InvalidUri {
        /// JSON field name.
        field: &'static str,
        /// Parser message.
        reason: String,
    },
}
