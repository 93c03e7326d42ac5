//! Codec errors.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Identifier encoding/decoding error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Context token failed authentication or did not hold a context id.
    #[error("invalid context token")]
    InvalidContextToken,

    /// Bundle id is malformed or failed validation.
    #[error("invalid data bundle id: {0}")]
    InvalidDataBundleId(String),

    /// Zipcode is not five digits.
    #[error("invalid zipcode: {0:?}")]
    InvalidZipcode(String),

    /// Identifier is not a positive integer.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// Encryption key is not a URL-safe base64 encoded 32-byte key.
    #[error("invalid encryption key")]
    InvalidKey,
}
