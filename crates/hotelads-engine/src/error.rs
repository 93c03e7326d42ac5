//! Ad engine error types.

use hotelads_cache::CacheError;
use hotelads_codec::{CodecError, ContextId, HotelId, Zipcode};
use thiserror::Error;

/// Result type for ad engine operations.
pub type AdResult<T> = Result<T, AdError>;

/// Errors that can occur while recommending, rotating or rendering ads.
#[derive(Error, Debug)]
pub enum AdError {
    /// The hotel provider has no data for the zipcode.
    #[error("Zipcode not in database: {0}")]
    ZipcodeNotInDatabase(Zipcode),

    /// A hotel id referenced by a context has no cached record.
    #[error("Hotel not found in cache: {0}")]
    HotelNotFoundInCache(HotelId),

    /// The context has no persisted zipcode, so it does not exist.
    #[error("No zipcode assigned to context {0}")]
    NoZipcodeAssignedToContext(ContextId),

    /// Bundle id failed decoding or validation.
    #[error("Invalid data bundle id: {0}")]
    InvalidDataBundleId(String),

    /// Context token failed authentication or did not hold a context id.
    #[error("Invalid context token")]
    InvalidContextToken,

    /// Too few distinct candidates to fill every ad slot.
    #[error("Insufficient candidates: required {required}, available {available}")]
    InsufficientCandidates { required: usize, available: usize },

    /// Unrecognised sort criterion under a rejecting parse policy.
    #[error("Unknown sort criterion: {0}")]
    UnknownCriterion(String),

    /// Image rendering failed or timed out.
    #[error("Render error: {0}")]
    Render(String),

    /// Reading or writing a persisted ad image failed.
    #[error("Image I/O error: {0}")]
    ImageIo(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache store error.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Other codec errors (invalid zipcode, invalid key, ...).
    #[error("Codec error: {0}")]
    Codec(CodecError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdError {
    /// Whether the error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ZipcodeNotInDatabase(_)
                | Self::HotelNotFoundInCache(_)
                | Self::NoZipcodeAssignedToContext(_)
        )
    }

    /// Whether the error was caused by caller input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDataBundleId(_)
                | Self::InvalidContextToken
                | Self::UnknownCriterion(_)
                | Self::Codec(CodecError::InvalidZipcode(_) | CodecError::InvalidId(_))
        )
    }
}

impl From<CodecError> for AdError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidContextToken => Self::InvalidContextToken,
            CodecError::InvalidDataBundleId(msg) => Self::InvalidDataBundleId(msg),
            other => Self::Codec(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_errors_map_to_domain_variants() {
        assert!(matches!(
            AdError::from(CodecError::InvalidContextToken),
            AdError::InvalidContextToken
        ));
        assert!(matches!(
            AdError::from(CodecError::InvalidDataBundleId("short".into())),
            AdError::InvalidDataBundleId(_)
        ));
        assert!(matches!(
            AdError::from(CodecError::InvalidKey),
            AdError::Codec(CodecError::InvalidKey)
        ));
    }

    #[test]
    fn test_error_classification() {
        assert!(AdError::HotelNotFoundInCache(HotelId::new(1)).is_not_found());
        assert!(AdError::NoZipcodeAssignedToContext(ContextId::new(1)).is_not_found());
        assert!(AdError::InvalidContextToken.is_client_error());
        assert!(!AdError::Render("boom".into()).is_client_error());
        assert!(!AdError::InsufficientCandidates {
            required: 4,
            available: 2
        }
        .is_not_found());
    }
}
