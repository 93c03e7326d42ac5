//! Cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when talking to the cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Backend operation failed.
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// Operation against a key holding the wrong kind of value.
    #[error("Wrong type for key: {0}")]
    WrongType(String),

    /// Increment of a value that is not an integer.
    #[error("Value at {0} is not an integer")]
    NotAnInteger(String),

    /// A pipeline reply did not have the expected shape.
    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    /// A pipeline failed part way through. Keys touched by it are in an
    /// unknown state and must be re-read before retrying.
    #[error("Pipeline failed after {completed} of {total} commands: {source}")]
    PipelineAborted {
        completed: usize,
        total: usize,
        #[source]
        source: Box<CacheError>,
    },
}
