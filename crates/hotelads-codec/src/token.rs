//! Encrypted context tokens.
//!
//! A context token is the decimal context id sealed with Fernet (AES-128-CBC
//! plus HMAC-SHA256, URL-safe base64 output). Decoding authenticates before
//! decrypting and never falls back to reading the token as a plaintext id.

use std::fmt;
use std::sync::Arc;

use fernet::Fernet;
use tracing::debug;

use crate::{CodecError, CodecResult, ContextId};

/// Symmetric codec turning context ids into opaque URL tokens.
#[derive(Clone)]
pub struct ContextTokenCodec {
    cipher: Arc<Fernet>,
}

impl ContextTokenCodec {
    /// Create a codec from a URL-safe base64 encoded 32-byte key.
    pub fn new(key: &str) -> CodecResult<Self> {
        let cipher = Fernet::new(key.trim()).ok_or(CodecError::InvalidKey)?;
        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }

    /// Generate a fresh random key suitable for [`ContextTokenCodec::new`].
    pub fn generate_key() -> String {
        Fernet::generate_key()
    }

    /// Seal a context id into a token.
    pub fn encode(&self, id: ContextId) -> String {
        self.cipher.encrypt(id.to_string().as_bytes())
    }

    /// Authenticate and open a token.
    ///
    /// Non-digit characters in the plaintext are stripped before parsing.
    /// Anything that fails authentication, holds no digits, or parses to zero
    /// is rejected.
    pub fn decode(&self, token: &str) -> CodecResult<ContextId> {
        let plaintext = self.cipher.decrypt(token.trim()).map_err(|_| {
            debug!("context token failed authentication");
            CodecError::InvalidContextToken
        })?;

        let digits: String = String::from_utf8_lossy(&plaintext)
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        match digits.parse::<u64>() {
            Ok(id) if id > 0 => Ok(ContextId::new(id)),
            _ => Err(CodecError::InvalidContextToken),
        }
    }
}

impl fmt::Debug for ContextTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextTokenCodec").finish_non_exhaustive()
    }
}
