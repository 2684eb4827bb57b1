//! Vault error types.

use qvault_crypto::CryptoError;
use qvault_storage::StorageError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors surfaced by [`FileVault`](crate::FileVault). Nothing is retried.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("bit source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("authentication failed (key does not match stored ciphertext)")]
    Authentication,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VaultError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<CryptoError> for VaultError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::SourceUnavailable(msg) => Self::SourceUnavailable(msg),
            CryptoError::Authentication => Self::Authentication,
            CryptoError::MalformedCiphertext(msg) => Self::MalformedCiphertext(msg),
            other => Self::Crypto(other),
        }
    }
}
