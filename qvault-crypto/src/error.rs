//! Error types for the crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors produced while deriving keys or sealing/opening tokens.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The measurement backend could not produce a bit.
    #[error("bit source unavailable: {0}")]
    SourceUnavailable(String),

    /// The token's authentication tag did not verify under the supplied key.
    #[error("authentication failed (wrong key or tampered data)")]
    Authentication,

    /// The input is not a structurally valid token.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// The AEAD refused to seal the plaintext.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Key material did not decode to exactly 32 bytes.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The token verified but is older than the caller's TTL.
    #[error("token expired: issued at {issued_at}, ttl {ttl_secs}s")]
    TokenExpired { issued_at: u64, ttl_secs: u64 },
}
