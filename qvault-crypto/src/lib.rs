//! Key derivation and authenticated encryption for qvault.
//!
//! Provides the cryptographic core of the vault:
//! - A simulated single-qubit measurement that turns a password seed into one bit
//! - Key derivation mixing that bit into 32 fresh CSPRNG bytes
//! - ChaCha20-Poly1305 tokens carrying version, timestamp and nonce
//!
//! # Key derivation
//!
//! 1. **Seed**: the password's UTF-8 bytes read as a big-endian integer.
//! 2. **Bit**: one measurement of the qubit simulator seeded with that integer.
//! 3. **Key**: 32 random bytes, every byte XORed with the measured bit.
//!
//! Step 3 draws fresh randomness on every call, so two derivations from the
//! same password almost never agree. A token sealed under one derivation will
//! fail authentication under the next.

mod bit_source;
mod cipher;
mod error;
mod key;

pub use bit_source::{BitSource, QubitSimulator, QubitState};
pub use cipher::{
    CipherKey, NONCE_SIZE, TAG_SIZE, TOKEN_VERSION, Token, decrypt, decrypt_with_ttl, encrypt,
    token_timestamp,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{KEY_SIZE, KeyDeriver, KeyMaterial, Seed};
