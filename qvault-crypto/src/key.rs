//! Password seeds, key material, and the key deriver.

use crate::bit_source::{BitSource, QubitSimulator};
use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use std::fmt;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of symmetric keys in bytes.
pub const KEY_SIZE: usize = 32;

/// A password read as an unsigned big-endian integer.
///
/// Stored as the canonical magnitude: leading zero bytes are stripped, so the
/// empty password and a password of only NUL characters are both zero.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    magnitude: Vec<u8>,
}

impl Seed {
    /// Interprets the password's UTF-8 bytes as a big-endian integer.
    pub fn from_password(password: &str) -> Self {
        Self::from_be_bytes(password.as_bytes())
    }

    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self {
            magnitude: bytes[start..].to_vec(),
        }
    }

    /// Canonical big-endian bytes (empty for zero).
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.magnitude
    }

    #[cfg(test)]
    fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// The seed as a `u128`, if it fits.
    #[cfg(test)]
    fn to_u128(&self) -> Option<u128> {
        if self.magnitude.len() > 16 {
            return None;
        }
        Some(
            self.magnitude
                .iter()
                .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)),
        )
    }
}

// The seed is the password; never print it.
impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed(<{} bytes>)", self.magnitude.len())
    }
}

/// 32 bytes of symmetric key material. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_SIZE],
}

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Padded base64-url encoding, the form the cipher is keyed with.
    pub fn to_base64url(&self) -> String {
        URL_SAFE.encode(self.bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Derives key material from a password.
///
/// The password only decides which bit gets XORed into a fresh random block,
/// so derivations are not reproducible across calls.
#[derive(Clone, Debug)]
pub struct KeyDeriver<B = QubitSimulator> {
    source: B,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(QubitSimulator::default())
    }
}

impl<B: BitSource> KeyDeriver<B> {
    pub fn new(source: B) -> Self {
        Self { source }
    }

    pub fn bit_source(&self) -> &B {
        &self.source
    }

    pub fn derive(&self, password: &str) -> CryptoResult<KeyMaterial> {
        let seed = Seed::from_password(password);
        let bit = self.source.measure_one_bit(&seed)?;
        if bit > 1 {
            return Err(CryptoError::SourceUnavailable(format!(
                "measurement produced non-binary outcome {bit}"
            )));
        }
        trace!(bit, "measured key derivation bit");

        let mut block = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut block);
        let key = mix_bit(&block, bit);
        block.zeroize();
        Ok(key)
    }
}

/// XORs `bit` into every byte of `block`.
fn mix_bit(block: &[u8; KEY_SIZE], bit: u8) -> KeyMaterial {
    let mut bytes = *block;
    for byte in &mut bytes {
        *byte ^= bit;
    }
    KeyMaterial::from_bytes(bytes)
}
