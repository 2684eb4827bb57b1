//! Authenticated encryption tokens.
//!
//! A token is the padded base64-url encoding of
//! `version || timestamp || nonce || ciphertext`, where the ciphertext is
//! ChaCha20-Poly1305 output with its 16-byte tag appended. Version and
//! timestamp are bound to the ciphertext as associated data, so the token is
//! self-contained: the key is the only other input decryption needs.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KEY_SIZE, KeyMaterial};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::Utc;
use rand::RngCore;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Leading byte of every token.
pub const TOKEN_VERSION: u8 = 0xA1;

/// Size of the ChaCha20-Poly1305 nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const TIMESTAMP_SIZE: usize = 8;
const HEADER_SIZE: usize = 1 + TIMESTAMP_SIZE;
const MIN_TOKEN_SIZE: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

/// Cipher key, built from the base64-url form of [`KeyMaterial`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    /// Decodes a padded base64-url key. It must decode to exactly 32 bytes.
    pub fn from_base64url(encoded: &str) -> CryptoResult<Self> {
        let mut decoded = URL_SAFE
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: 0,
            })?;
        let key = KeyMaterial::from_slice(&decoded);
        decoded.zeroize();
        Ok(Self {
            bytes: *key?.as_bytes(),
        })
    }

    pub fn from_key_material(key: &KeyMaterial) -> CryptoResult<Self> {
        Self::from_base64url(&key.to_base64url())
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.bytes))
    }
}

/// A parsed token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub version: u8,
    /// Unix seconds at which the token was sealed.
    pub timestamp: u64,
    pub nonce: [u8; NONCE_SIZE],
    /// AEAD ciphertext with the tag appended.
    pub ciphertext: Vec<u8>,
}

impl Token {
    /// Decodes and splits a token without verifying it.
    pub fn parse(data: &[u8]) -> CryptoResult<Self> {
        let raw = URL_SAFE
            .decode(data)
            .map_err(|e| CryptoError::MalformedCiphertext(format!("base64 decode: {e}")))?;

        if raw.len() < MIN_TOKEN_SIZE {
            return Err(CryptoError::MalformedCiphertext(format!(
                "token too short: {} bytes, need at least {MIN_TOKEN_SIZE}",
                raw.len()
            )));
        }
        if raw[0] != TOKEN_VERSION {
            return Err(CryptoError::MalformedCiphertext(format!(
                "unknown token version 0x{:02x}",
                raw[0]
            )));
        }

        let (header, body) = raw.split_at(HEADER_SIZE);
        let (nonce, ciphertext) = body.split_at(NONCE_SIZE);

        let mut timestamp = [0u8; TIMESTAMP_SIZE];
        timestamp.copy_from_slice(&header[1..]);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            version: header[0],
            timestamp: u64::from_be_bytes(timestamp),
            nonce: nonce_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encodes the token back to its base64-url wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + self.ciphertext.len());
        raw.extend_from_slice(&self.header());
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.ciphertext);
        URL_SAFE.encode(raw).into_bytes()
    }

    fn header(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0] = self.version;
        header[1..].copy_from_slice(&self.timestamp.to_be_bytes());
        header
    }
}

/// Encrypts `plaintext` under `key`, returning a token.
pub fn encrypt(key: &KeyMaterial, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    encrypt_at(key, plaintext, now_secs())
}

pub(crate) fn encrypt_at(
    key: &KeyMaterial,
    plaintext: &[u8],
    timestamp: u64,
) -> CryptoResult<Vec<u8>> {
    let cipher = CipherKey::from_key_material(key)?.cipher();

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);

    let mut token = Token {
        version: TOKEN_VERSION,
        timestamp,
        nonce,
        ciphertext: Vec::new(),
    };
    let aad = token.header();
    token.ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(token.encode())
}

/// Decrypts a token produced by [`encrypt`].
pub fn decrypt(key: &KeyMaterial, token: &[u8]) -> CryptoResult<Vec<u8>> {
    let token = Token::parse(token)?;
    open(key, &token)
}

/// Decrypts a token and rejects it if it was sealed more than `ttl` ago.
///
/// The age check runs only after the tag verifies.
pub fn decrypt_with_ttl(key: &KeyMaterial, token: &[u8], ttl: Duration) -> CryptoResult<Vec<u8>> {
    let token = Token::parse(token)?;
    let plaintext = open(key, &token)?;

    let ttl_secs = ttl.as_secs();
    if now_secs().saturating_sub(token.timestamp) > ttl_secs {
        return Err(CryptoError::TokenExpired {
            issued_at: token.timestamp,
            ttl_secs,
        });
    }
    Ok(plaintext)
}

/// Reads the sealing timestamp of a token without verifying it.
pub fn token_timestamp(token: &[u8]) -> CryptoResult<u64> {
    Token::parse(token).map(|t| t.timestamp)
}

fn open(key: &KeyMaterial, token: &Token) -> CryptoResult<Vec<u8>> {
    let cipher = CipherKey::from_key_material(key)?.cipher();
    cipher
        .decrypt(
            Nonce::from_slice(&token.nonce),
            Payload {
                msg: &token.ciphertext,
                aad: &token.header(),
            },
        )
        .map_err(|_| CryptoError::Authentication)
}

fn now_secs() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::from_bytes([byte; KEY_SIZE])
    }

    fn reencode(token: &[u8], edit: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut raw = URL_SAFE.decode(token).unwrap();
        edit(&mut raw);
        URL_SAFE.encode(raw).into_bytes()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let k = key(1);
        let token = encrypt(&k, b"hello").unwrap();
        assert_eq!(decrypt(&k, &token).unwrap(), b"hello");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let k = key(2);
        let token = encrypt(&k, b"").unwrap();
        assert_eq!(decrypt(&k, &token).unwrap(), b"");
    }

    #[test]
    fn token_is_base64url_text() {
        let token = encrypt(&key(3), &[0xFF; 100]).unwrap();
        let text = std::str::from_utf8(&token).unwrap();
        assert!(text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='));
    }

    #[test]
    fn token_layout_sizes() {
        let token = encrypt(&key(3), b"abc").unwrap();
        let parsed = Token::parse(&token).unwrap();
        assert_eq!(parsed.version, TOKEN_VERSION);
        assert_eq!(parsed.ciphertext.len(), 3 + TAG_SIZE);
    }

    #[test]
    fn each_encrypt_uses_fresh_nonce() {
        let k = key(4);
        let t1 = Token::parse(&encrypt(&k, b"same").unwrap()).unwrap();
        let t2 = Token::parse(&encrypt(&k, b"same").unwrap()).unwrap();
        assert_ne!(t1.nonce, t2.nonce);
        assert_ne!(t1.ciphertext, t2.ciphertext);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let token = encrypt(&key(5), b"secret").unwrap();
        assert!(matches!(
            decrypt(&key(6), &token),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let k = key(7);
        let token = reencode(&encrypt(&k, b"secret").unwrap(), |raw| {
            let last = raw.len() - 1;
            raw[last] ^= 0x01;
        });
        assert!(matches!(decrypt(&k, &token), Err(CryptoError::Authentication)));
    }

    #[test]
    fn tampered_timestamp_fails_authentication() {
        let k = key(8);
        let token = reencode(&encrypt(&k, b"secret").unwrap(), |raw| raw[4] ^= 0x10);
        assert!(matches!(decrypt(&k, &token), Err(CryptoError::Authentication)));
    }

    #[test]
    fn non_base64_is_malformed() {
        assert!(matches!(
            decrypt(&key(9), b"not a token!"),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn truncated_token_is_malformed() {
        let short = URL_SAFE.encode([TOKEN_VERSION; MIN_TOKEN_SIZE - 1]);
        assert!(matches!(
            decrypt(&key(9), short.as_bytes()),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn unknown_version_is_malformed() {
        let k = key(10);
        let token = reencode(&encrypt(&k, b"x").unwrap(), |raw| raw[0] = 0x80);
        assert!(matches!(
            decrypt(&k, &token),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn plaintext_bytes_are_malformed_not_authentication() {
        assert!(matches!(
            decrypt(&key(11), b"hello"),
            Err(CryptoError::MalformedCiphertext(_))
        ));
    }

    #[test]
    fn ttl_accepts_fresh_token() {
        let k = key(12);
        let token = encrypt(&k, b"fresh").unwrap();
        assert_eq!(
            decrypt_with_ttl(&k, &token, Duration::from_secs(60)).unwrap(),
            b"fresh"
        );
    }

    #[test]
    fn ttl_rejects_old_token() {
        let k = key(13);
        let token = encrypt_at(&k, b"stale", now_secs() - 3600).unwrap();
        assert!(matches!(
            decrypt_with_ttl(&k, &token, Duration::from_secs(60)),
            Err(CryptoError::TokenExpired { ttl_secs: 60, .. })
        ));
        // Without a TTL the same token still opens.
        assert_eq!(decrypt(&k, &token).unwrap(), b"stale");
    }

    #[test]
    fn ttl_checks_tag_before_age() {
        let token = encrypt_at(&key(14), b"stale", 0).unwrap();
        assert!(matches!(
            decrypt_with_ttl(&key(15), &token, Duration::from_secs(1)),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn token_timestamp_reads_header() {
        let token = encrypt_at(&key(16), b"x", 1_700_000_000).unwrap();
        assert_eq!(token_timestamp(&token).unwrap(), 1_700_000_000);
    }

    #[test]
    fn parse_encode_preserves_token() {
        let token = encrypt(&key(17), b"payload").unwrap();
        assert_eq!(Token::parse(&token).unwrap().encode(), token);
    }

    #[test]
    fn cipher_key_rejects_wrong_length() {
        let short = URL_SAFE.encode([0u8; 16]);
        assert!(matches!(
            CipherKey::from_base64url(&short),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16 })
        ));
    }

    #[test]
    fn cipher_key_rejects_invalid_base64() {
        assert!(matches!(
            CipherKey::from_base64url("%%%"),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }
}
