//! Transport-free request surface.
//!
//! Mirrors the two inbound operations, `encrypt(file, password)` and
//! `decrypt(file_name, password)`. Routing, status codes and framing belong
//! to whatever transport wraps these.

use crate::error::VaultResult;
use crate::vault::FileVault;
use qvault_crypto::BitSource;
use qvault_storage::{RecordId, RecordStore};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ENCRYPT_SUCCESS_MESSAGE: &str = "Encryption successful!";

#[derive(Clone, Deserialize)]
pub struct EncryptRequest {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub password: String,
}

#[derive(Clone, Deserialize)]
pub struct DecryptRequest {
    pub file_name: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub message: String,
    pub record_id: RecordId,
}

impl fmt::Debug for EncryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptRequest")
            .field("file_name", &self.file_name)
            .field("contents_len", &self.contents.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DecryptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptRequest")
            .field("file_name", &self.file_name)
            .finish_non_exhaustive()
    }
}

pub fn handle_encrypt<S: RecordStore, B: BitSource>(
    vault: &FileVault<S, B>,
    request: EncryptRequest,
) -> VaultResult<EncryptResponse> {
    let record_id = vault.encrypt(&request.file_name, &request.contents, &request.password)?;
    Ok(EncryptResponse {
        message: ENCRYPT_SUCCESS_MESSAGE.to_string(),
        record_id,
    })
}

/// Returns the raw decrypted bytes.
pub fn handle_decrypt<S: RecordStore, B: BitSource>(
    vault: &FileVault<S, B>,
    request: DecryptRequest,
) -> VaultResult<Vec<u8>> {
    vault.decrypt(&request.file_name, &request.password)
}
