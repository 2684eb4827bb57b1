//! Encrypted file records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a record on insert. Increases with insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record about to be inserted.
#[derive(Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub file_name: String,
    /// Complete token as returned by the cipher.
    pub ciphertext: Vec<u8>,
    /// Opaque association value. Never used as decryption input.
    pub password_reference: String,
    pub is_encrypted: bool,
}

/// A persisted record.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    pub id: RecordId,
    pub file_name: String,
    pub ciphertext: Vec<u8>,
    pub password_reference: String,
    pub is_encrypted: bool,
    /// Unix milliseconds.
    pub created_at: i64,
}

// password_reference may hold a plaintext password; keep it out of logs.
impl fmt::Debug for NewRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRecord")
            .field("file_name", &self.file_name)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("is_encrypted", &self.is_encrypted)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for EncryptedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedRecord")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("is_encrypted", &self.is_encrypted)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
