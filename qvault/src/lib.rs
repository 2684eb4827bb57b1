//! Password-keyed encrypted file vault.
//!
//! [`FileVault`] ties the pieces together: it derives a key from the
//! password, seals the file into a token, and stores the token under the
//! file's name. Decryption looks the name up and opens the token with a
//! freshly derived key.
//!
//! Key derivation mixes the password-seeded measurement bit into fresh random
//! bytes, so the key derived for decryption is not the key used at encryption
//! time. Decrypting a stored file therefore fails with
//! [`VaultError::Authentication`] in practice.

pub mod config;
pub mod error;
pub mod request;
mod vault;

pub use config::{PasswordReference, VaultConfig};
pub use error::{VaultError, VaultResult};
pub use request::{
    DecryptRequest, ENCRYPT_SUCCESS_MESSAGE, EncryptRequest, EncryptResponse, handle_decrypt,
    handle_encrypt,
};
pub use vault::{FileVault, StoredFile};

pub use qvault_crypto::{BitSource, QubitSimulator, QubitState};
pub use qvault_storage::{DuckDbRecordStore, EncryptedRecord, RecordId, RecordStore};
