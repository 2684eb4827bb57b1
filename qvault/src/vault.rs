//! The file vault: key derivation, sealing, and record bookkeeping.

use crate::config::{PasswordReference, VaultConfig};
use crate::error::{VaultError, VaultResult};
use qvault_crypto::{BitSource, CryptoError, KeyDeriver, QubitSimulator};
use qvault_storage::{NewRecord, RecordId, RecordStore};
use tracing::{debug, info, warn};

/// Result of a successful encrypt: the new record and the token it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub id: RecordId,
    pub ciphertext: Vec<u8>,
}

/// Encrypts files into, and decrypts them out of, a [`RecordStore`].
///
/// The store is injected and owned by the caller. Every call opens its own
/// session and drops it before returning, on success and on error.
pub struct FileVault<S, B = QubitSimulator> {
    store: S,
    deriver: KeyDeriver<B>,
    password_reference: PasswordReference,
}

impl<S: RecordStore> FileVault<S> {
    /// Creates a vault using the default qubit simulator as bit source.
    pub fn new(store: S, config: &VaultConfig) -> Self {
        Self::with_bit_source(store, QubitSimulator::default(), config)
    }
}

impl<S: RecordStore, B: BitSource> FileVault<S, B> {
    pub fn with_bit_source(store: S, source: B, config: &VaultConfig) -> Self {
        Self {
            store,
            deriver: KeyDeriver::new(source),
            password_reference: config.password_reference,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypts `contents` and inserts a new record under `file_name`.
    ///
    /// Existing records with the same name are left alone; the new record is
    /// added next to them.
    pub fn encrypt(&self, file_name: &str, contents: &[u8], password: &str) -> VaultResult<RecordId> {
        self.encrypt_file(file_name, contents, password)
            .map(|stored| stored.id)
    }

    /// Like [`encrypt`](Self::encrypt), also returning the stored token.
    pub fn encrypt_file(
        &self,
        file_name: &str,
        contents: &[u8],
        password: &str,
    ) -> VaultResult<StoredFile> {
        let session = self.store.session()?;

        let key = self.deriver.derive(password)?;
        let ciphertext = qvault_crypto::encrypt(&key, contents)?;

        let id = session.insert(NewRecord {
            file_name: file_name.to_string(),
            ciphertext: ciphertext.clone(),
            password_reference: self.password_reference.reference_for(password),
            is_encrypted: true,
        })?;

        info!(
            %id,
            file_name,
            plaintext_len = contents.len(),
            ciphertext_len = ciphertext.len(),
            "stored encrypted file"
        );
        Ok(StoredFile { id, ciphertext })
    }

    /// Decrypts the first record stored under `file_name`.
    ///
    /// The key is derived afresh, independent of the one used at encryption.
    pub fn decrypt(&self, file_name: &str, password: &str) -> VaultResult<Vec<u8>> {
        let session = self.store.session()?;

        let record = session
            .find_first(file_name)?
            .ok_or_else(|| VaultError::NotFound(file_name.to_string()))?;
        debug!(id = %record.id, file_name, "found encrypted file");

        let key = self.deriver.derive(password)?;
        qvault_crypto::decrypt(&key, &record.ciphertext).map_err(|e| {
            if is_authentication_failure(&e) {
                warn!(id = %record.id, file_name, "decryption failed: {e}");
            } else {
                debug!(id = %record.id, file_name, "decryption failed: {e}");
            }
            VaultError::from(e)
        })
    }
}

/// Only a tag mismatch is worth a warning; other failures are the caller's input.
fn is_authentication_failure(err: &CryptoError) -> bool {
    matches!(err, CryptoError::Authentication)
}
