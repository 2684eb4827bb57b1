//! Vault configuration.

use crate::error::{VaultError, VaultResult};
use qvault_storage::DuckDbRecordStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Path value that selects an in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

/// What gets stored in a record's `password_reference` column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordReference {
    /// Hex SHA-256 digest of the password.
    #[default]
    Sha256,
    /// The password itself. Leaves a secret at rest; only for parity with
    /// databases written by the original service.
    Plaintext,
}

impl PasswordReference {
    pub fn reference_for(self, password: &str) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(password.as_bytes())),
            Self::Plaintext => password.to_string(),
        }
    }
}

/// Configuration for a [`FileVault`](crate::FileVault) and its record store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// DuckDB file holding the records, or `:memory:`.
    pub db_path: PathBuf,

    /// DuckDB `memory_limit` pragma.
    pub memory_limit: String,

    /// DuckDB `threads` pragma.
    pub threads: u32,

    pub password_reference: PasswordReference,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("qvault.duckdb"),
            memory_limit: "64MB".to_string(),
            threads: 1,
            password_reference: PasswordReference::Sha256,
        }
    }
}

impl VaultConfig {
    /// Config for tests: in-memory database, defaults otherwise.
    pub fn in_memory() -> Self {
        Self {
            db_path: PathBuf::from(IN_MEMORY_DB),
            ..Self::default()
        }
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> VaultResult<Self> {
        toml::from_str(text).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> VaultResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| VaultError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> VaultResult<String> {
        toml::to_string(self).map_err(|e| VaultError::Config(e.to_string()))
    }

    /// Opens the record store this config points at, applying `memory_limit`
    /// and `threads` for file and in-memory databases alike.
    pub fn open_store(&self) -> VaultResult<DuckDbRecordStore> {
        if self.threads == 0 {
            return Err(VaultError::Config("threads must be at least 1".into()));
        }
        let store = if self.db_path.as_os_str() == IN_MEMORY_DB {
            DuckDbRecordStore::open_in_memory_with_limits(&self.memory_limit, self.threads)?
        } else {
            DuckDbRecordStore::open(&self.db_path, &self.memory_limit, self.threads)?
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_reference_is_hex_digest() {
        let reference = PasswordReference::Sha256.reference_for("pw1");
        assert_eq!(reference.len(), 64);
        assert_ne!(reference, "pw1");
        assert_eq!(reference, PasswordReference::Sha256.reference_for("pw1"));
    }

    #[test]
    fn sha256_reference_of_empty_password() {
        assert_eq!(
            PasswordReference::Sha256.reference_for(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn plaintext_reference_is_password() {
        assert_eq!(PasswordReference::Plaintext.reference_for("pw1"), "pw1");
    }

    #[test]
    fn zero_threads_rejected() {
        let config = VaultConfig {
            threads: 0,
            ..VaultConfig::in_memory()
        };
        assert!(matches!(config.open_store(), Err(VaultError::Config(_))));
    }
}
