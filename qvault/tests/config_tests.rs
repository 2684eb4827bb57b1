use qvault::{PasswordReference, RecordStore, VaultConfig, VaultError};
use std::path::PathBuf;

#[test]
fn default_db_path() {
    let config = VaultConfig::default();
    assert_eq!(config.db_path, PathBuf::from("qvault.duckdb"));
}

#[test]
fn default_resource_limits() {
    let config = VaultConfig::default();
    assert_eq!(config.memory_limit, "64MB");
    assert_eq!(config.threads, 1);
}

#[test]
fn default_password_reference_is_hashed() {
    assert_eq!(
        VaultConfig::default().password_reference,
        PasswordReference::Sha256
    );
}

#[test]
fn toml_roundtrip() {
    let config = VaultConfig {
        db_path: PathBuf::from("/var/lib/qvault/files.duckdb"),
        memory_limit: "128MB".into(),
        threads: 2,
        password_reference: PasswordReference::Plaintext,
    };
    let text = config.to_toml_string().unwrap();
    assert_eq!(VaultConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn partial_toml_uses_defaults() {
    let config = VaultConfig::from_toml_str(r#"password_reference = "plaintext""#).unwrap();
    assert_eq!(config.password_reference, PasswordReference::Plaintext);
    assert_eq!(config.db_path, VaultConfig::default().db_path);
    assert_eq!(config.threads, 1);
}

#[test]
fn unknown_password_reference_is_config_error() {
    let err = VaultConfig::from_toml_str(r#"password_reference = "md5""#).unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qvault.toml");
    std::fs::write(&path, "db_path = \"records.duckdb\"\nthreads = 4\n").unwrap();

    let config = VaultConfig::load(&path).unwrap();
    assert_eq!(config.db_path, PathBuf::from("records.duckdb"));
    assert_eq!(config.threads, 4);
}

#[test]
fn load_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = VaultConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}

#[test]
fn in_memory_config_opens_empty_store() {
    let store = VaultConfig::in_memory().open_store().unwrap();
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.session().unwrap().find_first("x").unwrap().is_none());
}

#[test]
fn in_memory_store_honors_thread_setting() {
    let config = VaultConfig {
        threads: 2,
        ..VaultConfig::in_memory()
    };
    assert_eq!(config.open_store().unwrap().threads().unwrap(), 2);
}

#[test]
fn in_memory_store_rejects_bad_memory_limit() {
    let config = VaultConfig {
        memory_limit: "plenty".into(),
        ..VaultConfig::in_memory()
    };
    assert!(matches!(config.open_store(), Err(VaultError::Storage(_))));
}
