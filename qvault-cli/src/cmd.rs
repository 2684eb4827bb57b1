use crate::{Cli, Commands};
use anyhow::{Context, bail};
use qvault::{
    DecryptRequest, DuckDbRecordStore, ENCRYPT_SUCCESS_MESSAGE, EncryptResponse, FileVault,
    VaultConfig, handle_decrypt,
};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => VaultConfig::load(path)?,
        None => VaultConfig::default(),
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    debug!(db = %config.db_path.display(), "opening vault");

    let store = config
        .open_store()
        .with_context(|| format!("failed to open record store {}", config.db_path.display()))?;
    let vault = FileVault::new(store, &config);

    match cli.cmd {
        Commands::Encrypt {
            file,
            password,
            write_sibling,
        } => {
            let response = encrypt(&vault, &file, &password, write_sibling)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Decrypt {
            file_name,
            password,
            output,
        } => {
            let plaintext = handle_decrypt(
                &vault,
                DecryptRequest {
                    file_name: file_name.clone(),
                    password,
                },
            )
            .with_context(|| format!("failed to decrypt {file_name}"))?;
            write_output(output.as_deref(), &plaintext)?;
        }
    }
    Ok(())
}

fn encrypt(
    vault: &FileVault<DuckDbRecordStore>,
    file: &Path,
    password: &str,
    write_sibling: bool,
) -> anyhow::Result<EncryptResponse> {
    let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
        bail!("{} has no usable file name", file.display());
    };
    let contents =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

    let stored = vault.encrypt_file(file_name, &contents, password)?;

    if write_sibling {
        let sibling = sibling_path(file);
        std::fs::write(&sibling, &stored.ciphertext)
            .with_context(|| format!("failed to write {}", sibling.display()))?;
        info!("wrote ciphertext to {}", sibling.display());
    }

    Ok(EncryptResponse {
        message: ENCRYPT_SUCCESS_MESSAGE.to_string(),
        record_id: stored.id,
    })
}

/// `<file>.enc`, keeping the original extension.
fn sibling_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".enc");
    PathBuf::from(name)
}

fn write_output(output: Option<&Path>, plaintext: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, plaintext)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(plaintext)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
