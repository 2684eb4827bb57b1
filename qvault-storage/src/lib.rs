//! DuckDB storage layer for qvault.
//!
//! Persists encrypted file records and hands out one session per request.
//!
//! # Architecture
//!
//! - [`RecordStore`] is the capability the vault consumes: open a session.
//! - [`RecordSession`] exposes the only two operations the vault needs,
//!   `insert` and `find_first`. Records are never updated or deleted.
//! - [`DuckDbRecordStore`] keeps a root connection and gives each session its
//!   own cloned connection, released when the session is dropped.

mod error;
mod record;
mod record_store;

pub use error::{StorageError, StorageResult};
pub use record::{EncryptedRecord, NewRecord, RecordId};
pub use record_store::{DuckDbRecordStore, RecordSession, RecordStore};

use std::path::{Path, PathBuf};
use tracing::warn;

/// Open a DuckDB connection, recovering once from a stale WAL file.
///
/// An unclean shutdown can leave `<db>.wal` behind and make the open fail.
/// In that case the WAL is removed and the open retried a single time.
/// `memory_limit` and `threads` are applied to the returned connection.
pub fn open_duckdb_with_wal_recovery(
    path: &Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(conn) => conn,
        Err(first_err) => {
            let wal_path = wal_path_for(path);
            if !wal_path.exists() {
                return Err(first_err.into());
            }
            warn!(
                "DuckDB open failed ({first_err}), removing stale WAL {} and retrying",
                wal_path.display()
            );
            std::fs::remove_file(&wal_path)?;
            duckdb::Connection::open(path)?
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

fn wal_path_for(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) => path.with_extension(format!("{}.wal", ext.to_string_lossy())),
        None => path.with_extension("wal"),
    }
}

fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{memory_limit}'; PRAGMA threads={threads};"
    ))?;
    Ok(())
}
