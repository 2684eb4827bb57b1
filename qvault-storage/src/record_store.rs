//! Record store backed by DuckDB.

use crate::error::{StorageError, StorageResult};
use crate::record::{EncryptedRecord, NewRecord, RecordId};
use chrono::Utc;
use duckdb::{Connection, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// One request's view of the store. Dropping it releases the connection.
pub trait RecordSession {
    /// Inserts a new record. No uniqueness check on `file_name`.
    fn insert(&self, record: NewRecord) -> StorageResult<RecordId>;

    /// Returns the earliest-inserted record whose `file_name` matches exactly.
    fn find_first(&self, file_name: &str) -> StorageResult<Option<EncryptedRecord>>;
}

/// Hands out per-request sessions.
pub trait RecordStore: Send + Sync {
    fn session(&self) -> StorageResult<Box<dyn RecordSession + '_>>;
}

const SELECT_COLUMNS: &str =
    "id, file_name, encrypted_data, password_reference, is_encrypted, created_at";

/// DuckDB-backed [`RecordStore`].
#[derive(Clone)]
pub struct DuckDbRecordStore {
    root: Arc<Mutex<Connection>>,
}

impl DuckDbRecordStore {
    /// Opens or creates a record store at the given path.
    pub fn open(path: &Path, memory_limit: &str, threads: u32) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path, memory_limit, threads)?;
        initialize_record_schema(&conn)?;
        debug!("opened record store at {}", path.display());
        Ok(Self {
            root: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory record store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_record_schema(&conn)?;
        Ok(Self {
            root: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory record store with the same limits a file store gets.
    pub fn open_in_memory_with_limits(memory_limit: &str, threads: u32) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        crate::apply_resource_limits(&conn, memory_limit, threads)?;
        initialize_record_schema(&conn)?;
        Ok(Self {
            root: Arc::new(Mutex::new(conn)),
        })
    }

    /// DuckDB's current `threads` setting.
    pub fn threads(&self) -> StorageResult<u32> {
        let conn = self.lock()?;
        let threads: i64 =
            conn.query_row("SELECT current_setting('threads')", [], |row| row.get(0))?;
        Ok(u32::try_from(threads).unwrap_or(0))
    }

    /// All records with the given name, oldest first.
    pub fn records_named(&self, file_name: &str) -> StorageResult<Vec<EncryptedRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM encrypted_files WHERE file_name = ? ORDER BY id"
        ))?;
        let records = stmt
            .query_map(params![file_name], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Total number of records.
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM encrypted_files", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.root
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl RecordStore for DuckDbRecordStore {
    fn session(&self) -> StorageResult<Box<dyn RecordSession + '_>> {
        let conn = self.lock()?.try_clone()?;
        trace!("record session acquired");
        Ok(Box::new(DuckDbSession { conn }))
    }
}

struct DuckDbSession {
    conn: Connection,
}

impl RecordSession for DuckDbSession {
    fn insert(&self, record: NewRecord) -> StorageResult<RecordId> {
        let id: i64 = self.conn.query_row(
            r#"
            INSERT INTO encrypted_files (
                file_name, encrypted_data, password_reference, is_encrypted, created_at
            ) VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
            params![
                record.file_name,
                record.ciphertext,
                record.password_reference,
                record.is_encrypted,
                Utc::now().timestamp_millis(),
            ],
            |row| row.get(0),
        )?;
        Ok(RecordId::new(id))
    }

    fn find_first(&self, file_name: &str) -> StorageResult<Option<EncryptedRecord>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {SELECT_COLUMNS} FROM encrypted_files WHERE file_name = ? ORDER BY id LIMIT 1"
            ),
            params![file_name],
            row_to_record,
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for DuckDbSession {
    fn drop(&mut self) {
        trace!("record session released");
    }
}

fn row_to_record(row: &duckdb::Row<'_>) -> duckdb::Result<EncryptedRecord> {
    Ok(EncryptedRecord {
        id: RecordId::new(row.get(0)?),
        file_name: row.get(1)?,
        ciphertext: row.get(2)?,
        password_reference: row.get(3)?,
        is_encrypted: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn initialize_record_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE SEQUENCE IF NOT EXISTS encrypted_files_id_seq START 1;
        CREATE TABLE IF NOT EXISTS encrypted_files (
            id BIGINT PRIMARY KEY DEFAULT nextval('encrypted_files_id_seq'),
            file_name VARCHAR NOT NULL,
            encrypted_data BLOB NOT NULL,
            password_reference VARCHAR NOT NULL,
            is_encrypted BOOLEAN NOT NULL DEFAULT FALSE,
            created_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_encrypted_files_name ON encrypted_files(file_name);
        "#,
    )?;
    Ok(())
}
