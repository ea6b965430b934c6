//! ReportStore — redb-backed write-once blob storage.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::REPORTS;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Key under which a status report captured at `epoch` is stored.
pub fn status_report_key(epoch: u64) -> String {
    format!("status-{epoch}")
}

/// Thread-safe report store backed by redb.
#[derive(Clone)]
pub struct ReportStore {
    db: Arc<Database>,
}

impl ReportStore {
    /// Open (or create) a persistent report store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "report store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory report store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory report store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(REPORTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Store `bytes` under `key`. A key can only be written once.
    pub fn put_report(&self, key: &str, bytes: &[u8]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(REPORTS).map_err(map_err!(Table))?;
            let exists = table.get(key).map_err(map_err!(Read))?.is_some();
            if exists {
                return Err(StateError::AlreadyExists(key.to_string()));
            }
            table.insert(key, bytes).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, size = bytes.len(), "report stored");
        Ok(())
    }

    /// Serialize `report` as pretty JSON and store it under `key`.
    pub fn put_json<T: Serialize>(&self, key: &str, report: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec_pretty(report).map_err(map_err!(Serialize))?;
        self.put_report(key, &bytes)
    }

    /// Read back the exact bytes stored under `key`.
    pub fn get_report(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REPORTS).map_err(map_err!(Table))?;
        let value = table
            .get(key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    /// All report keys, in key order.
    pub fn list_report_keys(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REPORTS).map_err(map_err!(Table))?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
