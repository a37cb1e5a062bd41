//! HostStatusStore — redb-backed persistence of per-host orchestrator status.
//!
//! Values are JSON-serialized [`HostStatusRecord`]s. The store supports both
//! on-disk and in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hostgate_model::{ApplicationId, HostName, HostStatus, HostStatusSnapshot};

use crate::error::{StatusError, StatusResult};
use crate::tables::HOST_STATUS;

/// Convert any `Display` error into a `StatusError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StatusError::$variant(e.to_string())
    };
}

/// Stored status of one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatusRecord {
    pub application: ApplicationId,
    pub host: HostName,
    pub status: HostStatus,
    /// Unix timestamp (seconds) of the last change.
    pub updated_at: u64,
}

impl HostStatusRecord {
    /// Build the composite key for the host status table.
    pub fn table_key(&self) -> String {
        table_key(&self.application, &self.host)
    }
}

fn table_key(application: &ApplicationId, host: &HostName) -> String {
    format!("{}/{}", application.serialized_form(), host)
}

fn application_prefix(application: &ApplicationId) -> String {
    format!("{}/", application.serialized_form())
}

/// Thread-safe host status registry backed by redb.
#[derive(Clone)]
pub struct HostStatusStore {
    db: Arc<Database>,
}

impl HostStatusStore {
    /// Open (or create) a persistent registry at the given path.
    pub fn open(path: &Path) -> StatusResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "host status store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory registry (for testing).
    pub fn open_in_memory() -> StatusResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory host status store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StatusResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(HOST_STATUS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Current status of a host. Hosts never written are `NoRemarks`.
    pub fn host_status(
        &self,
        application: &ApplicationId,
        host: &HostName,
    ) -> StatusResult<HostStatus> {
        Ok(self
            .get_record(application, host)?
            .map(|r| r.status)
            .unwrap_or_default())
    }

    /// Get the stored record of a host, if any.
    pub fn get_record(
        &self,
        application: &ApplicationId,
        host: &HostName,
    ) -> StatusResult<Option<HostStatusRecord>> {
        let key = table_key(application, host);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOST_STATUS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: HostStatusRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                let matches = record.application == *application && record.host == *host;
                Ok(matches.then_some(record))
            }
            None => Ok(None),
        }
    }

    /// All stored records of an application, sorted by host.
    pub fn list(&self, application: &ApplicationId) -> StatusResult<Vec<HostStatusRecord>> {
        let prefix = application_prefix(application);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HOST_STATUS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.range(prefix.as_str()..).map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            let record: HostStatusRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            // Keys of `t:a/x` also start with `t:a/`.
            if record.application != *application {
                continue;
            }
            results.push(record);
        }
        Ok(results)
    }

    /// Read every host status of an application into an immutable snapshot.
    pub fn snapshot(&self, application: &ApplicationId) -> StatusResult<HostStatusSnapshot> {
        let snapshot: HostStatusSnapshot = self
            .list(application)?
            .into_iter()
            .map(|r| (r.host, r.status))
            .collect();
        Ok(snapshot)
    }

    /// Set the status of a single host.
    pub fn set_host_status(
        &self,
        application: &ApplicationId,
        host: &HostName,
        status: HostStatus,
    ) -> StatusResult<()> {
        self.set_host_statuses(application, std::slice::from_ref(host), status)
    }

    /// Set the status of several hosts in one write transaction.
    pub fn set_host_statuses(
        &self,
        application: &ApplicationId,
        hosts: &[HostName],
        status: HostStatus,
    ) -> StatusResult<()> {
        if hosts.is_empty() {
            return Ok(());
        }
        let now = epoch_secs();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HOST_STATUS).map_err(map_err!(Table))?;
            for host in hosts {
                let record = HostStatusRecord {
                    application: application.clone(),
                    host: host.clone(),
                    status,
                    updated_at: now,
                };
                let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
                table
                    .insert(record.table_key().as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        info!(%application, hosts = hosts.len(), %status, "host status updated");
        Ok(())
    }

    /// Remove every record of an application. Returns the number removed.
    pub fn remove_application(&self, application: &ApplicationId) -> StatusResult<u32> {
        let keys: Vec<String> = self
            .list(application)?
            .iter()
            .map(HostStatusRecord::table_key)
            .collect();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HOST_STATUS).map_err(map_err!(Table))?;
            for key in &keys {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%application, removed = keys.len(), "application host statuses removed");
        Ok(keys.len() as u32)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
