use std::sync::Arc;

use serde::Serialize;

use super::{replay_catalog, ReplayError};
use crate::invariants::InvariantEngine;
use crate::log::{TransactionLog, Version};
use crate::state::{Catalog, DataFile};
use crate::store::ObjectStore;

/// One table's schema and file set as of a specific version.
///
/// Snapshots are plain values: they stay valid however far the log
/// advances after they were taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSnapshot {
    pub table: String,
    pub version: Option<Version>,
    pub schema: Vec<String>,
    pub files: Vec<DataFile>,
}

impl TableSnapshot {
    /// Extract `table` from a folded catalog.
    ///
    /// A table with no schema yet counts as not found.
    pub fn from_catalog(catalog: &Catalog, table: &str) -> Result<Self, ReplayError> {
        let not_found = || ReplayError::TableNotFound {
            table: table.to_string(),
        };
        let meta = catalog.table(table).ok_or_else(not_found)?;
        let schema = meta.schema.clone().ok_or_else(not_found)?;

        Ok(Self {
            table: table.to_string(),
            version: catalog.version(),
            schema,
            files: meta.files.clone(),
        })
    }

    pub fn row_count(&self) -> u64 {
        self.files.iter().map(|f| f.row_count).sum()
    }
}

/// Materializes snapshots by replaying the log.
pub struct SnapshotReader<S: ObjectStore + ?Sized> {
    log: TransactionLog<S>,
    invariants: Arc<InvariantEngine>,
}

impl<S: ObjectStore + ?Sized> Clone for SnapshotReader<S> {
    fn clone(&self) -> Self {
        Self {
            log: self.log.clone(),
            invariants: Arc::clone(&self.invariants),
        }
    }
}

impl<S: ObjectStore + ?Sized> SnapshotReader<S> {
    /// Reader enforcing the built-in invariants.
    pub fn new(log: TransactionLog<S>) -> Self {
        Self::with_invariants(log, InvariantEngine::with_defaults())
    }

    pub fn with_invariants(log: TransactionLog<S>, invariants: InvariantEngine) -> Self {
        Self {
            log,
            invariants: Arc::new(invariants),
        }
    }

    pub fn log(&self) -> &TransactionLog<S> {
        &self.log
    }

    /// Catalog folded through `version` (`None` is the empty catalog).
    pub fn catalog_at(&self, version: Option<Version>) -> Result<Catalog, ReplayError> {
        replay_catalog(&self.log, version, &self.invariants)
    }

    pub fn latest_catalog(&self) -> Result<Catalog, ReplayError> {
        let latest = self.log.latest_version()?;
        self.catalog_at(latest)
    }

    /// `table` as of the latest committed version.
    pub fn latest_snapshot(&self, table: &str) -> Result<TableSnapshot, ReplayError> {
        TableSnapshot::from_catalog(&self.latest_catalog()?, table)
    }

    /// `table` as of `version`, ignoring every later entry.
    pub fn snapshot_at(&self, table: &str, version: Version) -> Result<TableSnapshot, ReplayError> {
        TableSnapshot::from_catalog(&self.catalog_at(Some(version))?, table)
    }
}
