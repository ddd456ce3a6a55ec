// Table Catalog State
//
// Derives table metadata and file sets from a sequence of log entries.
// This module is pure, deterministic, and side-effect free.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::log::{Action, LogEntry, Version};

/// A committed data object as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFile {
    pub object_key: String,
    pub row_count: u64,
}

/// Folded metadata for one table.
///
/// `schema` is `None` until a change-metadata action is seen; such a
/// table is not readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub schema: Option<Vec<String>>,
    pub files: Vec<DataFile>,
}

impl TableMetadata {
    pub fn row_count(&self) -> u64 {
        self.files.iter().map(|f| f.row_count).sum()
    }
}

/// Errors produced while folding entries.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StateError {
    #[error("entry out of order: expected version {expected}, got {actual}")]
    OutOfOrder { expected: Version, actual: Version },
}

/// Every table's metadata as of one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    version: Option<Version>,
    tables: BTreeMap<String, TableMetadata>,
}

impl Catalog {
    /// Catalog of an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the last entry folded in.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(name)
    }

    /// Schema of `name`, if the table has been defined.
    pub fn schema(&self, name: &str) -> Option<&[String]> {
        self.tables.get(name)?.schema.as_deref()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableMetadata)> {
        self.tables.iter().map(|(name, meta)| (name.as_str(), meta))
    }

    /// Fold one entry into the catalog.
    ///
    /// Later change-metadata replaces the schema; data objects only
    /// ever accumulate.
    pub fn apply(&mut self, entry: &LogEntry) -> Result<(), StateError> {
        let expected = self.version.map_or(0, |v| v + 1);
        if entry.version != expected {
            return Err(StateError::OutOfOrder {
                expected,
                actual: entry.version,
            });
        }

        for action in &entry.actions {
            match action {
                Action::ChangeMetadata { table, schema } => {
                    self.tables.entry(table.clone()).or_default().schema = Some(schema.clone());
                }
                Action::AddDataObject {
                    table,
                    object_key,
                    row_count,
                } => {
                    self.tables.entry(table.clone()).or_default().files.push(DataFile {
                        object_key: object_key.clone(),
                        row_count: *row_count,
                    });
                }
            }
        }

        self.version = Some(entry.version);
        Ok(())
    }
}
