// Commit Records
//
// A log entry is the immutable record of one committed transaction.
// Entries are self-describing JSON documents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Version;

/// A single change recorded in a log entry.
///
/// Replay handles every variant exhaustively, so adding a new kind of
/// action is a compile-time checked change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// A new immutable data object joins the table's file set.
    #[serde(rename_all = "camelCase")]
    AddDataObject {
        table: String,
        object_key: String,
        row_count: u64,
    },

    /// The table's schema is established or replaced.
    #[serde(rename_all = "camelCase")]
    ChangeMetadata { table: String, schema: Vec<String> },
}

impl Action {
    /// Name of the table this action touches.
    pub fn table(&self) -> &str {
        match self {
            Action::AddDataObject { table, .. } => table,
            Action::ChangeMetadata { table, .. } => table,
        }
    }
}

/// One committed version of the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub version: Version,

    /// Transaction that committed this entry.
    pub txn_id: Uuid,

    /// Version the committing transaction read from, if any existed.
    pub read_version: Option<Version>,

    pub actions: Vec<Action>,
}

impl LogEntry {
    /// Set of tables touched by this entry.
    pub fn tables(&self) -> BTreeSet<&str> {
        self.actions.iter().map(Action::table).collect()
    }

    pub fn touches(&self, table: &str) -> bool {
        self.actions.iter().any(|a| a.table() == table)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
