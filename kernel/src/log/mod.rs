// Transaction Log
//
// Append-only sequence of version-numbered commit records, built
// entirely on the object store's exclusive create. Whoever creates
// the key for version N first owns version N; nobody else ever can.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{ObjectStore, StoreError};

mod entry;

pub use entry::{Action, LogEntry};

/// Logical version of the table store.
pub type Version = u64;

/// Key prefix shared by every log entry.
pub const LOG_PREFIX: &str = "_log_";

/// Object key holding the entry for `version`.
///
/// Zero padding makes lexicographic key order equal version order.
pub fn version_key(version: Version) -> String {
    format!("{LOG_PREFIX}{version:020}")
}

fn parse_version_key(key: &str) -> Option<Version> {
    let digits = key.strip_prefix(LOG_PREFIX)?;
    if digits.len() != 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("log entry for version {version} is missing")]
    MissingEntry { version: Version },

    #[error("log entry for version {version} is corrupt: {reason}")]
    Corrupt { version: Version, reason: String },
}

/// Result of racing for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// This writer claimed the version.
    Committed,

    /// Another writer claimed the version first.
    Conflict,
}

/// Handle to the log stored in an object store.
///
/// Cheap to clone; all clones observe the same durable log.
#[derive(Debug)]
pub struct TransactionLog<S: ObjectStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ObjectStore + ?Sized> Clone for TransactionLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ObjectStore + ?Sized> TransactionLog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The backing object store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Highest committed version, or `None` for an empty log.
    pub fn latest_version(&self) -> Result<Option<Version>, LogError> {
        let mut latest = None;
        for key in self.store.list_prefix(LOG_PREFIX)? {
            match parse_version_key(&key) {
                Some(version) => latest = latest.max(Some(version)),
                None => warn!(key = %key, "ignoring foreign key in log namespace"),
            }
        }
        Ok(latest)
    }

    /// Try to claim `entry.version` for `entry`.
    ///
    /// Only `AlreadyExists` is reported as [`AppendOutcome::Conflict`];
    /// every other store failure is returned as an error, and leaves the
    /// outcome of the create unknown.
    pub fn append(&self, entry: &LogEntry) -> Result<AppendOutcome, LogError> {
        let bytes = entry.encode().map_err(|e| LogError::Corrupt {
            version: entry.version,
            reason: e.to_string(),
        })?;

        match self.store.atomic_create(&version_key(entry.version), &bytes) {
            Ok(()) => {
                debug!(version = entry.version, actions = entry.actions.len(), "log entry appended");
                Ok(AppendOutcome::Committed)
            }
            Err(e) if e.is_already_exists() => Ok(AppendOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the entry for `version`, if it exists.
    pub fn read_entry(&self, version: Version) -> Result<Option<LogEntry>, LogError> {
        let bytes = match self.store.read(&version_key(version)) {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry = LogEntry::decode(&bytes).map_err(|e| LogError::Corrupt {
            version,
            reason: e.to_string(),
        })?;

        if entry.version != version {
            return Err(LogError::Corrupt {
                version,
                reason: format!("entry claims version {}", entry.version),
            });
        }

        Ok(Some(entry))
    }

    /// Entries for versions `from..=to`, in version order.
    ///
    /// A missing version inside the range is an error: committed
    /// versions never have gaps.
    pub fn entries_in_range(&self, from: Version, to: Version) -> Result<Vec<LogEntry>, LogError> {
        if from > to {
            return Ok(Vec::new());
        }

        (from..=to)
            .map(|version| {
                self.read_entry(version)?
                    .ok_or(LogError::MissingEntry { version })
            })
            .collect()
    }

    /// Every committed entry, from version 0 to the latest.
    pub fn history(&self) -> Result<Vec<LogEntry>, LogError> {
        match self.latest_version()? {
            Some(latest) => self.entries_in_range(0, latest),
            None => Ok(Vec::new()),
        }
    }
}
