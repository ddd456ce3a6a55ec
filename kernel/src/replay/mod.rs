// Deterministic Replay Engine
//
// Replays log entries from version 0 while enforcing invariants and
// producing the catalog as of a chosen version.

use crate::invariants::{InvariantEngine, InvariantViolation};
use crate::log::{LogError, TransactionLog, Version};
use crate::state::{Catalog, StateError};
use crate::store::ObjectStore;

mod snapshot;

pub use snapshot::{SnapshotReader, TableSnapshot};

/// Errors that can occur during replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("table `{table}` not found")]
    TableNotFound { table: String },
}

/// Replay the log through `upto` and derive the catalog.
///
/// `None` replays nothing and yields the empty catalog. This is the
/// *only* supported way to derive table state.
pub fn replay_catalog<S: ObjectStore + ?Sized>(
    log: &TransactionLog<S>,
    upto: Option<Version>,
    invariants: &InvariantEngine,
) -> Result<Catalog, ReplayError> {
    let mut current = Catalog::new();
    let Some(upto) = upto else {
        return Ok(current);
    };

    for entry in log.entries_in_range(0, upto)? {
        let mut next = current.clone();
        next.apply(&entry)?;

        invariants.evaluate(&current, &entry, &next)?;

        current = next;
    }

    Ok(current)
}
