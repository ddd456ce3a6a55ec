// Transactions
//
// A transaction pins a read snapshot at begin, buffers actions in
// memory, and commits by racing to create the next log entry. Losing
// the race to commits on disjoint tables is retried a bounded number
// of times; losing it to a commit on a shared table aborts.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::KernelConfig;
use crate::data::{data_object_key, is_valid_table_name, DataObject, Row};
use crate::invariants::schema_problem;
use crate::log::{Action, AppendOutcome, LogEntry, LogError, TransactionLog, Version};
use crate::replay::{ReplayError, SnapshotReader, TableSnapshot};
use crate::state::Catalog;
use crate::store::{ObjectStore, StoreError};

mod conflict;
mod scan;
mod state;

pub use conflict::{find_overlap, Overlap};
pub use scan::Scan;
pub use state::{TxEvent, TxState, TxStateError, TxStateMachine};

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("replay error: {0}")]
    Replay(ReplayError),

    #[error("table `{table}` not found")]
    TableNotFound { table: String },

    #[error("table `{table}` already exists")]
    TableExists { table: String },

    #[error("invalid schema for table `{table}`: {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("row for table `{table}` has {actual} values, schema has {expected} columns")]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("commit conflict: table `{table}` was changed at version {version}")]
    Conflict { table: String, version: Version },

    #[error("gave up committing after {attempts} attempts")]
    CommitAttemptsExhausted { attempts: u32 },

    #[error("data object `{key}` is corrupt: {reason}")]
    CorruptObject { key: String, reason: String },

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidState(#[from] TxStateError),
}

impl From<ReplayError> for TxError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::TableNotFound { table } => TxError::TableNotFound { table },
            ReplayError::Log(e) => TxError::Log(e),
            other => TxError::Replay(other),
        }
    }
}

/// Successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Version claimed by the commit; `None` if there was nothing to write.
    pub version: Option<Version>,

    /// Append attempts made, including the successful one.
    pub attempts: u32,
}

fn next_version(version: Option<Version>) -> Version {
    version.map_or(0, |v| v + 1)
}

/// A single-session, snapshot-isolated transaction.
pub struct Transaction<S: ObjectStore + ?Sized> {
    id: Uuid,
    reader: SnapshotReader<S>,
    config: KernelConfig,
    read_version: Option<Version>,
    catalog: Catalog,
    pending: Vec<Action>,
    pending_schemas: BTreeMap<String, Vec<String>>,
    buffered: BTreeMap<String, Vec<Row>>,
    next_seq: u64,
    machine: TxStateMachine,
    committed_version: Option<Version>,
}

impl<S: ObjectStore + ?Sized> Transaction<S> {
    /// Begin a transaction reading the latest committed version.
    pub fn begin(reader: SnapshotReader<S>, config: KernelConfig) -> Result<Self, TxError> {
        let read_version = reader.log().latest_version()?;
        let catalog = reader.catalog_at(read_version)?;
        let id = Uuid::new_v4();

        debug!(txn = %id, read_version = ?read_version, "transaction started");

        Ok(Self {
            id,
            reader,
            config,
            read_version,
            catalog,
            pending: Vec::new(),
            pending_schemas: BTreeMap::new(),
            buffered: BTreeMap::new(),
            next_seq: 0,
            machine: TxStateMachine::new(),
            committed_version: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Latest committed version when the transaction began.
    pub fn read_version(&self) -> Option<Version> {
        self.read_version
    }

    pub fn state(&self) -> TxState {
        self.machine.current_state()
    }

    /// Version this transaction committed at, once committed.
    pub fn committed_version(&self) -> Option<Version> {
        self.committed_version
    }

    /// Actions recorded so far, in the order they were added.
    pub fn pending_actions(&self) -> &[Action] {
        &self.pending
    }

    fn log(&self) -> &TransactionLog<S> {
        self.reader.log()
    }

    /// Schema visible to this transaction: its own pending change wins
    /// over the pinned snapshot.
    pub fn schema(&self, table: &str) -> Option<&[String]> {
        self.pending_schemas
            .get(table)
            .map(Vec::as_slice)
            .or_else(|| self.catalog.schema(table))
    }

    /// Define a new table.
    pub fn create_table(&mut self, table: &str, columns: Vec<String>) -> Result<(), TxError> {
        self.machine.ensure_active("create table")?;
        if self.schema(table).is_some() {
            return Err(TxError::TableExists {
                table: table.to_string(),
            });
        }
        self.change_metadata(table, columns)
    }

    /// Establish or replace a table's schema.
    ///
    /// Within one transaction the last change to a table wins; only that
    /// one reaches the log.
    pub fn change_metadata(&mut self, table: &str, columns: Vec<String>) -> Result<(), TxError> {
        self.machine.ensure_active("change metadata")?;
        validate_schema(table, &columns)?;

        // Rows are positional against the schema they were written under.
        self.flush_table(table)?;

        self.pending_schemas.insert(table.to_string(), columns.clone());
        self.pending.push(Action::ChangeMetadata {
            table: table.to_string(),
            schema: columns,
        });
        Ok(())
    }

    /// Record an action directly.
    ///
    /// `AddDataObject` must reference an object that already exists in the
    /// store and a table with a known schema.
    pub fn add_action(&mut self, action: Action) -> Result<(), TxError> {
        self.machine.ensure_active("add action")?;
        match action {
            Action::ChangeMetadata { table, schema } => self.change_metadata(&table, schema),
            add @ Action::AddDataObject { .. } => {
                if self.schema(add.table()).is_none() {
                    return Err(TxError::TableNotFound {
                        table: add.table().to_string(),
                    });
                }
                self.pending.push(add);
                Ok(())
            }
        }
    }

    /// Buffer a row, flushing a data object once the buffer is full.
    pub fn write_row(&mut self, table: &str, row: Row) -> Result<(), TxError> {
        self.machine.ensure_active("write")?;
        let expected = self
            .schema(table)
            .ok_or_else(|| TxError::TableNotFound {
                table: table.to_string(),
            })?
            .len();

        if row.len() != expected {
            return Err(TxError::SchemaMismatch {
                table: table.to_string(),
                expected,
                actual: row.len(),
            });
        }

        let rows = self.buffered.entry(table.to_string()).or_default();
        rows.push(row);
        if rows.len() >= self.config.rows_per_object {
            if let Err(e) = self.flush_table(table) {
                // The failed write leaves the buffer as it was before this row.
                if let Some(rows) = self.buffered.get_mut(table) {
                    rows.pop();
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Write buffered rows for `table` as one immutable data object.
    fn flush_table(&mut self, table: &str) -> Result<(), TxError> {
        let rows = match self.buffered.remove(table) {
            Some(rows) if !rows.is_empty() => rows,
            _ => return Ok(()),
        };

        // A create that reports failure may still have landed, so a key is
        // never reused.
        let key = data_object_key(table, self.id, self.next_seq);
        self.next_seq += 1;

        let row_count = rows.len() as u64;
        let object = DataObject {
            table: table.to_string(),
            rows,
        };
        let written = object
            .encode()
            .map_err(TxError::from)
            .and_then(|bytes| Ok(self.log().store().atomic_create(&key, &bytes)?));
        if let Err(e) = written {
            warn!(txn = %self.id, table, key = %key, error = %e, "data object flush failed; rows kept");
            self.buffered.insert(table.to_string(), object.rows);
            return Err(e);
        }

        debug!(txn = %self.id, table, key = %key, rows = row_count, "data object flushed");

        self.pending.push(Action::AddDataObject {
            table: table.to_string(),
            object_key: key,
            row_count,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TxError> {
        let tables: Vec<String> = self.buffered.keys().cloned().collect();
        for table in tables {
            self.flush_table(&table)?;
        }
        Ok(())
    }

    /// Actions as they will appear in the log entry: one schema change
    /// per table (the last one), ahead of every data object.
    fn effective_actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.pending.len());
        let mut emitted = BTreeSet::new();

        for action in &self.pending {
            if let Action::ChangeMetadata { table, schema } = action {
                if emitted.insert(table.as_str()) {
                    let last = self.pending_schemas.get(table).unwrap_or(schema);
                    actions.push(Action::ChangeMetadata {
                        table: table.clone(),
                        schema: last.clone(),
                    });
                }
            }
        }

        actions.extend(
            self.pending
                .iter()
                .filter(|a| matches!(a, Action::AddDataObject { .. }))
                .cloned(),
        );
        actions
    }

    fn touched_tables(&self) -> BTreeSet<String> {
        self.pending.iter().map(|a| a.table().to_string()).collect()
    }

    /// Scan `table` as this transaction sees it.
    ///
    /// While active: the pinned snapshot followed by this transaction's own
    /// writes. After commit: the snapshot at the commit version.
    pub fn scan(&self, table: &str) -> Result<Scan<S>, TxError> {
        let store = Arc::clone(self.log().store());

        match self.state() {
            TxState::Aborted => Err(TxStateError::NotActive {
                operation: "scan",
                state: TxState::Aborted,
            }
            .into()),
            TxState::Committed => {
                let snapshot = match self.committed_version {
                    Some(version) => self.reader.snapshot_at(table, version)?,
                    None => TableSnapshot::from_catalog(&self.catalog, table)?,
                };
                let keys = snapshot.files.into_iter().map(|f| f.object_key).collect();
                Ok(Scan::new(store, table.to_string(), keys, Vec::new()))
            }
            TxState::Active => {
                if self.schema(table).is_none() {
                    return Err(TxError::TableNotFound {
                        table: table.to_string(),
                    });
                }

                let committed = self
                    .catalog
                    .table(table)
                    .map(|meta| meta.files.iter().map(|f| f.object_key.clone()))
                    .into_iter()
                    .flatten();
                let own = self.pending.iter().filter_map(|a| match a {
                    Action::AddDataObject {
                        table: t,
                        object_key,
                        ..
                    } if t == table => Some(object_key.clone()),
                    _ => None,
                });
                let keys = committed.chain(own).collect();
                let buffered = self.buffered.get(table).cloned().unwrap_or_default();

                Ok(Scan::new(store, table.to_string(), keys, buffered))
            }
        }
    }

    /// Commit all pending actions as one log entry.
    ///
    /// The first attempt targets the version right after the read version.
    /// On a lost race, every entry committed since the last check is
    /// inspected: a shared table aborts with [`TxError::Conflict`],
    /// otherwise the commit is retried at the new head. Storage errors
    /// leave the transaction active.
    pub fn commit(&mut self) -> Result<CommitOutcome, TxError> {
        self.machine.ensure_active("commit")?;
        self.flush()?;

        let actions = self.effective_actions();
        if actions.is_empty() {
            self.machine.apply(TxEvent::Commit)?;
            debug!(txn = %self.id, "read-only transaction committed");
            return Ok(CommitOutcome {
                version: None,
                attempts: 0,
            });
        }

        let log = self.log().clone();
        let touched = self.touched_tables();
        let max_attempts = self.config.max_commit_attempts;
        let mut checked_through = self.read_version;
        let mut candidate = next_version(self.read_version);

        for attempt in 1..=max_attempts {
            let entry = LogEntry {
                version: candidate,
                txn_id: self.id,
                read_version: self.read_version,
                actions: actions.clone(),
            };

            let outcome = match log.append(&entry) {
                Ok(outcome) => outcome,
                Err(e) => self.resolve_unknown_outcome(&log, candidate, e)?,
            };

            match outcome {
                AppendOutcome::Committed => {
                    self.machine.apply(TxEvent::Commit)?;
                    self.committed_version = Some(candidate);
                    self.pending.clear();
                    self.pending_schemas.clear();
                    info!(txn = %self.id, version = candidate, attempt, "transaction committed");
                    return Ok(CommitOutcome {
                        version: Some(candidate),
                        attempts: attempt,
                    });
                }
                AppendOutcome::Conflict => {
                    let latest = log.latest_version()?.map_or(candidate, |v| v.max(candidate));
                    let winners = log.entries_in_range(next_version(checked_through), latest)?;

                    if let Some(Overlap { table, version }) = find_overlap(&touched, &winners) {
                        self.machine.apply(TxEvent::Abort)?;
                        warn!(txn = %self.id, table = %table, version, "commit conflict; transaction aborted");
                        return Err(TxError::Conflict { table, version });
                    }

                    warn!(txn = %self.id, candidate, latest, attempt, "lost commit race to disjoint writers; retrying");
                    checked_through = Some(latest);
                    candidate = latest + 1;
                }
            }
        }

        self.machine.apply(TxEvent::Abort)?;
        warn!(txn = %self.id, attempts = max_attempts, "commit attempts exhausted; transaction aborted");
        Err(TxError::CommitAttemptsExhausted {
            attempts: max_attempts,
        })
    }

    /// A failed create may still have landed. Read the version back to
    /// find out who owns it.
    fn resolve_unknown_outcome(
        &self,
        log: &TransactionLog<S>,
        candidate: Version,
        error: LogError,
    ) -> Result<AppendOutcome, TxError> {
        warn!(txn = %self.id, version = candidate, error = %error, "commit outcome unknown; checking log");

        match log.read_entry(candidate) {
            Ok(Some(entry)) if entry.txn_id == self.id => Ok(AppendOutcome::Committed),
            Ok(Some(_)) => Ok(AppendOutcome::Conflict),
            Ok(None) | Err(_) => Err(error.into()),
        }
    }

    /// Abandon the transaction. Nothing reaches the log; objects already
    /// flushed stay unreferenced.
    pub fn abort(&mut self) -> Result<(), TxError> {
        self.machine.apply(TxEvent::Abort)?;
        self.pending.clear();
        self.pending_schemas.clear();
        self.buffered.clear();
        info!(txn = %self.id, "transaction aborted");
        Ok(())
    }
}

fn validate_schema(table: &str, columns: &[String]) -> Result<(), TxError> {
    let reason = if !is_valid_table_name(table) {
        Some("table names use ASCII letters, digits, '_' and '-'".to_string())
    } else {
        schema_problem(columns)
    };

    match reason {
        Some(reason) => Err(TxError::InvalidSchema {
            table: table.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::store::InMemoryObjectStore;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn reader() -> SnapshotReader<InMemoryObjectStore> {
        SnapshotReader::new(TransactionLog::new(Arc::new(InMemoryObjectStore::new())))
    }

    fn begin(reader: &SnapshotReader<InMemoryObjectStore>) -> Transaction<InMemoryObjectStore> {
        Transaction::begin(reader.clone(), KernelConfig::default()).unwrap()
    }

    fn rows(scan: Scan<InMemoryObjectStore>) -> Vec<Row> {
        scan.map(Result::unwrap).collect()
    }

    #[test]
    fn round_trip_in_write_order() {
        let reader = reader();
        let mut tx = begin(&reader);
        tx.create_table("users", cols(&["id", "name"])).unwrap();
        tx.write_row("users", row![1, "Alice"]).unwrap();
        tx.write_row("users", row![2, "Bob"]).unwrap();

        let outcome = tx.commit().unwrap();
        assert_eq!(outcome.version, Some(0));
        assert_eq!(tx.state(), TxState::Committed);

        let reader_tx = begin(&reader);
        assert_eq!(reader_tx.read_version(), Some(0));
        assert_eq!(
            rows(reader_tx.scan("users").unwrap()),
            vec![row![1, "Alice"], row![2, "Bob"]]
        );
    }

    #[test]
    fn commit_is_one_entry_with_schema_first() {
        let reader = reader();
        let config = KernelConfig {
            rows_per_object: 1,
            ..KernelConfig::default()
        };
        let mut tx = Transaction::begin(reader.clone(), config).unwrap();
        tx.create_table("t", cols(&["a"])).unwrap();
        tx.write_row("t", row![1]).unwrap();
        tx.write_row("t", row![2]).unwrap();
        tx.commit().unwrap();

        let history = reader.log().history().unwrap();
        assert_eq!(history.len(), 1);
        let entry = &history[0];
        assert_eq!(entry.txn_id, tx.id());
        assert_eq!(entry.read_version, None);
        assert_eq!(entry.actions.len(), 3);
        assert!(matches!(entry.actions[0], Action::ChangeMetadata { .. }));
        assert!(entry.actions[1..]
            .iter()
            .all(|a| matches!(a, Action::AddDataObject { row_count: 1, .. })));
    }

    #[test]
    fn last_schema_change_wins_within_transaction() {
        let reader = reader();
        let mut tx = begin(&reader);
        tx.create_table("t", cols(&["a"])).unwrap();
        tx.change_metadata("t", cols(&["a", "b"])).unwrap();
        tx.write_row("t", row![1, 2]).unwrap();
        tx.commit().unwrap();

        let entry = reader.log().read_entry(0).unwrap().unwrap();
        let schemas: Vec<_> = entry
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::ChangeMetadata { schema, .. } => Some(schema.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(schemas, vec![cols(&["a", "b"])]);
    }

    #[test]
    fn unknown_table_and_arity_are_rejected() {
        let reader = reader();
        let mut tx = begin(&reader);

        assert!(matches!(
            tx.write_row("nope", row![1]),
            Err(TxError::TableNotFound { .. })
        ));

        tx.create_table("t", cols(&["a", "b"])).unwrap();
        let err = tx.write_row("t", row![1]).unwrap_err();
        assert!(matches!(
            err,
            TxError::SchemaMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn create_existing_table_fails() {
        let reader = reader();
        let mut tx = begin(&reader);
        tx.create_table("t", cols(&["a"])).unwrap();
        assert!(matches!(
            tx.create_table("t", cols(&["a"])),
            Err(TxError::TableExists { .. })
        ));
        tx.commit().unwrap();

        let mut tx = begin(&reader);
        assert!(matches!(
            tx.create_table("t", cols(&["b"])),
            Err(TxError::TableExists { .. })
        ));
    }

    #[test]
    fn invalid_schemas_are_rejected() {
        let reader = reader();
        let mut tx = begin(&reader);

        for (table, columns) in [
            ("t", cols(&[])),
            ("t", cols(&["a", "a"])),
            ("bad/name", cols(&["a"])),
        ] {
            assert!(matches!(
                tx.create_table(table, columns),
                Err(TxError::InvalidSchema { .. })
            ));
        }
        assert!(tx.pending_actions().is_empty());
    }

    #[test]
    fn reads_see_own_writes_in_order() {
        let reader = reader();
        let mut setup = begin(&reader);
        setup.create_table("x", cols(&["name", "n"])).unwrap();
        setup.write_row("x", row!["Joey", 1]).unwrap();
        setup.commit().unwrap();

        let config = KernelConfig {
            rows_per_object: 2,
            ..KernelConfig::default()
        };
        let mut tx = Transaction::begin(reader.clone(), config).unwrap();
        tx.write_row("x", row!["Ada", 2]).unwrap();
        tx.write_row("x", row!["Bea", 3]).unwrap();
        tx.write_row("x", row!["Cy", 4]).unwrap();

        assert_eq!(
            rows(tx.scan("x").unwrap()),
            vec![
                row!["Joey", 1],
                row!["Ada", 2],
                row!["Bea", 3],
                row!["Cy", 4]
            ]
        );
    }

    #[test]
    fn pinned_snapshot_ignores_later_commits() {
        let reader = reader();
        let mut setup = begin(&reader);
        setup.create_table("t", cols(&["a"])).unwrap();
        setup.write_row("t", row![1]).unwrap();
        setup.commit().unwrap();

        let pinned = begin(&reader);
        let first = rows(pinned.scan("t").unwrap());

        let mut writer = begin(&reader);
        writer.write_row("t", row![2]).unwrap();
        writer.commit().unwrap();

        let mut scan = pinned.scan("t").unwrap();
        assert_eq!(rows(pinned.scan("t").unwrap()), first);
        assert_eq!(scan.by_ref().count(), 1);
        scan.rewind();
        assert_eq!(scan.map(Result::unwrap).collect::<Vec<_>>(), first);
    }

    #[test]
    fn disjoint_writers_both_commit() {
        let reader = reader();
        let mut setup = begin(&reader);
        setup.create_table("orders", cols(&["id"])).unwrap();
        setup.create_table("users", cols(&["id"])).unwrap();
        setup.commit().unwrap();

        let mut t1 = begin(&reader);
        let mut t2 = begin(&reader);
        t1.write_row("orders", row![10]).unwrap();
        t2.write_row("users", row![20]).unwrap();

        assert_eq!(t2.commit().unwrap().version, Some(1));
        let outcome = t1.commit().unwrap();
        assert_eq!(outcome.version, Some(2));
        assert_eq!(outcome.attempts, 2);

        let fresh = begin(&reader);
        assert_eq!(rows(fresh.scan("orders").unwrap()), vec![row![10]]);
        assert_eq!(rows(fresh.scan("users").unwrap()), vec![row![20]]);
    }

    #[test]
    fn overlapping_writers_conflict() {
        let reader = reader();
        let mut t1 = begin(&reader);
        let mut t2 = begin(&reader);
        t1.create_table("users", cols(&["id"])).unwrap();
        t2.create_table("users", cols(&["id", "name"])).unwrap();

        t2.commit().unwrap();
        let err = t1.commit().unwrap_err();

        assert!(matches!(
            err,
            TxError::Conflict { ref table, version: 0 } if table == "users"
        ));
        assert_eq!(t1.state(), TxState::Aborted);
        assert_eq!(reader.log().latest_version().unwrap(), Some(0));
    }

    #[test]
    fn attempts_are_bounded() {
        let reader = reader();
        let mut setup = begin(&reader);
        setup.create_table("a", cols(&["x"])).unwrap();
        setup.create_table("b", cols(&["x"])).unwrap();
        setup.commit().unwrap();

        let config = KernelConfig {
            max_commit_attempts: 1,
            ..KernelConfig::default()
        };
        let mut slow = Transaction::begin(reader.clone(), config).unwrap();
        slow.write_row("a", row![1]).unwrap();

        let mut fast = begin(&reader);
        fast.write_row("b", row![1]).unwrap();
        fast.commit().unwrap();

        assert!(matches!(
            slow.commit(),
            Err(TxError::CommitAttemptsExhausted { attempts: 1 })
        ));
        assert_eq!(slow.state(), TxState::Aborted);
    }

    #[test]
    fn terminal_transactions_reject_operations() {
        let reader = reader();
        let mut tx = begin(&reader);
        tx.create_table("t", cols(&["a"])).unwrap();
        tx.abort().unwrap();

        assert!(matches!(
            tx.write_row("t", row![1]),
            Err(TxError::InvalidState(_))
        ));
        assert!(matches!(tx.commit(), Err(TxError::InvalidState(_))));
        assert!(matches!(tx.scan("t"), Err(TxError::InvalidState(_))));
        assert!(matches!(tx.abort(), Err(TxError::InvalidState(_))));
        assert_eq!(reader.log().latest_version().unwrap(), None);
    }

    #[test]
    fn read_only_commit_writes_nothing() {
        let reader = reader();
        let mut tx = begin(&reader);

        let outcome = tx.commit().unwrap();

        assert_eq!(outcome.version, None);
        assert_eq!(tx.state(), TxState::Committed);
        assert_eq!(reader.log().latest_version().unwrap(), None);
    }

    #[test]
    fn committed_transaction_scans_its_commit_version() {
        let reader = reader();
        let mut tx = begin(&reader);
        tx.create_table("t", cols(&["a"])).unwrap();
        tx.write_row("t", row![7]).unwrap();
        tx.commit().unwrap();

        assert_eq!(rows(tx.scan("t").unwrap()), vec![row![7]]);
    }

    #[test]
    fn add_action_requires_known_table() {
        let reader = reader();
        let mut tx = begin(&reader);

        let err = tx
            .add_action(Action::AddDataObject {
                table: "t".into(),
                object_key: "k".into(),
                row_count: 1,
            })
            .unwrap_err();
        assert!(matches!(err, TxError::TableNotFound { .. }));

        tx.add_action(Action::ChangeMetadata {
            table: "t".into(),
            schema: cols(&["a"]),
        })
        .unwrap();
        assert_eq!(tx.schema("t").unwrap(), ["a"]);
    }
}
