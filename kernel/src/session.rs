// Client Session
//
// One active transaction per session: create tables, write rows,
// scan, then commit or abort. Sessions share nothing in memory; all
// coordination between them goes through the object store.

use std::sync::Arc;

use crate::config::KernelConfig;
use crate::data::Row;
use crate::log::{LogEntry, LogError, TransactionLog};
use crate::replay::{ReplayError, SnapshotReader, TableSnapshot};
use crate::store::ObjectStore;
use crate::txn::{CommitOutcome, Scan, Transaction, TxError, TxState};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no transaction is open")]
    NoTransaction,

    #[error("a transaction is already open")]
    ExistingTransaction,

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Log(#[from] LogError),
}

pub struct Session<S: ObjectStore + ?Sized> {
    reader: SnapshotReader<S>,
    config: KernelConfig,
    tx: Option<Transaction<S>>,
}

impl<S: ObjectStore + ?Sized> Session<S> {
    pub fn new(store: Arc<S>, config: KernelConfig) -> Self {
        Self {
            reader: SnapshotReader::new(TransactionLog::new(store)),
            config,
            tx: None,
        }
    }

    /// The open transaction, if any.
    pub fn transaction(&self) -> Option<&Transaction<S>> {
        self.tx.as_ref()
    }

    fn active(&mut self) -> Result<&mut Transaction<S>, SessionError> {
        self.tx.as_mut().ok_or(SessionError::NoTransaction)
    }

    pub fn new_tx(&mut self) -> Result<(), SessionError> {
        if self.tx.is_some() {
            return Err(SessionError::ExistingTransaction);
        }
        self.tx = Some(Transaction::begin(self.reader.clone(), self.config.clone())?);
        Ok(())
    }

    pub fn create_table<I, C>(&mut self, table: &str, columns: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.active()?.create_table(table, columns)?;
        Ok(())
    }

    pub fn write_row(&mut self, table: &str, row: Row) -> Result<(), SessionError> {
        self.active()?.write_row(table, row)?;
        Ok(())
    }

    pub fn scan(&mut self, table: &str) -> Result<Scan<S>, SessionError> {
        Ok(self.active()?.scan(table)?)
    }

    /// Commit the open transaction and close it.
    ///
    /// If the commit failed on storage and the transaction is still active,
    /// it stays open so the caller can retry.
    pub fn commit_tx(&mut self) -> Result<CommitOutcome, SessionError> {
        let mut tx = self.tx.take().ok_or(SessionError::NoTransaction)?;
        match tx.commit() {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if tx.state() == TxState::Active {
                    self.tx = Some(tx);
                }
                Err(e.into())
            }
        }
    }

    pub fn abort_tx(&mut self) -> Result<(), SessionError> {
        let mut tx = self.tx.take().ok_or(SessionError::NoTransaction)?;
        tx.abort()?;
        Ok(())
    }

    /// `table` as of the latest commit, outside any transaction.
    pub fn latest_snapshot(&self, table: &str) -> Result<TableSnapshot, SessionError> {
        Ok(self.reader.latest_snapshot(table)?)
    }

    /// Every committed log entry.
    pub fn history(&self) -> Result<Vec<LogEntry>, SessionError> {
        Ok(self.reader.log().history()?)
    }
}
