// Transaction State Machine
//
// Active -> {Committed, Aborted}. Both outcomes are terminal.

use std::fmt;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Accepting writes; nothing visible to other transactions.
    Active,

    /// All pending actions landed in exactly one log entry.
    Committed,

    /// Nothing was written to the log.
    Aborted,
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxState::Active => "active",
            TxState::Committed => "committed",
            TxState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Events that drive a transaction out of `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    Commit,
    Abort,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TxStateError {
    #[error("cannot {operation}: transaction is {state}")]
    NotActive {
        operation: &'static str,
        state: TxState,
    },
}

#[derive(Debug)]
pub struct TxStateMachine {
    state: TxState,
}

impl TxStateMachine {
    pub fn new() -> Self {
        Self {
            state: TxState::Active,
        }
    }

    pub fn current_state(&self) -> TxState {
        self.state
    }

    /// Fail unless the transaction can still accept `operation`.
    pub fn ensure_active(&self, operation: &'static str) -> Result<(), TxStateError> {
        match self.state {
            TxState::Active => Ok(()),
            state => Err(TxStateError::NotActive { operation, state }),
        }
    }

    pub fn apply(&mut self, event: TxEvent) -> Result<(), TxStateError> {
        let operation = match event {
            TxEvent::Commit => "commit",
            TxEvent::Abort => "abort",
        };
        self.ensure_active(operation)?;

        self.state = match event {
            TxEvent::Commit => TxState::Committed,
            TxEvent::Abort => TxState::Aborted,
        };
        Ok(())
    }
}

impl Default for TxStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
