// Invariant Framework
//
// Invariants are pure rules that must hold after every log entry is
// folded into the catalog. A violation stops replay before a reader
// can observe an inconsistent table.

use std::collections::BTreeSet;

use crate::log::{Action, LogEntry};
use crate::state::Catalog;

/// Result of invariant evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantResult {
    Pass,
    Fail(String),
}

/// Trait implemented by all invariants.
///
/// Invariants must be:
/// - Pure
/// - Deterministic
/// - Side-effect free
pub trait Invariant: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, previous: &Catalog, entry: &LogEntry, next: &Catalog) -> InvariantResult;
}

/// Data objects may only be added to tables that have a schema.
pub struct DataRequiresSchema;

impl Invariant for DataRequiresSchema {
    fn name(&self) -> &'static str {
        "data-requires-schema"
    }

    fn validate(&self, _previous: &Catalog, entry: &LogEntry, next: &Catalog) -> InvariantResult {
        for action in &entry.actions {
            if let Action::AddDataObject { table, object_key, .. } = action {
                if next.schema(table).is_none() {
                    return InvariantResult::Fail(format!(
                        "object `{object_key}` added to table `{table}` which has no schema"
                    ));
                }
            }
        }
        InvariantResult::Pass
    }
}

/// Column names are non-empty and unique within a schema.
pub struct UniqueColumns;

impl Invariant for UniqueColumns {
    fn name(&self) -> &'static str {
        "unique-columns"
    }

    fn validate(&self, _previous: &Catalog, entry: &LogEntry, _next: &Catalog) -> InvariantResult {
        for action in &entry.actions {
            if let Action::ChangeMetadata { table, schema } = action {
                if let Some(reason) = schema_problem(schema) {
                    return InvariantResult::Fail(format!("table `{table}`: {reason}"));
                }
            }
        }
        InvariantResult::Pass
    }
}

/// Describe what is wrong with `columns`, if anything.
pub fn schema_problem(columns: &[String]) -> Option<String> {
    if columns.is_empty() {
        return Some("schema has no columns".into());
    }

    let mut seen = BTreeSet::new();
    for column in columns {
        if column.is_empty() {
            return Some("empty column name".into());
        }
        if !seen.insert(column.as_str()) {
            return Some(format!("duplicate column `{column}`"));
        }
    }
    None
}

/// Invariant engine that evaluates a set of invariants.
#[derive(Default)]
pub struct InvariantEngine {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantEngine {
    /// Create an engine with no invariants.
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    /// Engine with the built-in table invariants registered.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.register(DataRequiresSchema);
        engine.register(UniqueColumns);
        engine
    }

    /// Register an invariant.
    pub fn register<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Evaluate all invariants.
    ///
    /// Stops at the first failure.
    pub fn evaluate(
        &self,
        previous: &Catalog,
        entry: &LogEntry,
        next: &Catalog,
    ) -> Result<(), InvariantViolation> {
        for invariant in &self.invariants {
            match invariant.validate(previous, entry, next) {
                InvariantResult::Pass => continue,
                InvariantResult::Fail(reason) => {
                    return Err(InvariantViolation {
                        invariant: invariant.name(),
                        version: entry.version,
                        reason,
                    })
                }
            }
        }
        Ok(())
    }
}

/// Returned when an invariant is violated.
#[derive(Debug, thiserror::Error)]
#[error("invariant `{invariant}` violated at version {version}: {reason}")]
pub struct InvariantViolation {
    pub invariant: &'static str,
    pub version: u64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn entry(actions: Vec<Action>) -> LogEntry {
        LogEntry {
            version: 0,
            txn_id: Uuid::new_v4(),
            read_version: None,
            actions,
        }
    }

    fn fold(entry: &LogEntry) -> (Catalog, Catalog) {
        let previous = Catalog::new();
        let mut next = previous.clone();
        next.apply(entry).unwrap();
        (previous, next)
    }

    #[test]
    fn data_without_schema_is_blocked() {
        let engine = InvariantEngine::with_defaults();
        let entry = entry(vec![Action::AddDataObject {
            table: "t".into(),
            object_key: "k".into(),
            row_count: 1,
        }]);
        let (previous, next) = fold(&entry);

        let err = engine.evaluate(&previous, &entry, &next).unwrap_err();

        assert!(err.to_string().contains("data-requires-schema"));
    }

    #[test]
    fn duplicate_columns_are_blocked() {
        let engine = InvariantEngine::with_defaults();
        let entry = entry(vec![Action::ChangeMetadata {
            table: "t".into(),
            schema: vec!["a".into(), "a".into()],
        }]);
        let (previous, next) = fold(&entry);

        let err = engine.evaluate(&previous, &entry, &next).unwrap_err();

        assert_eq!(err.invariant, "unique-columns");
        assert!(err.reason.contains("duplicate column `a`"));
    }

    #[test]
    fn schema_then_data_in_one_entry_passes() {
        let engine = InvariantEngine::with_defaults();
        let entry = entry(vec![
            Action::ChangeMetadata {
                table: "t".into(),
                schema: vec!["a".into()],
            },
            Action::AddDataObject {
                table: "t".into(),
                object_key: "k".into(),
                row_count: 1,
            },
        ]);
        let (previous, next) = fold(&entry);

        assert!(engine.evaluate(&previous, &entry, &next).is_ok());
    }

    #[test]
    fn empty_engine_accepts_anything() {
        let engine = InvariantEngine::new();
        let entry = entry(vec![Action::ChangeMetadata {
            table: "t".into(),
            schema: vec![],
        }]);
        let (previous, next) = fold(&entry);

        assert!(engine.evaluate(&previous, &entry, &next).is_ok());
    }
}
