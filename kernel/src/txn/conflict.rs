// Commit Conflict Detection
//
// After losing a version race, the entries committed since the read
// version are checked against the tables this transaction touched.
// Any shared table is a conflict; disjoint commits are safe to skip.

use std::collections::BTreeSet;

use crate::log::{LogEntry, Version};

/// The first interleaving commit that touched one of our tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub table: String,
    pub version: Version,
}

/// Find the earliest entry in `winners` touching any table in `touched`.
pub fn find_overlap(touched: &BTreeSet<String>, winners: &[LogEntry]) -> Option<Overlap> {
    winners.iter().find_map(|entry| {
        entry
            .tables()
            .into_iter()
            .find(|table| touched.contains(*table))
            .map(|table| Overlap {
                table: table.to_string(),
                version: entry.version,
            })
    })
}
