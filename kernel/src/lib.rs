// Tablelog Kernel
//
// Transactional table store: immutable data objects plus an
// append-only transaction log, coordinated only through atomic
// create-if-absent on an object store.

pub mod config;
pub mod data;
pub mod invariants;
pub mod log;
pub mod replay;
pub mod session;
pub mod state;
pub mod store;
pub mod txn;
