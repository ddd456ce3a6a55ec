// Object Store Abstraction
//
// Defines the storage contract every other component is built on.
// The only concurrency primitive is `atomic_create`: an object either
// does not exist or exists fully, and exactly one creator wins a key.

mod file;
mod memory;

pub use file::FileObjectStore;
pub use memory::InMemoryObjectStore;

/// Errors produced by object store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("invalid object key `{key}`: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// True when the failure means another writer already owns the key.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

/// Convenience alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Write-once key/value storage backend.
///
/// Properties required from implementations:
/// - `atomic_create` is indivisible: concurrent creators of one key see
///   exactly one success, never a check-then-write race
/// - No partial objects are ever visible to `read`
/// - `read` returns exactly the bytes that were created
/// - `list_prefix` returns keys in lexicographic order
///
/// Implementations MUST NOT:
/// - Overwrite an existing object
/// - Emulate exclusivity with advisory locks
pub trait ObjectStore: Send + Sync {
    /// Create `key` with `bytes` iff no object exists there.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the key is taken.
    fn atomic_create(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    /// Read the full payload stored at `key`.
    ///
    /// Fails with [`StoreError::NotFound`] if nothing was created there.
    fn read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// List every key starting with `prefix`, sorted lexicographically.
    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for std::sync::Arc<S> {
    fn atomic_create(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        (**self).atomic_create(key, bytes)
    }

    fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        (**self).read(key)
    }

    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).list_prefix(prefix)
    }
}

/// Reject keys that cannot be mapped onto a flat namespace.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    let reason = if key.is_empty() {
        Some("key is empty")
    } else if key.contains('/') || key.contains('\\') {
        Some("key contains a path separator")
    } else if key.starts_with('.') {
        Some("key starts with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}
