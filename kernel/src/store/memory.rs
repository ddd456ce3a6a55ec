use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{validate_key, ObjectStore, StoreError, StoreResult};

/// In-memory object store.
///
/// Intended for tests and embedding. Exclusivity comes from holding the
/// write lock across the existence check and the insert.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn atomic_create(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_key(key)?;

        let mut objects = self.objects.write().expect("lock poisoned");
        if objects.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        let objects = self.objects.read().expect("lock poisoned");
        objects.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })
    }

    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let objects = self.objects.read().expect("lock poisoned");
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
