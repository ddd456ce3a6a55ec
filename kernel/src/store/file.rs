// Filesystem Object Store
//
// Flat directory backend. Exclusive creation is provided by the
// filesystem itself: the payload is written to a private temporary
// file and then hard-linked to its final name, which fails if the
// name already exists.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::{validate_key, ObjectStore, StoreError, StoreResult};

const TEMP_PREFIX: &str = ".tmp-";

/// Object store rooted at a single local directory.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
}

impl FileObjectStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_temp(&self, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.join(format!("{TEMP_PREFIX}{}", Uuid::new_v4()));
        let mut file = File::create(&path)?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        if let Err(e) = written {
            let _ = fs::remove_file(&path);
            return Err(e);
        }
        Ok(path)
    }
}

impl ObjectStore for FileObjectStore {
    fn atomic_create(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_key(key)?;

        let temp = self.write_temp(bytes)?;
        let target = self.root.join(key);
        let linked = fs::hard_link(&temp, &target);
        let _ = fs::remove_file(&temp);

        match linked {
            Ok(()) => {
                debug!(key, len = bytes.len(), "object created");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists {
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        validate_key(key)?;

        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn list_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) || !name.starts_with(prefix) {
                continue;
            }
            keys.push(name);
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn create_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();

        store.atomic_create("_log_0", b"hello").unwrap();
        assert_eq!(store.read("_log_0").unwrap(), b"hello");
    }

    #[test]
    fn second_create_fails_and_keeps_first_payload() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();

        store.atomic_create("k", b"first").unwrap();
        let err = store.atomic_create("k", b"second").unwrap_err();

        assert!(err.is_already_exists());
        assert_eq!(store.read("k").unwrap(), b"first");
    }

    #[test]
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();

        let err = store.read("nope").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn listing_is_sorted_and_skips_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();

        store.atomic_create("_log_2", b"").unwrap();
        store.atomic_create("_log_0", b"").unwrap();
        store.atomic_create("_table_x_1", b"").unwrap();
        fs::write(dir.path().join(".tmp-leftover"), b"junk").unwrap();

        assert_eq!(store.list_prefix("_log_").unwrap(), vec!["_log_0", "_log_2"]);
        assert_eq!(store.list_prefix("").unwrap().len(), 3);
    }

    #[test]
    fn no_temporaries_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::open(dir.path()).unwrap();

        store.atomic_create("a", b"1").unwrap();
        let _ = store.atomic_create("a", b"2");

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn concurrent_creators_have_exactly_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileObjectStore::open(dir.path()).unwrap());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.atomic_create("contended", &[i]).is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
