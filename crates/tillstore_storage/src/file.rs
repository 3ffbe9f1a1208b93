//! File-based storage backend for persistent storage.
//!
//! Layout of a store directory:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK              # Advisory lock for single-process access
//! ├─ products.json     # One file per key
//! ├─ clients.json
//! └─ ...
//! ```

use crate::backend::{validate_key, KeyValueBackend};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const VALUE_EXT: &str = "json";
const TEMP_EXT: &str = "json.tmp";

/// A directory-backed key-value backend.
///
/// Each key is stored as `<key>.json` inside the directory. Data survives
/// process restarts.
///
/// # Durability
///
/// `put` writes to a temporary file, syncs it, then renames it over the
/// previous value, so a crash never leaves a half-written value behind.
///
/// # Exclusivity
///
/// The backend holds an exclusive advisory lock on `LOCK` for its whole
/// lifetime. A second open of the same directory fails with
/// [`StorageError::Locked`].
///
/// # Example
///
/// ```no_run
/// use tillstore_storage::{KeyValueBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("shop-data")).unwrap();
/// backend.put("nextId", "1000").unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    io: RwLock<()>,
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a store directory at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - The path exists but is not a directory
    /// - Another process holds the lock (`Locked`)
    pub fn open(path: &Path) -> StorageResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("path is not a directory: {}", path.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            io: RwLock::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.{VALUE_EXT}"))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{key}.{TEMP_EXT}"))
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }
}

fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        let _guard = self.io.read();

        let bytes = match fs::read(self.value_path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupted(format!("value for {key:?} is not UTF-8: {e}")))
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        let _guard = self.io.write();

        let temp_path = self.temp_path(key);
        let written = write_synced(&temp_path, value)
            .and_then(|()| fs::rename(&temp_path, self.value_path(key)));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        self.sync_directory()
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let _guard = self.io.write();

        match fs::remove_file(self.value_path(key)) {
            Ok(()) => {
                self.sync_directory()?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let _guard = self.io.read();

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(&format!(".{VALUE_EXT}")) {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn value_len(&self, key: &str) -> StorageResult<Option<u64>> {
        validate_key(key)?;
        let _guard = self.io.read();

        match fs::metadata(self.value_path(key)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&self) -> StorageResult<()> {
        // Every put is synced before it returns
        let _guard = self.io.write();
        self.sync_directory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");

        let backend = FileBackend::open(&path).unwrap();
        assert!(backend.keys().unwrap().is_empty());
        assert!(path.join(LOCK_FILE).exists());
    }

    #[test]
    fn file_put_and_get() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("products", "[{\"id\":1}]").unwrap();
        assert_eq!(
            backend.get("products").unwrap().as_deref(),
            Some("[{\"id\":1}]")
        );
        assert_eq!(backend.get("clients").unwrap(), None);
        assert!(!dir.path().join("products.json.tmp").exists());
    }

    #[test]
    fn failed_put_removes_temp_file() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        fs::create_dir(dir.path().join("products.json")).unwrap();
        fs::write(dir.path().join("products.json").join("inner"), "x").unwrap();

        assert!(matches!(
            backend.put("products", "[]"),
            Err(StorageError::Io(_))
        ));
        assert!(!dir.path().join("products.json.tmp").exists());
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();

        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend.put("nextId", "1005").unwrap();
        }

        {
            let backend = FileBackend::open(dir.path()).unwrap();
            assert_eq!(backend.get("nextId").unwrap().as_deref(), Some("1005"));
        }
    }

    #[test]
    fn file_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _first = FileBackend::open(dir.path()).unwrap();

        let second = FileBackend::open(dir.path());
        assert!(matches!(second, Err(StorageError::Locked)));
    }

    #[test]
    fn file_remove() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("sales", "[]").unwrap();
        assert!(backend.remove("sales").unwrap());
        assert!(!backend.remove("sales").unwrap());
        assert!(!dir.path().join("sales.json").exists());
    }

    #[test]
    fn file_keys_skip_foreign_files() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("sales", "[]").unwrap();
        backend.put("clients", "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["clients", "sales"]);
    }

    #[test]
    fn file_value_len() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put("lastUpdate", "\"x\"").unwrap();
        assert_eq!(backend.value_len("lastUpdate").unwrap(), Some(3));
        assert_eq!(backend.value_len("missing").unwrap(), None);
    }

    #[test]
    fn file_non_utf8_is_corrupted() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        fs::write(dir.path().join("products.json"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            backend.get("products"),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn file_rejects_path_keys() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(backend.put("../outside", "1").is_err());
    }

    #[test]
    fn file_path_and_flush() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.path(), dir.path());
        assert!(backend.flush().is_ok());
    }
}
