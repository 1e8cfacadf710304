//! File-backed credential store.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Result;
use crate::auth::{AccessToken, RefreshToken, TokenPair};
use crate::error::StorageError;

use super::CredentialStore;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk layout: the two tokens as named string entries.
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "access-token")]
    access_token: String,
    #[serde(rename = "refresh-token")]
    refresh_token: String,
}

/// A credential store persisted as a JSON file.
///
/// Writes go to a temporary file that is renamed over the real one, under
/// an exclusive lock on a sidecar `.lock` file, so concurrent processes never
/// see a half-written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the file at `path`.
    ///
    /// Nothing is created until the first [`save`](CredentialStore::save).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn open_lock(&self) -> Result<File> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| self.io_error(&lock_path, e))?;
        Ok(file)
    }

    fn write_record(&self, record: &StoredCredentials) -> Result<()> {
        let json = serde_json::to_string_pretty(record).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(|e| self.io_error(&temp_path, e))?;

        #[cfg(unix)]
        {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| self.io_error(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    #[instrument(skip(self, pair), fields(path = %self.path.display()))]
    fn save(&self, pair: &TokenPair) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .map_err(|e| self.io_error(&self.lock_path(), e))?;

        let result = self.write_record(&StoredCredentials {
            access_token: pair.access.as_str().to_string(),
            refresh_token: pair.refresh.as_str().to_string(),
        });

        lock.unlock()
            .map_err(|e| self.io_error(&self.lock_path(), e))?;
        debug!("Saved credentials");
        result
    }

    fn load(&self) -> Result<Option<TokenPair>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e).into()),
        };

        let stored: StoredCredentials =
            serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Some(TokenPair::new(
            AccessToken::new(stored.access_token),
            RefreshToken::new(stored.refresh_token),
        )))
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive()
            .map_err(|e| self.io_error(&self.lock_path(), e))?;

        let result = match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(&self.path, e).into()),
        };

        lock.unlock()
            .map_err(|e| self.io_error(&self.lock_path(), e))?;
        debug!("Cleared credentials");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair::new(AccessToken::new(access), RefreshToken::new(refresh))
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("credentials.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested/credentials.json"));
        store.save(&pair("a1", "r1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair("a1", "r1")));

        store.save(&pair("a2", "r1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair("a2", "r1")));
    }

    #[test]
    fn uses_named_entries_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileStore::new(&path);
        store.save(&pair("acc", "ref")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["access-token"], "acc");
        assert_eq!(raw["refresh-token"], "ref");
        assert!(!dir.path().join("credentials.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        FileStore::new(&path).save(&pair("a", "r")).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("credentials.json"));
        store.clear().unwrap();
        store.save(&pair("a", "r")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn survives_a_new_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        FileStore::new(&path).save(&pair("a", "r")).unwrap();
        assert_eq!(FileStore::new(&path).load().unwrap(), Some(pair("a", "r")));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("corrupt"));
    }
}
