//! Directory-backed [`KvStore`].
//!
//! Each key is stored in its own file named after the SHA-256 digest of the
//! key, so arbitrary key text (and length) never reaches the filesystem as
//! a path. The file holds a small JSON document carrying the original key
//! next to the value, which is how [`KvStore::keys`] recovers the key set
//! after a restart.
//!
//! Writes go through a named temporary file in the same directory that is
//! persisted over the entry path, which keeps every key's value atomic for
//! readers. A failed write leaves no temporary file behind.
//!
//! # Layout
//!
//! ```text
//! <directory>/
//!   3f0c...e1.entry   {"key":"geocode:Beijing","value":"..."}
//!   ...
//! ```

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cache::traits::{KvStore, StoreError};

/// File extension of stored entries.
const ENTRY_EXTENSION: &str = "entry";

/// On-disk content of one entry file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<'a> {
    #[serde(borrow)]
    key: Cow<'a, str>,
    #[serde(borrow)]
    value: Cow<'a, str>,
}

/// A [`KvStore`] persisting each key as a file in one directory.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        debug!(directory = %directory.display(), "Opened file store");
        Ok(Self {
            directory,
            quota_bytes: None,
        })
    }

    /// Reject writes that would grow the store beyond `quota_bytes`.
    ///
    /// Entry files are charged at their size on disk.
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// The root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}.{}", file_stem(key), ENTRY_EXTENSION))
    }

    fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Entry files as (path, size) pairs.
    fn entry_files(&self) -> Result<Vec<(PathBuf, u64)>, StoreError> {
        let mut files = Vec::new();
        for dirent in fs::read_dir(&self.directory)? {
            let dirent = dirent?;
            let path = dirent.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let size = dirent.metadata().map(|m| m.len()).unwrap_or(0);
            files.push((path, size));
        }
        Ok(files)
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        let Some(content) = Self::read_optional(&path)? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredEntry>(&content) {
            Ok(entry) if entry.key == key => Ok(Some(entry.value.into_owned())),
            Ok(entry) => {
                debug!(key, stored = %entry.key, "Entry file holds a different key");
                Ok(None)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Unreadable entry file");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        let entry = StoredEntry {
            key: Cow::Borrowed(key),
            value: Cow::Borrowed(value),
        };
        let content = serde_json::to_vec(&entry).map_err(io::Error::from)?;

        if let Some(quota) = self.quota_bytes {
            let used: u64 = self.entry_files()?.iter().map(|(_, size)| size).sum();
            let replaced = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            let needed = used.saturating_sub(replaced) + content.len() as u64;
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }

        // The temp file is removed on drop if any step fails
        let mut file = NamedTempFile::new_in(&self.directory)?;
        file.write_all(&content)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for (path, _) in self.entry_files()? {
            let Some(content) = Self::read_optional(&path)? else {
                continue;
            };
            match serde_json::from_str::<StoredEntry>(&content) {
                Ok(entry) => keys.push(entry.key.into_owned()),
                Err(_) => debug!(path = %path.display(), "Skipping unreadable entry file"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn usage_bytes(&self) -> u64 {
        self.entry_files()
            .map(|files| files.iter().map(|(_, size)| size).sum())
            .unwrap_or(0)
    }
}

/// Hex SHA-256 of the key, a fixed 64-character file stem.
fn file_stem(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}
