//! File-backed shared store.
//!
//! A single versioned JSON document holds every slot:
//!
//! ```json
//! { "version": 1, "entries": { "jss_reauth_lock": "1700000000000" } }
//! ```
//!
//! Independent processes share it the way sibling tabs share an origin's
//! storage partition: no locking, no transactions, no change notification.
//! Every operation re-reads the document, so a writer's update becomes
//! visible to a sibling on its next poll - the eventually-consistent model
//! the coordination protocol is built for.
//!
//! # Defensive Design
//!
//! Since siblings write the file concurrently, loads handle:
//! - Missing or empty files (empty store)
//! - Corrupt JSON (empty store, log warning)
//! - Version mismatches (empty store, log warning)
//!
//! # Atomic Writes
//!
//! Uses temp file + rename so a sibling never reads a partial write.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::context::SharedStore;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    entries: HashMap<String, String>,
}

impl Default for StoreFile {
    fn default() -> Self {
        StoreFile {
            version: STORE_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Shared store persisted as one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: &Path) -> Self {
        JsonFileStore {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self) -> HashMap<String, String> {
        if !self.path.exists() {
            return HashMap::new();
        }

        let content = match fs_err::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to read store file; treating as empty");
                return HashMap::new();
            }
        };

        if content.trim().is_empty() {
            return HashMap::new();
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => file.entries,
            Ok(file) => {
                tracing::warn!(
                    path = %self.path.display(),
                    version = file.version,
                    "Unsupported store file version; treating as empty"
                );
                HashMap::new()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Corrupt store file; treating as empty");
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: HashMap<String, String>) {
        let file = StoreFile {
            version: STORE_VERSION,
            entries,
        };
        let content = match serde_json::to_string_pretty(&file) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to serialize store file");
                return;
            }
        };

        let Some(parent) = self.path.parent() else {
            tracing::warn!(path = %self.path.display(), "Store path has no parent directory");
            return;
        };
        if !parent.exists() {
            if let Err(err) = fs_err::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %err, "Failed to create store directory");
                return;
            }
        }

        let result = NamedTempFile::new_in(parent)
            .and_then(|mut tmp| {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                Ok(tmp)
            })
            .and_then(|tmp| tmp.persist(&self.path).map_err(|e| e.error));
        if let Err(err) = result {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to write store file");
        }
    }
}

impl SharedStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load_entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.load_entries();
        entries.insert(key.to_string(), value.to_string());
        self.persist(entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.load_entries();
        if entries.remove(key).is_some() {
            self.persist(entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let temp = tempdir().unwrap();
        let store = JsonFileStore::new(&temp.path().join("store.json"));
        store.set("bookmark_tab_abc", "https://h.example.test/computers/42");
        store.set("jss_reauth_lock", "1700000000000");

        let sibling = JsonFileStore::new(store.path());
        assert_eq!(
            sibling.get("bookmark_tab_abc").as_deref(),
            Some("https://h.example.test/computers/42")
        );
        sibling.remove("jss_reauth_lock");
        assert!(store.get("jss_reauth_lock").is_none());
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let temp = tempdir().unwrap();
        let store = JsonFileStore::new(&temp.path().join("nope.json"));
        assert!(store.get("anything").is_none());
    }

    #[test]
    fn test_empty_file_reads_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, "").unwrap();
        assert!(JsonFileStore::new(&path).get("k").is_none());
    }

    #[test]
    fn test_corrupt_file_reads_empty_and_recovers_on_write() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, "{invalid json}").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get("k").is_none());
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_unsupported_version_reads_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("store.json");
        std::fs::write(&path, r#"{"version":9,"entries":{"k":"v"}}"#).unwrap();
        assert!(JsonFileStore::new(&path).get("k").is_none());
    }

    #[test]
    fn test_set_creates_parent_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("store.json");
        let store = JsonFileStore::new(&path);
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }
}
