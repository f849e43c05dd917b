// src/answers.rs
//! Persisted answer records: campaign identifier → answered flag.
//!
//! The evaluator only ever asks whether a record *exists*; the flag value is
//! kept for the UI collaborator (accepted vs. dismissed).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::AnswerStoreError;

/// Key-value persistence behind `mark_answered` and the answered check.
pub trait AnswerStore: Send + Sync {
    fn exists(&self, campaign_identifier: &str) -> Result<bool, AnswerStoreError>;
    fn set(&self, campaign_identifier: &str, answer: bool) -> Result<(), AnswerStoreError>;
}

/* ----------------------------
In-memory store
---------------------------- */

/// Non-durable store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryAnswerStore {
    inner: Mutex<HashMap<String, bool>>,
}

impl MemoryAnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded flag for a campaign, if any.
    pub fn get(&self, campaign_identifier: &str) -> Option<bool> {
        self.inner
            .lock()
            .ok()
            .and_then(|m| m.get(campaign_identifier).copied())
    }
}

impl AnswerStore for MemoryAnswerStore {
    fn exists(&self, campaign_identifier: &str) -> Result<bool, AnswerStoreError> {
        let m = self
            .inner
            .lock()
            .map_err(|_| AnswerStoreError::unavailable("memory answer store poisoned"))?;
        Ok(m.contains_key(campaign_identifier))
    }

    fn set(&self, campaign_identifier: &str, answer: bool) -> Result<(), AnswerStoreError> {
        let mut m = self
            .inner
            .lock()
            .map_err(|_| AnswerStoreError::unavailable("memory answer store poisoned"))?;
        m.insert(campaign_identifier.to_string(), answer);
        Ok(())
    }
}

/* ----------------------------
JSON file store
---------------------------- */

/// Durable store backed by a single JSON object file (`{"<campaign>": true}`).
///
/// The map is loaded once on `open` and written through on every `set`.
/// Writes go to `<path>.tmp` (e.g. `answers.json.tmp`) first and are renamed
/// into place; the in-memory map only changes after the rename succeeded.
#[derive(Debug)]
pub struct FileAnswerStore {
    path: PathBuf,
    answers: Mutex<BTreeMap<String, bool>>,
}

impl FileAnswerStore {
    /// Open (or lazily create) the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AnswerStoreError> {
        let path = path.into();
        let answers: BTreeMap<String, bool> = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AnswerStoreError::Io(e)),
        };
        debug!(path = %path.display(), records = answers.len(), "opened answer store");
        Ok(Self {
            path,
            answers: Mutex::new(answers),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded flag for a campaign, if any.
    pub fn get(&self, campaign_identifier: &str) -> Option<bool> {
        self.lock()
            .ok()
            .and_then(|m| m.get(campaign_identifier).copied())
    }

    /// Sibling temp file: the full file name plus `.tmp`.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, bool>>, AnswerStoreError> {
        self.answers
            .lock()
            .map_err(|_| AnswerStoreError::unavailable("file answer store poisoned"))
    }

    fn write_atomic(&self, answers: &BTreeMap<String, bool>) -> Result<(), AnswerStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(answers)?;

        let tmp = self.tmp_path();
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl AnswerStore for FileAnswerStore {
    fn exists(&self, campaign_identifier: &str) -> Result<bool, AnswerStoreError> {
        Ok(self.lock()?.contains_key(campaign_identifier))
    }

    fn set(&self, campaign_identifier: &str, answer: bool) -> Result<(), AnswerStoreError> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        next.insert(campaign_identifier.to_string(), answer);
        self.write_atomic(&next)?;
        *guard = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_last_write_wins() {
        let s = MemoryAnswerStore::new();
        assert!(!s.exists("C1").unwrap());
        s.set("C1", true).unwrap();
        s.set("C1", false).unwrap();
        assert!(s.exists("C1").unwrap());
        assert_eq!(s.get("C1"), Some(false));
        assert_eq!(s.get("C2"), None);
    }

    #[test]
    fn file_store_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("answers.json");

        let s = FileAnswerStore::open(&path).unwrap();
        assert!(!s.exists("C1").unwrap());
        s.set("C1", true).unwrap();
        s.set("C2", false).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("answers.json.tmp").exists());

        let reopened = FileAnswerStore::open(&path).unwrap();
        assert!(reopened.exists("C1").unwrap());
        assert_eq!(reopened.get("C2"), Some(false));
    }

    #[test]
    fn tmp_file_keeps_full_name() {
        let dir = tempfile::tempdir().unwrap();
        let json = FileAnswerStore::open(dir.path().join("a.json")).unwrap();
        let toml = FileAnswerStore::open(dir.path().join("a.toml")).unwrap();
        assert_eq!(json.tmp_path(), dir.path().join("a.json.tmp"));
        assert_ne!(json.tmp_path(), toml.tmp_path());
    }

    #[test]
    fn failed_write_leaves_campaign_unanswered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        let s = FileAnswerStore::open(&path).unwrap();

        // A directory squatting on the temp path makes File::create fail.
        fs::create_dir(dir.path().join("answers.json.tmp")).unwrap();

        let err = s.set("C1", true).unwrap_err();
        assert!(matches!(err, AnswerStoreError::Io(_)));
        assert!(!s.exists("C1").unwrap());
        assert_eq!(s.get("C1"), None);
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        fs::write(&path, "not json").unwrap();
        let err = FileAnswerStore::open(&path).unwrap_err();
        assert!(matches!(err, AnswerStoreError::Json(_)));
    }

    #[test]
    fn empty_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        fs::write(&path, "\n").unwrap();
        let s = FileAnswerStore::open(&path).unwrap();
        assert!(!s.exists("anything").unwrap());
    }
}
