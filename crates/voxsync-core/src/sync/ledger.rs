//! Local record of uploads already written to the vault.
//!
//! The service is expected to stop returning an upload once it has been
//! acknowledged. When an acknowledgement is lost, or the service returns an
//! upload again anyway, the ledger keeps it from being written twice.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_LEDGER_CAPACITY: usize = 5000;

const LEDGER_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    acknowledged: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AckLedger {
    path: Option<PathBuf>,
    capacity: usize,
    order: VecDeque<String>,
    ids: HashSet<String>,
    dirty: bool,
}

impl AckLedger {
    /// Ledger that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            capacity: DEFAULT_LEDGER_CAPACITY,
            order: VecDeque::new(),
            ids: HashSet::new(),
            dirty: false,
        }
    }

    /// Load the ledger at `path`. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut ledger = Self {
            path: Some(path.clone()),
            ..Self::in_memory()
        };

        match read_ledger(&path) {
            Ok(Some(file)) => {
                for id in file.acknowledged {
                    ledger.insert(id);
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(
                    "Ignoring unreadable acknowledgement ledger at {}: {}",
                    path.display(),
                    error
                );
            }
        }
        ledger.dirty = false;
        ledger
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self.evict();
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remember `id`; the oldest entries fall off past capacity.
    pub fn record(&mut self, id: &str) {
        if self.insert(id.to_string()) {
            self.dirty = true;
        }
    }

    /// Write pending changes atomically. No-op for in-memory ledgers.
    pub fn save(&mut self) -> Result<()> {
        match self.take_pending_write() {
            Some(write) => write.commit().inspect_err(|_| self.dirty = true),
            None => Ok(()),
        }
    }

    /// Snapshot unsaved changes so they can be written without holding the
    /// ledger. Call [`AckLedger::mark_unsaved`] if the write fails.
    pub fn take_pending_write(&mut self) -> Option<LedgerWrite> {
        let path = self.path.clone()?;
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(LedgerWrite {
            path,
            file: LedgerFile {
                version: LEDGER_VERSION,
                acknowledged: self.order.iter().cloned().collect(),
            },
        })
    }

    pub fn mark_unsaved(&mut self) {
        self.dirty = self.path.is_some();
    }

    fn insert(&mut self, id: String) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.insert(id.clone());
        self.order.push_back(id);
        self.evict();
        true
    }

    fn evict(&mut self) {
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }
}

/// Serialized ledger contents waiting to be written.
#[derive(Debug)]
pub struct LedgerWrite {
    path: PathBuf,
    file: LedgerFile,
}

impl LedgerWrite {
    /// Blocking write through a temp file and rename.
    pub fn commit(self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string(&self.file)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn read_ledger(path: &Path) -> Result<Option<LedgerFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_idempotent() {
        let mut ledger = AckLedger::in_memory();
        ledger.record("1");
        ledger.record("1");
        assert_eq!(ledger.len(), 1);
        assert!(ledger.contains("1"));
        assert!(!ledger.contains("2"));
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut ledger = AckLedger::in_memory().with_capacity(2);
        ledger.record("1");
        ledger.record("2");
        ledger.record("3");
        assert!(!ledger.contains("1"));
        assert!(ledger.contains("2"));
        assert!(ledger.contains("3"));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("acknowledged.json");

        let mut ledger = AckLedger::load(&path);
        assert!(ledger.is_empty());
        ledger.record("a");
        ledger.record("b");
        ledger.save().unwrap();

        let reloaded = AckLedger::load(&path);
        assert!(reloaded.contains("a"));
        assert!(reloaded.contains("b"));
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn pending_write_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acknowledged.json");

        let mut ledger = AckLedger::load(&path);
        assert!(ledger.take_pending_write().is_none());
        ledger.record("a");
        let write = ledger.take_pending_write().unwrap();
        assert!(ledger.take_pending_write().is_none());

        ledger.mark_unsaved();
        assert!(ledger.take_pending_write().is_some());
        write.commit().unwrap();
        assert!(AckLedger::load(&path).contains("a"));

        let mut memory = AckLedger::in_memory();
        memory.record("a");
        assert!(memory.take_pending_write().is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acknowledged.json");
        fs::write(&path, "not json").unwrap();

        let ledger = AckLedger::load(&path);
        assert!(ledger.is_empty());
    }
}
