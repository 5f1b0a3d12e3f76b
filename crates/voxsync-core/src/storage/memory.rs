use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::{NoteHandle, NoteStorage, StoredNote};
use crate::error::{Error, Result};

/// In-memory note storage keyed by path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    notes: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored note, ordered by path.
    pub fn notes(&self) -> BTreeMap<String, String> {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn insert(&self, path: &str, content: &str) {
        self.notes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), content.to_string());
    }
}

impl NoteStorage for MemoryStorage {
    async fn read_by_path(&self, path: &str) -> Result<Option<StoredNote>> {
        Ok(self.get(path).map(|content| StoredNote {
            handle: NoteHandle::new(path),
            content,
        }))
    }

    async fn create(&self, path: &str, content: &str) -> Result<NoteHandle> {
        let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        if notes.contains_key(path) {
            return Err(Error::StorageConflict(path.to_string()));
        }
        notes.insert(path.to_string(), content.to_string());
        Ok(NoteHandle::new(path))
    }

    async fn modify(&self, handle: &NoteHandle, content: &str) -> Result<()> {
        let mut notes = self.notes.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(existing) = notes.get_mut(handle.path()) else {
            return Err(Error::StorageUnavailable(format!(
                "{} no longer exists",
                handle.path()
            )));
        };
        content.clone_into(existing);
        Ok(())
    }
}
