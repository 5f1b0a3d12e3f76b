//! Note storage collaborator.
//!
//! Paths are vault-relative strings such as `Voice Notes.md`.

mod memory;
mod vault;

use std::future::Future;

pub use memory::MemoryStorage;
pub use vault::VaultStorage;

use crate::error::Result;

/// Opaque reference to a stored note, returned by `create` and `read_by_path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteHandle {
    path: String,
}

impl NoteHandle {
    pub(crate) fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A note read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNote {
    pub handle: NoteHandle,
    pub content: String,
}

pub trait NoteStorage: Send + Sync + 'static {
    fn read_by_path(&self, path: &str) -> impl Future<Output = Result<Option<StoredNote>>> + Send;

    /// Create a new note; fails with `StorageConflict` when it already exists.
    fn create(&self, path: &str, content: &str)
        -> impl Future<Output = Result<NoteHandle>> + Send;

    /// Replace the content of an existing note.
    fn modify(&self, handle: &NoteHandle, content: &str)
        -> impl Future<Output = Result<()>> + Send;
}
