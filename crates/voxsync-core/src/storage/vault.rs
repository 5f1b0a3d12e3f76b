//! Markdown vault on the local file system.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{NoteHandle, NoteStorage, StoredNote};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct VaultStorage {
    root: PathBuf,
}

impl VaultStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault-relative path, refusing anything that would escape the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim());
        if relative.as_os_str().is_empty() {
            return Err(Error::InvalidInput("note path must not be empty".to_string()));
        }
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::InvalidInput(format!(
                "note path must stay inside the vault: {path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn unavailable(path: &Path, error: &io::Error) -> Error {
    Error::StorageUnavailable(format!("{}: {}", path.display(), error))
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|error| unavailable(parent, &error))?;
    }
    Ok(())
}

/// Fill a freshly created note. On failure the note is removed again.
async fn fill_or_remove<W>(mut writer: W, path: &Path, content: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(content.as_bytes()).await?;
        writer.flush().await
    }
    .await;
    if written.is_err() {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                "failed to remove partial note: {}",
                cleanup
            );
        }
    }
    written
}

impl NoteStorage for VaultStorage {
    async fn read_by_path(&self, path: &str) -> Result<Option<StoredNote>> {
        let full_path = self.resolve(path)?;
        match fs::read_to_string(&full_path).await {
            Ok(content) => Ok(Some(StoredNote {
                handle: NoteHandle::new(path.trim()),
                content,
            })),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(unavailable(&full_path, &error)),
        }
    }

    async fn create(&self, path: &str, content: &str) -> Result<NoteHandle> {
        let full_path = self.resolve(path)?;
        ensure_parent(&full_path).await?;

        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .await
        {
            Ok(file) => file,
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::StorageConflict(path.trim().to_string()));
            }
            Err(error) => return Err(unavailable(&full_path, &error)),
        };
        fill_or_remove(file, &full_path, content)
            .await
            .map_err(|error| unavailable(&full_path, &error))?;

        tracing::debug!(path = %full_path.display(), "note created");
        Ok(NoteHandle::new(path.trim()))
    }

    async fn modify(&self, handle: &NoteHandle, content: &str) -> Result<()> {
        let full_path = self.resolve(handle.path())?;
        let mut tmp_name = full_path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, content)
            .await
            .map_err(|error| unavailable(&tmp_path, &error))?;
        fs::rename(&tmp_path, &full_path)
            .await
            .map_err(|error| unavailable(&full_path, &error))?;

        tracing::debug!(path = %full_path.display(), "note updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn create_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());

        let handle = vault.create("inbox/Walk.md", "hello").await.unwrap();
        assert_eq!(handle.path(), "inbox/Walk.md");

        let stored = vault.read_by_path("inbox/Walk.md").await.unwrap().unwrap();
        assert_eq!(stored.content, "hello");
        assert_eq!(stored.handle, handle);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_note_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        assert_eq!(vault.read_by_path("nope.md").await.unwrap(), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_existing_note_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        vault.create("Walk.md", "first").await.unwrap();

        let error = vault.create("Walk.md", "second").await.unwrap_err();
        assert!(matches!(error, Error::StorageConflict(_)));
        let stored = vault.read_by_path("Walk.md").await.unwrap().unwrap();
        assert_eq!(stored.content, "first");
    }

    /// Accepts a few bytes, then fails like a full disk.
    struct FullDisk {
        room: usize,
    }

    impl AsyncWrite for FullDisk {
        fn poll_write(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<io::Result<usize>> {
            if self.room == 0 {
                return std::task::Poll::Ready(Err(io::Error::other("no space left")));
            }
            let written = buf.len().min(self.room);
            self.room -= written;
            std::task::Poll::Ready(Ok(written))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_write_leaves_no_partial_note() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        let path = dir.path().join("Walk.md");
        fs::write(&path, "").await.unwrap();

        let error = fill_or_remove(FullDisk { room: 3 }, &path, "hello")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "no space left");
        assert!(!path.exists());

        vault.create("Walk.md", "hello").await.unwrap();
        let stored = vault.read_by_path("Walk.md").await.unwrap().unwrap();
        assert_eq!(stored.content, "hello");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn long_wide_name_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        let name = format!("{}.md", crate::sync::sanitize_note_name(&"会".repeat(200)));

        vault.create(&name, "hello").await.unwrap();
        let stored = vault.read_by_path(&name).await.unwrap().unwrap();
        assert_eq!(stored.content, "hello");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn modify_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        let handle = vault.create("Log.md", "a").await.unwrap();

        vault.modify(&handle, "a\nb").await.unwrap();
        let stored = vault.read_by_path("Log.md").await.unwrap().unwrap();
        assert_eq!(stored.content, "a\nb");
        assert!(!dir.path().join("Log.md.tmp").exists());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn paths_cannot_escape_vault() {
        let dir = tempfile::tempdir().unwrap();
        let vault = VaultStorage::new(dir.path());
        assert!(matches!(
            vault.create("../outside.md", "x").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            vault.read_by_path("/etc/passwd").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
