//! Notes-directory storage backends.
//!
//! This module provides byte-level note storage with:
//! - A [`StorageBackend`] trait abstracting over filesystem and test backends
//! - Markdown file enumeration (title = file stem)
//! - Atomic write operations (temp file + rename)
//! - Directory-creation-if-absent and a startup health check

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use margin_core::{defaults, Error, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Storage backend trait for note file access.
///
/// All note and sidecar I/O in the catalog goes through this trait, so tests
/// can substitute an in-memory backend with injectable failures.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Read the file at `path`.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write `data` to `path`, creating parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete the file at `path`. Deleting an absent file is not an error.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Check whether a file exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Enumerate note titles: stems of markdown files in the notes directory.
    async fn list_notes(&self) -> Result<Vec<String>>;

    /// Absolute path of the backing file for `title`.
    fn note_path(&self, title: &str) -> PathBuf;

    /// Absolute path of the sidecar metadata document.
    fn sidecar_path(&self) -> PathBuf;

    /// Create the notes directory if absent.
    async fn ensure_dir(&self) -> Result<()>;
}

/// Filesystem storage backend rooted at the notes directory.
pub struct FilesystemBackend {
    notes_dir: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend for the given notes directory.
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
        }
    }

    /// The notes directory this backend is rooted at.
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem issues
    /// (permission errors, read-only mounts, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_file = self.notes_dir.join(".health-check.tmp");

        fs::create_dir_all(&self.notes_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", self.notes_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(path).await?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        debug!(path = %path.display(), size = data.len(), "storage: write");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "storage: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "storage: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "storage: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %path.display(), error = %e, "storage: rename failed");
            e
        })?;

        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        if fs::try_exists(path).await? {
            fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(fs::try_exists(path).await?)
    }

    async fn list_notes(&self) -> Result<Vec<String>> {
        let mut titles = Vec::new();
        let mut entries = fs::read_dir(&self.notes_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(defaults::NOTE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                titles.push(stem.to_string());
            }
        }
        titles.sort();
        debug!(note_count = titles.len(), dir = %self.notes_dir.display(), "storage: list_notes");
        Ok(titles)
    }

    fn note_path(&self, title: &str) -> PathBuf {
        self.notes_dir
            .join(format!("{}.{}", title, defaults::NOTE_EXTENSION))
    }

    fn sidecar_path(&self) -> PathBuf {
        self.notes_dir.join(defaults::SIDECAR_FILE)
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.notes_dir).await?;
        Ok(())
    }
}

/// In-memory backend used by tests across the workspace.
pub mod testing {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory [`StorageBackend`] with injectable write/delete failures.
    ///
    /// Paths are synthesized under a fixed virtual root, so `note_path` and
    /// `sidecar_path` behave like the filesystem backend's.
    #[derive(Default)]
    pub struct MemoryBackend {
        files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
        fail_writes: AtomicBool,
        fail_deletes: AtomicBool,
    }

    impl MemoryBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent `write` calls fail with a storage error.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make subsequent `delete` calls fail with a storage error.
        pub fn fail_deletes(&self, fail: bool) {
            self.fail_deletes.store(fail, Ordering::SeqCst);
        }

        /// Raw file contents, for assertions.
        pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path).cloned()
        }

        fn root() -> PathBuf {
            PathBuf::from("/memory/notes")
        }
    }

    #[async_trait]
    impl StorageBackend for MemoryBackend {
        async fn read(&self, path: &Path) -> Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Storage(format!("no such file: {}", path.display())))
        }

        async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::Storage("injected write failure".to_string()));
            }
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), data.to_vec());
            Ok(())
        }

        async fn delete(&self, path: &Path) -> Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(Error::Storage("injected delete failure".to_string()));
            }
            self.files.lock().unwrap().remove(path);
            Ok(())
        }

        async fn exists(&self, path: &Path) -> Result<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn list_notes(&self) -> Result<Vec<String>> {
            let files = self.files.lock().unwrap();
            let mut titles: Vec<String> = files
                .keys()
                .filter(|p| {
                    p.extension().and_then(|e| e.to_str()) == Some(defaults::NOTE_EXTENSION)
                })
                .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                .collect();
            titles.sort();
            Ok(titles)
        }

        fn note_path(&self, title: &str) -> PathBuf {
            Self::root().join(format!("{}.{}", title, defaults::NOTE_EXTENSION))
        }

        fn sidecar_path(&self) -> PathBuf {
            Self::root().join(defaults::SIDECAR_FILE)
        }

        async fn ensure_dir(&self) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryBackend;
    use super::*;

    #[tokio::test]
    async fn test_filesystem_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        let path = backend.note_path("Alpha");
        backend.write(&path, b"# Alpha").await.unwrap();
        assert_eq!(backend.read(&path).await.unwrap(), b"# Alpha");
        assert!(backend.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_filesystem_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("nested/notes"));

        backend.ensure_dir().await.unwrap();
        let path = backend.note_path("Alpha");
        backend.write(&path, b"").await.unwrap();
        assert!(backend.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_filesystem_delete_absent_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.delete(&backend.note_path("Missing")).await.unwrap();
    }

    #[tokio::test]
    async fn test_filesystem_list_notes_only_markdown_stems() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        backend
            .write(&backend.note_path("Beta"), b"")
            .await
            .unwrap();
        backend
            .write(&backend.note_path("Alpha"), b"")
            .await
            .unwrap();
        backend
            .write(&dir.path().join("tags.json"), b"{}")
            .await
            .unwrap();
        backend
            .write(&dir.path().join("scratch.txt"), b"")
            .await
            .unwrap();

        let titles = backend.list_notes().await.unwrap();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_filesystem_validate() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_backend_injected_failures() {
        let backend = MemoryBackend::new();
        let path = backend.note_path("Alpha");
        backend.write(&path, b"x").await.unwrap();

        backend.fail_deletes(true);
        assert!(backend.delete(&path).await.is_err());
        assert!(backend.exists(&path).await.unwrap());

        backend.fail_deletes(false);
        backend.delete(&path).await.unwrap();
        assert!(!backend.exists(&path).await.unwrap());
    }

    #[test]
    fn test_note_path_shape() {
        let backend = FilesystemBackend::new("/data/notes");
        assert_eq!(
            backend.note_path("Alpha"),
            PathBuf::from("/data/notes/Alpha.md")
        );
        assert_eq!(
            backend.sidecar_path(),
            PathBuf::from("/data/notes/tags.json")
        );
    }
}
