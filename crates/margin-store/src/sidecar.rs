//! Sidecar tag/pin store.
//!
//! [`TagStore`] owns the in-memory copy of the sidecar document and persists
//! it through the storage backend. Every mutation is a full-document rewrite
//! (last writer wins); there is no incremental patching and no
//! optimistic-concurrency check. A crash mid-write can corrupt the sidecar,
//! in which case the next [`TagStore::initialize`] self-heals to an empty
//! document.

use std::sync::Arc;

use margin_core::{Result, SidecarDocument};
use tracing::{debug, info, warn};

use crate::storage::StorageBackend;

/// Persistence for note tags and pin metadata.
///
/// The store is the source of truth for tags/pinned, never for note
/// existence: keys without a backing file are stale but harmless, and get
/// pruned on delete/rename of the corresponding note.
pub struct TagStore {
    backend: Arc<dyn StorageBackend>,
    doc: SidecarDocument,
}

impl TagStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            doc: SidecarDocument::default(),
        }
    }

    /// Load the sidecar document.
    ///
    /// A missing, malformed, or non-object document degrades to an empty
    /// store which is persisted immediately. This never fails the caller:
    /// any read or parse error means "empty store", not an error surfaced to
    /// the user.
    pub async fn initialize(&mut self) -> Result<()> {
        let path = self.backend.sidecar_path();
        match self.backend.read(&path).await {
            Ok(bytes) => match std::str::from_utf8(&bytes)
                .map_err(|e| e.to_string())
                .and_then(|raw| SidecarDocument::parse(raw).map_err(|e| e.to_string()))
            {
                Ok(doc) => {
                    info!(
                        entries = doc.tags.len(),
                        path = %path.display(),
                        "sidecar loaded"
                    );
                    self.doc = doc;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed sidecar, resetting to empty");
                    self.doc = SidecarDocument::default();
                    self.persist_best_effort().await;
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no sidecar, creating empty document");
                self.doc = SidecarDocument::default();
                self.persist_best_effort().await;
            }
        }
        Ok(())
    }

    /// Tags for `title`; empty when unknown. Non-mutating.
    pub fn get_tags(&self, title: &str) -> Vec<String> {
        self.doc.tags.get(title).cloned().unwrap_or_default()
    }

    /// Pinned state for `title`; false when unknown.
    pub fn get_pinned(&self, title: &str) -> bool {
        self.doc
            .metadata
            .get(title)
            .map(|m| m.pinned)
            .unwrap_or(false)
    }

    /// Store `tags` for `title` verbatim and persist.
    ///
    /// Normalization (trim, dedupe) is the caller's job; the store writes
    /// exactly what it is handed.
    pub async fn set_tags(&mut self, title: &str, tags: Vec<String>) -> Result<()> {
        self.doc.tags.insert(title.to_string(), tags);
        self.persist().await
    }

    /// Move the tag entry from `old_title` to `new_title` and persist.
    ///
    /// When no entry exists under the old key, an empty entry is created
    /// under the new one, so every note has a tag entry post-rename. The
    /// pinned metadata entry is deliberately not moved (see DESIGN.md).
    pub async fn rename_key(&mut self, old_title: &str, new_title: &str) -> Result<()> {
        match self.doc.tags.remove(old_title) {
            Some(tags) => {
                self.doc.tags.insert(new_title.to_string(), tags);
            }
            None => {
                self.doc.tags.insert(new_title.to_string(), Vec::new());
            }
        }
        self.persist().await
    }

    /// Remove the tag entry for `title` and persist.
    ///
    /// A metadata entry under the same key is left dangling (see DESIGN.md).
    pub async fn delete_key(&mut self, title: &str) -> Result<()> {
        self.doc.tags.remove(title);
        self.persist().await
    }

    /// Upsert the pinned flag for `title` and persist.
    pub async fn set_pinned(&mut self, title: &str, pinned: bool) -> Result<()> {
        self.doc.metadata.entry(title.to_string()).or_default().pinned = pinned;
        self.persist().await
    }

    /// Whole-document rewrite in the structured format.
    async fn persist(&self) -> Result<()> {
        let path = self.backend.sidecar_path();
        let json = self.doc.to_pretty_json()?;
        self.backend.write(&path, json.as_bytes()).await?;
        debug!(
            entries = self.doc.tags.len(),
            path = %path.display(),
            "sidecar persisted"
        );
        Ok(())
    }

    async fn persist_best_effort(&self) {
        if let Err(e) = self.persist().await {
            warn!(error = %e, "failed to persist empty sidecar document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MemoryBackend;

    fn store() -> (Arc<MemoryBackend>, TagStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = TagStore::new(backend.clone());
        (backend, store)
    }

    #[tokio::test]
    async fn test_initialize_absent_creates_empty_document() {
        let (backend, mut store) = store();
        store.initialize().await.unwrap();

        let raw = backend.contents(&backend.sidecar_path()).unwrap();
        let doc = SidecarDocument::parse(std::str::from_utf8(&raw).unwrap()).unwrap();
        assert!(doc.tags.is_empty());
        assert!(doc.metadata.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_malformed_self_heals() {
        let (backend, mut store) = store();
        backend
            .write(&backend.sidecar_path(), b"{not json")
            .await
            .unwrap();

        store.initialize().await.unwrap();
        assert!(store.get_tags("Alpha").is_empty());

        let raw = backend.contents(&backend.sidecar_path()).unwrap();
        assert!(SidecarDocument::parse(std::str::from_utf8(&raw).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_initialize_non_object_self_heals() {
        let (backend, mut store) = store();
        backend
            .write(&backend.sidecar_path(), b"\"just a string\"")
            .await
            .unwrap();

        store.initialize().await.unwrap();
        assert!(store.get_tags("Alpha").is_empty());
    }

    #[tokio::test]
    async fn test_unknown_title_defaults() {
        let (_backend, store) = store();
        assert!(store.get_tags("Nope").is_empty());
        assert!(!store.get_pinned("Nope"));
    }

    #[tokio::test]
    async fn test_set_tags_round_trip_structured() {
        let (backend, mut store) = store();
        store.initialize().await.unwrap();
        store
            .set_tags("Alpha", vec!["x".into(), "y".into()])
            .await
            .unwrap();

        // Reload from the persisted document
        let mut reloaded = TagStore::new(backend);
        reloaded.initialize().await.unwrap();
        assert_eq!(reloaded.get_tags("Alpha"), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_round_trip_from_legacy_format() {
        let (backend, mut store) = store();
        backend
            .write(&backend.sidecar_path(), br#"{"Alpha": ["x", "y"]}"#)
            .await
            .unwrap();

        store.initialize().await.unwrap();
        assert_eq!(store.get_tags("Alpha"), vec!["x", "y"]);

        // Any persist rewrites in the structured form
        store.set_pinned("Alpha", true).await.unwrap();
        let mut reloaded = TagStore::new(backend);
        reloaded.initialize().await.unwrap();
        assert_eq!(reloaded.get_tags("Alpha"), vec!["x", "y"]);
        assert!(reloaded.get_pinned("Alpha"));
    }

    #[tokio::test]
    async fn test_rename_key_moves_tags() {
        let (_backend, mut store) = store();
        store.initialize().await.unwrap();
        store.set_tags("Alpha", vec!["x".into()]).await.unwrap();

        store.rename_key("Alpha", "Beta").await.unwrap();
        assert!(store.get_tags("Alpha").is_empty());
        assert_eq!(store.get_tags("Beta"), vec!["x"]);
    }

    #[tokio::test]
    async fn test_rename_key_without_entry_creates_empty() {
        let (_backend, mut store) = store();
        store.initialize().await.unwrap();

        store.rename_key("Ghost", "Beta").await.unwrap();
        assert!(store.get_tags("Beta").is_empty());
        // An entry now exists under the new key
        let raw = store.doc.tags.get("Beta");
        assert!(raw.is_some());
    }

    #[tokio::test]
    async fn test_rename_key_does_not_move_pin_metadata() {
        // Pins the observed asymmetry: rename moves tags but leaves the
        // metadata entry under the old key.
        let (_backend, mut store) = store();
        store.initialize().await.unwrap();
        store.set_tags("Alpha", vec!["x".into()]).await.unwrap();
        store.set_pinned("Alpha", true).await.unwrap();

        store.rename_key("Alpha", "Beta").await.unwrap();
        assert!(!store.get_pinned("Beta"));
        assert!(store.get_pinned("Alpha"));
    }

    #[tokio::test]
    async fn test_delete_key_leaves_pin_metadata_dangling() {
        // Same asymmetry on delete: the tags entry goes, metadata stays.
        let (_backend, mut store) = store();
        store.initialize().await.unwrap();
        store.set_tags("Alpha", vec!["x".into()]).await.unwrap();
        store.set_pinned("Alpha", true).await.unwrap();

        store.delete_key("Alpha").await.unwrap();
        assert!(store.get_tags("Alpha").is_empty());
        assert!(store.get_pinned("Alpha"));
    }

    #[tokio::test]
    async fn test_set_pinned_upserts() {
        let (_backend, mut store) = store();
        store.initialize().await.unwrap();

        store.set_pinned("Alpha", true).await.unwrap();
        assert!(store.get_pinned("Alpha"));
        store.set_pinned("Alpha", false).await.unwrap();
        assert!(!store.get_pinned("Alpha"));
    }

    #[tokio::test]
    async fn test_mutation_propagates_persist_failure() {
        let (backend, mut store) = store();
        store.initialize().await.unwrap();

        backend.fail_writes(true);
        assert!(store.set_tags("Alpha", vec!["x".into()]).await.is_err());
    }
}
