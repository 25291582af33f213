//! Note catalog: the reconciled in-memory view of all notes.
//!
//! The catalog owns the note list, the tag store, and the panel registry,
//! and keeps the three consistent across every mutation. It is constructed
//! once per session and shared by handle; there are no ambient singletons.
//!
//! Error propagation follows one policy throughout: logical errors
//! (duplicate title, empty rename) are rejected before any I/O and reported
//! as warnings; I/O errors short-circuit the remaining steps of the
//! operation so the in-memory model never claims a state the filesystem
//! doesn't support; nothing crosses into the UI as anything other than a
//! human-readable message.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use margin_core::{
    normalize_tags, CatalogEvent, Config, Error, EventBus, MarkdownRenderer, NoteRecord, Result,
    SurfaceFactory, SurfaceOutbound, TagEditHandler, UserNotifier,
};
use margin_panel::PanelRegistry;
use margin_store::{StorageBackend, TagStore};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// List state behind one lock: the reconciled records plus the active filter.
#[derive(Default)]
struct ListState {
    notes: Vec<NoteRecord>,
    filter_text: String,
}

/// The note/tag state manager.
///
/// All mutating operations serialize through a single op guard, so two
/// catalog mutations cannot interleave across their await points (rename vs.
/// delete on the same title, for example). Reads take only the short-lived
/// state lock.
pub struct NoteCatalog {
    state: Mutex<ListState>,
    tag_store: Mutex<TagStore>,
    registry: Mutex<PanelRegistry>,
    backend: Arc<dyn StorageBackend>,
    notifier: Arc<dyn UserNotifier>,
    events: Arc<EventBus>,
    config: Config,
    initialized: AtomicBool,
    op_guard: Mutex<()>,
}

impl NoteCatalog {
    pub fn new(
        config: Config,
        backend: Arc<dyn StorageBackend>,
        factory: Box<dyn SurfaceFactory>,
        renderer: Box<dyn MarkdownRenderer>,
        notifier: Arc<dyn UserNotifier>,
        events: Arc<EventBus>,
    ) -> Self {
        let registry = PanelRegistry::new(
            factory,
            backend.clone(),
            renderer,
            notifier.clone(),
            config.default_edit_mode,
        );
        Self {
            state: Mutex::new(ListState::default()),
            tag_store: Mutex::new(TagStore::new(backend.clone())),
            registry: Mutex::new(registry),
            backend,
            notifier,
            events,
            config,
            initialized: AtomicBool::new(false),
            op_guard: Mutex::new(()),
        }
    }

    /// Register the handler for surface-initiated tag-edit requests.
    pub async fn set_tag_edit_handler(&self, handler: Box<dyn TagEditHandler>) {
        self.registry.lock().await.set_tag_edit_handler(handler);
    }

    /// One-shot initialization: load the sidecar store, then reconcile.
    ///
    /// Subsequent calls are cheap no-ops. Failures degrade to user-visible
    /// messages; initialization itself never fails the caller.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let guard = self.op_guard.lock().await;

        if let Err(e) = self.backend.ensure_dir().await {
            self.notifier
                .error(&format!("Initialization failed: {}", e));
            return;
        }
        if let Err(e) = self.tag_store.lock().await.initialize().await {
            self.notifier
                .error(&format!("Initialization failed: {}", e));
            return;
        }
        self.reconcile_locked(&guard).await;
        info!(subsystem = "catalog", "catalog initialized");
    }

    /// Reconcile the catalog against on-disk truth.
    ///
    /// The canonical recovery path after any external file-system change.
    /// Safe to call repeatedly: the list is rebuilt from scratch every time.
    pub async fn load_existing_notes(&self) {
        let guard = self.op_guard.lock().await;
        self.reconcile_locked(&guard).await;
    }

    async fn reconcile_locked(&self, _guard: &MutexGuard<'_, ()>) {
        // Step 1: no surface may outlive its backing file. Close surfaces
        // whose file vanished before rebuilding the list.
        let mut registry = self.registry.lock().await;
        for title in registry.open_titles() {
            let missing = match registry.path_of(&title) {
                Some(path) => !self.backend.exists(&path).await.unwrap_or(false),
                None => true,
            };
            if missing {
                registry.close(&title).await;
                self.notifier.warn(&format!(
                    "Note \"{}\" was deleted; its panel has been closed",
                    title
                ));
                self.events
                    .emit(CatalogEvent::SurfaceForceClosed { title });
            }
        }
        drop(registry);

        // Step 2: rebuild the list from directory enumeration + sidecar.
        let titles = match self.backend.list_notes().await {
            Ok(titles) => titles,
            Err(e) => {
                self.notifier.error(&format!("Failed to load notes: {}", e));
                return;
            }
        };
        let tag_store = self.tag_store.lock().await;
        let notes: Vec<NoteRecord> = titles
            .into_iter()
            .map(|title| {
                let tags = tag_store.get_tags(&title);
                let pinned = tag_store.get_pinned(&title);
                NoteRecord::with_metadata(title, tags, pinned)
            })
            .collect();
        drop(tag_store);

        // Steps 3 and 4: reset the filter, publish the change.
        let note_count = notes.len();
        let mut state = self.state.lock().await;
        state.notes = notes;
        state.filter_text.clear();
        drop(state);

        debug!(subsystem = "catalog", op = "reconcile", note_count, "reconciled");
        self.emit_list_changed().await;
    }

    /// Create an empty note.
    ///
    /// Titles are a uniqueness domain enforced before file creation, so an
    /// existing note is never silently overwritten. Per configuration, the
    /// new note's surface may open immediately.
    pub async fn add_note(&self, title: &str) {
        let _guard = self.op_guard.lock().await;

        if let Err(e) = validate_title(title) {
            self.notifier.warn(&format!("Cannot create note: {}", e));
            return;
        }
        if self.title_exists(title).await {
            self.notifier
                .warn(&format!("Note \"{}\" already exists", title));
            return;
        }

        let path = self.backend.note_path(title);
        if let Err(e) = self.backend.write(&path, b"").await {
            self.notifier
                .error(&format!("Failed to create note: {}", e));
            return;
        }

        self.state.lock().await.notes.push(NoteRecord::new(title));
        debug!(subsystem = "catalog", op = "add_note", title, "note created");
        self.emit_list_changed().await;

        if self.config.open_on_create {
            if let Err(e) = self.registry.lock().await.show(title, &path, &[]).await {
                self.notifier
                    .error(&format!("Failed to open note \"{}\": {}", title, e));
                return;
            }
            self.events.emit(CatalogEvent::NoteOpened {
                title: title.to_string(),
            });
        }
    }

    /// Delete a note: surface first, then sidecar entry, then file, then
    /// the in-memory record.
    ///
    /// A failed tag-entry removal is only warned — the file deletion still
    /// proceeds. A failed file deletion aborts before the list is touched,
    /// so the catalog never drops a record whose file still exists.
    pub async fn delete_note(&self, title: &str) {
        let _guard = self.op_guard.lock().await;

        if !self.title_exists(title).await {
            self.notifier
                .warn(&format!("Note \"{}\" does not exist", title));
            return;
        }

        if self.registry.lock().await.close(title).await {
            self.events.emit(CatalogEvent::NoteClosed {
                title: title.to_string(),
            });
        }

        if let Err(e) = self.tag_store.lock().await.delete_key(title).await {
            self.notifier
                .warn(&format!("Failed to delete note tags: {}", e));
        }

        let path = self.backend.note_path(title);
        if let Err(e) = self.backend.delete(&path).await {
            self.notifier
                .error(&format!("Failed to delete note file: {}", e));
            return;
        }

        self.state.lock().await.notes.retain(|n| n.title != title);
        debug!(subsystem = "catalog", op = "delete_note", title, "note deleted");
        self.emit_list_changed().await;
    }

    /// Rename a note, moving its file, sidecar entry, and any open surface.
    ///
    /// No-op when the new title is empty or unchanged; rejected when another
    /// record already holds it (case-sensitive exact match). The
    /// copy-write-delete sequence short-circuits on first failure with no
    /// compensating rollback.
    pub async fn rename_note(&self, old_title: &str, new_title: &str) {
        let _guard = self.op_guard.lock().await;

        if new_title.is_empty() || new_title == old_title {
            return;
        }
        if let Err(e) = validate_title(new_title) {
            self.notifier.warn(&format!("Cannot rename note: {}", e));
            return;
        }
        if !self.title_exists(old_title).await {
            self.notifier
                .warn(&format!("Note \"{}\" does not exist", old_title));
            return;
        }
        if self.title_exists(new_title).await {
            self.notifier
                .warn(&format!("Note \"{}\" already exists", new_title));
            return;
        }

        let old_path = self.backend.note_path(old_title);
        let new_path = self.backend.note_path(new_title);

        let content = match self.backend.read(&old_path).await {
            Ok(content) => content,
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to rename note: {}", e));
                return;
            }
        };
        if let Err(e) = self.backend.write(&new_path, &content).await {
            self.notifier
                .error(&format!("Failed to rename note: {}", e));
            return;
        }
        if let Err(e) = self.backend.delete(&old_path).await {
            self.notifier
                .error(&format!("Failed to rename note: {}", e));
            return;
        }

        if let Err(e) = self
            .tag_store
            .lock()
            .await
            .rename_key(old_title, new_title)
            .await
        {
            // The in-memory entry moved; only the persist failed.
            self.notifier
                .warn(&format!("Failed to persist renamed tags: {}", e));
        }

        let tags = {
            let mut state = self.state.lock().await;
            match state.notes.iter_mut().find(|n| n.title == old_title) {
                Some(record) => {
                    record.title = new_title.to_string();
                    record.tags.clone()
                }
                // Unreachable: existence was checked under the same op guard.
                None => Vec::new(),
            }
        };

        // The live editor's displayed title and future save target move
        // with the catalog; unsaved edits are preserved.
        self.registry
            .lock()
            .await
            .retitle(old_title, new_title, &tags, &new_path)
            .await;

        debug!(subsystem = "catalog", op = "rename_note", old_title, new_title, "note renamed");
        self.emit_list_changed().await;
    }

    /// Replace a note's tags from raw comma-separated input.
    ///
    /// Normalization (trim, drop empties, dedupe) happens here, not in the
    /// store. The new tag list is pushed to any open surface.
    pub async fn edit_tags(&self, title: &str, raw_input: &str) {
        let _guard = self.op_guard.lock().await;

        let tags = normalize_tags(raw_input);
        {
            let mut state = self.state.lock().await;
            let Some(record) = state.notes.iter_mut().find(|n| n.title == title) else {
                self.notifier
                    .warn(&format!("Note \"{}\" does not exist", title));
                return;
            };
            record.tags = tags.clone();
        }

        if let Err(e) = self
            .tag_store
            .lock()
            .await
            .set_tags(title, tags.clone())
            .await
        {
            self.notifier
                .error(&format!("Failed to save tags: {}", e));
        }

        if let Err(e) = self.registry.lock().await.update_tags(title, &tags).await {
            warn!(title, error = %e, "surface tag update failed");
        }

        debug!(
            subsystem = "catalog",
            op = "edit_tags",
            title,
            tag_count = tags.len(),
            "tags updated"
        );
        self.emit_list_changed().await;
    }

    /// Set a note's pinned state.
    pub async fn toggle_pin(&self, title: &str, pinned: bool) {
        let _guard = self.op_guard.lock().await;

        {
            let mut state = self.state.lock().await;
            let Some(record) = state.notes.iter_mut().find(|n| n.title == title) else {
                self.notifier
                    .warn(&format!("Note \"{}\" does not exist", title));
                return;
            };
            record.pinned = pinned;
        }

        if let Err(e) = self.tag_store.lock().await.set_pinned(title, pinned).await {
            self.notifier
                .error(&format!("Failed to save pin state: {}", e));
        }
        self.emit_list_changed().await;
    }

    /// Set the list filter text. Applied at read time; the stored records
    /// are untouched.
    pub async fn set_filter(&self, text: &str) {
        {
            let mut state = self.state.lock().await;
            state.filter_text = text.to_string();
        }
        self.emit_list_changed().await;
    }

    /// Look up a record by exact title.
    ///
    /// Fails with [`Error::NoteNotFound`] rather than returning a silent
    /// empty result; callers must handle the miss explicitly.
    pub async fn get_by_title(&self, title: &str) -> Result<NoteRecord> {
        self.state
            .lock()
            .await
            .notes
            .iter()
            .find(|n| n.title == title)
            .cloned()
            .ok_or_else(|| Error::NoteNotFound(title.to_string()))
    }

    /// Open (or reveal) the editor surface for a note.
    pub async fn open_note(&self, title: &str) {
        let record = match self.get_by_title(title).await {
            Ok(record) => record,
            Err(e) => {
                self.notifier.warn(&e.to_string());
                return;
            }
        };
        let path = self.backend.note_path(&record.title);
        if let Err(e) = self
            .registry
            .lock()
            .await
            .show(&record.title, &path, &record.tags)
            .await
        {
            self.notifier
                .error(&format!("Failed to open note \"{}\": {}", title, e));
            return;
        }
        self.events.emit(CatalogEvent::NoteOpened {
            title: title.to_string(),
        });
    }

    /// Forward a message received from an open surface.
    pub async fn handle_surface_message(&self, from_title: &str, message: SurfaceOutbound) {
        self.registry
            .lock()
            .await
            .handle_message(from_title, message)
            .await;
    }

    /// Drop bookkeeping for a surface the user closed directly.
    ///
    /// `NoteClosed` is emitted only when a surface was actually tracked
    /// under `title`; stray dispose notifications produce no event.
    pub async fn handle_surface_disposed(&self, title: &str) {
        if self.registry.lock().await.handle_disposed(title) {
            self.events.emit(CatalogEvent::NoteClosed {
                title: title.to_string(),
            });
        }
    }

    /// The current filter text.
    pub async fn filter_text(&self) -> String {
        self.state.lock().await.filter_text.clone()
    }

    /// Filtered, sorted records for the list view: pinned notes first, then
    /// case-insensitive title order. Filtering is a case-insensitive
    /// substring match on the title.
    pub async fn filtered_notes(&self) -> Vec<NoteRecord> {
        let state = self.state.lock().await;
        let needle = state.filter_text.to_lowercase();
        let mut notes: Vec<NoteRecord> = state
            .notes
            .iter()
            .filter(|n| needle.is_empty() || n.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        notes.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        });
        notes
    }

    /// Number of open editor surfaces.
    pub async fn open_surface_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn title_exists(&self, title: &str) -> bool {
        self.state
            .lock()
            .await
            .notes
            .iter()
            .any(|n| n.title == title)
    }

    async fn emit_list_changed(&self) {
        let state = self.state.lock().await;
        self.events.emit(CatalogEvent::ListChanged {
            note_count: state.notes.len(),
            filter_text: state.filter_text.clone(),
        });
    }
}

/// Titles become file stems, so path separators would escape the notes
/// directory.
fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("title is empty".to_string()));
    }
    if title.contains('/') || title.contains('\\') {
        return Err(Error::InvalidInput(format!(
            "title contains a path separator: {}",
            title
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title_rejects_empty_and_separators() {
        assert!(validate_title("Alpha").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title("a/b").is_err());
        assert!(validate_title("a\\b").is_err());
    }
}
