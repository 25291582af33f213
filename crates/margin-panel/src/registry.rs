//! Panel registry: editor-surface lifecycle per note title.
//!
//! The registry exclusively owns the map from title to open surface and
//! enforces the core invariant: at most one surface per title. Opening an
//! already-open note reveals the existing surface instead of creating a
//! duplicate; renames re-key the entry without reloading the surface's
//! buffer, so in-progress edits survive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use margin_core::{
    EditMode, MarkdownRenderer, NoteSurface, Result, SurfaceFactory, SurfaceInbound,
    SurfaceOutbound, TagEditHandler, UserNotifier,
};
use margin_store::StorageBackend;
use tracing::{debug, warn};

/// One open editor surface and its current backing file path.
///
/// The path is mutable state: it moves with the title on rename, and saves
/// always resolve it at message time, never at open time.
struct OpenSurface {
    surface: Box<dyn NoteSurface>,
    path: PathBuf,
}

/// Tracks which notes currently have an open editor surface.
pub struct PanelRegistry {
    surfaces: HashMap<String, OpenSurface>,
    factory: Box<dyn SurfaceFactory>,
    backend: Arc<dyn StorageBackend>,
    renderer: Box<dyn MarkdownRenderer>,
    notifier: Arc<dyn UserNotifier>,
    tag_edit: Option<Box<dyn TagEditHandler>>,
    default_edit_mode: EditMode,
}

impl PanelRegistry {
    pub fn new(
        factory: Box<dyn SurfaceFactory>,
        backend: Arc<dyn StorageBackend>,
        renderer: Box<dyn MarkdownRenderer>,
        notifier: Arc<dyn UserNotifier>,
        default_edit_mode: EditMode,
    ) -> Self {
        Self {
            surfaces: HashMap::new(),
            factory,
            backend,
            renderer,
            notifier,
            tag_edit: None,
            default_edit_mode,
        }
    }

    /// Register the handler for surface-initiated tag-edit requests.
    pub fn set_tag_edit_handler(&mut self, handler: Box<dyn TagEditHandler>) {
        self.tag_edit = Some(handler);
    }

    /// Show the surface for `title`, creating it if none exists.
    ///
    /// An existing surface is brought to the foreground and receives the
    /// current tags. A new surface is created, loaded with the backing
    /// file's content, and receives the initial update message. A read
    /// failure of the backing file is reported but does not prevent the
    /// surface from opening; it just starts without content.
    pub async fn show(&mut self, title: &str, path: &Path, tags: &[String]) -> Result<()> {
        if let Some(open) = self.surfaces.get(title) {
            debug!(title, "revealing existing surface");
            open.surface.reveal().await?;
            open.surface
                .send(SurfaceInbound::Update {
                    note_title: None,
                    content: None,
                    tags: Some(tags.to_vec()),
                    keep_content: None,
                    default_edit_mode: None,
                })
                .await?;
            return Ok(());
        }

        let surface = self.factory.create(title).await?;

        let content = match self.backend.read(path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                self.notifier
                    .error(&format!("Failed to read note \"{}\": {}", title, e));
                None
            }
        };

        if let Err(e) = surface
            .send(SurfaceInbound::Update {
                note_title: Some(title.to_string()),
                content,
                tags: Some(tags.to_vec()),
                keep_content: None,
                default_edit_mode: Some(self.default_edit_mode),
            })
            .await
        {
            // Never leave a live panel the registry does not track.
            if let Err(de) = surface.dispose().await {
                warn!(title, error = %de, "surface dispose failed");
            }
            return Err(e);
        }

        self.surfaces.insert(
            title.to_string(),
            OpenSurface {
                surface,
                path: path.to_path_buf(),
            },
        );
        debug!(title, surface_count = self.surfaces.len(), "surface opened");
        Ok(())
    }

    /// Dispose the surface for `title`, if open. Returns whether anything
    /// was closed.
    pub async fn close(&mut self, title: &str) -> bool {
        match self.surfaces.remove(title) {
            Some(open) => {
                if let Err(e) = open.surface.dispose().await {
                    warn!(title, error = %e, "surface dispose failed");
                }
                debug!(title, surface_count = self.surfaces.len(), "surface closed");
                true
            }
            None => false,
        }
    }

    /// Drop bookkeeping for a surface the user closed directly.
    ///
    /// The host calls this from its dispose notification; the surface is
    /// already gone, so nothing is disposed here. Returns whether an entry
    /// was tracked under `title`.
    pub fn handle_disposed(&mut self, title: &str) -> bool {
        if self.surfaces.remove(title).is_some() {
            debug!(title, surface_count = self.surfaces.len(), "surface disposed by user");
            true
        } else {
            false
        }
    }

    /// Re-key the entry for a renamed note and update the live surface.
    ///
    /// No-op when no surface is open under `old_title`. The entry is re-keyed
    /// and re-pathed before the surface is touched, so a failing surface call
    /// cannot lose the registry's bookkeeping for a live panel. The pushed
    /// update carries `keep_content` and no content field: renaming must
    /// never discard the surface's in-progress edits.
    pub async fn retitle(
        &mut self,
        old_title: &str,
        new_title: &str,
        tags: &[String],
        new_path: &Path,
    ) {
        let Some(mut open) = self.surfaces.remove(old_title) else {
            return;
        };
        open.path = new_path.to_path_buf();
        self.surfaces.insert(new_title.to_string(), open);

        if let Some(open) = self.surfaces.get(new_title) {
            if let Err(e) = open.surface.set_title(new_title).await {
                warn!(old_title, new_title, error = %e, "surface set_title failed");
            }
            if let Err(e) = open
                .surface
                .send(SurfaceInbound::Update {
                    note_title: Some(new_title.to_string()),
                    content: None,
                    tags: Some(tags.to_vec()),
                    keep_content: Some(true),
                    default_edit_mode: None,
                })
                .await
            {
                warn!(old_title, new_title, error = %e, "surface update push failed");
            }
        }
        debug!(old_title, new_title, "surface retitled");
    }

    /// Push a tags-only update to the open surface for `title`, if any.
    pub async fn update_tags(&self, title: &str, tags: &[String]) -> Result<()> {
        if let Some(open) = self.surfaces.get(title) {
            open.surface
                .send(SurfaceInbound::Update {
                    note_title: None,
                    content: None,
                    tags: Some(tags.to_vec()),
                    keep_content: Some(true),
                    default_edit_mode: None,
                })
                .await?;
        }
        Ok(())
    }

    /// Handle a message received from the surface open under `from_title`.
    ///
    /// Failures are reported to the user and logged; nothing propagates as
    /// an error to the host loop.
    pub async fn handle_message(&self, from_title: &str, message: SurfaceOutbound) {
        match message {
            SurfaceOutbound::Save {
                note_title,
                content,
            } => {
                // Path looked up by title at message time, so saves follow
                // renames that happened after the surface was opened.
                let Some(path) = self.path_of(&note_title) else {
                    self.notifier
                        .error(&format!("Failed to save note \"{}\": no file path", note_title));
                    return;
                };
                if let Err(e) = self.backend.write(&path, content.as_bytes()).await {
                    warn!(title = %note_title, error = %e, "save failed");
                    self.notifier
                        .error(&format!("Failed to save note \"{}\": {}", note_title, e));
                }
            }
            SurfaceOutbound::GetPreview { content } => {
                let html = match self.renderer.render(&content).await {
                    Ok(html) => html,
                    Err(e) => {
                        self.notifier
                            .error(&format!("Failed to render preview: {}", e));
                        return;
                    }
                };
                if let Some(open) = self.surfaces.get(from_title) {
                    if let Err(e) = open.surface.send(SurfaceInbound::Preview { html }).await {
                        warn!(title = from_title, error = %e, "preview push failed");
                    }
                }
            }
            SurfaceOutbound::EditTags { note_title } => match &self.tag_edit {
                Some(handler) => {
                    if let Err(e) = handler.request_tag_edit(&note_title).await {
                        warn!(title = %note_title, error = %e, "tag edit request failed");
                    }
                }
                None => {
                    debug!(title = %note_title, "tag edit requested but no handler registered");
                }
            },
        }
    }

    /// Titles of all currently open surfaces.
    pub fn open_titles(&self) -> Vec<String> {
        self.surfaces.keys().cloned().collect()
    }

    /// Current backing file path for `title`, if a surface is open.
    pub fn path_of(&self, title: &str) -> Option<PathBuf> {
        self.surfaces.get(title).map(|open| open.path.clone())
    }

    /// Whether a surface is open under `title`.
    pub fn contains(&self, title: &str) -> bool {
        self.surfaces.contains_key(title)
    }

    /// Number of open surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
