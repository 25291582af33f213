//! Sidebar list view: projection and command dispatch.
//!
//! The view is a pure projection over the catalog. It never stores list
//! state of its own; every refresh re-reads the filtered records, so the
//! sidebar recovers from missed events by asking again.

use std::sync::Arc;

use margin_core::{ListInbound, ListNoteEntry, ListOutbound};
use tracing::debug;

use crate::catalog::NoteCatalog;

/// UI-facing projection of the catalog for the sidebar list.
pub struct ListView {
    catalog: Arc<NoteCatalog>,
}

impl ListView {
    pub fn new(catalog: Arc<NoteCatalog>) -> Self {
        Self { catalog }
    }

    /// Build the `update` message for the sidebar: the filtered, sorted
    /// records projected to title + tags rows.
    pub async fn list_update(&self) -> ListInbound {
        let notes = self
            .catalog
            .filtered_notes()
            .await
            .into_iter()
            .map(|record| ListNoteEntry {
                title: record.title,
                tags: record.tags,
            })
            .collect();
        ListInbound::Update {
            notes,
            filter_text: self.catalog.filter_text().await,
        }
    }

    /// The message that focuses the sidebar's inline new-note input.
    pub fn show_new_note_input(&self) -> ListInbound {
        ListInbound::ShowNewNoteInput
    }

    /// Dispatch one command received from the sidebar.
    pub async fn handle_command(&self, command: ListOutbound) {
        debug!(subsystem = "catalog", ?command, "list command");
        match command {
            ListOutbound::Filter { text } => self.catalog.set_filter(&text).await,
            ListOutbound::OpenNote { title } => self.catalog.open_note(&title).await,
            ListOutbound::DeleteNote { title } => self.catalog.delete_note(&title).await,
            ListOutbound::RenameNote {
                old_title,
                new_title,
            } => self.catalog.rename_note(&old_title, &new_title).await,
            ListOutbound::EditTags { title, tags } => self.catalog.edit_tags(&title, &tags).await,
            ListOutbound::AddNote { title } => self.catalog.add_note(&title).await,
        }
    }
}
