//! Wire protocol between the host-side controller and its webview surfaces.
//!
//! Two independent message sets exist: one per open editor surface (tagged by
//! `type`) and one for the sidebar list view (tagged by `command`). All
//! messages are JSON with camelCase field names. Optional fields are omitted
//! from the wire when unset; surfaces treat a missing `content` as "keep the
//! current editing buffer".

use serde::{Deserialize, Serialize};

use crate::models::EditMode;

// =============================================================================
// EDITOR SURFACE MESSAGES
// =============================================================================

/// Host → editor surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceInbound {
    /// Load or refresh surface state. Every field is optional; a tags-only
    /// update with `keep_content` set must not touch the editing buffer.
    Update {
        #[serde(skip_serializing_if = "Option::is_none")]
        note_title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tags: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        keep_content: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default_edit_mode: Option<EditMode>,
    },
    /// Rendered HTML answering a [`SurfaceOutbound::GetPreview`] request.
    Preview { html: String },
    /// Flip the active surface between edit and preview.
    TogglePreview,
}

/// Editor surface → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceOutbound {
    /// Persist the surface's current buffer. The host resolves the target
    /// path by title at message time, so saves stay correct across renames.
    Save { note_title: String, content: String },
    /// Ask the host to render markdown for the preview pane.
    GetPreview { content: String },
    /// Ask the host to start a tag-edit interaction for this note.
    EditTags { note_title: String },
}

// =============================================================================
// SIDEBAR LIST MESSAGES
// =============================================================================

/// One row of the sidebar list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNoteEntry {
    pub title: String,
    pub tags: Vec<String>,
}

/// Host → sidebar list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "command",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ListInbound {
    /// Replace the displayed list with the filtered view.
    Update {
        notes: Vec<ListNoteEntry>,
        filter_text: String,
    },
    /// Focus the inline new-note input.
    ShowNewNoteInput,
}

/// Sidebar list view → host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "command",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ListOutbound {
    Filter { text: String },
    OpenNote { title: String },
    DeleteNote { title: String },
    RenameNote { old_title: String, new_title: String },
    EditTags { title: String, tags: String },
    AddNote { title: String },
}
