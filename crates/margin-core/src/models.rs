//! Core data model for margin.
//!
//! A note is a markdown file identified by its title (the file stem). Tag and
//! pin metadata live in a separate sidecar document, so [`NoteRecord`] is the
//! reconciled in-memory pairing of the two. Records are plain data:
//! presentation (labels, icons, list rows) is a projection owned by the
//! UI-facing layer, never stored here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// NOTE RECORD
// =============================================================================

/// One note in the catalog: title plus its sidecar metadata.
///
/// Exists if and only if a backing `<title>.md` file existed at the time of
/// the last catalog reconciliation. The catalog is the source of truth for
/// existence; the sidecar store is the source of truth for `tags`/`pinned`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Unique title, derived 1:1 from the backing file name minus extension.
    pub title: String,
    /// Deduplicated tags, first-occurrence order preserved.
    pub tags: Vec<String>,
    /// Whether the note sorts into the pinned section of the list.
    pub pinned: bool,
}

impl NoteRecord {
    /// A bare record: no tags, not pinned.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            pinned: false,
        }
    }

    /// A record with its sidecar metadata already resolved.
    pub fn with_metadata(title: impl Into<String>, tags: Vec<String>, pinned: bool) -> Self {
        Self {
            title: title.into(),
            tags,
            pinned,
        }
    }

    /// Bracketed tag suffix for list labels: `[a, b]`, or empty when untagged.
    pub fn format_tags(&self) -> String {
        if self.tags.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.tags.join(", "))
        }
    }
}

/// Normalize raw comma-separated tag input into a deduplicated tag list.
///
/// Splits on `,`, trims whitespace, drops empty tokens, and keeps the first
/// occurrence of each tag. This is the single normalization point: the
/// sidecar store persists whatever it is handed verbatim.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let tag = token.trim();
        if tag.is_empty() {
            continue;
        }
        if !seen.iter().any(|t| t == tag) {
            seen.push(tag.to_string());
        }
    }
    seen
}

// =============================================================================
// SIDECAR DOCUMENT
// =============================================================================

/// Per-note metadata stored in the sidecar document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMetadata {
    /// Pinned state. Absent in older documents; defaults to unpinned.
    #[serde(default)]
    pub pinned: bool,
}

/// The persisted sidecar document holding tags and pin metadata.
///
/// Two on-disk formats exist. The legacy flat format maps titles directly to
/// tag arrays (`{"Alpha": ["x"]}`); the structured format nests two maps
/// (`{"tags": {...}, "metadata": {...}}`). [`SidecarDocument::parse`] accepts
/// both; writers always emit the structured form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SidecarDocument {
    pub tags: BTreeMap<String, Vec<String>>,
    pub metadata: BTreeMap<String, NoteMetadata>,
}

/// Wire shapes for the two accepted sidecar formats. Structured is tried
/// first: its `tags` value is a map, which can never deserialize as a legacy
/// tag array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SidecarWire {
    Structured {
        tags: BTreeMap<String, Vec<String>>,
        #[serde(default)]
        metadata: BTreeMap<String, NoteMetadata>,
    },
    Legacy(BTreeMap<String, Vec<String>>),
}

impl SidecarDocument {
    /// Parse a sidecar document, accepting both the legacy flat format and
    /// the structured format.
    pub fn parse(raw: &str) -> Result<Self> {
        let wire: SidecarWire = serde_json::from_str(raw)
            .map_err(|e| Error::Serialization(format!("sidecar document: {}", e)))?;
        Ok(match wire {
            SidecarWire::Structured { tags, metadata } => Self { tags, metadata },
            SidecarWire::Legacy(tags) => Self {
                tags,
                metadata: BTreeMap::new(),
            },
        })
    }

    /// Serialize to the structured on-disk form (pretty-printed).
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// EDIT MODE
// =============================================================================

/// Initial mode for a newly opened editor surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Raw markdown editing.
    #[default]
    Edit,
    /// Rendered preview.
    Preview,
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit => write!(f, "edit"),
            Self::Preview => write!(f, "preview"),
        }
    }
}

impl std::str::FromStr for EditMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "edit" => Ok(Self::Edit),
            "preview" => Ok(Self::Preview),
            _ => Err(Error::InvalidInput(format!("invalid edit mode: {}", s))),
        }
    }
}
