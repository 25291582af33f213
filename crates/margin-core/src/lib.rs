//! # margin-core
//!
//! Core types, traits, and abstractions for the margin note manager.
//!
//! This crate provides the foundational data structures, wire protocol, and
//! trait seams that the other margin crates depend on.

pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod protocol;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventBus, EventEnvelope};
pub use models::{normalize_tags, EditMode, NoteMetadata, NoteRecord, SidecarDocument};
pub use protocol::{ListInbound, ListNoteEntry, ListOutbound, SurfaceInbound, SurfaceOutbound};
pub use traits::{
    MarkdownRenderer, NoteSurface, SurfaceFactory, TagEditHandler, TracingNotifier, UserNotifier,
    UserPrompt,
};
