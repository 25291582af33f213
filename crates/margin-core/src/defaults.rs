//! Centralized default constants for margin.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! values.

// =============================================================================
// STORAGE
// =============================================================================

/// File name of the sidecar document holding tags and pin metadata.
pub const SIDECAR_FILE: &str = "tags.json";

/// Extension of note files (without the dot).
pub const NOTE_EXTENSION: &str = "md";

/// Notes directory relative to the workspace root, used when no explicit
/// path override is configured.
pub const DEFAULT_NOTES_DIR: &str = ".margin/notes";

// =============================================================================
// EVENTS
// =============================================================================

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Environment variable overriding the notes directory.
pub const ENV_NOTES_PATH: &str = "MARGIN_NOTES_PATH";

/// Environment variable controlling whether a newly created note opens its
/// editor surface immediately.
pub const ENV_OPEN_ON_CREATE: &str = "MARGIN_OPEN_ON_CREATE";

/// Environment variable selecting the initial edit/preview mode for newly
/// opened surfaces.
pub const ENV_DEFAULT_EDIT_MODE: &str = "MARGIN_DEFAULT_EDIT_MODE";
