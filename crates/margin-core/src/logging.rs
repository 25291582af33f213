//! Structured logging field name constants for margin.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log queries can filter by standardized names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and was surfaced to the user |
//! | WARN  | Recoverable issue, fallback or no-op applied |
//! | INFO  | Lifecycle events (initialize, reconcile completions) |
//! | DEBUG | Decision points, message pushes, config choices |
//! | TRACE | Per-item iteration (directory scans, list projections) |

/// Subsystem originating the log event.
/// Values: "store", "panel", "catalog"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "add_note", "rename_note", "reconcile", "show"
pub const OPERATION: &str = "op";

/// Note title being operated on.
pub const TITLE: &str = "title";

/// Filesystem path involved in the operation.
pub const PATH: &str = "path";

/// Number of notes in the catalog after an operation.
pub const NOTE_COUNT: &str = "note_count";

/// Number of tags attached to a note.
pub const TAG_COUNT: &str = "tag_count";

/// Number of open editor surfaces.
pub const SURFACE_COUNT: &str = "surface_count";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
