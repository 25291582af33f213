//! # margin-catalog
//!
//! The note catalog and its sidebar list view: reconciliation against the
//! notes directory, note lifecycle operations, and the filtered/sorted
//! projection pushed to the UI.

pub mod catalog;
pub mod view;

pub use catalog::NoteCatalog;
pub use view::ListView;
