//! # margin-panel
//!
//! Editor-surface lifecycle for margin: the panel registry mediating between
//! the catalog and zero or more independently open editor surfaces.

pub mod registry;
pub mod testing;

pub use registry::PanelRegistry;
