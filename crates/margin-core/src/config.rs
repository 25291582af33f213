//! Runtime configuration for margin.
//!
//! Three options are recognized, each with an environment-variable override.
//! Hosts embedding the catalog may also construct a [`Config`] directly from
//! their own settings surface.

use std::path::{Path, PathBuf};

use crate::defaults;
use crate::error::{Error, Result};
use crate::models::EditMode;

/// Resolved configuration for one session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit notes directory. When unset, the notes directory is resolved
    /// relative to the workspace root.
    pub notes_path: Option<PathBuf>,
    /// Whether creating a note opens its editor surface immediately.
    pub open_on_create: bool,
    /// Initial edit/preview mode for newly opened surfaces.
    pub default_edit_mode: EditMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_path: None,
            open_on_create: true,
            default_edit_mode: EditMode::default(),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// Unset or unparseable values fall back to defaults; configuration
    /// reading never fails.
    pub fn from_env() -> Self {
        let notes_path = std::env::var(defaults::ENV_NOTES_PATH)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let open_on_create = std::env::var(defaults::ENV_OPEN_ON_CREATE)
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(true);
        let default_edit_mode = std::env::var(defaults::ENV_DEFAULT_EDIT_MODE)
            .ok()
            .and_then(|v| v.parse::<EditMode>().ok())
            .unwrap_or_default();

        tracing::debug!(
            ?notes_path,
            open_on_create,
            %default_edit_mode,
            "config resolved from environment"
        );

        Self {
            notes_path,
            open_on_create,
            default_edit_mode,
        }
    }

    /// Resolve the notes directory for this session.
    ///
    /// Returns the configured override when set, otherwise
    /// `<workspace>/.margin/notes`. Fails with a configuration error when
    /// neither an override nor a workspace root is available — the one fatal
    /// configuration condition in the system.
    pub fn resolve_notes_path(&self, workspace_root: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = &self.notes_path {
            return Ok(path.clone());
        }
        match workspace_root {
            Some(root) => Ok(root.join(defaults::DEFAULT_NOTES_DIR)),
            None => Err(Error::Config(
                "no notes path configured and no workspace root available".to_string(),
            )),
        }
    }
}
