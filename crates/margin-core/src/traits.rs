//! Core traits for margin abstractions.
//!
//! These traits define the seams toward the host platform: the live editor
//! surface, user-visible messaging, prompts, and markdown rendering. The
//! state-management crates depend only on these interfaces, which keeps them
//! testable with in-memory implementations.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::SurfaceInbound;

/// A live, user-visible editor surface bound to exactly one note title.
///
/// The panel registry owns surfaces exclusively and enforces
/// at-most-one-per-title. Implementations wrap whatever the host provides
/// (a webview panel, a TUI pane, a test recorder).
#[async_trait]
pub trait NoteSurface: Send + Sync {
    /// Push a message to the surface.
    async fn send(&self, message: SurfaceInbound) -> Result<()>;

    /// Bring the surface to the foreground.
    async fn reveal(&self) -> Result<()>;

    /// Update the surface's displayed title.
    async fn set_title(&self, title: &str) -> Result<()>;

    /// Tear the surface down. Idempotent.
    async fn dispose(&self) -> Result<()>;
}

/// Creates new editor surfaces on behalf of the panel registry.
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn create(&self, title: &str) -> Result<Box<dyn NoteSurface>>;
}

// Shared handles forward the trait, so a host can keep an Arc to its factory
// while the registry owns a Box.
#[async_trait]
impl<T: SurfaceFactory + ?Sized> SurfaceFactory for Arc<T> {
    async fn create(&self, title: &str) -> Result<Box<dyn NoteSurface>> {
        self.as_ref().create(title).await
    }
}

/// Markdown-to-HTML conversion, delegated to an external library.
///
/// The core forwards the output to the requesting surface without
/// interpreting it.
#[async_trait]
pub trait MarkdownRenderer: Send + Sync {
    async fn render(&self, markdown: &str) -> Result<String>;
}

/// Receives a surface's request to start a tag-edit interaction.
///
/// The registry cannot run the prompt itself (prompts belong to the host
/// glue), so it hands the title off through this seam.
#[async_trait]
pub trait TagEditHandler: Send + Sync {
    async fn request_tag_edit(&self, title: &str) -> Result<()>;
}

#[async_trait]
impl<T: TagEditHandler + ?Sized> TagEditHandler for Arc<T> {
    async fn request_tag_edit(&self, title: &str) -> Result<()> {
        self.as_ref().request_tag_edit(title).await
    }
}

/// Human-readable message channel toward the user.
///
/// Per the error-propagation policy, no error crosses from the catalog into
/// the UI as anything other than one of these messages.
pub trait UserNotifier: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default notifier that routes user-visible messages to the log.
///
/// Hosts that can show real notifications provide their own implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl UserNotifier for TracingNotifier {
    fn info(&self, message: &str) {
        tracing::info!(user_message = message, "notify");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(user_message = message, "notify");
    }

    fn error(&self, message: &str) {
        tracing::error!(user_message = message, "notify");
    }
}

/// Single-line text input prompt. Returns `None` when the user cancels.
#[async_trait]
pub trait UserPrompt: Send + Sync {
    async fn input(&self, prompt: &str, placeholder: Option<&str>) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traits_are_object_safe() {
        fn _takes_surface(_: &dyn NoteSurface) {}
        fn _takes_factory(_: &dyn SurfaceFactory) {}
        fn _takes_renderer(_: &dyn MarkdownRenderer) {}
        fn _takes_notifier(_: &dyn UserNotifier) {}
        fn _takes_prompt(_: &dyn UserPrompt) {}
        fn _takes_tag_edit(_: &dyn TagEditHandler) {}
    }

    #[test]
    fn test_arc_handles_forward_seam_traits() {
        fn _factory<F: SurfaceFactory>(_: &F) {}
        fn _factory_via_arc<F: SurfaceFactory>(f: &Arc<F>) {
            _factory(f);
        }
        fn _tag_edit<H: TagEditHandler>(_: &H) {}
        fn _tag_edit_via_arc<H: TagEditHandler>(h: &Arc<H>) {
            _tag_edit(h);
        }
    }

    #[test]
    fn test_tracing_notifier_does_not_panic() {
        let notifier = TracingNotifier;
        notifier.info("hello");
        notifier.warn("careful");
        notifier.error("broken");
    }
}
