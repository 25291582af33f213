//! In-memory trait implementations used by tests across the workspace.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use margin_core::{
    Error, MarkdownRenderer, NoteSurface, Result, SurfaceFactory, SurfaceInbound, TagEditHandler,
    UserNotifier,
};

/// Observable state of one recording surface.
#[derive(Default)]
pub struct SurfaceState {
    pub sent: Mutex<Vec<SurfaceInbound>>,
    pub titles: Mutex<Vec<String>>,
    pub reveal_count: AtomicUsize,
    pub disposed: AtomicBool,
    send_fails: AtomicBool,
    set_title_fails: AtomicBool,
}

impl SurfaceState {
    /// Messages sent to this surface so far.
    pub fn messages(&self) -> Vec<SurfaceInbound> {
        self.sent.lock().unwrap().clone()
    }

    /// Make subsequent `send` calls fail.
    pub fn fail_send(&self, fail: bool) {
        self.send_fails.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `set_title` calls fail.
    pub fn fail_set_title(&self, fail: bool) {
        self.set_title_fails.store(fail, Ordering::SeqCst);
    }

    pub fn last_message(&self) -> Option<SurfaceInbound> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn reveals(&self) -> usize {
        self.reveal_count.load(Ordering::SeqCst)
    }
}

/// A surface that records everything pushed to it.
pub struct RecordingSurface(pub Arc<SurfaceState>);

#[async_trait]
impl NoteSurface for RecordingSurface {
    async fn send(&self, message: SurfaceInbound) -> Result<()> {
        if self.0.send_fails.load(Ordering::SeqCst) {
            return Err(Error::Internal("injected send failure".to_string()));
        }
        self.0.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn reveal(&self) -> Result<()> {
        self.0.reveal_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn set_title(&self, title: &str) -> Result<()> {
        if self.0.set_title_fails.load(Ordering::SeqCst) {
            return Err(Error::Internal("injected set_title failure".to_string()));
        }
        self.0.titles.lock().unwrap().push(title.to_string());
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.0.disposed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory that hands out recording surfaces and keeps a handle to each.
#[derive(Default)]
pub struct RecordingFactory {
    created: Mutex<Vec<(String, Arc<SurfaceState>)>>,
    fail_next_send: AtomicBool,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next created surface reject its `send` calls. One-shot: the
    /// flag clears when the surface is created.
    pub fn fail_next_send(&self, fail: bool) {
        self.fail_next_send.store(fail, Ordering::SeqCst);
    }

    /// Number of surfaces created so far.
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// State handle for the most recently created surface under `title`.
    pub fn surface(&self, title: &str) -> Option<Arc<SurfaceState>> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| t == title)
            .map(|(_, state)| state.clone())
    }
}

#[async_trait]
impl SurfaceFactory for RecordingFactory {
    async fn create(&self, title: &str) -> Result<Box<dyn NoteSurface>> {
        let state = Arc::new(SurfaceState::default());
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            state.fail_send(true);
        }
        self.created
            .lock()
            .unwrap()
            .push((title.to_string(), state.clone()));
        Ok(Box::new(RecordingSurface(state)))
    }
}

/// Renderer that wraps markdown in a marker element.
pub struct EchoRenderer;

#[async_trait]
impl MarkdownRenderer for EchoRenderer {
    async fn render(&self, markdown: &str) -> Result<String> {
        Ok(format!("<rendered>{}</rendered>", markdown))
    }
}

/// Renderer that always fails, for error-path tests.
pub struct FailingRenderer;

#[async_trait]
impl MarkdownRenderer for FailingRenderer {
    async fn render(&self, _markdown: &str) -> Result<String> {
        Err(Error::Internal("renderer unavailable".to_string()))
    }
}

/// Notifier that collects user-visible messages for assertions.
#[derive(Default)]
pub struct CollectingNotifier {
    pub infos: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl UserNotifier for CollectingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

/// Tag-edit handler that records requested titles.
#[derive(Default)]
pub struct RecordingTagEditHandler {
    pub requested: Mutex<Vec<String>>,
}

#[async_trait]
impl TagEditHandler for RecordingTagEditHandler {
    async fn request_tag_edit(&self, title: &str) -> Result<()> {
        self.requested.lock().unwrap().push(title.to_string());
        Ok(())
    }
}
