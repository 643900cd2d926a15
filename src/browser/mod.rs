//! Browser automation abstraction.
//!
//! The recorder only needs a narrow slice of what a browser driver offers:
//! open an isolated context, navigate, wait for the page to go quiet, take
//! a screenshot, count and interact with elements by CSS selector, and
//! check visibility. Two implementations are provided:
//! - [`ChromeDriver`] drives a real headless Chromium over CDP
//! - [`MockBrowser`] serves scripted pages and renders them with
//!   [`MockFramebuffer`](crate::snapshot::MockFramebuffer)

use async_trait::async_trait;
use thiserror::Error;

use crate::recorder::types::InteractionKind;

pub mod cdp;
pub mod mock;

pub use cdp::{ChromeConfig, ChromeDriver};
pub use mock::{MockBrowser, MockElement, MockPage, MockSite, MockStats};

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Error types for browser operations
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    /// Creating or disposing a browsing context failed
    #[error("Browsing context error: {0}")]
    Context(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Element '{selector}': {message}")]
    Element { selector: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    /// Operation on a page or browser that was already closed
    #[error("Browser session closed")]
    Closed,
}

/// A browser process shared by all test cases of one run
#[async_trait]
pub trait BrowserDriver: Send {
    /// Open a fresh browsing context (own cookies and storage) with one page
    async fn new_context(&mut self) -> BrowserResult<Box<dyn PageSession>>;

    /// Release the browser. Called exactly once at the end of a run.
    async fn shutdown(&mut self) -> BrowserResult<()>;

    /// Short identifier used in logs (e.g. "chromium", "mock")
    fn name(&self) -> &str;
}

/// One page inside an isolated browsing context
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Wait until the document has loaded and network activity has settled
    async fn wait_for_idle(&mut self) -> BrowserResult<()>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&mut self) -> BrowserResult<Vec<u8>>;

    /// Number of elements matching `selector`
    async fn count(&mut self, selector: &str) -> BrowserResult<usize>;

    /// Perform `kind` on the first element matching `selector`
    async fn interact(&mut self, selector: &str, kind: InteractionKind) -> BrowserResult<()>;

    /// Whether the first element matching `selector` is rendered and visible.
    /// A selector with no match is not visible.
    async fn is_visible(&mut self, selector: &str) -> BrowserResult<bool>;

    /// Close the page and dispose of its browsing context
    async fn close(&mut self) -> BrowserResult<()>;
}
