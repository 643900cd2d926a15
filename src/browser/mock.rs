//! Scripted in-process browser.
//!
//! A [`MockSite`] maps URLs to [`MockPage`]s. Each page is a list of
//! elements with a selector, a label and a visibility flag; clicking an
//! element can show or hide other elements. Screenshots are rendered with
//! [`MockFramebuffer`], so hover, focus and click all change the pixels.
//! URLs missing from the site fail navigation like a refused connection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BrowserDriver, BrowserError, BrowserResult, PageSession};
use crate::recorder::types::InteractionKind;
use crate::snapshot::MockFramebuffer;

const BACKGROUND: [u8; 3] = [245, 245, 245];
const TEXT: [u8; 3] = [20, 20, 20];
const ELEMENT: [u8; 3] = [200, 200, 200];
const HOVERED: [u8; 3] = [120, 160, 230];
const ACTIVE: [u8; 3] = [40, 167, 69];
const FOCUS_RING: [u8; 3] = [255, 140, 0];
const ROW_HEIGHT: u32 = 40;

/// An element on a mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Simple selector this element answers to (e.g. `#email`, `.nav-item`)
    pub selector: String,
    /// Text drawn inside the element
    pub label: String,
    pub visible: bool,
    /// Selectors shown (`true`) or hidden (`false`) when this element is clicked
    pub on_click: Vec<(String, bool)>,
}

impl MockElement {
    pub fn new(selector: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            label: label.into(),
            visible: true,
            on_click: Vec::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Clicking this element shows `selector`
    pub fn shows(mut self, selector: impl Into<String>) -> Self {
        self.on_click.push((selector.into(), true));
        self
    }

    /// Clicking this element hides `selector`
    pub fn hides(mut self, selector: impl Into<String>) -> Self {
        self.on_click.push((selector.into(), false));
        self
    }

    /// Whether a (possibly comma-separated) selector list matches this element
    fn matches(&self, selector: &str) -> bool {
        selector.split(',').any(|part| part.trim() == self.selector)
    }
}

/// A page served by the mock site
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub title: String,
    pub elements: Vec<MockElement>,
}

impl MockPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }
}

/// URL to page mapping
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    pub fn get(&self, url: &str) -> Option<&MockPage> {
        self.pages.get(url)
    }

    /// A stand-in for the Infitwin pages exercised by the built-in cases.
    /// The memory archive has no filter control, so that case yields a warning.
    pub fn infitwin(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = |path: &str| format!("{}{}", base, path);

        Self::new()
            .page(
                url("/pages/auth.html"),
                MockPage::new("Auth")
                    .element(
                        MockElement::new("[data-tab=\"signup\"]", "Sign up tab")
                            .shows("#signup-form")
                            .hides("#login-form"),
                    )
                    .element(MockElement::new("#login-form", "Login form"))
                    .element(MockElement::new("#signup-form", "Signup form").hidden())
                    .element(MockElement::new("#email", "Email")),
            )
            .page(
                url("/pages/dashboard.html"),
                MockPage::new("Dashboard")
                    .element(MockElement::new(".nav-item", "Home"))
                    .element(MockElement::new(".nav-item", "Archive"))
                    .element(MockElement::new(".action-button", "Start interview")),
            )
            .page(
                url("/pages/memory-archive.html"),
                MockPage::new("Memory Archive"),
            )
            .page(
                url("/pages/settings.html"),
                MockPage::new("Settings")
                    .element(MockElement::new(".toggle-switch", "Notifications")),
            )
            .page(
                url("/pages/interview.html"),
                MockPage::new("Interview").element(MockElement::new(".control-button", "Record")),
            )
            .page(
                url("/pages/file-browser.html"),
                MockPage::new("File Browser").element(MockElement::new(".file-item", "photo.jpg")),
            )
    }
}

/// Counters shared between a [`MockBrowser`] and the test inspecting it
#[derive(Debug, Default)]
pub struct MockStats {
    contexts_opened: AtomicUsize,
    contexts_closed: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl MockStats {
    pub fn contexts_opened(&self) -> usize {
        self.contexts_opened.load(Ordering::SeqCst)
    }

    pub fn contexts_closed(&self) -> usize {
        self.contexts_closed.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

/// Driver serving a [`MockSite`]
pub struct MockBrowser {
    site: Arc<MockSite>,
    viewport: (u32, u32),
    stats: Arc<MockStats>,
    closed: bool,
}

impl MockBrowser {
    pub fn new(site: MockSite, viewport: (u32, u32)) -> Self {
        Self {
            site: Arc::new(site),
            viewport,
            stats: Arc::new(MockStats::default()),
            closed: false,
        }
    }

    /// Handle to the counters, usable after the driver has been moved
    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn new_context(&mut self) -> BrowserResult<Box<dyn PageSession>> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.stats.contexts_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockPageSession {
            site: Arc::clone(&self.site),
            viewport: self.viewport,
            stats: Arc::clone(&self.stats),
            state: None,
            closed: false,
        }))
    }

    async fn shutdown(&mut self) -> BrowserResult<()> {
        self.closed = true;
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Live state of a loaded page: the elements plus interaction markers
#[derive(Debug, Clone)]
struct PageState {
    page: MockPage,
    hovered: Option<usize>,
    focused: Option<usize>,
    activated: Vec<usize>,
}

struct MockPageSession {
    site: Arc<MockSite>,
    viewport: (u32, u32),
    stats: Arc<MockStats>,
    state: Option<PageState>,
    closed: bool,
}

impl MockPageSession {
    fn state(&self) -> BrowserResult<&PageState> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.state
            .as_ref()
            .ok_or_else(|| BrowserError::Evaluation("no page loaded".to_string()))
    }

    fn render(&self, state: &PageState) -> BrowserResult<Vec<u8>> {
        let (width, height) = self.viewport;
        let mut fb = MockFramebuffer::with_color(width, height, BACKGROUND);
        fb.draw_text(10, 10, &state.page.title, TEXT, BACKGROUND);

        let visible = state
            .page
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.visible);
        for (row, (idx, element)) in visible.enumerate() {
            let y = 30 + row as u32 * ROW_HEIGHT;
            let fill = if state.activated.contains(&idx) {
                ACTIVE
            } else if state.hovered == Some(idx) {
                HOVERED
            } else {
                ELEMENT
            };
            let w = width.saturating_sub(20);
            fb.draw_rect(10, y, w, ROW_HEIGHT - 8, fill);
            if state.focused == Some(idx) {
                fb.draw_outline(8, y.saturating_sub(2), w + 4, ROW_HEIGHT - 4, FOCUS_RING);
            }
            fb.draw_text(20, y + 12, &element.label, TEXT, fill);
        }

        fb.to_png()
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }
}

#[async_trait]
impl PageSession for MockPageSession {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        let page = self
            .site
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            })?;
        self.state = Some(PageState {
            page,
            hovered: None,
            focused: None,
            activated: Vec::new(),
        });
        Ok(())
    }

    async fn wait_for_idle(&mut self) -> BrowserResult<()> {
        self.state().map(|_| ())
    }

    async fn screenshot(&mut self) -> BrowserResult<Vec<u8>> {
        let state = self.state()?;
        self.render(state)
    }

    async fn count(&mut self, selector: &str) -> BrowserResult<usize> {
        let state = self.state()?;
        Ok(state
            .page
            .elements
            .iter()
            .filter(|el| el.matches(selector))
            .count())
    }

    async fn interact(&mut self, selector: &str, kind: InteractionKind) -> BrowserResult<()> {
        self.state()?;
        let state = self.state.as_mut().ok_or(BrowserError::Closed)?;

        let idx = state
            .page
            .elements
            .iter()
            .position(|el| el.matches(selector))
            .ok_or_else(|| BrowserError::Element {
                selector: selector.to_string(),
                message: "no element matches selector".to_string(),
            })?;
        if !state.page.elements[idx].visible {
            return Err(BrowserError::Element {
                selector: selector.to_string(),
                message: format!("element is not visible, cannot {}", kind),
            });
        }

        match kind {
            InteractionKind::Hover => state.hovered = Some(idx),
            InteractionKind::Focus => state.focused = Some(idx),
            InteractionKind::Click => {
                state.focused = Some(idx);
                if !state.activated.contains(&idx) {
                    state.activated.push(idx);
                }
                let effects = state.page.elements[idx].on_click.clone();
                for (target, visible) in effects {
                    for el in state
                        .page
                        .elements
                        .iter_mut()
                        .filter(|el| el.matches(&target))
                    {
                        el.visible = visible;
                    }
                }
            }
        }
        Ok(())
    }

    async fn is_visible(&mut self, selector: &str) -> BrowserResult<bool> {
        let state = self.state()?;
        Ok(state
            .page
            .elements
            .iter()
            .find(|el| el.matches(selector))
            .is_some_and(|el| el.visible))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        if !self.closed {
            self.closed = true;
            self.state = None;
            self.stats.contexts_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8080";

    async fn open(url: &str) -> Box<dyn PageSession> {
        let mut browser = MockBrowser::new(MockSite::infitwin(BASE), (400, 300));
        let mut page = browser.new_context().await.unwrap();
        page.navigate(url).await.unwrap();
        page
    }

    #[test]
    fn test_selector_list_matching() {
        let el = MockElement::new(".toggle-switch", "t");
        assert!(el.matches(".toggle-switch"));
        assert!(el.matches(".toggle-switch, input[type=\"checkbox\"]"));
        assert!(!el.matches(".toggle"));
    }

    #[tokio::test]
    async fn test_unknown_url_fails_navigation() {
        let mut browser = MockBrowser::new(MockSite::new(), (100, 100));
        let mut page = browser.new_context().await.unwrap();
        let err = page
            .navigate("http://localhost:9/missing")
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_click_toggles_visibility() {
        let mut page = open("http://localhost:8080/pages/auth.html").await;
        assert!(!page.is_visible("#signup-form").await.unwrap());
        assert!(page.is_visible("#login-form").await.unwrap());

        page.interact("[data-tab=\"signup\"]", InteractionKind::Click)
            .await
            .unwrap();

        assert!(page.is_visible("#signup-form").await.unwrap());
        assert!(!page.is_visible("#login-form").await.unwrap());
    }

    #[tokio::test]
    async fn test_hover_changes_screenshot() {
        let mut page = open("http://localhost:8080/pages/dashboard.html").await;
        assert_eq!(page.count(".nav-item").await.unwrap(), 2);

        let before = page.screenshot().await.unwrap();
        page.interact(".nav-item", InteractionKind::Hover)
            .await
            .unwrap();
        let after = page.screenshot().await.unwrap();
        assert_ne!(before, after);

        let fb = MockFramebuffer::from_png_bytes(&after).unwrap();
        assert_eq!(fb.get_pixel(12, 32), HOVERED);
    }

    #[tokio::test]
    async fn test_interacting_with_hidden_element_fails() {
        let mut page = open("http://localhost:8080/pages/auth.html").await;
        let err = page
            .interact("#signup-form", InteractionKind::Click)
            .await
            .unwrap_err();
        assert!(matches!(err, BrowserError::Element { .. }));
    }

    #[tokio::test]
    async fn test_closed_page_rejects_operations() {
        let mut page = open("http://localhost:8080/pages/auth.html").await;
        page.close().await.unwrap();
        assert!(matches!(page.screenshot().await, Err(BrowserError::Closed)));
    }
}
