//! Headless Chromium driver over the Chrome DevTools Protocol.
//!
//! One Chromium process is launched per run. Every test case gets its own
//! browser context (the CDP equivalent of an incognito profile), created
//! with `Target.createBrowserContext` and disposed when the case finishes.

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserDriver, BrowserError, BrowserResult, PageSession};
use crate::config::Config;
use crate::recorder::types::InteractionKind;

/// Interval between document-state polls while waiting for idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// URL prefix Chromium uses for its own network error pages
const CHROME_ERROR_PREFIX: &str = "chrome-error://";

/// Reports load state and how many resources the page has fetched so far.
/// Idle means loaded and no new resource entries between two polls.
const IDLE_PROBE_JS: &str = "(() => ({ \
    ready: document.readyState === 'complete', \
    resources: performance.getEntriesByType('resource').length \
}))()";

/// Launch options for [`ChromeDriver`]
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Viewport width in CSS pixels
    pub viewport_width: u32,
    /// Viewport height in CSS pixels
    pub viewport_height: u32,
    /// Chromium executable (None = auto-detect)
    pub chrome_path: Option<PathBuf>,
    /// Run without a visible window
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Upper bound for `wait_for_idle`
    pub idle_timeout: Duration,
}

impl ChromeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            viewport_width: config.viewport.0,
            viewport_height: config.viewport.1,
            chrome_path: config.chrome_path.as_ref().map(PathBuf::from),
            headless: true,
            sandbox: true,
            idle_timeout: config.idle_timeout_duration(),
        }
    }

    pub fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Show the browser window, for watching a run locally
    pub fn headed(mut self) -> Self {
        self.headless = false;
        self
    }
}

/// A launched Chromium process
pub struct ChromeDriver {
    config: ChromeConfig,
    inner: Arc<Mutex<CdpBrowser>>,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromeDriver {
    /// Launch Chromium and start pumping its CDP event stream
    pub async fn launch(config: ChromeConfig) -> BrowserResult<Self> {
        let mut builder =
            CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!(
            viewport = %format!("{}x{}", config.viewport_width, config.viewport_height),
            headless = config.headless,
            "Launched Chromium"
        );

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(browser)),
            handler,
            closed: false,
        })
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn new_context(&mut self) -> BrowserResult<Box<dyn PageSession>> {
        if self.closed {
            return Err(BrowserError::Closed);
        }

        let browser = self.inner.lock().await;
        let created = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;
        let context_id = created.result.browser_context_id.clone();

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(BrowserError::Context)?;
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;
        drop(browser);

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(self.config.viewport_width))
            .height(i64::from(self.config.viewport_height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(BrowserError::Context)?;
        page.execute(metrics)
            .await
            .map_err(|e| BrowserError::Context(e.to_string()))?;

        debug!(context = ?context_id, "Opened browser context");

        Ok(Box::new(ChromePage {
            page: Some(page),
            context_id: Some(context_id),
            browser: Arc::clone(&self.inner),
            idle_timeout: self.config.idle_timeout,
        }))
    }

    async fn shutdown(&mut self) -> BrowserResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut browser = self.inner.lock().await;
        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Launch(format!("close failed: {}", e)));
        if let Err(e) = browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        self.handler.abort();
        info!("Chromium shut down");
        result
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

#[derive(Debug, Deserialize)]
struct IdleProbe {
    ready: bool,
    resources: u64,
}

/// A page bound to its own browser context
struct ChromePage {
    page: Option<CdpPage>,
    context_id: Option<BrowserContextId>,
    browser: Arc<Mutex<CdpBrowser>>,
    idle_timeout: Duration,
}

impl ChromePage {
    fn page(&self) -> BrowserResult<&CdpPage> {
        self.page.as_ref().ok_or(BrowserError::Closed)
    }

    async fn evaluate<T: serde::de::DeserializeOwned>(
        &self,
        expression: String,
    ) -> BrowserResult<T> {
        self.page()?
            .evaluate(expression)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }
}

/// Embed a selector in a script as a JS string literal
fn js_string(selector: &str) -> String {
    serde_json::Value::String(selector.to_string()).to_string()
}

fn visibility_script(selector: &str) -> String {
    format!(
        "(() => {{ \
            const el = document.querySelector({sel}); \
            if (!el) return false; \
            const style = window.getComputedStyle(el); \
            const rect = el.getBoundingClientRect(); \
            return style.display !== 'none' && style.visibility !== 'hidden' \
                && style.opacity !== '0' && rect.width > 0 && rect.height > 0; \
        }})()",
        sel = js_string(selector)
    )
}

#[async_trait]
impl PageSession for ChromePage {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let page = self.page()?;
        page.goto(url).await.map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        // Connection failures load Chromium's error page instead of failing the command
        let landed: String = self.evaluate("document.location.href".to_string()).await?;
        if landed.starts_with(CHROME_ERROR_PREFIX) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "page could not be loaded (network error)".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_idle(&mut self) -> BrowserResult<()> {
        let deadline = Instant::now() + self.idle_timeout;
        let mut last_seen: Option<u64> = None;

        loop {
            let probe: IdleProbe = self.evaluate(IDLE_PROBE_JS.to_string()).await?;
            if probe.ready && last_seen == Some(probe.resources) {
                return Ok(());
            }
            last_seen = probe.ready.then_some(probe.resources);

            if Instant::now() >= deadline {
                warn!(timeout = ?self.idle_timeout, "Page did not go idle, continuing");
                return Ok(());
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    async fn screenshot(&mut self) -> BrowserResult<Vec<u8>> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let shot = self
            .page()?
            .execute(params)
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))?;

        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    async fn count(&mut self, selector: &str) -> BrowserResult<usize> {
        let script = format!("document.querySelectorAll({}).length", js_string(selector));
        self.evaluate(script).await
    }

    async fn interact(&mut self, selector: &str, kind: InteractionKind) -> BrowserResult<()> {
        let element_error = |message: String| BrowserError::Element {
            selector: selector.to_string(),
            message,
        };

        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|e| element_error(e.to_string()))?;

        let outcome = match kind {
            InteractionKind::Click => element.click().await.map(|_| ()),
            InteractionKind::Hover => element.hover().await.map(|_| ()),
            InteractionKind::Focus => element.focus().await.map(|_| ()),
        };
        outcome.map_err(|e| element_error(format!("{} failed: {}", kind, e)))
    }

    async fn is_visible(&mut self, selector: &str) -> BrowserResult<bool> {
        self.evaluate(visibility_script(selector)).await
    }

    async fn close(&mut self) -> BrowserResult<()> {
        let mut first_error = None;

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                first_error = Some(BrowserError::Context(format!("page close failed: {}", e)));
            }
        }

        if let Some(context_id) = self.context_id.take() {
            let browser = self.browser.lock().await;
            if let Err(e) = browser
                .execute(DisposeBrowserContextParams::new(context_id))
                .await
            {
                first_error.get_or_insert(BrowserError::Context(format!("dispose failed: {}", e)));
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
