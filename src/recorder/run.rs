use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{RecorderError, RecorderResult, TestCase};
use crate::browser::{
    BrowserDriver, BrowserError, BrowserResult, ChromeConfig, ChromeDriver, PageSession,
};
use crate::config::{Config, clamp_settle_ms};
use crate::report::{generate_html_report, write_html_report};
use crate::runner::{RunResult, RunSummary, TestResult, TestStatus};
use crate::session::Session;
use crate::snapshot::{Phase, save_screenshot, write_manifest};

/// Screenshots taken so far in one case; empty until captured
#[derive(Debug, Default)]
struct Screenshots {
    before: Vec<u8>,
    after: Vec<u8>,
}

/// Verdict of one case, decided before anything is persisted
struct Verdict {
    status: TestStatus,
    details: String,
    error_message: Option<String>,
}

/// Executes a table of test cases once and keeps their results.
///
/// One recorder performs one run: results are owned by the instance and
/// read back with [`Recorder::results`] or [`Recorder::finish`].
pub struct Recorder {
    config: Config,
    cases: Vec<TestCase>,
    session: Session,
    results: Vec<TestResult>,
    executed: bool,
}

impl Recorder {
    pub fn new(config: Config, cases: Vec<TestCase>, session: Session) -> Self {
        Self {
            config,
            cases,
            session,
            results: Vec::new(),
            executed: false,
        }
    }

    /// Results accumulated so far, in execution order
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results)
    }

    /// Run every case sequentially on `driver`, then shut the driver down.
    ///
    /// Each case runs in its own browsing context. Failures inside a case
    /// become an error result for that case and never stop the run. The
    /// driver is shut down exactly once on every path, including when the
    /// run cannot start.
    pub async fn run_all_tests<D: BrowserDriver>(
        &mut self,
        mut driver: D,
    ) -> RecorderResult<&[TestResult]> {
        if let Err(e) = self.prepare() {
            shutdown(&mut driver).await;
            return Err(e);
        }

        info!(
            driver = driver.name(),
            cases = self.cases.len(),
            output = %self.session.dir.display(),
            "Starting interactive elements run"
        );

        for index in 0..self.cases.len() {
            let case = self.cases[index].clone();
            let result = self.run_case(&mut driver, index, &case).await;
            match result.status {
                TestStatus::Success => info!(test = %case.name, "Passed"),
                TestStatus::Warning => {
                    warn!(test = %case.name, details = %result.details, "Warning")
                }
                TestStatus::Error => warn!(
                    test = %case.name,
                    error = result.error_message.as_deref().unwrap_or(""),
                    "Failed"
                ),
            }
            self.results.push(result);
        }

        shutdown(&mut driver).await;
        Ok(&self.results)
    }

    /// Claim this recorder's single run and create the output directory
    fn prepare(&mut self) -> RecorderResult<()> {
        if self.executed {
            return Err(RecorderError::AlreadyRun);
        }
        self.executed = true;
        self.session.init(&self.config.base_url)?;
        Ok(())
    }

    async fn run_case<D: BrowserDriver>(
        &self,
        driver: &mut D,
        index: usize,
        case: &TestCase,
    ) -> TestResult {
        let started = Instant::now();
        let url = case.resolve_url(&self.config.base_url);
        debug!(test = %case.name, %url, kind = %case.interaction_kind, "Running case");

        let mut shots = Screenshots::default();
        let outcome = match driver.new_context().await {
            Ok(mut page) => {
                let outcome = self.execute_case(&mut *page, &url, case, &mut shots).await;
                if let Err(e) = page.close().await {
                    warn!(test = %case.name, "Closing browser context failed: {}", e);
                }
                outcome
            }
            Err(e) => Err(e),
        };

        // Screenshots captured before a failure stay with the result
        let verdict = outcome.unwrap_or_else(|e| Verdict {
            status: TestStatus::Error,
            details: format!(
                "{} on {} could not be completed",
                case.interaction_kind, url
            ),
            error_message: Some(e.to_string()),
        });

        self.record(index, case, shots, verdict)
            .with_duration_ms(started.elapsed().as_millis() as u64)
    }

    async fn execute_case(
        &self,
        page: &mut dyn PageSession,
        url: &str,
        case: &TestCase,
        shots: &mut Screenshots,
    ) -> BrowserResult<Verdict> {
        page.navigate(url).await?;
        page.wait_for_idle().await?;
        shots.before = page.screenshot().await?;

        let selector = case.interaction_selector.as_str();
        let matches = page.count(selector).await?;
        if matches == 0 {
            shots.after = shots.before.clone();
            return Ok(Verdict {
                status: TestStatus::Warning,
                details: format!("No element found matching {}", selector),
                error_message: None,
            });
        }

        page.interact(selector, case.interaction_kind).await?;
        let settle = clamp_settle_ms(case.settle_ms.unwrap_or(self.config.settle_ms));
        tokio::time::sleep(Duration::from_millis(settle)).await;
        shots.after = page.screenshot().await?;

        let failed = check_visibility(page, case).await?;
        let plural = if matches == 1 { "" } else { "es" };
        let action = format!(
            "{} on {} ({} match{})",
            case.interaction_kind, selector, matches, plural
        );

        if failed.is_empty() {
            let details = if case.has_assertions() {
                format!("{}; visibility checks passed", action)
            } else {
                format!("{} captured", action)
            };
            Ok(Verdict {
                status: TestStatus::Success,
                details,
                error_message: None,
            })
        } else {
            Ok(Verdict {
                status: TestStatus::Error,
                details: action,
                error_message: Some(format!("Visibility check failed: {}", failed.join(", "))),
            })
        }
    }

    /// Persist the screenshots and build the final result
    fn record(
        &self,
        index: usize,
        case: &TestCase,
        shots: Screenshots,
        verdict: Verdict,
    ) -> TestResult {
        let Screenshots { before, after } = shots;
        let Verdict {
            status,
            details,
            error_message,
        } = verdict;

        let saved = self
            .save(index, case, Phase::Before, &before)
            .and_then(|b| self.save(index, case, Phase::After, &after).map(|a| (b, a)));

        let (before_path, after_path) = match saved {
            Ok(paths) => paths,
            Err(e) => {
                error!(test = %case.name, "Writing screenshots failed: {}", e);
                let message = match error_message {
                    Some(existing) => format!("{}; screenshot write failed: {}", existing, e),
                    None => format!("Screenshot write failed: {}", e),
                };
                return TestResult::error(&case.name, before, after, details, message);
            }
        };

        let result = match status {
            TestStatus::Success => TestResult::success(&case.name, before, after, details),
            TestStatus::Warning => TestResult::warning(&case.name, before, details),
            TestStatus::Error => TestResult::error(
                &case.name,
                before,
                after,
                details,
                error_message.unwrap_or_else(|| "Unknown error".to_string()),
            ),
        };
        result.with_paths(before_path, after_path)
    }

    fn save(
        &self,
        index: usize,
        case: &TestCase,
        phase: Phase,
        png: &[u8],
    ) -> RecorderResult<Option<PathBuf>> {
        if png.is_empty() {
            return Ok(None);
        }
        let snapshot = save_screenshot(&self.session.dir, index, &case.name, phase, png)?;
        Ok(Some(snapshot.image_path))
    }

    /// Render the report for the accumulated results into the session directory
    pub fn generate_html_report(&self) -> RecorderResult<PathBuf> {
        let path = self.session.report_path();
        let html = generate_html_report(&self.results, &Utc::now());
        write_html_report(&path, &html)?;
        info!(path = %path.display(), "HTML report generated");
        Ok(path)
    }

    /// Write `results.json` and the HTML report, returning the run description.
    ///
    /// The manifest goes first so completed results survive a failed report
    /// write; a report failure is logged and leaves `report_path` empty.
    pub fn finish(&self) -> RecorderResult<RunResult> {
        let mut run = RunResult {
            base_url: self.config.base_url.clone(),
            started_at: self.session.started_at,
            output_dir: self.session.dir.clone(),
            report_path: None,
            summary: self.summary(),
            results: self.results.clone(),
        };
        write_manifest(&self.session.manifest_path(), &run)?;

        match self.generate_html_report() {
            Ok(path) => {
                run.report_path = Some(path);
                write_manifest(&self.session.manifest_path(), &run)?;
            }
            Err(e) => error!("HTML report generation failed: {}", e),
        }
        Ok(run)
    }
}

async fn shutdown<D: BrowserDriver>(driver: &mut D) {
    if let Err(e) = driver.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }
}

/// Selectors whose visibility after the interaction is not what the case expects
async fn check_visibility(
    page: &mut dyn PageSession,
    case: &TestCase,
) -> BrowserResult<Vec<String>> {
    let mut failed = Vec::new();
    for selector in &case.expect_visible {
        if !page.is_visible(selector).await? {
            failed.push(format!("{} is not visible", selector));
        }
    }
    for selector in &case.expect_hidden {
        if page.is_visible(selector).await? {
            failed.push(format!("{} is still visible", selector));
        }
    }
    Ok(failed)
}

/// Launch Chromium, run every case and write the manifest and report.
/// A browser that cannot be launched is an environment error and no case runs.
pub async fn run_with_chromium(
    config: Config,
    cases: Vec<TestCase>,
    session: Session,
    chrome: ChromeConfig,
) -> RecorderResult<RunResult> {
    let driver = ChromeDriver::launch(chrome).await.map_err(|e| match e {
        BrowserError::Launch(message) => {
            RecorderError::Environment(format!("cannot launch Chromium: {}", message))
        }
        other => RecorderError::Browser(other),
    })?;

    let mut recorder = Recorder::new(config, cases, session);
    recorder.run_all_tests(driver).await?;
    recorder.finish()
}

/// Capture a single page: open a context, load `url`, wait, screenshot, close
pub async fn capture_page<D: BrowserDriver>(
    driver: &mut D,
    url: &str,
    extra_wait: Duration,
) -> BrowserResult<Vec<u8>> {
    let mut page = driver.new_context().await?;

    let outcome = async {
        page.navigate(url).await?;
        page.wait_for_idle().await?;
        tokio::time::sleep(extra_wait).await;
        page.screenshot().await
    }
    .await;

    if let Err(e) = page.close().await {
        warn!(url, "Closing browser context failed: {}", e);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockBrowser, MockElement, MockPage, MockSite};
    use crate::recorder::types::InteractionKind;

    const BASE: &str = "http://localhost:8080";

    fn recorder(cases: Vec<TestCase>, root: &std::path::Path) -> Recorder {
        let config = Config::defaults().base_url(BASE).settle_ms(250);
        Recorder::new(config, cases, Session::new(root))
    }

    fn tabs_site(tab: MockElement) -> MockSite {
        MockSite::new().page(
            format!("{}/tabs.html", BASE),
            MockPage::new("Tabs")
                .element(tab)
                .element(MockElement::new("#login-form", "Login"))
                .element(MockElement::new("#signup-form", "Signup").hidden()),
        )
    }

    #[tokio::test]
    async fn test_failed_assertion_is_error_with_images() {
        let site = tabs_site(MockElement::new("#tab", "Tab"));
        let case = TestCase::new("Tabs", "/tabs.html", "#tab", InteractionKind::Click)
            .expect_visible("#signup-form");

        let root = tempfile::tempdir().unwrap();
        let mut rec = recorder(vec![case], root.path());
        let results = rec
            .run_all_tests(MockBrowser::new(site, (200, 200)))
            .await
            .unwrap();

        assert_eq!(results[0].status, TestStatus::Error);
        let message = results[0].error_message.as_deref().unwrap();
        assert!(message.contains("#signup-form is not visible"));
        assert!(results[0].has_images());
        assert!(results[0].before_path.is_some());
    }

    #[tokio::test]
    async fn test_element_left_visible_is_error() {
        // the tab reveals the signup form but never hides the login form
        let site = tabs_site(MockElement::new("#tab", "Tab").shows("#signup-form"));
        let case = TestCase::new("Tabs", "/tabs.html", "#tab", InteractionKind::Click)
            .expect_visible("#signup-form")
            .expect_hidden("#login-form");

        let root = tempfile::tempdir().unwrap();
        let mut rec = recorder(vec![case], root.path());
        let results = rec
            .run_all_tests(MockBrowser::new(site, (200, 200)))
            .await
            .unwrap();

        assert_eq!(results[0].status, TestStatus::Error);
        let message = results[0].error_message.as_deref().unwrap();
        assert!(
            message.contains("#login-form is still visible"),
            "got: {}",
            message
        );
        assert!(!message.contains("#signup-form"));
        assert!(results[0].after_path.is_some());
    }

    #[tokio::test]
    async fn test_interaction_failure_keeps_before_screenshot() {
        let site = MockSite::new().page(
            format!("{}/hidden.html", BASE),
            MockPage::new("Hidden").element(MockElement::new("#btn", "Button").hidden()),
        );
        let case = TestCase::new(
            "Hidden button",
            "/hidden.html",
            "#btn",
            InteractionKind::Click,
        );

        let root = tempfile::tempdir().unwrap();
        let mut rec = recorder(vec![case], root.path());
        let results = rec
            .run_all_tests(MockBrowser::new(site, (120, 80)))
            .await
            .unwrap();

        let result = &results[0];
        assert_eq!(result.status, TestStatus::Error);
        assert!(
            result
                .error_message
                .as_deref()
                .unwrap()
                .contains("not visible")
        );
        assert!(!result.before_image.is_empty());
        assert!(result.after_image.is_empty());
        assert!(result.before_path.as_deref().is_some_and(|p| p.exists()));
        assert!(result.after_path.is_none());
    }

    #[tokio::test]
    async fn test_recorder_runs_once() {
        let root = tempfile::tempdir().unwrap();
        let case = TestCase::new("a", "/a", "#a", InteractionKind::Click);
        let mut rec = recorder(vec![case], root.path());
        rec.run_all_tests(MockBrowser::new(MockSite::new(), (50, 50)))
            .await
            .unwrap();

        let second = MockBrowser::new(MockSite::new(), (50, 50));
        let stats = second.stats();
        let again = rec.run_all_tests(second).await;
        assert!(matches!(again, Err(RecorderError::AlreadyRun)));
        assert_eq!(stats.shutdowns(), 1);
        assert_eq!(stats.contexts_opened(), 0);
        assert_eq!(rec.results().len(), 1);
    }

    #[tokio::test]
    async fn test_unwritable_output_still_shuts_browser_down() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let case = TestCase::new("a", "/a", "#a", InteractionKind::Click);
        let mut rec = recorder(vec![case], &blocker);
        let driver = MockBrowser::new(MockSite::new(), (50, 50));
        let stats = driver.stats();

        let outcome = rec.run_all_tests(driver).await;
        assert!(matches!(outcome, Err(RecorderError::Io(_))));
        assert_eq!(stats.shutdowns(), 1);
        assert_eq!(stats.contexts_opened(), 0);
    }

    #[tokio::test]
    async fn test_capture_page_closes_context() {
        let site = MockSite::new().page(format!("{}/x", BASE), MockPage::new("X"));
        let mut driver = MockBrowser::new(site, (64, 64));
        let stats = driver.stats();

        let png = capture_page(&mut driver, &format!("{}/x", BASE), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        assert!(
            capture_page(&mut driver, "http://nowhere/", Duration::ZERO)
                .await
                .is_err()
        );
        assert_eq!(stats.contexts_opened(), 2);
        assert_eq!(stats.contexts_closed(), 2);
    }
}
