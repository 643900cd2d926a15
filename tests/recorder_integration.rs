//! Integration tests for a full recorder run against the scripted mock site

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use ui_recorder::browser::{MockBrowser, MockElement, MockPage, MockSite};
use ui_recorder::config::Config;
use ui_recorder::recorder::{InteractionKind, Recorder, TestCase, default_cases};
use ui_recorder::runner::{RunResult, TestStatus};
use ui_recorder::session::Session;
use ui_recorder::snapshot::MockFramebuffer;

const BASE: &str = "http://localhost:8080";

fn config() -> Config {
    Config::defaults().base_url(BASE).settle_ms(250)
}

fn browser(site: MockSite) -> MockBrowser {
    MockBrowser::new(site, (320, 240))
}

#[tokio::test]
async fn test_default_cases_against_mock_site() {
    let root = tempfile::tempdir().unwrap();
    let cases = default_cases();
    let driver = browser(MockSite::infitwin(BASE));
    let stats = driver.stats();

    let mut recorder = Recorder::new(config(), cases.clone(), Session::new(root.path()));
    let results = recorder.run_all_tests(driver).await.unwrap();

    // One result per case, in table order
    let names: Vec<&str> = results.iter().map(|r| r.test_name.as_str()).collect();
    let expected: Vec<&str> = cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, expected);

    let summary = recorder.summary();
    assert_eq!(summary.total, 8);
    assert_eq!(summary.success, 7);
    assert_eq!(summary.warning, 1);
    assert_eq!(summary.error, 0);

    assert_eq!(stats.contexts_opened(), 8);
    assert_eq!(stats.contexts_closed(), 8);
    assert_eq!(stats.shutdowns(), 1);
}

#[tokio::test]
async fn test_tab_switch_changes_the_page() {
    let root = tempfile::tempdir().unwrap();
    let case = default_cases().remove(0);
    assert_eq!(case.name, "Auth Page - Tab Switching");

    let mut recorder = Recorder::new(config(), vec![case], Session::new(root.path()));
    let results = recorder
        .run_all_tests(browser(MockSite::infitwin(BASE)))
        .await
        .unwrap();

    let result = &results[0];
    assert_eq!(result.status, TestStatus::Success);
    assert_ne!(result.before_image, result.after_image);

    let before = MockFramebuffer::from_png_bytes(&result.before_image).unwrap();
    assert_eq!((before.width(), before.height()), (320, 240));
}

#[tokio::test]
async fn test_missing_element_is_warning_with_identical_images() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new().page(format!("{}/empty.html", BASE), MockPage::new("Empty"));
    let case = TestCase::new(
        "Empty - Dropdown",
        "/empty.html",
        ".filter-button",
        InteractionKind::Click,
    );

    let mut recorder = Recorder::new(config(), vec![case], Session::new(root.path()));
    let results = recorder.run_all_tests(browser(site)).await.unwrap();

    assert_eq!(results[0].status, TestStatus::Warning);
    assert!(results[0].error_message.is_none());
    assert!(!results[0].before_image.is_empty());
    assert_eq!(results[0].before_image, results[0].after_image);
    assert!(results[0].details.contains(".filter-button"));
}

#[tokio::test]
async fn test_unreachable_page_does_not_stop_the_run() {
    let root = tempfile::tempdir().unwrap();
    let site = MockSite::new().page(
        format!("{}/ok.html", BASE),
        MockPage::new("Ok").element(MockElement::new("#go", "Go")),
    );
    let cases = vec![
        TestCase::new(
            "Missing page",
            "/missing.html",
            "#go",
            InteractionKind::Click,
        ),
        TestCase::new("Working page", "/ok.html", "#go", InteractionKind::Hover),
    ];
    let driver = browser(site);
    let stats = driver.stats();

    let mut recorder = Recorder::new(config(), cases, Session::new(root.path()));
    let results = recorder.run_all_tests(driver).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, TestStatus::Error);
    assert!(!results[0].has_images());
    let message = results[0].error_message.as_deref().unwrap();
    assert!(
        message.contains("ERR_CONNECTION_REFUSED"),
        "unexpected message: {}",
        message
    );
    assert_eq!(results[1].status, TestStatus::Success);

    assert_eq!(stats.contexts_closed(), 2);
}

#[tokio::test]
async fn test_finish_writes_report_manifest_and_screenshots() {
    let root = tempfile::tempdir().unwrap();
    let session = Session::new(root.path());
    let cases = default_cases().into_iter().take(2).collect::<Vec<_>>();

    let mut recorder = Recorder::new(config(), cases, session.clone());
    recorder
        .run_all_tests(browser(MockSite::infitwin(BASE)))
        .await
        .unwrap();
    let run = recorder.finish().unwrap();

    assert!(session.dir.join(".session.json").exists());
    assert_eq!(session.list_captures().unwrap().len(), 4);
    assert!(
        session
            .dir
            .join("01_Auth_Page_-_Tab_Switching_before.png")
            .exists()
    );

    let report_path = run.report_path.clone().unwrap();
    assert_eq!(report_path, session.report_path());
    let html = fs::read_to_string(&report_path).unwrap();
    assert_eq!(html.matches(r#"<span class="status "#).count(), 2);
    assert_eq!(html.matches("data:image/png;base64,").count(), 4);

    let manifest_json = fs::read_to_string(session.manifest_path()).unwrap();
    let manifest: RunResult = serde_json::from_str(&manifest_json).unwrap();
    assert_eq!(manifest.summary, run.summary);
    assert_eq!(manifest.results.len(), 2);
    for result in &manifest.results {
        assert!(result.before_path.as_deref().is_some_and(Path::exists));
    }
}

#[tokio::test]
async fn test_report_regeneration_is_stable() {
    let root = tempfile::tempdir().unwrap();
    let cases = default_cases()
        .into_iter()
        .skip(3)
        .take(1)
        .collect::<Vec<_>>();

    let mut recorder = Recorder::new(config(), cases, Session::new(root.path()));
    recorder
        .run_all_tests(browser(MockSite::infitwin(BASE)))
        .await
        .unwrap();

    let first = fs::read_to_string(recorder.generate_html_report().unwrap()).unwrap();
    let second = fs::read_to_string(recorder.generate_html_report().unwrap()).unwrap();

    // Only the generation timestamp line may differ
    let strip = |html: &str| {
        html.lines()
            .filter(|l| !l.contains("Generated:"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip(&first), strip(&second));
    assert!(first.contains(r#"<span class="status warning">WARNING</span>"#));
}
