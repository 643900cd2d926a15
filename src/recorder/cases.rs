//! The test-case table: built-in defaults and JSON loading.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::types::{InteractionKind, RecorderError, RecorderResult, TestCase};

/// Interactions exercised against the Infitwin pages
pub fn default_cases() -> Vec<TestCase> {
    use InteractionKind::{Click, Focus, Hover};

    vec![
        TestCase::new(
            "Auth Page - Tab Switching",
            "/pages/auth.html",
            "[data-tab=\"signup\"]",
            Click,
        )
        .expect_visible("#signup-form")
        .expect_hidden("#login-form")
        .settle_ms(500),
        TestCase::new(
            "Auth Page - Form Field Focus",
            "/pages/auth.html",
            "#email",
            Focus,
        ),
        TestCase::new(
            "Dashboard - Navigation Hover",
            "/pages/dashboard.html",
            ".nav-item",
            Hover,
        ),
        TestCase::new(
            "Memory Archive - Filter Dropdown",
            "/pages/memory-archive.html",
            ".filter-button, .filter-dropdown",
            Click,
        )
        .settle_ms(500),
        TestCase::new(
            "Settings - Toggle Switches",
            "/pages/settings.html",
            ".toggle-switch, input[type=\"checkbox\"]",
            Click,
        ),
        TestCase::new(
            "Dashboard - Button States",
            "/pages/dashboard.html",
            ".action-button",
            Hover,
        ),
        TestCase::new(
            "Interview - Button States",
            "/pages/interview.html",
            ".control-button",
            Hover,
        ),
        TestCase::new(
            "File Browser - Button States",
            "/pages/file-browser.html",
            ".file-item",
            Hover,
        ),
    ]
}

/// Parse a JSON array of test cases
pub fn parse_cases(json: &str) -> RecorderResult<Vec<TestCase>> {
    let cases: Vec<TestCase> = serde_json::from_str(json)?;
    validate_cases(&cases)?;
    Ok(cases)
}

/// Load a JSON array of test cases from a file
pub fn load_cases(path: &Path) -> RecorderResult<Vec<TestCase>> {
    let json = fs::read_to_string(path)?;
    parse_cases(&json)
}

/// Reject tables the recorder cannot run or report on unambiguously
pub fn validate_cases(cases: &[TestCase]) -> RecorderResult<()> {
    if cases.is_empty() {
        return Err(RecorderError::InvalidCases(
            "no test cases defined".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for case in cases {
        if case.name.trim().is_empty() {
            return Err(RecorderError::InvalidCases(
                "test case with empty name".to_string(),
            ));
        }
        if case.interaction_selector.trim().is_empty() {
            return Err(RecorderError::InvalidCases(format!(
                "'{}' has an empty selector",
                case.name
            )));
        }
        if case.target_url.trim().is_empty() {
            return Err(RecorderError::InvalidCases(format!(
                "'{}' has an empty target",
                case.name
            )));
        }
        if !seen.insert(case.name.as_str()) {
            return Err(RecorderError::InvalidCases(format!(
                "duplicate test name '{}'",
                case.name
            )));
        }
    }
    Ok(())
}
