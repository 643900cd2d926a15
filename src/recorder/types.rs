use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::snapshot::SnapshotError;

/// The single interaction a test case performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    Hover,
    Focus,
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionKind::Click => write!(f, "click"),
            InteractionKind::Hover => write!(f, "hover"),
            InteractionKind::Focus => write!(f, "focus"),
        }
    }
}

/// One page/selector pair to exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Display name, also used in screenshot file names
    pub name: String,

    /// Page path relative to the base URL (e.g. "/pages/auth.html"), or an absolute URL
    pub target_url: String,

    /// CSS selector of the element to interact with; the first match is used
    pub interaction_selector: String,

    pub interaction_kind: InteractionKind,

    /// Selectors that must be visible after the interaction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expect_visible: Vec<String>,

    /// Selectors that must be hidden after the interaction
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expect_hidden: Vec<String>,

    /// Per-case settle delay in milliseconds (clamped like the run-wide one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        target_url: impl Into<String>,
        interaction_selector: impl Into<String>,
        interaction_kind: InteractionKind,
    ) -> Self {
        Self {
            name: name.into(),
            target_url: target_url.into(),
            interaction_selector: interaction_selector.into(),
            interaction_kind,
            expect_visible: Vec::new(),
            expect_hidden: Vec::new(),
            settle_ms: None,
        }
    }

    pub fn expect_visible(mut self, selector: impl Into<String>) -> Self {
        self.expect_visible.push(selector.into());
        self
    }

    pub fn expect_hidden(mut self, selector: impl Into<String>) -> Self {
        self.expect_hidden.push(selector.into());
        self
    }

    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = Some(ms);
        self
    }

    pub fn has_assertions(&self) -> bool {
        !self.expect_visible.is_empty() || !self.expect_hidden.is_empty()
    }

    /// Resolve the target against `base_url`. Absolute URLs pass through.
    pub fn resolve_url(&self, base_url: &str) -> String {
        let target = self.target_url.trim();
        if target.starts_with("http://") || target.starts_with("https://") {
            return target.to_string();
        }
        let base = base_url.trim_end_matches('/');
        if target.starts_with('/') {
            format!("{}{}", base, target)
        } else {
            format!("{}/{}", base, target)
        }
    }
}

/// Result type for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Error types for recorder operations
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The environment is not ready (server unreachable, browser unavailable)
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The test-case table is unusable
    #[error("Invalid test cases: {0}")]
    InvalidCases(String),

    /// A recorder instance executes once
    #[error("Recorder has already run")]
    AlreadyRun,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let case = TestCase::new("x", "/pages/auth.html", "#a", InteractionKind::Click);
        let expected = "http://localhost:8080/pages/auth.html";
        assert_eq!(case.resolve_url("http://localhost:8080"), expected);
        assert_eq!(case.resolve_url("http://localhost:8080/"), expected);

        let relative = TestCase::new("x", "pages/auth.html", "#a", InteractionKind::Click);
        assert_eq!(
            relative.resolve_url("http://h:1"),
            "http://h:1/pages/auth.html"
        );

        let absolute = TestCase::new("x", "https://example.com/a", "#a", InteractionKind::Click);
        assert_eq!(absolute.resolve_url("http://h:1"), "https://example.com/a");
    }

    #[test]
    fn test_interaction_kind_serde() {
        let json = serde_json::to_string(&InteractionKind::Hover).unwrap();
        assert_eq!(json, "\"hover\"");
        let kind: InteractionKind = serde_json::from_str("\"focus\"").unwrap();
        assert_eq!(kind, InteractionKind::Focus);
    }

    #[test]
    fn test_case_json_defaults() {
        let case: TestCase = serde_json::from_str(
            r##"{
                "name": "n",
                "target_url": "/p",
                "interaction_selector": "#s",
                "interaction_kind": "click"
            }"##,
        )
        .unwrap();
        assert!(case.expect_visible.is_empty());
        assert!(!case.has_assertions());
        assert_eq!(case.settle_ms, None);
    }
}
