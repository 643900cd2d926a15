//! Types for test run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Verdict of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Warning,
    Error,
}

impl TestStatus {
    /// Lowercase name, used as the CSS class of the report badge
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Success => "success",
            TestStatus::Warning => "warning",
            TestStatus::Error => "error",
        }
    }

    /// Badge text
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Success => "SUCCESS",
            TestStatus::Warning => "WARNING",
            TestStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one test case. Built once, never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,

    pub status: TestStatus,

    /// PNG bytes before the interaction (empty if never captured)
    #[serde(skip)]
    pub before_image: Vec<u8>,

    /// PNG bytes after the interaction (empty if never captured)
    #[serde(skip)]
    pub after_image: Vec<u8>,

    pub details: String,

    pub error_message: Option<String>,

    /// Where the before screenshot was written
    #[serde(default)]
    pub before_path: Option<PathBuf>,

    /// Where the after screenshot was written
    #[serde(default)]
    pub after_path: Option<PathBuf>,

    /// Wall time of the case in milliseconds
    #[serde(default)]
    pub duration_ms: u64,
}

impl TestResult {
    /// Interaction performed and every assertion held
    pub fn success(
        test_name: impl Into<String>,
        before_image: Vec<u8>,
        after_image: Vec<u8>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            status: TestStatus::Success,
            before_image,
            after_image,
            details: details.into(),
            error_message: None,
            before_path: None,
            after_path: None,
            duration_ms: 0,
        }
    }

    /// Nothing to interact with; the after image is the before image
    pub fn warning(
        test_name: impl Into<String>,
        before_image: Vec<u8>,
        details: impl Into<String>,
    ) -> Self {
        let after_image = before_image.clone();
        Self {
            status: TestStatus::Warning,
            ..Self::success(test_name, before_image, after_image, details)
        }
    }

    pub fn error(
        test_name: impl Into<String>,
        before_image: Vec<u8>,
        after_image: Vec<u8>,
        details: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            status: TestStatus::Error,
            error_message: Some(error_message.into()),
            ..Self::success(test_name, before_image, after_image, details)
        }
    }

    pub fn with_paths(mut self, before: Option<PathBuf>, after: Option<PathBuf>) -> Self {
        self.before_path = before;
        self.after_path = after;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn has_images(&self) -> bool {
        !self.before_image.is_empty() || !self.after_image.is_empty()
    }
}

/// Per-status counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl RunSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            match result.status {
                TestStatus::Success => summary.success += 1,
                TestStatus::Warning => summary.warning += 1,
                TestStatus::Error => summary.error += 1,
            }
            summary
        })
    }
}

/// Result of a complete run, written as `results.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub base_url: String,

    pub started_at: DateTime<Utc>,

    /// Directory holding screenshots, report and manifest
    pub output_dir: PathBuf,

    /// HTML report, if it was written
    pub report_path: Option<PathBuf>,

    pub summary: RunSummary,

    /// All results in execution order
    pub results: Vec<TestResult>,
}
