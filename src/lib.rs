//! UI Recorder - before/after screenshots of web UI interactions.
//!
//! This crate provides:
//! - A data-driven table of interaction test cases (click, hover, focus)
//! - A recorder that runs each case in an isolated headless-browser context
//! - Screenshot persistence in a timestamped run directory
//! - A self-contained HTML report with inlined images
//! - Plain HTTP reachability and page-marker checks
//!
//! # Example
//!
//! ```rust,no_run
//! use ui_recorder::browser::{ChromeConfig, ChromeDriver};
//! use ui_recorder::config::Config;
//! use ui_recorder::recorder::{Recorder, default_cases};
//! use ui_recorder::session::Session;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env();
//! let driver = ChromeDriver::launch(ChromeConfig::from_config(&config)).await?;
//! let session = Session::new(&config.output_dir);
//!
//! let mut recorder = Recorder::new(config, default_cases(), session);
//! recorder.run_all_tests(driver).await?;
//! let run = recorder.finish()?;
//! println!("{} passed", run.summary.success);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod probe;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod session;
pub mod snapshot;

// Re-export runner types
pub use runner::{RunResult, RunSummary, TestResult, TestStatus};

// Re-export recorder types
pub use recorder::{
    InteractionKind, Recorder, RecorderError, RecorderResult, TestCase, default_cases,
};

// Re-export browser drivers
pub use browser::{
    BrowserDriver, BrowserError, ChromeConfig, ChromeDriver, MockBrowser, MockSite, PageSession,
};

// Re-export report rendering
pub use report::generate_html_report;

pub use session::Session;
