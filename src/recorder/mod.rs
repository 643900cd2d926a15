//! Interaction recording: the test-case table and the run loop that turns
//! each case into a before/after screenshot pair and a verdict.

pub mod cases;
pub mod run;
pub mod types;

pub use cases::{default_cases, load_cases, parse_cases, validate_cases};
pub use run::{Recorder, capture_page, run_with_chromium};
pub use types::{InteractionKind, RecorderError, RecorderResult, TestCase};
