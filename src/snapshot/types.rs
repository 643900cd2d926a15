// Core types for screenshot persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Which side of an interaction a screenshot shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

/// A screenshot written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Path to the PNG file
    pub image_path: PathBuf,

    /// Test case the screenshot belongs to
    pub test_name: String,

    pub phase: Phase,

    /// Size of the PNG in bytes
    pub size: usize,

    /// Timestamp when the screenshot was written
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        image_path: PathBuf,
        test_name: impl Into<String>,
        phase: Phase,
        size: usize,
    ) -> Self {
        Self {
            image_path,
            test_name: test_name.into(),
            phase,
            size,
            timestamp: Utc::now(),
        }
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Error types for snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Error producing image data
    #[error("Capture error: {0}")]
    Capture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
