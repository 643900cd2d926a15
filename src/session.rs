//! Output directory management for recorder runs.
//!
//! Every run writes into its own directory under the output root:
//! `<root>/run_<YYYYMMDD_HHMMSS>/` holding the screenshots, the HTML
//! report, `results.json` and a `.session.json` metadata file.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::snapshot::utils::{format_timestamp, sanitize_name};

/// Metadata file written by [`Session::init`]
pub const SESSION_METADATA_FILE: &str = ".session.json";

/// Manifest file name for serialized results
pub const RESULTS_MANIFEST_FILE: &str = "results.json";

/// One run's output location
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID (also the directory name)
    pub id: String,
    /// Root directory for this session
    pub dir: PathBuf,
    /// When the run started
    pub started_at: DateTime<Utc>,
}

impl Session {
    /// New timestamped session under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::at(root, Utc::now())
    }

    /// Session under `root` for a run started at `started_at`
    pub fn at(root: impl AsRef<Path>, started_at: DateTime<Utc>) -> Self {
        let id = format!("run_{}", format_timestamp(&started_at));
        let dir = root.as_ref().join(&id);
        Self {
            id,
            dir,
            started_at,
        }
    }

    /// Create a session with a specific name/prefix
    pub fn with_name(root: impl AsRef<Path>, name: &str) -> Self {
        let started_at = Utc::now();
        let id = format!("{}_{}", sanitize_name(name), format_timestamp(&started_at));
        let dir = root.as_ref().join(&id);
        Self {
            id,
            dir,
            started_at,
        }
    }

    /// Run timestamp in YYYYMMDD_HHMMSS form
    pub fn timestamp(&self) -> String {
        format_timestamp(&self.started_at)
    }

    /// Create the session directory and write its metadata
    pub fn init(&self, base_url: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let metadata = serde_json::json!({
            "id": self.id,
            "created": self.started_at.to_rfc3339(),
            "base_url": base_url,
            "host": host,
        });

        fs::write(
            self.dir.join(SESSION_METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;
        Ok(())
    }

    /// HTML report path; the file name embeds the run timestamp
    pub fn report_path(&self) -> PathBuf {
        self.dir
            .join(format!("test_report_{}.html", self.timestamp()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(RESULTS_MANIFEST_FILE)
    }

    /// List all PNG files in the session
    pub fn list_captures(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut captures = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|e| e == "png") {
                    captures.push(path);
                }
            }
        }
        captures.sort();
        Ok(captures)
    }
}
