use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::snapshot::types::{Phase, Snapshot, SnapshotResult};

/// Format a timestamp in the YYYYMMDD_HHMMSS form used in file names
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Sanitize a name for use in filenames
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

/// Filename for one side of an interaction, e.g. `03_Settings_-_Toggle_before.png`.
/// The index keeps files in execution order and distinct when names repeat.
pub fn generate_filename(index: usize, test_name: &str, phase: Phase) -> String {
    format!(
        "{:02}_{}_{}.png",
        index + 1,
        sanitize_name(test_name),
        phase.as_str()
    )
}

/// Write PNG bytes into `dir` and describe the written file
pub fn save_screenshot(
    dir: &Path,
    index: usize,
    test_name: &str,
    phase: Phase,
    png: &[u8],
) -> SnapshotResult<Snapshot> {
    fs::create_dir_all(dir)?;
    let image_path = dir.join(generate_filename(index, test_name, phase));
    fs::write(&image_path, png)?;
    Ok(Snapshot::new(image_path, test_name, phase, png.len()))
}

/// Write any serializable value as pretty JSON next to the screenshots
pub fn write_manifest<T: Serialize + ?Sized>(path: &Path, value: &T) -> SnapshotResult<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(path.to_path_buf())
}
