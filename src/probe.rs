//! Plain HTTP checks against the site under test.
//!
//! These never go through the browser: a reachability probe run before a
//! recorder session, and a page check that looks for expected markers in
//! the served HTML.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The server could not be reached at all
    #[error("{url} is not reachable: {message}")]
    Unreachable { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Markers checked by `verify` when none are given
pub fn default_markers() -> Vec<(String, String)> {
    [
        ("navigation container", ".sidebar-nav-container"),
        ("file container", "filesContainer"),
        ("loading state", "Loading your files"),
        ("empty state", "No files yet"),
        ("firebase import", "firebase/app"),
    ]
    .into_iter()
    .map(|(label, needle)| (label.to_string(), needle.to_string()))
    .collect()
}

/// Parse a `LABEL=NEEDLE` marker; a bare value is both label and needle
pub fn parse_marker(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((label, needle)) if !label.trim().is_empty() => {
            (label.trim().to_string(), needle.to_string())
        }
        _ => (raw.to_string(), raw.to_string()),
    }
}

/// Presence of one marker in a page body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerCheck {
    pub label: String,
    pub needle: String,
    pub found: bool,
}

/// What a plain GET of a page returned
#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub url: String,
    pub status: u16,
    /// Body length in characters
    pub body_len: usize,
    pub markers: Vec<MarkerCheck>,
}

impl PageReport {
    pub fn all_found(&self) -> bool {
        self.markers.iter().all(|m| m.found)
    }
}

fn client(timeout: Duration) -> ProbeResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProbeError::Client(e.to_string()))
}

/// GET `url` and return the HTTP status. Any response counts as reachable;
/// a non-200 status is logged as a warning.
pub async fn check_reachable(url: &str, timeout: Duration) -> ProbeResult<u16> {
    let response = client(timeout)?
        .get(url)
        .send()
        .await
        .map_err(|e| ProbeError::Unreachable {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let status = response.status().as_u16();
    if status == 200 {
        debug!(url, status, "Server reachable");
    } else {
        warn!(
            url,
            status, "Server responded but might not be properly configured"
        );
    }
    Ok(status)
}

/// GET `url` and report which markers occur in the body
pub async fn verify_page(
    url: &str,
    markers: &[(String, String)],
    timeout: Duration,
) -> ProbeResult<PageReport> {
    let unreachable = |e: reqwest::Error| ProbeError::Unreachable {
        url: url.to_string(),
        message: e.to_string(),
    };

    let response = client(timeout)?
        .get(url)
        .send()
        .await
        .map_err(unreachable)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(unreachable)?;

    let markers = markers
        .iter()
        .map(|(label, needle)| MarkerCheck {
            label: label.clone(),
            needle: needle.clone(),
            found: body.contains(needle.as_str()),
        })
        .collect();

    Ok(PageReport {
        url: url.to_string(),
        status,
        body_len: body.chars().count(),
        markers,
    })
}
