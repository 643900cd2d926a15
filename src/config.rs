//! Configuration management with environment variable support.
//!
//! Centralized defaults for the recorder, supporting:
//! - Environment variables for every configurable value
//! - Defaults matching the values the debugging scripts hardcoded
//! - Builder-style overrides from CLI flags
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `UI_RECORDER_BASE_URL` | Base URL of the site under test | `http://localhost:8080` |
//! | `UI_RECORDER_OUTPUT_DIR` | Root directory for run output | `interactive-test-results` |
//! | `UI_RECORDER_SETTLE_MS` | Delay after each interaction (ms, clamped 250-500) | `300` |
//! | `UI_RECORDER_VIEWPORT` | Viewport size as `WxH` | `1200x800` |
//! | `UI_RECORDER_IDLE_TIMEOUT` | Max wait for network idle (seconds) | `10` |
//! | `UI_RECORDER_PROBE_TIMEOUT` | Reachability probe timeout (seconds) | `5` |
//! | `UI_RECORDER_CHROME` | Path to the Chromium executable | auto-detect |
//!
//! # Example
//!
//! ```bash
//! export UI_RECORDER_BASE_URL="http://localhost:8357"
//! export UI_RECORDER_SETTLE_MS=500
//! ```

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default base URL of the site under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default output root directory
pub const DEFAULT_OUTPUT_DIR: &str = "interactive-test-results";

/// Default settle delay after an interaction (milliseconds)
pub const DEFAULT_SETTLE_MS: u64 = 300;

/// Lower bound for the settle delay (milliseconds)
pub const MIN_SETTLE_MS: u64 = 250;

/// Upper bound for the settle delay (milliseconds)
pub const MAX_SETTLE_MS: u64 = 500;

/// Default viewport width (pixels)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1200;

/// Default viewport height (pixels)
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

/// Default network-idle timeout (seconds)
pub const DEFAULT_IDLE_TIMEOUT: u64 = 10;

/// Default reachability probe timeout (seconds)
pub const DEFAULT_PROBE_TIMEOUT: u64 = 5;

/// Default extra wait before a single-page screenshot (milliseconds)
pub const DEFAULT_SCREENSHOT_WAIT_MS: u64 = 3000;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the base URL
pub const ENV_BASE_URL: &str = "UI_RECORDER_BASE_URL";

/// Environment variable for the output root
pub const ENV_OUTPUT_DIR: &str = "UI_RECORDER_OUTPUT_DIR";

/// Environment variable for the settle delay
pub const ENV_SETTLE_MS: &str = "UI_RECORDER_SETTLE_MS";

/// Environment variable for the viewport size
pub const ENV_VIEWPORT: &str = "UI_RECORDER_VIEWPORT";

/// Environment variable for the network-idle timeout
pub const ENV_IDLE_TIMEOUT: &str = "UI_RECORDER_IDLE_TIMEOUT";

/// Environment variable for the probe timeout
pub const ENV_PROBE_TIMEOUT: &str = "UI_RECORDER_PROBE_TIMEOUT";

/// Environment variable for the Chromium executable
pub const ENV_CHROME: &str = "UI_RECORDER_CHROME";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for the recorder
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Site under test
    pub base_url: String,
    /// Root directory for run output
    pub output_dir: String,
    /// Delay after each interaction (already clamped)
    pub settle_ms: u64,
    /// Viewport (width, height)
    pub viewport: (u32, u32),
    /// Max wait for network idle (seconds)
    pub idle_timeout: u64,
    /// Reachability probe timeout (seconds)
    pub probe_timeout: u64,
    /// Chromium executable, `None` lets the driver auto-detect
    pub chrome_path: Option<String>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        Self {
            base_url: env::var(ENV_BASE_URL).unwrap_or(defaults.base_url),
            output_dir: env::var(ENV_OUTPUT_DIR).unwrap_or(defaults.output_dir),
            settle_ms: env::var(ENV_SETTLE_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(clamp_settle_ms)
                .unwrap_or(defaults.settle_ms),
            viewport: env::var(ENV_VIEWPORT)
                .ok()
                .and_then(|s| parse_viewport(&s))
                .unwrap_or(defaults.viewport),
            idle_timeout: env::var(ENV_IDLE_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.idle_timeout),
            probe_timeout: env::var(ENV_PROBE_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.probe_timeout),
            chrome_path: env::var(ENV_CHROME).ok().filter(|s| !s.is_empty()),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            settle_ms: DEFAULT_SETTLE_MS,
            viewport: (DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            chrome_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the settle delay; values outside 250..=500 ms are clamped
    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = clamp_settle_ms(ms);
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Use a specific Chromium executable instead of auto-detection
    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn idle_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn probe_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Clamp a settle delay into the supported 250..=500 ms window
pub fn clamp_settle_ms(ms: u64) -> u64 {
    ms.clamp(MIN_SETTLE_MS, MAX_SETTLE_MS)
}

/// Parse a viewport string into (width, height).
/// Supports "WxH" plus the presets "desktop" (1200x800), "hd" (1920x1080)
/// and "mobile" (375x667).
pub fn parse_viewport(size: &str) -> Option<(u32, u32)> {
    match size.trim().to_lowercase().as_str() {
        "desktop" => Some((1200, 800)),
        "hd" => Some((1920, 1080)),
        "mobile" => Some((375, 667)),
        custom => {
            let (w, h) = custom.split_once('x')?;
            let w: u32 = w.parse().ok()?;
            let h: u32 = h.parse().ok()?;
            if w == 0 || h == 0 {
                return None;
            }
            Some((w, h))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport_presets() {
        assert_eq!(parse_viewport("desktop"), Some((1200, 800)));
        assert_eq!(parse_viewport("HD"), Some((1920, 1080)));
        assert_eq!(parse_viewport("mobile"), Some((375, 667)));
    }

    #[test]
    fn test_parse_viewport_custom() {
        assert_eq!(parse_viewport("1024x768"), Some((1024, 768)));
        assert_eq!(parse_viewport(" 800x600 "), Some((800, 600)));
    }

    #[test]
    fn test_parse_viewport_invalid() {
        assert_eq!(parse_viewport("invalid"), None);
        assert_eq!(parse_viewport("1200"), None);
        assert_eq!(parse_viewport("0x800"), None);
        assert_eq!(parse_viewport("axb"), None);
    }

    #[test]
    fn test_settle_delay_is_clamped() {
        assert_eq!(clamp_settle_ms(0), MIN_SETTLE_MS);
        assert_eq!(clamp_settle_ms(300), 300);
        assert_eq!(clamp_settle_ms(5000), MAX_SETTLE_MS);
        assert_eq!(Config::defaults().settle_ms(100).settle_ms, 250);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.viewport, (1200, 800));
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_chrome_path_override() {
        let config = Config::defaults().chrome_path("/opt/chromium/chrome");
        assert_eq!(config.chrome_path.as_deref(), Some("/opt/chromium/chrome"));
    }

    #[test]
    fn test_global_config_is_shared() {
        assert!(std::ptr::eq(get(), get()));
    }
}
