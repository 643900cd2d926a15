use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use ui_recorder::browser::{BrowserDriver, ChromeConfig, ChromeDriver, MockBrowser, MockSite};
use ui_recorder::config::{self, Config, parse_viewport};
use ui_recorder::probe::{check_reachable, default_markers, parse_marker, verify_page};
use ui_recorder::recorder::{
    Recorder, RecorderError, capture_page, default_cases, load_cases, run_with_chromium,
};
use ui_recorder::runner::{RunResult, TestStatus};
use ui_recorder::session::Session;

/// UI Recorder - before/after screenshots of web UI interactions
#[derive(Parser, Debug)]
#[command(
    name = "ui-recorder",
    about = "Record UI interactions in headless Chromium and write an HTML report",
    after_help = "ENVIRONMENT VARIABLES:\n\
        UI_RECORDER_BASE_URL       Base URL of the site under test\n\
        UI_RECORDER_OUTPUT_DIR     Root directory for run output\n\
        UI_RECORDER_SETTLE_MS      Delay after each interaction (250-500 ms)\n\
        UI_RECORDER_VIEWPORT       Viewport size (desktop, hd, mobile or WxH)\n\
        UI_RECORDER_IDLE_TIMEOUT   Network idle timeout (seconds)\n\
        UI_RECORDER_PROBE_TIMEOUT  Reachability probe timeout (seconds)\n\
        UI_RECORDER_CHROME         Path to the Chromium executable\n\
        RUST_LOG                   Log filter (default: info)"
)]
struct Args {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every interaction test case and write screenshots plus an HTML report
    Run {
        /// Base URL of the site under test
        #[arg(short, long, env = "UI_RECORDER_BASE_URL")]
        base_url: Option<String>,

        /// Root directory for run output (a timestamped run directory is created inside)
        #[arg(short, long, env = "UI_RECORDER_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// JSON file with test cases (default: built-in table)
        #[arg(short, long)]
        cases: Option<PathBuf>,

        /// Delay after each interaction in ms (clamped to 250-500)
        #[arg(long, env = "UI_RECORDER_SETTLE_MS")]
        settle_ms: Option<u64>,

        /// Viewport: desktop (1200x800), hd (1920x1080), mobile (375x667), or WxH
        #[arg(long, short = 's', env = "UI_RECORDER_VIEWPORT")]
        viewport: Option<String>,

        /// Chromium executable
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Disable the Chromium sandbox (needed in most containers)
        #[arg(long)]
        no_sandbox: bool,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,

        /// Skip the HTTP reachability check before launching the browser
        #[arg(long)]
        skip_probe: bool,

        /// Print the run result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Capture a single page screenshot
    Screenshot {
        /// Page URL
        #[arg(short, long)]
        url: String,

        /// Output PNG path
        #[arg(short, long, default_value = "./page_screenshot.png")]
        output: PathBuf,

        /// Viewport: desktop, hd, mobile, or WxH
        #[arg(long, short = 's')]
        viewport: Option<String>,

        /// Extra wait after the page settles (ms)
        #[arg(long, default_value_t = config::DEFAULT_SCREENSHOT_WAIT_MS)]
        wait_ms: u64,

        /// Chromium executable
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Disable the Chromium sandbox
        #[arg(long)]
        no_sandbox: bool,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,
    },

    /// Fetch a page over plain HTTP and check it contains expected markers
    Verify {
        /// Page URL
        #[arg(short, long)]
        url: String,

        /// Marker as LABEL=TEXT (repeatable, default: built-in My Files markers)
        #[arg(short, long)]
        marker: Vec<String>,

        /// Print the page report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in test-case table as JSON
    Cases,

    /// Run the built-in cases against a scripted mock site (no browser needed)
    Mock {
        /// Root directory for run output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Some(Commands::Run {
            base_url,
            output,
            cases,
            settle_ms,
            viewport,
            chrome,
            no_sandbox,
            headed,
            skip_probe,
            json,
        }) => {
            let mut config = config::get().clone();
            if let Some(url) = base_url {
                config = config.base_url(url);
            }
            if let Some(dir) = output {
                config = config.output_dir(dir.to_string_lossy());
            }
            if let Some(ms) = settle_ms {
                config = config.settle_ms(ms);
            }
            if let Some(ref size) = viewport {
                let (w, h) = viewport_or_err(size)?;
                config = config.viewport(w, h);
            }

            if let Some(path) = chrome {
                config = config.chrome_path(path.to_string_lossy());
            }

            let test_cases = match cases {
                Some(path) => {
                    load_cases(&path).with_context(|| format!("loading {}", path.display()))?
                }
                None => default_cases(),
            };

            if !skip_probe {
                let timeout = config.probe_timeout_duration();
                if let Err(e) = check_reachable(&config.base_url, timeout).await {
                    report_environment_error(&format!(
                        "{}\nStart the site under test \
                         (e.g. `python3 -m http.server 8080`) and retry.",
                        e
                    ));
                    return Ok(());
                }
            }

            let chrome_config = chrome_config(&config, no_sandbox, headed);
            let session = Session::new(&config.output_dir);

            match run_with_chromium(config, test_cases, session, chrome_config).await {
                Ok(run) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&run)?);
                    } else {
                        print_summary(&run);
                    }
                }
                Err(RecorderError::Environment(message)) => report_environment_error(&message),
                Err(e) => return Err(e.into()),
            }
        }

        Some(Commands::Screenshot {
            url,
            output,
            viewport,
            wait_ms,
            chrome,
            no_sandbox,
            headed,
        }) => {
            let mut config = config::get().clone();
            if let Some(ref size) = viewport {
                let (w, h) = viewport_or_err(size)?;
                config = config.viewport(w, h);
            }
            if let Some(path) = chrome {
                config = config.chrome_path(path.to_string_lossy());
            }

            let launched = ChromeDriver::launch(chrome_config(&config, no_sandbox, headed)).await;
            let mut driver = match launched {
                Ok(driver) => driver,
                Err(e) => {
                    report_environment_error(&e.to_string());
                    return Ok(());
                }
            };

            let captured = capture_page(&mut driver, &url, Duration::from_millis(wait_ms)).await;
            if let Err(e) = driver.shutdown().await {
                warn!("Browser shutdown failed: {}", e);
            }
            let png = captured?;

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, &png)?;
            println!("Screenshot saved: {}", output.display());
            println!("  Size: {} bytes", png.len());
        }

        Some(Commands::Verify { url, marker, json }) => {
            let markers = if marker.is_empty() {
                default_markers()
            } else {
                marker.iter().map(|m| parse_marker(m)).collect()
            };

            let timeout = config::get().probe_timeout_duration();
            let report = match verify_page(&url, &markers, timeout).await {
                Ok(report) => report,
                Err(e) => {
                    report_environment_error(&e.to_string());
                    return Ok(());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Status: {}", report.status);
                println!("Content length: {} characters", report.body_len);
                for check in &report.markers {
                    let mark = if check.found { "found" } else { "MISSING" };
                    println!("  {:<24} {}", check.label, mark);
                }
            }
        }

        Some(Commands::Cases) => {
            println!("{}", serde_json::to_string_pretty(&default_cases())?);
        }

        Some(Commands::Mock { output }) => {
            let config = config::get().clone();
            let root = output.unwrap_or_else(|| PathBuf::from(&config.output_dir));
            let driver = MockBrowser::new(MockSite::infitwin(&config.base_url), config.viewport);
            let session = Session::with_name(&root, "mock");

            let mut recorder = Recorder::new(config, default_cases(), session);
            recorder.run_all_tests(driver).await?;
            print_summary(&recorder.finish()?);
        }

        None => {
            println!("UI Recorder - before/after screenshots of web UI interactions");
            println!();
            println!("Usage: ui-recorder <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run         Run all interaction cases in headless Chromium");
            println!("  screenshot  Capture a single page");
            println!("  verify      Check a page for expected markers over HTTP");
            println!("  cases       Print the built-in case table");
            println!("  mock        Run the cases against a scripted mock site");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn viewport_or_err(size: &str) -> anyhow::Result<(u32, u32)> {
    parse_viewport(size).ok_or_else(|| {
        anyhow!(
            "Invalid viewport '{}'. Use: desktop, hd, mobile, or WxH",
            size
        )
    })
}

fn chrome_config(config: &Config, no_sandbox: bool, headed: bool) -> ChromeConfig {
    let mut chrome_config = ChromeConfig::from_config(config);
    if no_sandbox {
        chrome_config = chrome_config.no_sandbox();
    }
    if headed {
        chrome_config = chrome_config.headed();
    }
    chrome_config
}

/// Environment problems are reported, not propagated: the exit status stays 0
fn report_environment_error(message: &str) {
    error!("{}", message);
    eprintln!("Error: {}", message);
}

fn print_summary(run: &RunResult) {
    println!();
    println!("Test Summary:");
    for result in &run.results {
        let line = match result.status {
            TestStatus::Error => format!(
                "  [{}] {}: {}",
                result.status.label(),
                result.test_name,
                result.error_message.as_deref().unwrap_or("Unknown error")
            ),
            _ => format!("  [{}] {}", result.status.label(), result.test_name),
        };
        println!("{}", line);
    }
    println!();
    println!("  Success: {}", run.summary.success);
    println!("  Warning: {}", run.summary.warning);
    println!("  Error:   {}", run.summary.error);
    println!();
    println!("Output: {}", run.output_dir.display());
    match &run.report_path {
        Some(path) => println!("Report: {}", path.display()),
        None => println!("Report: not written"),
    }
}
