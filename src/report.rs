//! Self-contained HTML report.
//!
//! Screenshots are embedded as base64 `data:` URIs, so the report opens
//! offline and can be moved without its screenshot directory. Rendering is
//! a pure function of the results and the generation timestamp.

use base64::Engine;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::runner::{RunSummary, TestResult, TestStatus};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
        .header { background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .test-result { background: white; padding: 20px; margin-bottom: 20px; border-radius: 8px; }
        .test-title { font-size: 18px; font-weight: bold; margin-bottom: 10px; }
        .status {
            display: inline-block; padding: 4px 8px; border-radius: 4px;
            font-size: 12px; margin-left: 10px;
        }
        .status.success { background: #28a745; color: white; }
        .status.warning { background: #ffc107; color: #856404; }
        .status.error { background: #dc3545; color: white; }
        .screenshots { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; margin-top: 15px; }
        .screenshot-box { border: 1px solid #ddd; border-radius: 4px; overflow: hidden; }
        .screenshot-label { background: #f8f9fa; padding: 8px; font-weight: 500; }
        .screenshot-img { width: 100%; height: auto; display: block; }
        .screenshot-missing { padding: 40px 8px; color: #999; text-align: center; }
        .details { margin-top: 10px; color: #666; }
        .error-msg { color: #dc3545; margin-top: 10px; }
"#;

/// Escape text for element content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Render all results into one HTML document
pub fn generate_html_report(results: &[TestResult], generated_at: &DateTime<Utc>) -> String {
    let summary = RunSummary::from_results(results);
    let mut html = String::new();

    // Writing into a String cannot fail
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Interactive Elements Test Report</title>
    <style>{style}    </style>
</head>
<body>
    <div class="header">
        <h1>Interactive Elements Test Report</h1>
        <p>Generated: {generated}</p>
        <p>Total Tests: {total}</p>
        <p>Success: {success} &middot; Warning: {warning} &middot; Error: {error}</p>
    </div>
"#,
        style = STYLE,
        generated = generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        total = summary.total,
        success = summary.success,
        warning = summary.warning,
        error = summary.error,
    );

    for result in results {
        render_result(&mut html, result);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_result(html: &mut String, result: &TestResult) {
    let _ = write!(
        html,
        r#"    <div class="test-result">
        <div class="test-title">
            {name}
            <span class="status {class}">{label}</span>
        </div>
"#,
        name = escape_html(&result.test_name),
        class = result.status.as_str(),
        label = result.status.label(),
    );

    if !result.details.is_empty() {
        let _ = writeln!(
            html,
            r#"        <div class="details">{}</div>"#,
            escape_html(&result.details)
        );
    }

    if result.status == TestStatus::Error {
        let message = result.error_message.as_deref().unwrap_or("Unknown error");
        let _ = writeln!(
            html,
            r#"        <div class="error-msg">Error: {}</div>"#,
            escape_html(message)
        );
    }

    if result.has_images() {
        html.push_str("        <div class=\"screenshots\">\n");
        render_screenshot(html, "Before Interaction", &result.before_image);
        render_screenshot(html, "After Interaction", &result.after_image);
        html.push_str("        </div>\n");
    }

    html.push_str("    </div>\n");
}

/// One image box; a side that was never captured gets a placeholder instead of an empty image
fn render_screenshot(html: &mut String, label: &str, png: &[u8]) {
    if png.is_empty() {
        let _ = write!(
            html,
            r#"            <div class="screenshot-box">
                <div class="screenshot-label">{label}</div>
                <div class="screenshot-missing">Not captured</div>
            </div>
"#,
            label = label,
        );
        return;
    }
    let _ = write!(
        html,
        r#"            <div class="screenshot-box">
                <div class="screenshot-label">{label}</div>
                <img class="screenshot-img" src="{src}" />
            </div>
"#,
        label = label,
        src = data_uri(png),
    );
}

/// Write a rendered report, creating the parent directory if needed
pub fn write_html_report(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    fn sample() -> Vec<TestResult> {
        vec![
            TestResult::success("Tabs", vec![1, 2, 3], vec![4, 5, 6], "Switched tab"),
            TestResult::warning("Dropdown", vec![7, 8, 9], "No element matched"),
            TestResult::error(
                "Settings",
                Vec::new(),
                Vec::new(),
                "",
                "net::ERR_CONNECTION_REFUSED",
            ),
        ]
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_one_badge_per_result() {
        let html = generate_html_report(&sample(), &at());
        assert_eq!(html.matches(r#"<span class="status "#).count(), 3);
        assert!(html.contains(r#"<span class="status success">SUCCESS</span>"#));
        assert!(html.contains(r#"<span class="status warning">WARNING</span>"#));
        assert!(html.contains(r#"<span class="status error">ERROR</span>"#));
    }

    #[test]
    fn test_images_are_inlined() {
        let html = generate_html_report(&sample(), &at());
        // [1,2,3] -> AQID
        assert!(html.contains("src=\"data:image/png;base64,AQID\""));
        assert!(!html.contains("src=\"http"));
        // error result without captures renders no image boxes
        assert_eq!(html.matches(r#"class="screenshot-box""#).count(), 4);
    }

    #[test]
    fn test_missing_side_gets_placeholder() {
        let results = vec![TestResult::error(
            "Hidden",
            vec![1, 2, 3],
            Vec::new(),
            "",
            "boom",
        )];
        let html = generate_html_report(&results, &at());
        assert_eq!(html.matches(r#"class="screenshot-box""#).count(), 2);
        assert_eq!(html.matches("data:image/png;base64,").count(), 1);
        assert!(!html.contains("base64,\""));
        assert!(html.contains(r#"<div class="screenshot-missing">Not captured</div>"#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let results = sample();
        assert_eq!(
            generate_html_report(&results, &at()),
            generate_html_report(&results, &at())
        );
    }

    #[test]
    fn test_header_counts_and_timestamp() {
        let html = generate_html_report(&sample(), &at());
        assert!(html.contains("Generated: 2024-05-06 07:08:09 UTC"));
        assert!(html.contains("Total Tests: 3"));
        assert!(html.contains("Success: 1 &middot; Warning: 1 &middot; Error: 1"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let results = vec![TestResult::error(
            "<script>",
            Vec::new(),
            Vec::new(),
            "",
            "a < b",
        )];
        let html = generate_html_report(&results, &at());
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Error: a &lt; b"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_write_report_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.html");
        write_html_report(&path, "<html></html>").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
