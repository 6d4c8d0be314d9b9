//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use adaptest_core::report::AttemptReport;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from an attempt report.
pub fn generate_html(report: &AttemptReport) -> String {
    let mut html = String::new();
    let attempt = &report.attempt;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>adaptest report — {}</title>\n",
        html_escape(&attempt.id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>adaptest attempt report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Attempt: <strong>{}</strong> | Exam: {} | Student: {} | {}</p>\n",
        html_escape(&attempt.id),
        html_escape(&attempt.exam_id),
        html_escape(&attempt.student_id),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Score</th><th>Status</th><th>Questions</th><th>Correct</th><th>Ability</th><th>Std. Error</th><th>Warnings</th><th>Duration</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    let status_class = match attempt.status {
        adaptest_core::attempt::AttemptStatus::Flagged => "fail",
        _ => "pass",
    };
    html.push_str(&format!(
        "<tr><td>{}</td><td class=\"{}\">{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td><td>{:.1}s</td></tr>\n",
        attempt
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string()),
        status_class,
        attempt.status,
        report.ability.questions_asked,
        report.correct_count(),
        report.ability.estimated_ability,
        report.ability.standard_error,
        attempt.warning_count(),
        report.duration_ms as f64 / 1000.0,
    ));
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Per-response results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Responses</h2>\n");
    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>#</th><th>Item</th><th>Correct</th><th>Time</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (i, r) in report.responses.iter().enumerate() {
        let class = if r.correct { "pass" } else { "fail" };
        let text = if r.correct { "yes" } else { "no" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.1}s</td></tr>\n",
            class,
            i + 1,
            html_escape(&r.item_id),
            text,
            r.time_spent_secs
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Warning timeline
    html.push_str("<section class=\"warnings\">\n");
    html.push_str("<h2>Warnings</h2>\n");
    if attempt.warnings.is_empty() {
        html.push_str("<p>No proctoring warnings.</p>\n");
    } else {
        html.push_str("<table class=\"warnings-table\">\n");
        html.push_str(
            "<thead><tr><th>Time</th><th>Type</th><th>Severity</th><th>Direction</th></tr></thead>\n",
        );
        html.push_str("<tbody>\n");
        for w in &attempt.warnings {
            let class = match w.severity {
                adaptest_core::attempt::Severity::High => "sev-high",
                adaptest_core::attempt::Severity::Medium => "sev-medium",
                adaptest_core::attempt::Severity::Low => "sev-low",
            };
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                class,
                w.timestamp.format("%H:%M:%S"),
                w.kind,
                w.severity,
                w.direction
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AttemptReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --warn: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --warn: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.sev-high { background: var(--fail); }
.sev-medium { background: var(--warn); }
.sev-low { background: var(--pass); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
