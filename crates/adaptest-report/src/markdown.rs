//! Markdown report generator.

use adaptest_core::report::AttemptReport;

/// Format an attempt report as markdown.
pub fn to_markdown(report: &AttemptReport) -> String {
    let mut md = String::new();
    let attempt = &report.attempt;

    md.push_str(&format!("## Attempt {}\n\n", attempt.id));
    md.push_str(&format!(
        "**Summary:** score {} | status {} | {} questions | {} correct | {} warning(s)\n\n",
        attempt
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string()),
        attempt.status,
        report.ability.questions_asked,
        report.correct_count(),
        attempt.warning_count(),
    ));
    md.push_str(&format!(
        "Ability estimate {:.2} (standard error {:.2}), {:.1}s total\n\n",
        report.ability.estimated_ability,
        report.ability.standard_error,
        report.duration_ms as f64 / 1000.0,
    ));

    if !report.responses.is_empty() {
        md.push_str("### Responses\n\n");
        md.push_str("| # | Item | Correct | Time |\n");
        md.push_str("|---|------|---------|------|\n");
        for (i, r) in report.responses.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}s |\n",
                i + 1,
                r.item_id,
                if r.correct { "yes" } else { "no" },
                r.time_spent_secs
            ));
        }
        md.push('\n');
    }

    if !attempt.warnings.is_empty() {
        md.push_str("### Warnings\n\n");
        md.push_str("| Time | Type | Severity | Direction |\n");
        md.push_str("|------|------|----------|-----------|\n");
        for w in &attempt.warnings {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                w.timestamp.format("%H:%M:%S"),
                w.kind,
                w.severity,
                w.direction
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ));
        }
    }

    md
}
