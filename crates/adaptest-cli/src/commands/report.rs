//! The `adaptest report` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::report::AttemptReport;
use adaptest_report::{to_markdown, write_html_report};

pub fn execute(report_path: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = AttemptReport::load_json(&report_path)?;

    match format.as_str() {
        "text" => print_text(&report),
        "markdown" => println!("{}", to_markdown(&report)),
        "html" => {
            let path = output.unwrap_or_else(|| report_path.with_extension("html"));
            write_html_report(&report, &path)?;
            println!("HTML report: {}", path.display());
        }
        other => anyhow::bail!("unknown format: {other} (expected text, markdown, or html)"),
    }

    Ok(())
}

fn print_text(report: &AttemptReport) {
    use comfy_table::{Cell, Table};

    let attempt = &report.attempt;
    println!(
        "Attempt {} — exam {} — student {}",
        attempt.id, attempt.exam_id, attempt.student_id
    );

    let mut summary = Table::new();
    summary.set_header(vec![
        "Score",
        "Status",
        "Questions",
        "Correct",
        "Ability",
        "Std. Error",
        "Duration",
    ]);
    summary.add_row(vec![
        Cell::new(
            attempt
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(attempt.status.to_string()),
        Cell::new(report.ability.questions_asked.to_string()),
        Cell::new(report.correct_count().to_string()),
        Cell::new(format!("{:.2}", report.ability.estimated_ability)),
        Cell::new(format!("{:.2}", report.ability.standard_error)),
        Cell::new(format!("{:.1}s", report.duration_ms as f64 / 1000.0)),
    ]);
    println!("{summary}");

    if attempt.warnings.is_empty() {
        println!("No proctoring warnings.");
        return;
    }

    let mut warnings = Table::new();
    warnings.set_header(vec!["Time", "Type", "Severity", "Direction"]);
    for w in &attempt.warnings {
        warnings.add_row(vec![
            Cell::new(w.timestamp.format("%H:%M:%S").to_string()),
            Cell::new(w.kind.to_string()),
            Cell::new(w.severity.to_string()),
            Cell::new(
                w.direction
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    println!("{warnings}");
}
