//! The `adaptest run` command.
//!
//! Simulates a full adaptive session: a deterministic respondent answers
//! whatever the CAT engine selects, an optional frame script is replayed
//! through the integrity monitor, and the finished attempt is saved as a
//! report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adaptest_core::attempt::Attempt;
use adaptest_core::model::{Item, ItemPool};
use adaptest_core::parser;
use adaptest_core::report::AttemptReport;
use adaptest_core::session::ExamSession;
use adaptest_core::traits::Frame;
use adaptest_detectors::config::load_config_from;
use adaptest_detectors::mock::{FrameScript, ScriptedDetector};
use adaptest_proctor::ProctorMonitor;
use adaptest_report::{to_markdown, write_html_report};

/// A deterministic simulated respondent.
///
/// Selectable items are answered correctly whenever the simulated ability
/// is at least the item difficulty; free-response items are never
/// auto-correct, they need manual grading.
struct SimulatedStudent {
    ability: f64,
}

impl SimulatedStudent {
    fn answer(&self, item: &Item) -> (String, bool, f64) {
        let correct = item.kind.is_selectable() && self.ability >= item.difficulty;
        let raw_answer = match item.correct_option {
            Some(keyed) if correct => keyed.to_string(),
            Some(keyed) if !item.options.is_empty() => ((keyed + 1) % item.options.len()).to_string(),
            _ => "(free response)".to_string(),
        };
        // Harder items take longer in the simulation.
        let time_spent_secs = 5.0 + 30.0 * item.difficulty;
        (raw_answer, correct, time_spent_secs)
    }
}

pub async fn execute(
    pool_path: PathBuf,
    ability: f64,
    max_questions: Option<u32>,
    frames: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&ability),
        "ability must be between 0.0 and 1.0"
    );

    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(detector = ?config.detector, "configuration resolved");
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let pool = parser::parse_pool(&pool_path)?;
    let max = max_questions.unwrap_or(pool.default_max_questions);

    let attempt_id = format!("attempt-{}", uuid::Uuid::new_v4());
    let attempt = Attempt::start(&attempt_id, &pool.id, "simulated-student");
    let mut session = ExamSession::new(attempt, &pool, Some(max));
    let student = SimulatedStudent { ability };

    eprintln!(
        "adaptest v0.1.0 — {} ({} items, cap {max}), simulated ability {ability:.2}",
        pool.name,
        pool.items.len()
    );
    eprintln!();

    let mut question_no = 0u32;
    while let Some(item) = session.next_item() {
        question_no += 1;
        let (raw_answer, correct, time_spent) = student.answer(&item);
        eprintln!(
            "  Q{question_no}: {} (difficulty {:.2}) -> {}",
            item.id,
            item.difficulty,
            if correct { "correct" } else { "incorrect" }
        );
        session.submit_answer(&raw_answer, correct, time_spent);

        if session.is_finished() {
            break;
        }
    }

    if let Some(frames_path) = &frames {
        replay_frames(&mut session, frames_path, &attempt_id).await?;
    }

    let report = session.finish();
    print_summary(&report, &pool);
    save_outputs(&report, &output, &format)?;

    Ok(())
}

/// Replay a frame script through a fresh monitor and feed the emitted
/// warnings into the session.
async fn replay_frames(
    session: &mut ExamSession,
    frames_path: &Path,
    attempt_id: &str,
) -> Result<()> {
    let script = FrameScript::from_path(frames_path)?;
    let frame_count = script.len();
    let detector = Arc::new(ScriptedDetector::new(script.into_boxes()));

    let mut monitor = ProctorMonitor::new(detector);
    monitor.initialize().await?;

    let frame = Frame::empty(640, 480);
    let mut emitted = 0usize;
    for _ in 0..frame_count {
        if let Some(warning) = monitor.analyze_frame(&frame, attempt_id).await {
            eprintln!("  WARNING: {} ({})", warning.kind, warning.severity);
            session.record_warning(warning);
            emitted += 1;
        }
    }
    monitor.dispose();

    eprintln!("\nReplayed {frame_count} frames, {emitted} warning(s)");
    Ok(())
}

fn print_summary(report: &AttemptReport, pool: &ItemPool) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Pool",
        "Score",
        "Status",
        "Questions",
        "Correct",
        "Ability",
        "Std. Error",
        "Warnings",
    ]);

    table.add_row(vec![
        Cell::new(&pool.name),
        Cell::new(
            report
                .attempt
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(report.attempt.status.to_string()),
        Cell::new(report.ability.questions_asked.to_string()),
        Cell::new(report.correct_count().to_string()),
        Cell::new(format!("{:.2}", report.ability.estimated_ability)),
        Cell::new(format!("{:.2}", report.ability.standard_error)),
        Cell::new(report.attempt.warning_count().to_string()),
    ]);

    eprintln!("\n{table}");
}

fn save_outputs(report: &AttemptReport, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("attempt-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("attempt-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "markdown" => {
                let path = output.join(format!("attempt-{timestamp}.md"));
                std::fs::write(&path, to_markdown(report))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}
