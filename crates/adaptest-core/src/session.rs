//! Exam session orchestration around the CAT engine.
//!
//! [`ExamSession`] owns the asked-item set the bare engine leaves to its
//! caller, the attempt record, and the warning escalation policy. One
//! session exists per attempt; sessions are never shared across attempts
//! or threads.

use std::collections::HashSet;

use chrono::Utc;

use crate::attempt::{Attempt, AttemptStatus, Severity, Warning, WarningKind};
use crate::engine::CatEngine;
use crate::model::{AbilityState, Item, ItemPool, ItemResponse};
use crate::report::AttemptReport;

/// Warnings of any kind before an attempt is flagged for review.
pub const FLAG_THRESHOLD: usize = 3;

/// A single adaptive exam session: the CAT engine plus the bookkeeping the
/// engine deliberately leaves to its caller.
pub struct ExamSession {
    engine: CatEngine,
    asked: HashSet<String>,
    current_item: Option<Item>,
    responses: Vec<ItemResponse>,
    attempt: Attempt,
}

impl ExamSession {
    /// Start a session for `attempt` over the given pool.
    pub fn new(attempt: Attempt, pool: &ItemPool, max_questions: Option<u32>) -> Self {
        let max = max_questions.unwrap_or(pool.default_max_questions);
        Self {
            engine: CatEngine::new(pool.items.clone(), max),
            asked: HashSet::new(),
            current_item: None,
            responses: Vec::new(),
            attempt,
        }
    }

    /// Ask the engine for the next item and record it as asked.
    ///
    /// `None` means the session is over (budget spent or pool exhausted);
    /// callers must treat it like a stop signal and call [`finish`].
    ///
    /// [`finish`]: ExamSession::finish
    pub fn next_item(&mut self) -> Option<Item> {
        let item = self.engine.next_item(&self.asked)?;
        self.asked.insert(item.id.clone());
        self.current_item = Some(item.clone());
        Some(item)
    }

    /// Submit the answer to the item returned by the last `next_item`.
    ///
    /// Stores the raw answer on the attempt and folds the graded response
    /// into the ability estimate. Returns `false` if no item is in flight.
    pub fn submit_answer(&mut self, raw_answer: &str, correct: bool, time_spent_secs: f64) -> bool {
        let Some(item) = self.current_item.take() else {
            tracing::warn!("answer submitted with no item in flight");
            return false;
        };

        self.attempt
            .answers
            .insert(item.id.clone(), raw_answer.to_string());

        let response = ItemResponse {
            item_id: item.id.clone(),
            correct,
            time_spent_secs,
        };
        self.engine.record_response(&response, &item);
        self.responses.push(response);
        true
    }

    /// Append a proctoring warning and apply the escalation policy: at
    /// [`FLAG_THRESHOLD`] warnings of any kind the attempt is flagged for
    /// review. Flagged attempts stay flagged.
    pub fn record_warning(&mut self, warning: Warning) {
        self.attempt.push_warning(warning);
        if self.attempt.warning_count() >= FLAG_THRESHOLD
            && self.attempt.status == AttemptStatus::InProgress
        {
            tracing::info!(
                attempt = %self.attempt.id,
                warnings = self.attempt.warning_count(),
                "attempt flagged for review"
            );
            self.attempt.status = AttemptStatus::Flagged;
        }
    }

    /// Report that the test-taker left the exam tab. Browser-level events
    /// come from the rendering layer, not the frame monitor, but they land
    /// in the same warning stream.
    pub fn record_tab_switch(&mut self) {
        let warning = Warning::new(&self.attempt.id, WarningKind::TabSwitch, Severity::Low);
        self.record_warning(warning);
    }

    /// True once the engine's stop condition holds.
    pub fn is_finished(&self) -> bool {
        self.engine.should_stop()
    }

    /// Current ability snapshot.
    pub fn ability(&self) -> AbilityState {
        self.engine.state()
    }

    /// The attempt record as it stands right now.
    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    /// Close the session: stamp the score and end time, transition
    /// in-progress to completed (flagged attempts keep their status), and
    /// produce the final report.
    pub fn finish(mut self) -> AttemptReport {
        let finished_at = Utc::now();
        self.attempt.score = Some(self.engine.final_score());
        self.attempt.finished_at = Some(finished_at);
        if self.attempt.status == AttemptStatus::InProgress {
            self.attempt.status = AttemptStatus::Completed;
        }

        let duration_ms = (finished_at - self.attempt.started_at)
            .num_milliseconds()
            .max(0) as u64;

        AttemptReport::new(self.attempt, self.engine.state(), self.responses, duration_ms)
    }
}
