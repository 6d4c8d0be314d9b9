//! Adaptive item selection and ability estimation (CAT).
//!
//! Implements computerized adaptive testing over a fixed item pool: pick
//! the item closest to the current ability estimate, update the estimate
//! after each response, stop once precision is high enough or the question
//! budget is spent.
//!
//! The engine is pure and synchronous. It never performs I/O, never throws,
//! and clamps out-of-range numeric input instead of rejecting it. One
//! engine instance exists per exam attempt; it must not be shared across
//! attempts.

use std::collections::HashSet;

use crate::model::{AbilityState, Item, ItemResponse};
use crate::statistics::probability_correct;

/// Gradient step size for the ability update.
const LEARNING_RATE: f64 = 0.3;
/// Multiplicative decay applied to the standard error per response.
const SE_DECAY: f64 = 0.9;
/// The standard error never drops below this floor.
const SE_FLOOR: f64 = 0.1;
/// Precision at which testing stops early.
const SE_STOP_THRESHOLD: f64 = 0.2;

/// The adaptive testing engine for a single exam session.
pub struct CatEngine {
    pool: Vec<Item>,
    state: AbilityState,
}

impl CatEngine {
    /// Create an engine over `pool` with a hard cap of `max_questions`.
    pub fn new(pool: Vec<Item>, max_questions: u32) -> Self {
        Self {
            pool,
            state: AbilityState::new(max_questions),
        }
    }

    /// Select the next item to ask.
    ///
    /// Returns `None` once the question budget is spent or every item in
    /// the pool appears in `asked` — both are normal end-of-session
    /// signals, not errors. Otherwise returns the unasked item whose
    /// difficulty is closest to the current ability estimate, first in
    /// pool order on ties, and counts it against the budget.
    ///
    /// The engine does not record the item as asked; the caller owns the
    /// `asked` set and must add the returned item's id to it.
    pub fn next_item(&mut self, asked: &HashSet<String>) -> Option<Item> {
        if self.state.questions_asked >= self.state.max_questions {
            return None;
        }

        let next = self
            .pool
            .iter()
            .filter(|item| !asked.contains(&item.id))
            .min_by(|a, b| {
                let da = (a.difficulty - self.state.estimated_ability).abs();
                let db = (b.difficulty - self.state.estimated_ability).abs();
                // min_by keeps the earlier element on Equal, preserving
                // pool order for ties.
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })?
            .clone();

        self.state.questions_asked += 1;
        Some(next)
    }

    /// Fold a response into the ability estimate.
    ///
    /// Uses a fixed-learning-rate gradient step under the 1PL model, then
    /// decays the standard error toward its floor. The ability estimate
    /// stays inside [0,1] no matter what is fed in.
    pub fn record_response(&mut self, response: &ItemResponse, item: &Item) {
        let correct = if response.correct { 1.0 } else { 0.0 };
        let difficulty = item.difficulty.clamp(0.0, 1.0);

        let p = probability_correct(self.state.estimated_ability, difficulty);
        let adjustment = LEARNING_RATE * (correct - p);

        self.state.estimated_ability =
            (self.state.estimated_ability + adjustment).clamp(0.0, 1.0);
        self.state.standard_error = (self.state.standard_error * SE_DECAY).max(SE_FLOOR);
        self.state.current_difficulty = self.state.estimated_ability;
    }

    /// True once the session should end: question budget spent, or the
    /// estimate is precise enough.
    pub fn should_stop(&self) -> bool {
        self.state.questions_asked >= self.state.max_questions
            || self.state.standard_error < SE_STOP_THRESHOLD
    }

    /// Final score on a 0–100 scale.
    pub fn final_score(&self) -> u32 {
        (self.state.estimated_ability * 100.0).round() as u32
    }

    /// Snapshot of the current state. Copy semantics: later engine
    /// mutation does not alter a snapshot already handed out.
    pub fn state(&self) -> AbilityState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKind;

    fn item(id: &str, difficulty: f64) -> Item {
        Item {
            id: id.into(),
            text: format!("question {id}"),
            kind: ItemKind::MultipleChoice,
            options: vec!["a".into(), "b".into()],
            correct_option: Some(0),
            difficulty,
            topic: "test".into(),
            points: 1,
            tags: vec![],
        }
    }

    fn response(id: &str, correct: bool) -> ItemResponse {
        ItemResponse {
            item_id: id.into(),
            correct,
            time_spent_secs: 12.0,
        }
    }

    fn spread_pool() -> Vec<Item> {
        vec![
            item("q1", 0.1),
            item("q2", 0.3),
            item("q3", 0.5),
            item("q4", 0.7),
            item("q5", 0.9),
        ]
    }

    #[test]
    fn first_pick_matches_initial_ability() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let picked = engine.next_item(&HashSet::new()).unwrap();
        assert_eq!(picked.id, "q3");
        assert_eq!(engine.state().questions_asked, 1);
    }

    #[test]
    fn ties_break_by_pool_order() {
        // 0.4 and 0.6 are equidistant from 0.5; the earlier item wins.
        let pool = vec![item("a", 0.4), item("b", 0.6)];
        let mut engine = CatEngine::new(pool, 10);
        assert_eq!(engine.next_item(&HashSet::new()).unwrap().id, "a");
    }

    #[test]
    fn never_returns_an_asked_item() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let mut asked = HashSet::new();
        for _ in 0..5 {
            let picked = engine.next_item(&asked).unwrap();
            assert!(asked.insert(picked.id.clone()), "item repeated: {}", picked.id);
        }
        assert!(engine.next_item(&asked).is_none());
    }

    #[test]
    fn exhausted_budget_returns_none() {
        let mut engine = CatEngine::new(spread_pool(), 2);
        let mut asked = HashSet::new();
        for _ in 0..2 {
            let picked = engine.next_item(&asked).unwrap();
            asked.insert(picked.id);
        }
        assert!(engine.next_item(&asked).is_none());
        // A later call is still None; the count does not grow past the cap.
        assert!(engine.next_item(&asked).is_none());
        assert_eq!(engine.state().questions_asked, 2);
    }

    #[test]
    fn empty_pool_returns_none() {
        let mut engine = CatEngine::new(vec![], 10);
        assert!(engine.next_item(&HashSet::new()).is_none());
        assert_eq!(engine.state().questions_asked, 0);
    }

    #[test]
    fn correct_answers_raise_ability() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let q = item("q3", 0.5);
        let before = engine.state().estimated_ability;
        engine.record_response(&response("q3", true), &q);
        assert!(engine.state().estimated_ability > before);
    }

    #[test]
    fn incorrect_answers_lower_ability() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let q = item("q3", 0.5);
        let before = engine.state().estimated_ability;
        engine.record_response(&response("q3", false), &q);
        assert!(engine.state().estimated_ability < before);
    }

    #[test]
    fn ability_stays_in_unit_interval() {
        let mut engine = CatEngine::new(spread_pool(), 100);
        let easy = item("easy", 0.0);
        for _ in 0..50 {
            engine.record_response(&response("easy", true), &easy);
            let a = engine.state().estimated_ability;
            assert!((0.0..=1.0).contains(&a), "ability escaped: {a}");
        }
        let hard = item("hard", 1.0);
        for _ in 0..50 {
            engine.record_response(&response("hard", false), &hard);
            let a = engine.state().estimated_ability;
            assert!((0.0..=1.0).contains(&a), "ability escaped: {a}");
        }
    }

    #[test]
    fn out_of_range_difficulty_is_clamped() {
        let mut engine = CatEngine::new(vec![], 10);
        let wild = item("wild", 7.5);
        engine.record_response(&response("wild", true), &wild);
        let a = engine.state().estimated_ability;
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn standard_error_decays_to_floor() {
        let mut engine = CatEngine::new(spread_pool(), 1000);
        let q = item("q3", 0.5);
        let mut last = engine.state().standard_error;
        for _ in 0..100 {
            engine.record_response(&response("q3", true), &q);
            let se = engine.state().standard_error;
            assert!(se <= last, "standard error grew: {se} > {last}");
            assert!(se >= 0.1, "standard error fell through floor: {se}");
            last = se;
        }
        assert!((engine.state().standard_error - 0.1).abs() < 1e-9);
    }

    #[test]
    fn stops_at_max_questions_regardless_of_error() {
        let mut engine = CatEngine::new(spread_pool(), 3);
        let mut asked = HashSet::new();
        for _ in 0..3 {
            let picked = engine.next_item(&asked).unwrap();
            asked.insert(picked.id);
        }
        // Standard error is still 1.0; the budget alone forces the stop.
        assert_eq!(engine.state().standard_error, 1.0);
        assert!(engine.should_stop());
    }

    #[test]
    fn stops_once_precise_enough() {
        let mut engine = CatEngine::new(spread_pool(), 1000);
        let q = item("q3", 0.5);
        assert!(!engine.should_stop());
        // 1.0 * 0.9^16 ≈ 0.185 < 0.2
        for _ in 0..16 {
            engine.record_response(&response("q3", true), &q);
        }
        assert!(engine.should_stop());
    }

    #[test]
    fn final_score_tracks_ability() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        assert_eq!(engine.final_score(), 50);
        let easy = item("easy", 0.0);
        for _ in 0..30 {
            engine.record_response(&response("easy", true), &easy);
        }
        assert!(engine.final_score() <= 100);
        assert!(engine.final_score() > 50);
    }

    #[test]
    fn state_snapshot_is_detached() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let snapshot = engine.state();
        engine.record_response(&response("q3", true), &item("q3", 0.5));
        assert_eq!(snapshot.estimated_ability, 0.5);
        assert_eq!(snapshot.questions_asked, 0);
        assert_ne!(snapshot.estimated_ability, engine.state().estimated_ability);
    }

    #[test]
    fn selection_follows_the_moving_estimate() {
        let mut engine = CatEngine::new(spread_pool(), 10);
        let mut asked = HashSet::new();

        let first = engine.next_item(&asked).unwrap();
        asked.insert(first.id.clone());
        engine.record_response(&response(&first.id, true), &first);

        // Ability moved up from 0.5, so the next pick is the 0.7 item.
        let second = engine.next_item(&asked).unwrap();
        assert_eq!(second.id, "q4");
    }
}
