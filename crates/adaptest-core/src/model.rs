//! Core data model types for adaptest.
//!
//! These are the fundamental types the system uses to represent exam items,
//! item pools, responses, and the running ability estimate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single exam question supplied by the question-bank collaborator.
///
/// Items are read-only from the engine's perspective; the pool they come
/// from is fixed for the duration of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier for this item.
    pub id: String,
    /// The question text shown to the test-taker.
    pub text: String,
    /// What kind of answer the item expects.
    pub kind: ItemKind,
    /// Answer options for selectable kinds.
    #[serde(default)]
    pub options: Vec<String>,
    /// Index into `options` of the keyed answer, for selectable kinds.
    #[serde(default)]
    pub correct_option: Option<usize>,
    /// Difficulty on a nominal [0,1] scale; the engine clamps out-of-range
    /// values rather than rejecting them.
    pub difficulty: f64,
    /// Topic label used for organization and reporting.
    #[serde(default)]
    pub topic: String,
    /// Points awarded for a correct response.
    #[serde(default = "default_points")]
    pub points: u32,
    /// Free-form tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_points() -> u32 {
    1
}

/// Supported item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    MultipleChoice,
    TrueFalse,
    FillBlank,
    Essay,
}

impl ItemKind {
    /// Selectable kinds can be auto-graded; free-response kinds cannot.
    pub fn is_selectable(&self) -> bool {
        matches!(self, ItemKind::MultipleChoice | ItemKind::TrueFalse)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::MultipleChoice => write!(f, "multiple-choice"),
            ItemKind::TrueFalse => write!(f, "true-false"),
            ItemKind::FillBlank => write!(f, "fill-blank"),
            ItemKind::Essay => write!(f, "essay"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "mc" => Ok(ItemKind::MultipleChoice),
            "true-false" | "tf" => Ok(ItemKind::TrueFalse),
            "fill-blank" => Ok(ItemKind::FillBlank),
            "essay" => Ok(ItemKind::Essay),
            other => Err(format!("unknown item kind: {other}")),
        }
    }
}

/// An ordered collection of items.
///
/// Pool order is meaningful: when two items are equally close to the
/// ability estimate, the first one in the pool wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPool {
    /// Unique identifier for this pool.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of what this pool covers.
    #[serde(default)]
    pub description: String,
    /// The items in this pool.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Default cap on questions per session for this pool.
    #[serde(default = "default_max_questions")]
    pub default_max_questions: u32,
}

fn default_max_questions() -> u32 {
    20
}

/// A test-taker's response to a single item. Produced by the session loop
/// and consumed exactly once by the ability update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    /// The item that was answered.
    pub item_id: String,
    /// Whether the response was correct.
    pub correct: bool,
    /// Seconds spent on the item.
    pub time_spent_secs: f64,
}

/// The running ability estimate for one exam session.
///
/// Created at session start, mutated only by [`crate::engine::CatEngine`],
/// and discarded when the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityState {
    /// Inferred proficiency on a [0,1] scale.
    pub estimated_ability: f64,
    /// Uncertainty of the estimate; never drops below 0.1.
    pub standard_error: f64,
    /// Mirror of the ability estimate, kept as a display hint.
    pub current_difficulty: f64,
    /// Items selected so far.
    pub questions_asked: u32,
    /// Hard cap on items for this session.
    pub max_questions: u32,
}

impl AbilityState {
    /// Initial state for a fresh session: medium ability, high uncertainty.
    pub fn new(max_questions: u32) -> Self {
        Self {
            estimated_ability: 0.5,
            standard_error: 1.0,
            current_difficulty: 0.5,
            questions_asked: 0,
            max_questions,
        }
    }
}
