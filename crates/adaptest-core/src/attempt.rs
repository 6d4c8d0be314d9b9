//! Exam attempt records and proctoring warnings.
//!
//! An [`Attempt`] is owned by the persistence collaborator; the engines
//! only append warnings to it and report scores. Warnings are append-only:
//! once created they are never mutated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Flagged,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::InProgress => write!(f, "in-progress"),
            AttemptStatus::Completed => write!(f, "completed"),
            AttemptStatus::Flagged => write!(f, "flagged"),
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-progress" => Ok(AttemptStatus::InProgress),
            "completed" => Ok(AttemptStatus::Completed),
            "flagged" => Ok(AttemptStatus::Flagged),
            other => Err(format!("unknown attempt status: {other}")),
        }
    }
}

/// Violation classes the integrity monitor can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    NoFace,
    MultipleFaces,
    LookAway,
    TabSwitch,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::NoFace => write!(f, "no-face"),
            WarningKind::MultipleFaces => write!(f, "multiple-faces"),
            WarningKind::LookAway => write!(f, "look-away"),
            WarningKind::TabSwitch => write!(f, "tab-switch"),
        }
    }
}

/// How serious a warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Horizontal direction of a look-away violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookDirection {
    Left,
    Right,
}

impl fmt::Display for LookDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookDirection::Left => write!(f, "left"),
            LookDirection::Right => write!(f, "right"),
        }
    }
}

/// A single proctoring violation, emitted by the integrity monitor and
/// appended to the owning attempt. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Unique identifier.
    pub id: Uuid,
    /// The attempt this warning belongs to.
    pub attempt_id: String,
    /// Violation class.
    pub kind: WarningKind,
    /// Severity assigned by the emitting heuristic.
    pub severity: Severity,
    /// Direction label, set only for look-away warnings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<LookDirection>,
    /// When the warning was produced.
    pub timestamp: DateTime<Utc>,
}

impl Warning {
    /// Create a warning stamped with the current time.
    pub fn new(attempt_id: &str, kind: WarningKind, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt_id: attempt_id.to_string(),
            kind,
            severity,
            direction: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach a look-away direction label.
    pub fn with_direction(mut self, direction: LookDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// One student's run through one exam.
///
/// Referenced, not owned, by the engines: the CAT engine fills in the
/// final score and the integrity monitor's warnings are appended here, but
/// status transitions are a policy decision made by the session loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// Unique identifier.
    pub id: String,
    /// The exam being taken.
    pub exam_id: String,
    /// The student taking it.
    pub student_id: String,
    /// Raw answers keyed by item id.
    #[serde(default)]
    pub answers: HashMap<String, String>,
    /// Final score, populated on completion.
    #[serde(default)]
    pub score: Option<u32>,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt ended, if it has.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Current lifecycle state.
    pub status: AttemptStatus,
    /// Proctoring warnings, in production order.
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

impl Attempt {
    /// Start a fresh in-progress attempt.
    pub fn start(id: &str, exam_id: &str, student_id: &str) -> Self {
        Self {
            id: id.to_string(),
            exam_id: exam_id.to_string(),
            student_id: student_id.to_string(),
            answers: HashMap::new(),
            score: None,
            started_at: Utc::now(),
            finished_at: None,
            status: AttemptStatus::InProgress,
            warnings: Vec::new(),
        }
    }

    /// Append a warning. Warnings are never removed or reordered.
    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Number of warnings accumulated so far.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}
