//! Attempt report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::Attempt;
use crate::model::{AbilityState, ItemResponse};

/// The durable record of one finished exam session: the attempt itself,
/// the final ability estimate, and the graded response trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The finished attempt, warnings included.
    pub attempt: Attempt,
    /// Final ability estimate.
    pub ability: AbilityState,
    /// Graded responses in the order they were given.
    pub responses: Vec<ItemResponse>,
    /// Wall-clock duration of the session in milliseconds.
    pub duration_ms: u64,
}

impl AttemptReport {
    pub fn new(
        attempt: Attempt,
        ability: AbilityState,
        responses: Vec<ItemResponse>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            attempt,
            ability,
            responses,
            duration_ms,
        }
    }

    /// Number of responses answered correctly.
    pub fn correct_count(&self) -> usize {
        self.responses.iter().filter(|r| r.correct).count()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
