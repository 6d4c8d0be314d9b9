//! TOML item pool parser.
//!
//! Loads item pools from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Item, ItemKind, ItemPool};

/// Intermediate TOML structure for parsing pool files.
#[derive(Debug, Deserialize)]
struct TomlPoolFile {
    pool: TomlPoolHeader,
    #[serde(default)]
    items: Vec<TomlItem>,
}

#[derive(Debug, Deserialize)]
struct TomlPoolHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_max_questions")]
    default_max_questions: u32,
}

fn default_max_questions() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
struct TomlItem {
    id: String,
    text: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_option: Option<usize>,
    difficulty: f64,
    #[serde(default)]
    topic: String,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_kind() -> String {
    "multiple-choice".to_string()
}

fn default_points() -> u32 {
    1
}

/// Parse a single TOML file into an `ItemPool`.
pub fn parse_pool(path: &Path) -> Result<ItemPool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pool file: {}", path.display()))?;

    parse_pool_str(&content, path)
}

/// Parse a TOML string into an `ItemPool` (useful for testing).
pub fn parse_pool_str(content: &str, source_path: &Path) -> Result<ItemPool> {
    let parsed: TomlPoolFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let items = parsed
        .items
        .into_iter()
        .map(|i| {
            let kind: ItemKind = i
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("item {}: {}", i.id, e))?;

            Ok(Item {
                id: i.id,
                text: i.text,
                kind,
                options: i.options,
                correct_option: i.correct_option,
                difficulty: i.difficulty,
                topic: i.topic,
                points: i.points,
                tags: i.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemPool {
        id: parsed.pool.id,
        name: parsed.pool.name,
        description: parsed.pool.description,
        items,
        default_max_questions: parsed.pool.default_max_questions,
    })
}

/// Recursively load all `.toml` pool files from a directory.
pub fn load_pool_directory(dir: &Path) -> Result<Vec<ItemPool>> {
    let mut pools = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            pools.extend(load_pool_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_pool(&path) {
                Ok(pool) => pools.push(pool),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(pools)
}

/// A warning from pool validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an item pool for common issues.
pub fn validate_pool(pool: &ItemPool) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if pool.items.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "pool has no items".into(),
        });
    }

    // Check for duplicate item IDs
    let mut seen_ids = std::collections::HashSet::new();
    for item in &pool.items {
        if !seen_ids.insert(&item.id) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("duplicate item ID: {}", item.id),
            });
        }
    }

    // Check for out-of-range difficulty (the engine clamps, but the pool
    // author almost certainly made a mistake)
    for item in &pool.items {
        if !(0.0..=1.0).contains(&item.difficulty) {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: format!("difficulty {} outside [0,1]", item.difficulty),
            });
        }
    }

    // Selectable items need options and a keyed answer
    for item in &pool.items {
        if item.kind.is_selectable() {
            if item.options.is_empty() {
                warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: format!("{} item has no options", item.kind),
                });
            }
            match item.correct_option {
                None => warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: "selectable item has no correct_option".into(),
                }),
                Some(idx) if idx >= item.options.len() => warnings.push(ValidationWarning {
                    item_id: Some(item.id.clone()),
                    message: format!(
                        "correct_option {idx} out of range for {} options",
                        item.options.len()
                    ),
                }),
                Some(_) => {}
            }
        }
    }

    // Check for empty question text
    for item in &pool.items {
        if item.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(item.id.clone()),
                message: "question text is empty".into(),
            });
        }
    }

    warnings
}
