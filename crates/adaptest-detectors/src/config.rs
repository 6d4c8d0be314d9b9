//! Detector configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::traits::FaceDetector;

use crate::mock::{FrameScript, ScriptedDetector, StaticDetector};
use crate::remote::RemoteDetector;

/// Configuration for a face-detection backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure
/// in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DetectorConfig {
    Remote {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
        #[serde(default = "default_min_confidence")]
        min_confidence: f64,
    },
    Scripted {
        #[serde(default)]
        script_path: Option<PathBuf>,
    },
    Static,
}

impl std::fmt::Debug for DetectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorConfig::Remote {
                api_key,
                base_url,
                timeout_secs,
                min_confidence,
            } => f
                .debug_struct("Remote")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .field("min_confidence", min_confidence)
                .finish(),
            DetectorConfig::Scripted { script_path } => f
                .debug_struct("Scripted")
                .field("script_path", script_path)
                .finish(),
            DetectorConfig::Static => f.debug_struct("Static").finish(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_min_confidence() -> f64 {
    0.5
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Which detection backend proctored sessions use.
    #[serde(default = "default_detector")]
    pub detector: DetectorConfig,
    /// Seconds between frame analyses.
    #[serde(default = "default_interval")]
    pub monitor_interval_secs: u64,
    /// Default question cap per session.
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,
    /// Output directory for attempt reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_detector() -> DetectorConfig {
    DetectorConfig::Static
}
fn default_interval() -> u64 {
    2
}
fn default_max_questions() -> u32 {
    20
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./adaptest-results")
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            detector: default_detector(),
            monitor_interval_secs: default_interval(),
            max_questions: default_max_questions(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a detector config.
fn resolve_detector_config(config: &DetectorConfig) -> DetectorConfig {
    match config {
        DetectorConfig::Remote {
            base_url,
            api_key,
            timeout_secs,
            min_confidence,
        } => DetectorConfig::Remote {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_ref().map(|k| resolve_env_vars(k)),
            timeout_secs: *timeout_secs,
            min_confidence: *min_confidence,
        },
        other => other.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_DETECTOR_URL`,
/// `ADAPTEST_DETECTOR_KEY`.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AdaptestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AdaptestConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("ADAPTEST_DETECTOR_URL") {
        config.detector = match config.detector {
            DetectorConfig::Remote {
                api_key,
                timeout_secs,
                min_confidence,
                ..
            } => DetectorConfig::Remote {
                base_url: url,
                api_key,
                timeout_secs,
                min_confidence,
            },
            _ => DetectorConfig::Remote {
                base_url: url,
                api_key: None,
                timeout_secs: default_timeout(),
                min_confidence: default_min_confidence(),
            },
        };
    }

    if let Ok(key) = std::env::var("ADAPTEST_DETECTOR_KEY") {
        if let DetectorConfig::Remote { api_key, .. } = &mut config.detector {
            *api_key = Some(key);
        }
    }

    config.detector = resolve_detector_config(&config.detector);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

/// Create a detector instance from its configuration.
pub fn create_detector(config: &DetectorConfig) -> Result<Arc<dyn FaceDetector>> {
    match config {
        DetectorConfig::Remote {
            base_url,
            api_key,
            timeout_secs,
            min_confidence,
        } => Ok(Arc::new(RemoteDetector::with_options(
            base_url,
            api_key.clone(),
            *min_confidence,
            *timeout_secs,
        ))),
        DetectorConfig::Scripted { script_path } => {
            let frames = match script_path {
                Some(path) => FrameScript::from_path(path)?.into_boxes(),
                None => Vec::new(),
            };
            Ok(Arc::new(ScriptedDetector::new(frames)))
        }
        DetectorConfig::Static => Ok(Arc::new(StaticDetector::default())),
    }
}
