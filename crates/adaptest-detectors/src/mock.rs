//! Scripted and static detectors for tests and replay.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use adaptest_core::traits::{BoundingBox, FaceDetector, Frame, FrameSource};

use crate::error::DetectorError;

/// One scripted detection outcome: a set of boxes, or an error message.
type ScriptEntry = Result<Vec<BoundingBox>, String>;

/// A detector that plays back a scripted sequence of detection results.
///
/// Each `detect` call consumes the next entry; once the script is
/// exhausted the configured default (no faces, unless overridden) is
/// returned. Used by the monitor's unit tests and by the CLI's frame
/// replay mode.
pub struct ScriptedDetector {
    script: Mutex<VecDeque<ScriptEntry>>,
    default_response: Vec<BoundingBox>,
    latency: Duration,
    fail_load: bool,
    load_count: AtomicU32,
    detect_count: AtomicU32,
}

impl ScriptedDetector {
    /// Create a detector that plays back `frames` in order.
    pub fn new(frames: Vec<Vec<BoundingBox>>) -> Self {
        Self {
            script: Mutex::new(frames.into_iter().map(Ok).collect()),
            default_response: Vec::new(),
            latency: Duration::ZERO,
            fail_load: false,
            load_count: AtomicU32::new(0),
            detect_count: AtomicU32::new(0),
        }
    }

    /// Append more scripted frames.
    pub fn then_frames(self, frames: Vec<Vec<BoundingBox>>) -> Self {
        self.script
            .lock()
            .unwrap()
            .extend(frames.into_iter().map(Ok));
        self
    }

    /// Append a scripted detection error.
    pub fn then_error(self, message: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    /// Response returned once the script runs dry.
    pub fn with_default(mut self, faces: Vec<BoundingBox>) -> Self {
        self.default_response = faces;
        self
    }

    /// Add artificial inference latency to every `detect` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `load` fail, for fatal-initialization tests.
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Number of `load` calls made.
    pub fn load_count(&self) -> u32 {
        self.load_count.load(Ordering::Relaxed)
    }

    /// Number of `detect` calls made.
    pub fn detect_count(&self) -> u32 {
        self.detect_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn load(&self) -> anyhow::Result<()> {
        self.load_count.fetch_add(1, Ordering::Relaxed);
        if self.fail_load {
            return Err(DetectorError::ModelUnavailable("scripted load failure".into()).into());
        }
        Ok(())
    }

    async fn detect(&self, _frame: &Frame) -> anyhow::Result<Vec<BoundingBox>> {
        self.detect_count.fetch_add(1, Ordering::Relaxed);
        if self.latency > Duration::ZERO {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(faces)) => Ok(faces),
            Some(Err(message)) => Err(DetectorError::InferenceFailed(message).into()),
            None => Ok(self.default_response.clone()),
        }
    }
}

/// A detector that always reports the same single face, for un-proctored
/// demo runs where the monitor should stay quiet.
pub struct StaticDetector {
    face: BoundingBox,
}

impl StaticDetector {
    pub fn new(face: BoundingBox) -> Self {
        Self { face }
    }
}

impl Default for StaticDetector {
    fn default() -> Self {
        // A face parked in the middle of a 640x480 frame.
        Self::new(BoundingBox::new(270.0, 140.0, 370.0, 280.0))
    }
}

#[async_trait]
impl FaceDetector for StaticDetector {
    fn name(&self) -> &str {
        "static"
    }

    async fn load(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn detect(&self, _frame: &Frame) -> anyhow::Result<Vec<BoundingBox>> {
        Ok(vec![self.face])
    }
}

/// A frame source that hands out empty frames of a fixed size.
pub struct StaticFrameSource {
    width: u32,
    height: u32,
}

impl StaticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn next_frame(&self) -> anyhow::Result<Frame> {
        Ok(Frame::empty(self.width, self.height))
    }
}

// ---------------------------------------------------------------------------
// Frame scripts
// ---------------------------------------------------------------------------

/// A replayable frame script, loaded from TOML:
///
/// ```toml
/// [[frames]]
/// faces = [[270.0, 140.0, 370.0, 280.0]]
///
/// [[frames]]
/// faces = []
/// ```
///
/// Each entry is one analyzed frame; each face is `[x0, y0, x1, y1]`.
#[derive(Debug, Deserialize)]
pub struct FrameScript {
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FrameEntry {
    #[serde(default)]
    pub faces: Vec<[f64; 4]>,
}

impl FrameScript {
    /// Parse a script from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a script from a TOML file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read frame script: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse frame script: {}", path.display()))
    }

    /// Number of frames in the script.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if the script holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Convert into the box sequence a [`ScriptedDetector`] plays back.
    pub fn into_boxes(self) -> Vec<Vec<BoundingBox>> {
        self.frames
            .into_iter()
            .map(|entry| {
                entry
                    .faces
                    .into_iter()
                    .map(|[x0, y0, x1, y1]| BoundingBox::new(x0, y0, x1, y1))
                    .collect()
            })
            .collect()
    }
}
