//! Capability traits for face detection and frame capture.
//!
//! These async traits are implemented by the `adaptest-detectors` crate and
//! by whatever owns the camera. The integrity monitor depends only on the
//! traits, so its threshold and debounce logic is unit-testable with a fake
//! detector returning scripted box sequences.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Frame geometry
// ---------------------------------------------------------------------------

/// A single captured video frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data; layout is a contract between the frame source and
    /// the detector, the monitor never looks inside.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Frame {
    /// A frame with dimensions only, for detectors that don't need pixels.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: Vec::new(),
        }
    }
}

/// A point in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned face bounding box in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Center point of the box.
    pub fn center(&self) -> Point {
        Point {
            x: (self.x0 + self.x1) / 2.0,
            y: (self.y0 + self.y1) / 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Face detection capability
// ---------------------------------------------------------------------------

/// Trait for face-detection backends.
///
/// Implementations are injected into the integrity monitor, which treats
/// them as a black box: a frame goes in, zero or more bounding boxes come
/// out. `load` failures are fatal (a proctored session must not start
/// without detection); `detect` failures are transient and cost one frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Human-readable backend name (e.g. "remote").
    fn name(&self) -> &str;

    /// Acquire the detection model. Called once before any `detect`.
    async fn load(&self) -> anyhow::Result<()>;

    /// Detect faces in a frame.
    async fn detect(&self, frame: &Frame) -> anyhow::Result<Vec<BoundingBox>>;
}

/// Trait for frame capture backends.
///
/// Yields the current video frame on demand; the monitor does not manage
/// camera acquisition.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Grab the most recent frame.
    async fn next_frame(&self) -> anyhow::Result<Frame>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_center() {
        let b = BoundingBox::new(100.0, 50.0, 300.0, 250.0);
        let c = b.center();
        assert_eq!(c.x, 200.0);
        assert_eq!(c.y, 150.0);
    }

    #[test]
    fn bounding_box_serde_roundtrip() {
        let b = BoundingBox::new(0.0, 0.0, 64.0, 64.0);
        let json = serde_json::to_string(&b).unwrap();
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn empty_frame_has_no_pixels() {
        let f = Frame::empty(640, 480);
        assert_eq!(f.width, 640);
        assert_eq!(f.height, 480);
        assert!(f.data.is_empty());
    }
}
