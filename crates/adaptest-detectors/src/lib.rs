//! adaptest-detectors — Face-detection backends.
//!
//! Implements the `FaceDetector` trait for a remote inference service and
//! for scripted/static fakes, so the integrity monitor's logic runs
//! unchanged against a real backend, a replay script, or a test.

pub mod config;
pub mod error;
pub mod mock;
pub mod remote;

pub use config::{create_detector, load_config, AdaptestConfig, DetectorConfig};
pub use error::DetectorError;
