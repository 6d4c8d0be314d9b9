//! adaptest-proctor — Behavioral integrity monitoring.
//!
//! Consumes a video signal through an injected face-detection capability
//! and emits discrete violation warnings when heuristic thresholds are
//! crossed. The monitor itself is synchronous per invocation; the frame
//! pump drives it on a fixed cadence with at-most-one analysis in flight.

pub mod monitor;
pub mod pump;

pub use monitor::ProctorMonitor;
pub use pump::{spawn_pump, PumpHandle, PumpStats};
