//! Frame-by-frame violation detection.
//!
//! The monitor keeps short-lived tracking state (last face center and a
//! fractional violation counter) and turns raw bounding boxes into
//! discrete warnings:
//!
//! - no face on 3 accumulated violations (counter resets on emit)
//! - more than one face immediately, every frame, with no debounce
//! - a horizontal face jump over 100 px on 3 accumulated violations,
//!   tagged with the jump direction
//!
//! The counter is shared between the no-face and look-away heuristics and
//! decays by 0.5 per calm frame rather than resetting. A detection error
//! costs exactly one frame: it is logged and skipped without touching the
//! tracking state.

use std::sync::Arc;

use anyhow::Context;

use adaptest_core::attempt::{LookDirection, Severity, Warning, WarningKind};
use adaptest_core::traits::{FaceDetector, Frame, Point};

/// Accumulated violations before a debounced warning fires.
const VIOLATION_THRESHOLD: f64 = 3.0;
/// Horizontal movement in pixels that counts as looking away.
const LOOK_AWAY_PX: f64 = 100.0;
/// Amount the violation counter decays per calm frame.
const DECAY_STEP: f64 = 0.5;

/// Tracking state for one monitored session. Exclusively owned by one
/// monitor instance; never shared across sessions.
#[derive(Debug, Default)]
struct TrackingState {
    last_face_position: Option<Point>,
    violation_count: f64,
}

/// The behavioral integrity monitor for a single exam attempt.
pub struct ProctorMonitor {
    detector: Option<Arc<dyn FaceDetector>>,
    initialized: bool,
    tracking: TrackingState,
}

impl ProctorMonitor {
    /// Create a monitor around an injected detection capability.
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            detector: Some(detector),
            initialized: false,
            tracking: TrackingState::default(),
        }
    }

    /// Acquire the detection model. Idempotent; must complete before
    /// [`analyze_frame`] is called.
    ///
    /// A load failure is fatal: proctored sessions must not start without
    /// detection, so the error propagates to the caller instead of being
    /// swallowed.
    ///
    /// [`analyze_frame`]: ProctorMonitor::analyze_frame
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        if self.initialized {
            return Ok(());
        }
        let Some(detector) = &self.detector else {
            anyhow::bail!("monitor has been disposed");
        };
        detector
            .load()
            .await
            .context("failed to load face detection capability")?;
        tracing::info!(detector = detector.name(), "face detection capability loaded");
        self.initialized = true;
        Ok(())
    }

    /// Whether `initialize` has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Analyze one video frame and return a warning if a threshold was
    /// crossed.
    ///
    /// Detection errors are contained to the current frame: the error is
    /// logged, no state changes, and analysis resumes on the next tick.
    pub async fn analyze_frame(&mut self, frame: &Frame, attempt_id: &str) -> Option<Warning> {
        let Some(detector) = &self.detector else {
            tracing::warn!("analyze_frame called on a disposed monitor");
            return None;
        };
        if !self.initialized {
            tracing::warn!("analyze_frame called before initialize");
            return None;
        }

        let faces = match detector.detect(frame).await {
            Ok(faces) => faces,
            Err(e) => {
                tracing::warn!("frame analysis failed, skipping frame: {e:#}");
                return None;
            }
        };

        match faces.len() {
            0 => {
                self.tracking.violation_count += 1.0;
                if self.tracking.violation_count >= VIOLATION_THRESHOLD {
                    self.tracking.violation_count = 0.0;
                    return Some(Warning::new(attempt_id, WarningKind::NoFace, Severity::High));
                }
                None
            }
            1 => {
                let center = faces[0].center();
                let mut warning = None;

                if let Some(last) = self.tracking.last_face_position {
                    let dx = center.x - last.x;
                    if dx.abs() > LOOK_AWAY_PX {
                        self.tracking.violation_count += 1.0;
                        if self.tracking.violation_count >= VIOLATION_THRESHOLD {
                            self.tracking.violation_count = 0.0;
                            let direction = if dx > 0.0 {
                                LookDirection::Right
                            } else {
                                LookDirection::Left
                            };
                            warning = Some(
                                Warning::new(attempt_id, WarningKind::LookAway, Severity::Medium)
                                    .with_direction(direction),
                            );
                        }
                    } else {
                        self.tracking.violation_count =
                            (self.tracking.violation_count - DECAY_STEP).max(0.0);
                    }
                }

                self.tracking.last_face_position = Some(center);
                warning
            }
            _ => Some(Warning::new(
                attempt_id,
                WarningKind::MultipleFaces,
                Severity::High,
            )),
        }
    }

    /// Clear the tracking state, for resuming monitoring after a pause.
    pub fn reset(&mut self) {
        self.tracking = TrackingState::default();
    }

    /// Release the detection capability. Must be called on session end
    /// regardless of exit path; afterwards the monitor refuses to analyze
    /// and cannot be re-initialized.
    pub fn dispose(&mut self) {
        self.detector = None;
        self.initialized = false;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::traits::BoundingBox;
    use adaptest_detectors::mock::ScriptedDetector;

    fn frame() -> Frame {
        Frame::empty(640, 480)
    }

    /// A face box whose center sits at `x`.
    fn face_at(x: f64) -> Vec<BoundingBox> {
        vec![BoundingBox::new(x - 50.0, 100.0, x + 50.0, 300.0)]
    }

    async fn monitor_with(script: Vec<Vec<BoundingBox>>) -> ProctorMonitor {
        let detector = Arc::new(ScriptedDetector::new(script));
        let mut monitor = ProctorMonitor::new(detector);
        monitor.initialize().await.unwrap();
        monitor
    }

    #[tokio::test]
    async fn three_absent_frames_emit_one_warning() {
        let mut monitor = monitor_with(vec![vec![], vec![], vec![], vec![]]).await;

        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());

        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.kind, WarningKind::NoFace);
        assert_eq!(warning.severity, Severity::High);
        assert_eq!(warning.attempt_id, "att-1");

        // Counter was reset: the fourth absent frame starts a fresh count
        // instead of firing again.
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert_eq!(monitor.tracking.violation_count, 1.0);
    }

    #[tokio::test]
    async fn six_absent_frames_emit_two_warnings() {
        let mut monitor = monitor_with(vec![vec![]; 6]).await;
        let mut warnings = 0;
        for _ in 0..6 {
            if monitor.analyze_frame(&frame(), "att-1").await.is_some() {
                warnings += 1;
            }
        }
        assert_eq!(warnings, 2);
    }

    #[tokio::test]
    async fn multiple_faces_fire_immediately_every_time() {
        let two = vec![
            BoundingBox::new(0.0, 0.0, 100.0, 100.0),
            BoundingBox::new(400.0, 0.0, 500.0, 100.0),
        ];
        let mut monitor = monitor_with(vec![two.clone(), two]).await;

        // No warm-up debounce: even the very first frame fires.
        let first = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(first.kind, WarningKind::MultipleFaces);
        assert_eq!(first.severity, Severity::High);

        let second = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(second.kind, WarningKind::MultipleFaces);

        // The debounce counter is untouched by multiple-face frames.
        assert_eq!(monitor.tracking.violation_count, 0.0);
    }

    #[tokio::test]
    async fn sustained_look_away_emits_directed_warning() {
        // Baseline at x=200, then three jumps of +150 px.
        let script = vec![face_at(200.0), face_at(350.0), face_at(500.0), face_at(650.0)];
        let mut monitor = monitor_with(script).await;

        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());

        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.kind, WarningKind::LookAway);
        assert_eq!(warning.severity, Severity::Medium);
        assert_eq!(warning.direction, Some(LookDirection::Right));
        assert_eq!(monitor.tracking.violation_count, 0.0);
    }

    #[tokio::test]
    async fn look_away_left_is_labeled_left() {
        let script = vec![face_at(600.0), face_at(450.0), face_at(300.0), face_at(150.0)];
        let mut monitor = monitor_with(script).await;

        for _ in 0..3 {
            assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        }
        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.direction, Some(LookDirection::Left));
    }

    #[tokio::test]
    async fn calm_frame_decays_progress_instead_of_resetting() {
        // Two jumps (count 2), a calm frame (count 1.5), then two more
        // jumps: 2.5 then 3.5, which crosses the threshold.
        let script = vec![
            face_at(100.0),
            face_at(250.0),
            face_at(400.0),
            face_at(450.0), // +50: calm
            face_at(600.0),
            face_at(750.0),
        ];
        let mut monitor = monitor_with(script).await;

        for _ in 0..3 {
            assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        }
        assert_eq!(monitor.tracking.violation_count, 2.0);

        // The calm frame decays by half a step.
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert_eq!(monitor.tracking.violation_count, 1.5);

        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.kind, WarningKind::LookAway);
    }

    #[tokio::test]
    async fn decay_never_goes_negative() {
        let script = vec![face_at(100.0), face_at(110.0), face_at(120.0), face_at(130.0)];
        let mut monitor = monitor_with(script).await;
        for _ in 0..4 {
            monitor.analyze_frame(&frame(), "att-1").await;
        }
        assert_eq!(monitor.tracking.violation_count, 0.0);
    }

    #[tokio::test]
    async fn counter_is_shared_across_violation_kinds() {
        // Two absent frames, a baseline face, then one jump: 2 + 1 = 3
        // crosses the threshold as a look-away.
        let script = vec![vec![], vec![], face_at(200.0), face_at(400.0)];
        let mut monitor = monitor_with(script).await;

        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());

        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.kind, WarningKind::LookAway);
    }

    #[tokio::test]
    async fn detection_error_skips_the_frame_without_state_change() {
        let detector = Arc::new(
            ScriptedDetector::new(vec![vec![], vec![]])
                .then_error("inference backend fell over")
                .then_frames(vec![vec![]]),
        );
        let mut monitor = ProctorMonitor::new(detector);
        monitor.initialize().await.unwrap();

        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert_eq!(monitor.tracking.violation_count, 2.0);

        // The error frame neither increments nor resets.
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert_eq!(monitor.tracking.violation_count, 2.0);

        // The next absent frame completes the streak.
        let warning = monitor.analyze_frame(&frame(), "att-1").await.unwrap();
        assert_eq!(warning.kind, WarningKind::NoFace);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let mut monitor = ProctorMonitor::new(Arc::clone(&detector) as Arc<dyn FaceDetector>);
        monitor.initialize().await.unwrap();
        monitor.initialize().await.unwrap();
        assert_eq!(detector.load_count(), 1);
    }

    #[tokio::test]
    async fn failed_load_is_fatal() {
        let detector = Arc::new(ScriptedDetector::new(vec![]).failing_load());
        let mut monitor = ProctorMonitor::new(detector);
        let err = monitor.initialize().await.unwrap_err();
        assert!(err.to_string().contains("face detection"));
        assert!(!monitor.is_initialized());
    }

    #[tokio::test]
    async fn analyze_before_initialize_returns_nothing() {
        let detector = Arc::new(ScriptedDetector::new(vec![vec![]]));
        let mut monitor = ProctorMonitor::new(Arc::clone(&detector) as Arc<dyn FaceDetector>);
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert_eq!(detector.detect_count(), 0);
    }

    #[tokio::test]
    async fn reset_clears_tracking() {
        let mut monitor = monitor_with(vec![vec![], vec![], vec![], vec![], vec![]]).await;
        monitor.analyze_frame(&frame(), "att-1").await;
        monitor.analyze_frame(&frame(), "att-1").await;
        assert_eq!(monitor.tracking.violation_count, 2.0);

        monitor.reset();
        assert_eq!(monitor.tracking.violation_count, 0.0);
        assert!(monitor.tracking.last_face_position.is_none());

        // A fresh streak is needed after the reset.
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_some());
    }

    #[tokio::test]
    async fn disposed_monitor_refuses_everything() {
        let mut monitor = monitor_with(vec![vec![]]).await;
        monitor.dispose();

        assert!(!monitor.is_initialized());
        assert!(monitor.analyze_frame(&frame(), "att-1").await.is_none());
        assert!(monitor.initialize().await.is_err());
    }
}
