//! The frame pump: drives the monitor on a fixed cadence.
//!
//! Detection latency is variable, so the pump never queues work: a tick
//! that lands while the previous analysis is still running is skipped,
//! guaranteeing at most one in-flight analysis per session and in-order
//! mutation of the tracking state. Warnings are forwarded in production
//! order, so timestamps seen by the consumer are non-decreasing.
//!
//! Stopping the pump (or dropping the warning receiver) disposes the
//! monitor before the stop call returns; no background work survives.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use adaptest_core::attempt::Warning;
use adaptest_core::traits::FrameSource;

use crate::monitor::ProctorMonitor;

/// Reference cadence between frame analyses.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Counters describing what a pump did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Frames that went through the monitor.
    pub frames_analyzed: u64,
    /// Frames lost to capture errors.
    pub frames_skipped: u64,
    /// Warnings forwarded to the consumer.
    pub warnings_emitted: u64,
}

/// Handle to a running pump.
pub struct PumpHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<PumpStats>,
}

impl PumpHandle {
    /// Stop the pump and wait for it to wind down.
    ///
    /// When this returns, the loop has exited and the monitor has been
    /// disposed — the detection capability is released before control
    /// goes back to the caller.
    pub async fn stop(self) -> PumpStats {
        let _ = self.shutdown.send(true);
        self.join.await.unwrap_or_default()
    }
}

/// Spawn a pump that feeds `monitor` one frame per `interval`, forwarding
/// emitted warnings for `attempt_id` over `warnings`.
///
/// The monitor must already be initialized; the pump takes ownership and
/// disposes it on every exit path.
pub fn spawn_pump(
    mut monitor: ProctorMonitor,
    frames: Arc<dyn FrameSource>,
    attempt_id: String,
    interval: Duration,
    warnings: mpsc::UnboundedSender<Warning>,
) -> PumpHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        let mut stats = PumpStats::default();
        let mut ticker = tokio::time::interval(interval);
        // Skip, never queue: ticks that elapse during a slow analysis are
        // coalesced into a single next tick.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Shutdown wins over a simultaneously-ready tick.
                biased;
                _ = shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    let frame = match frames.next_frame().await {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("frame capture failed, skipping tick: {e:#}");
                            stats.frames_skipped += 1;
                            continue;
                        }
                    };

                    if let Some(warning) = monitor.analyze_frame(&frame, &attempt_id).await {
                        stats.warnings_emitted += 1;
                        if warnings.send(warning).is_err() {
                            tracing::debug!("warning consumer gone, stopping pump");
                            break;
                        }
                    }
                    stats.frames_analyzed += 1;
                }
            }
        }

        monitor.dispose();
        stats
    });

    PumpHandle { shutdown, join }
}
