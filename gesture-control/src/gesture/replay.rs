//! Offline replay of a recorded landmark stream
//!
//! Runs the same machine the live loop runs, but on the stream's own clock:
//! frame `t_ms` stamps drive the cooldowns, so a replay is deterministic.
//! Frames without a stamp are placed one nominal frame after the previous.

use super::machine::GestureMachine;
use crate::hand::classifier::{classify, FingerState};
use crate::hand::source::{FrameSource, LandmarkDetector, LandmarkRecord};
use crate::output::action::{Action, Dispatcher};
use crate::output::sink::ActionSink;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Assumed spacing of unstamped frames (about 30 fps)
pub const NOMINAL_FRAME_MS: u64 = 33;

/// One emitted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayEvent {
    /// Zero-based frame index
    pub frame: u64,
    pub t_ms: u64,
    /// Classified pose, as a digit string
    pub fingers: String,
    pub action: Action,
}

/// Result of a replay run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub frames: u64,
    /// Lines that could not be read
    pub skipped: u64,
    /// Frames with a hand
    pub hands: u64,
    pub events: Vec<ReplayEvent>,
}

/// Replay every frame of `source` through `machine`, executing emitted
/// actions on `sink`.
///
/// # Errors
/// A detection error ends the replay with that error. Unreadable lines are
/// skipped and counted.
pub fn replay<S, D, K>(
    source: &mut S,
    detector: &mut D,
    machine: &mut GestureMachine,
    dispatcher: &Dispatcher,
    sink: &mut K,
) -> crate::Result<ReplayReport>
where
    S: FrameSource<Frame = LandmarkRecord>,
    D: LandmarkDetector<Frame = LandmarkRecord>,
    K: ActionSink + ?Sized,
{
    let origin = Instant::now();
    let mut report = ReplayReport::default();
    let mut clock_ms: Option<u64> = None;

    loop {
        let record = match source.read_frame() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(e) => {
                warn!("Skipping frame: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        let t_ms = match (record.t_ms, clock_ms) {
            (Some(t), _) => t,
            (None, Some(prev)) => prev + NOMINAL_FRAME_MS,
            (None, None) => 0,
        };
        clock_ms = Some(t_ms);

        let hand = detector.detect(&record)?;
        let fingers = hand.as_ref().map(classify);
        if hand.is_some() {
            report.hands += 1;
        }

        let action = machine.step_landmarks(hand.as_ref(), origin + Duration::from_millis(t_ms));
        if action.is_some() {
            dispatcher.dispatch(action, sink)?;
            report.events.push(ReplayEvent {
                frame: report.frames,
                t_ms,
                fingers: fingers.map_or_else(|| "-".to_string(), |f: FingerState| f.to_string()),
                action,
            });
        }
        report.frames += 1;
    }

    debug!(
        "Replayed {} frames ({} with a hand), {} actions",
        report.frames,
        report.hands,
        report.events.len()
    );
    Ok(report)
}
