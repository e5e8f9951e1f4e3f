//! Gesture loop thread
//!
//! A [`GestureWorker`] owns one run of the per-frame loop:
//!
//! 1. The thread opens the frame source, the detector and the sink itself
//!    and reports readiness (or the init error) back to [`GestureWorker::start`].
//! 2. Each iteration checks the [`CancellationToken`], reads a frame,
//!    detects, steps the [`GestureMachine`] and dispatches the action.
//! 3. Source and detector sit in [`ReleaseGuard`]s, so they are released
//!    exactly once on every exit path, panics included. Completion is
//!    reported only after the guards have dropped.

use super::cursor::{CursorConfig, CursorMapper};
use super::machine::GestureMachine;
use super::rules::{Behavior, GestureRule};
use crate::hand::source::{DetectorResource, FrameSource, LandmarkDetector, ReleaseGuard, SourceResource};
use crate::output::action::{DispatchConfig, Dispatcher};
use crate::output::sink::ActionSink;
use crate::time::FpsMeter;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Cooperative stop flag, polled once per frame
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Opens the per-session collaborators.
///
/// Everything is opened on the gesture thread, so the opened values need not
/// be `Send`; only the factory itself crosses threads.
pub trait SessionFactory: Send + Sync + 'static {
    type Source: FrameSource;
    type Detector: LandmarkDetector<Frame = <Self::Source as FrameSource>::Frame>;
    type Sink: ActionSink;

    fn open_source(&self) -> crate::Result<Self::Source>;

    fn open_detector(&self) -> crate::Result<Self::Detector>;

    fn open_sink(&self) -> crate::Result<Self::Sink>;
}

/// Settings for one gesture session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rules: Vec<GestureRule>,
    pub cursor: CursorConfig,
    pub dispatch: DispatchConfig,
    /// Pause after a failed frame read
    pub frame_retry: Duration,
    /// How long `start` waits for the thread to open its resources
    pub init_timeout: Duration,
}

impl SessionConfig {
    pub fn new(rules: Vec<GestureRule>) -> Self {
        Self {
            rules,
            cursor: CursorConfig::default(),
            dispatch: DispatchConfig::default(),
            frame_retry: Duration::from_millis(100),
            init_timeout: Duration::from_secs(5),
        }
    }

    /// Build the machine for a session. Pointer rules get a cursor mapper
    /// when a screen size is known, from config first, then from the sink.
    pub fn build_machine(&self, sink_screen: Option<(i32, i32)>) -> GestureMachine {
        let machine = GestureMachine::new(self.rules.clone());
        if !self.rules.iter().any(|r| r.behavior == Behavior::Pointer) {
            return machine;
        }
        match self.cursor.screen().or(sink_screen) {
            Some((width, height)) => {
                debug!("Pointer mapped onto {}x{}", width, height);
                machine.with_cursor(CursorMapper::new(self.cursor.clone(), width, height))
            }
            None => {
                warn!("Pointer rule active but the screen size is unknown; set cursor.screen_width/height");
                machine
            }
        }
    }
}

/// How a gesture loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Stopped through the cancellation token
    Cancelled,
    /// The frame source ran out of frames
    StreamEnded,
    /// Opening a collaborator failed
    InitFailed(String),
    /// The detector failed mid-session
    DetectionFailed(String),
    /// The loop panicked; resources were still released
    Panicked(String),
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerExit::Cancelled => f.write_str("cancelled"),
            WorkerExit::StreamEnded => f.write_str("landmark stream ended"),
            WorkerExit::InitFailed(e) => write!(f, "init failed: {}", e),
            WorkerExit::DetectionFailed(e) => write!(f, "detection failed: {}", e),
            WorkerExit::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// Handle to a running gesture loop
pub struct GestureWorker {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    done: Receiver<WorkerExit>,
    exit: Option<WorkerExit>,
}

impl GestureWorker {
    /// Spawn the loop and wait until its resources are open.
    ///
    /// # Errors
    /// Returns the init error if the source, detector or sink cannot be
    /// opened, or `Error::Session` if the thread cannot be spawned or does
    /// not report in within `init_timeout`. Nothing is left running.
    pub fn start<F: SessionFactory>(factory: Arc<F>, config: SessionConfig) -> crate::Result<Self> {
        let token = CancellationToken::new();
        let (ready_tx, ready_rx) = mpsc::channel::<crate::Result<()>>();
        let (done_tx, done_rx) = mpsc::channel::<WorkerExit>();
        let init_timeout = config.init_timeout;

        let thread_token = token.clone();
        let handle = thread::Builder::new()
            .name("gesture-loop".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_session(&*factory, &config, &thread_token, &ready_tx)
                }));
                let exit = outcome.unwrap_or_else(|payload| {
                    let msg = panic_message(payload.as_ref());
                    error!("Gesture loop panicked: {}", msg);
                    WorkerExit::Panicked(msg)
                });
                // Guards inside run_session have already released everything.
                let _ = done_tx.send(exit);
            })
            .map_err(|e| crate::Error::Session(format!("failed to spawn gesture thread: {}", e)))?;

        match ready_rx.recv_timeout(init_timeout) {
            Ok(Ok(())) => {
                info!("Gesture loop started");
                Ok(Self {
                    token,
                    handle: Some(handle),
                    done: done_rx,
                    exit: None,
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                token.cancel();
                Err(crate::Error::Session(format!(
                    "gesture loop did not initialise within {:?}",
                    init_timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let exit = done_rx.recv().unwrap_or(WorkerExit::Panicked("unknown".into()));
                let _ = handle.join();
                Err(crate::Error::Session(format!("gesture loop exited during init: {}", exit)))
            }
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Non-blocking check for a loop that ended on its own.
    pub fn try_exit(&mut self) -> Option<&WorkerExit> {
        if self.exit.is_none() {
            match self.done.try_recv() {
                Ok(exit) => self.finish(exit),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.finish(WorkerExit::Panicked("gesture thread vanished".into())),
            }
        }
        self.exit.as_ref()
    }

    /// Signal the loop and wait up to `timeout` for it to release its
    /// resources.
    ///
    /// Returns the exit reason, or `None` if the loop did not stop in time;
    /// the thread is then detached and a warning logged.
    pub fn stop(&mut self, timeout: Duration) -> Option<WorkerExit> {
        self.token.cancel();
        if let Some(exit) = self.exit.clone() {
            return Some(exit);
        }
        match self.done.recv_timeout(timeout) {
            Ok(exit) => {
                self.finish(exit.clone());
                info!("Gesture loop stopped ({})", exit);
                Some(exit)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Gesture loop did not stop within {:?}; detaching it (camera/detector may stay open)",
                    timeout
                );
                self.handle.take();
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                let exit = WorkerExit::Panicked("gesture thread vanished".into());
                self.finish(exit.clone());
                Some(exit)
            }
        }
    }

    fn finish(&mut self, exit: WorkerExit) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.exit = Some(exit);
    }
}

impl Drop for GestureWorker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

fn run_session<F: SessionFactory>(
    factory: &F,
    config: &SessionConfig,
    token: &CancellationToken,
    ready: &Sender<crate::Result<()>>,
) -> WorkerExit {
    let opened = factory.open_source().and_then(|source| {
        let source = ReleaseGuard::new("frame source", SourceResource(source));
        let detector = ReleaseGuard::new("landmark detector", DetectorResource(factory.open_detector()?));
        let sink = factory.open_sink()?;
        Ok((source, detector, sink))
    });

    let (mut source, mut detector, mut sink) = match opened {
        Ok(parts) => parts,
        Err(e) => {
            let exit = WorkerExit::InitFailed(e.to_string());
            let _ = ready.send(Err(e));
            return exit;
        }
    };
    let _ = ready.send(Ok(()));

    let mut machine = config.build_machine(sink.screen_size());
    let dispatcher = Dispatcher::new(config.dispatch.clone());
    let mut fps = FpsMeter::default();

    loop {
        if token.is_cancelled() {
            return WorkerExit::Cancelled;
        }

        let frame = match source.get_mut().0.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Landmark stream ended");
                return WorkerExit::StreamEnded;
            }
            Err(e) => {
                warn!("Frame read failed, retrying: {}", e);
                thread::sleep(config.frame_retry);
                continue;
            }
        };

        let hand = match detector.get_mut().0.detect(&frame) {
            Ok(hand) => hand,
            Err(e) => {
                error!("Landmark detection failed: {}", e);
                return WorkerExit::DetectionFailed(e.to_string());
            }
        };

        let now = Instant::now();
        let action = machine.step_landmarks(hand.as_ref(), now);
        if let Err(e) = dispatcher.dispatch(action, &mut sink) {
            warn!("Failed to execute {}: {}", action, e);
        }

        if let Some(rate) = fps.tick(now) {
            debug!("Gesture loop at {:.1} fps", rate);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
