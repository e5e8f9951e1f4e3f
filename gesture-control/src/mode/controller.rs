//! Mode Controller
//!
//! Owns the current [`Mode`] and, while in Gesture mode, the running
//! [`GestureWorker`]. Triggers only express intent; this is the single
//! place that starts and stops the gesture loop.
//!
//! ```text
//!            click burst / "Gesture Mode ON"
//!   ┌───────┐ ───────────────────────────▶ ┌─────────┐
//!   │ Mouse │                              │ Gesture │
//!   └───────┘ ◀─────────────────────────── └─────────┘
//!      ▲     click burst / "Gesture Mode OFF"   │
//!      └──────── loop ended / init failed ──────┘
//! ```

use super::{Mode, ModeConfig};
use crate::gesture::worker::{GestureWorker, SessionConfig, SessionFactory};
use crate::trigger::click_burst::ClickBurstDetector;
use crate::trigger::types::{ModeCommand, PointerEvent};
use crate::trigger::TriggerInputs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Triggers drained per source per tick
const DRAIN_BATCH: usize = 64;

pub struct ModeController<F: SessionFactory> {
    mode: Mode,
    factory: Arc<F>,
    session: SessionConfig,
    worker: Option<GestureWorker>,
    clicks: ClickBurstDetector,
    stop_timeout: Duration,
    poll_interval: Duration,
    transitions: u64,
}

impl<F: SessionFactory> ModeController<F> {
    /// Create a controller in Mouse mode. `session.init_timeout` is taken
    /// from `config`.
    pub fn new(factory: Arc<F>, mut session: SessionConfig, config: &ModeConfig) -> Self {
        session.init_timeout = config.init_timeout();
        Self {
            mode: Mode::Mouse,
            factory,
            session,
            worker: None,
            clicks: ClickBurstDetector::new(config.trigger_button, config.click_threshold(), config.click_count),
            stop_timeout: config.stop_timeout(),
            poll_interval: config.poll_interval(),
            transitions: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Completed Mouse <-> Gesture transitions
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Feed a pointer event to the click-burst counter; a completed burst
    /// toggles the mode. Returns whether it toggled.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        if !self.clicks.observe(event) {
            return false;
        }
        info!("{} click burst", event.button);
        self.handle_command(ModeCommand::Toggle);
        true
    }

    pub fn handle_command(&mut self, command: ModeCommand) {
        debug!("Mode command: {}", command);
        match command {
            ModeCommand::Toggle => {
                self.toggle();
            }
            ModeCommand::Set(mode) => {
                self.set_mode(mode);
            }
        }
    }

    pub fn toggle(&mut self) -> Mode {
        self.set_mode(self.mode.toggled())
    }

    /// Move to `target`. Returns the mode actually reached: entering
    /// Gesture mode can fail, leaving the controller in Mouse mode.
    pub fn set_mode(&mut self, target: Mode) -> Mode {
        match target {
            Mode::Gesture => self.start_gesture(),
            Mode::Mouse => self.stop_gesture(),
        }
        self.mode
    }

    fn start_gesture(&mut self) {
        // A loop that already ended must not swallow this request.
        self.poll();
        if self.worker.is_some() {
            warn!("Gesture loop already running; ignoring start request");
            return;
        }
        match GestureWorker::start(Arc::clone(&self.factory), self.session.clone()) {
            Ok(worker) => {
                self.worker = Some(worker);
                self.mode = Mode::Gesture;
                self.transitions += 1;
                info!("Mode: gesture");
            }
            Err(e) => {
                error!("Could not enter gesture mode: {}", e);
                self.mode = Mode::Mouse;
            }
        }
    }

    fn stop_gesture(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            if self.mode == Mode::Mouse {
                debug!("Already in mouse mode");
            }
            self.mode = Mode::Mouse;
            return;
        };
        // A timeout is logged by the worker; the controller carries on.
        worker.stop(self.stop_timeout);
        self.mode = Mode::Mouse;
        self.transitions += 1;
        info!("Mode: mouse");
    }

    /// Notice a gesture loop that ended on its own and fall back to Mouse.
    pub fn poll(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        if let Some(exit) = worker.try_exit() {
            warn!("Gesture loop ended ({}); back to mouse mode", exit);
            self.worker = None;
            self.mode = Mode::Mouse;
            self.transitions += 1;
        }
    }

    /// Apply everything queued by the triggers. Pointer events are applied
    /// before remote commands, so a remote command queued in the same tick
    /// has the last word.
    pub fn drain(&mut self, triggers: &mut TriggerInputs) {
        if let Some(pointer) = triggers.pointer.as_mut() {
            for slot in pointer.pop_batch(DRAIN_BATCH) {
                trace!("Pointer trigger #{}: {:?}", slot.sequence, slot.item);
                self.handle_pointer(&slot.item);
            }
        }
        if let Some(remote) = triggers.remote.as_mut() {
            for slot in remote.pop_batch(DRAIN_BATCH) {
                trace!("Remote trigger #{}: {}", slot.sequence, slot.item);
                self.handle_command(slot.item);
            }
        }
    }

    /// Drain triggers every poll interval until `stop` is set, then shut
    /// down.
    ///
    /// # Errors
    /// Returns the listener error if the pointer listener dies; the gesture
    /// loop is stopped first.
    pub fn run(&mut self, triggers: &mut TriggerInputs, stop: &AtomicBool) -> crate::Result<()> {
        info!("Mode controller running in {} mode", self.mode);
        let result = loop {
            if stop.load(Ordering::SeqCst) {
                break Ok(());
            }
            if let Err(e) = triggers.check() {
                break Err(e);
            }
            self.drain(triggers);
            self.poll();
            std::thread::sleep(self.poll_interval);
        };
        self.shutdown();
        triggers.shutdown();
        triggers.log_stats();
        result
    }

    /// Stop any running gesture loop.
    pub fn shutdown(&mut self) {
        if self.worker.is_some() {
            info!("Shutting down gesture loop");
            self.stop_gesture();
        }
    }
}

impl<F: SessionFactory> Drop for ModeController<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::rules::Profile;
    use crate::hand::source::{JsonLinesSource, RecordDetector};
    use crate::output::sink::RecordingSink;
    use crate::trigger::types::PointerButton;
    use crate::trigger::TriggerRing;
    use std::io::Cursor;
    use std::time::Instant;

    /// Never produces a frame; every read is a transient failure.
    struct IdleSource;

    impl crate::hand::source::FrameSource for IdleSource {
        type Frame = crate::hand::source::LandmarkRecord;

        fn read_frame(&mut self) -> crate::Result<Option<Self::Frame>> {
            Err(crate::Error::FrameRead("no frame yet".into()))
        }
    }

    struct IdleFactory {
        fail: bool,
    }

    impl SessionFactory for IdleFactory {
        type Source = IdleSource;
        type Detector = RecordDetector;
        type Sink = RecordingSink;

        fn open_source(&self) -> crate::Result<IdleSource> {
            if self.fail {
                Err(crate::Error::FrameRead("camera busy".into()))
            } else {
                Ok(IdleSource)
            }
        }

        fn open_detector(&self) -> crate::Result<RecordDetector> {
            Ok(RecordDetector::new())
        }

        fn open_sink(&self) -> crate::Result<RecordingSink> {
            Ok(RecordingSink::new())
        }
    }

    struct EmptyStreamFactory;

    impl SessionFactory for EmptyStreamFactory {
        type Source = JsonLinesSource;
        type Detector = RecordDetector;
        type Sink = RecordingSink;

        fn open_source(&self) -> crate::Result<JsonLinesSource> {
            Ok(JsonLinesSource::from_reader(Cursor::new(Vec::new()), "empty"))
        }

        fn open_detector(&self) -> crate::Result<RecordDetector> {
            Ok(RecordDetector::new())
        }

        fn open_sink(&self) -> crate::Result<RecordingSink> {
            Ok(RecordingSink::new())
        }
    }

    fn session() -> SessionConfig {
        let mut session = SessionConfig::new(Profile::Media.rules());
        session.frame_retry = Duration::from_millis(5);
        session
    }

    fn controller(fail: bool) -> ModeController<IdleFactory> {
        let config = ModeConfig {
            click_threshold_ms: 150,
            stop_timeout_ms: 1000,
            ..Default::default()
        };
        ModeController::new(Arc::new(IdleFactory { fail }), session(), &config)
    }

    #[test]
    fn test_set_mode_starts_and_stops_loop() {
        let mut c = controller(false);
        assert_eq!(c.set_mode(Mode::Gesture), Mode::Gesture);
        assert!(c.is_running());
        assert_eq!(c.set_mode(Mode::Mouse), Mode::Mouse);
        assert!(!c.is_running());
        assert_eq!(c.transitions(), 2);
    }

    #[test]
    fn test_second_start_is_a_noop() {
        let mut c = controller(false);
        c.set_mode(Mode::Gesture);
        assert_eq!(c.set_mode(Mode::Gesture), Mode::Gesture);
        assert_eq!(c.transitions(), 1);
        c.shutdown();
    }

    #[test]
    fn test_init_failure_stays_in_mouse() {
        let mut c = controller(true);
        assert_eq!(c.set_mode(Mode::Gesture), Mode::Mouse);
        assert!(!c.is_running());
        assert_eq!(c.transitions(), 0);
    }

    #[test]
    fn test_click_burst_toggles_once() {
        let mut c = controller(false);
        let start = Instant::now();
        let toggles: Vec<bool> = [0u64, 100, 200, 300]
            .iter()
            .map(|ms| c.handle_pointer(&PointerEvent::press(PointerButton::Middle, start + Duration::from_millis(*ms))))
            .collect();
        assert_eq!(toggles, vec![false, false, true, false]);
        assert_eq!(c.mode(), Mode::Gesture);
        c.shutdown();
        assert_eq!(c.mode(), Mode::Mouse);
    }

    #[test]
    fn test_loop_ending_on_its_own_returns_to_mouse() {
        let mut c = ModeController::new(Arc::new(EmptyStreamFactory), session(), &ModeConfig::default());
        assert_eq!(c.set_mode(Mode::Gesture), Mode::Gesture);
        for _ in 0..200 {
            c.poll();
            if c.mode() == Mode::Mouse {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(c.mode(), Mode::Mouse);
        assert!(!c.is_running());
    }

    #[test]
    fn test_start_after_unnoticed_loop_end_is_not_lost() {
        let mut c = ModeController::new(Arc::new(EmptyStreamFactory), session(), &ModeConfig::default());
        assert_eq!(c.set_mode(Mode::Gesture), Mode::Gesture);
        // The empty stream ends right away; nobody has polled yet.
        std::thread::sleep(Duration::from_millis(200));

        c.handle_command(ModeCommand::Set(Mode::Gesture));
        assert_eq!(c.mode(), Mode::Gesture);
        assert!(c.is_running());
        // Start, noticed end, second start.
        assert_eq!(c.transitions(), 3);
    }

    #[test]
    fn test_toggle_command_flips_mode() {
        let mut c = controller(false);
        c.handle_command(ModeCommand::Toggle);
        assert_eq!(c.mode(), Mode::Gesture);
        c.handle_command(ModeCommand::Toggle);
        assert_eq!(c.mode(), Mode::Mouse);
        assert_eq!(c.transitions(), 2);
    }

    #[test]
    fn test_drain_applies_remote_after_pointer() {
        let mut c = controller(false);
        let (mut pointer_tx, pointer_rx) = TriggerRing::with_capacity(16).unwrap().split();
        let (mut remote_tx, remote_rx) = TriggerRing::with_capacity(16).unwrap().split();
        let mut triggers = TriggerInputs::new().with_pointer(pointer_rx).with_remote(remote_rx);

        let start = Instant::now();
        for ms in [0u64, 50, 100] {
            pointer_tx.push(PointerEvent::press(PointerButton::Middle, start + Duration::from_millis(ms)));
        }
        remote_tx.push(ModeCommand::Set(Mode::Mouse));

        c.drain(&mut triggers);
        // The burst turned gesture on, the remote command turned it off.
        assert_eq!(c.mode(), Mode::Mouse);
        assert_eq!(c.transitions(), 2);
    }

    #[test]
    fn test_run_exits_on_stop_flag() {
        let mut c = controller(false);
        c.set_mode(Mode::Gesture);
        let stop = AtomicBool::new(true);
        let mut triggers = TriggerInputs::new();
        assert!(c.run(&mut triggers, &stop).is_ok());
        assert_eq!(c.mode(), Mode::Mouse);
        assert!(!c.is_running());
    }
}
