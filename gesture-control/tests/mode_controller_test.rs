//! Integration tests for the mode controller
//!
//! Triggers -> rings -> controller -> gesture thread, with a scripted
//! session factory that counts how often its resources are released.

use gesture_control::gesture::rules::Profile;
use gesture_control::gesture::worker::{SessionConfig, SessionFactory};
use gesture_control::hand::landmarks::{HandLandmarks, LANDMARK_COUNT, THUMB_TIP, WRIST};
use gesture_control::hand::source::{FrameSource, LandmarkDetector, LandmarkRecord};
use gesture_control::mode::{Mode, ModeConfig, ModeController};
use gesture_control::output::sink::{RecordingSink, ScrollDirection, SinkCall};
use gesture_control::trigger::{ModeCommand, PointerButton, PointerEvent, TriggerInputs, TriggerRing};
use gesture_control::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Upright hand with every finger curled (a fist)
fn fist() -> HandLandmarks {
    let mut triples = [[0i32; 3]; LANDMARK_COUNT];
    for (id, triple) in triples.iter_mut().enumerate() {
        let finger = id.saturating_sub(1) / 4;
        let joint = id.saturating_sub(1) % 4;
        *triple = [id as i32, 200 + finger as i32 * 20, 300 + joint as i32 * 5];
    }
    triples[WRIST] = [0, 240, 400];
    triples[THUMB_TIP] = [THUMB_TIP as i32, 180, 300];
    triples[THUMB_TIP - 1] = [(THUMB_TIP - 1) as i32, 190, 300];
    HandLandmarks::from_triples(&triples).unwrap()
}

#[derive(Default)]
struct Counters {
    sessions: AtomicUsize,
    source_released: AtomicUsize,
    detector_released: AtomicUsize,
}

/// Endless stream of fist frames, one every `frame_delay`
struct FistSource {
    record: LandmarkRecord,
    frame_delay: Duration,
    counters: Arc<Counters>,
}

impl FrameSource for FistSource {
    type Frame = LandmarkRecord;

    fn read_frame(&mut self) -> gesture_control::Result<Option<LandmarkRecord>> {
        thread::sleep(self.frame_delay);
        Ok(Some(self.record.clone()))
    }

    fn release(&mut self) {
        self.counters.source_released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Passes records through; panics on frame `panic_at` when set
struct ScriptedDetector {
    frames: usize,
    panic_at: Option<usize>,
    counters: Arc<Counters>,
}

impl LandmarkDetector for ScriptedDetector {
    type Frame = LandmarkRecord;

    fn detect(&mut self, frame: &LandmarkRecord) -> gesture_control::Result<Option<HandLandmarks>> {
        self.frames += 1;
        if Some(self.frames) == self.panic_at {
            panic!("detector crashed on frame {}", self.frames);
        }
        match &frame.hand {
            Some(triples) => HandLandmarks::from_triples(triples).map(Some),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.counters.detector_released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ScriptedFactory {
    counters: Arc<Counters>,
    sink: RecordingSink,
    panic_at: Option<usize>,
    /// Per-frame read time; defaults to 2ms
    frame_delay: Option<Duration>,
    fail_detector: AtomicBool,
}

impl SessionFactory for ScriptedFactory {
    type Source = FistSource;
    type Detector = ScriptedDetector;
    type Sink = RecordingSink;

    fn open_source(&self) -> gesture_control::Result<FistSource> {
        self.counters.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(FistSource {
            record: LandmarkRecord::with_hand(None, &fist()),
            frame_delay: self.frame_delay.unwrap_or(Duration::from_millis(2)),
            counters: Arc::clone(&self.counters),
        })
    }

    fn open_detector(&self) -> gesture_control::Result<ScriptedDetector> {
        if self.fail_detector.load(Ordering::SeqCst) {
            return Err(Error::Detection("model file missing".into()));
        }
        Ok(ScriptedDetector {
            frames: 0,
            panic_at: self.panic_at,
            counters: Arc::clone(&self.counters),
        })
    }

    fn open_sink(&self) -> gesture_control::Result<RecordingSink> {
        Ok(self.sink.clone())
    }
}

fn controller(factory: Arc<ScriptedFactory>) -> ModeController<ScriptedFactory> {
    ModeController::new(factory, SessionConfig::new(Profile::Media.rules()), &ModeConfig::default())
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn push_burst(producer: &mut gesture_control::trigger::TriggerProducer<PointerEvent>, start: Instant) {
    for i in 0..3 {
        let at = start + Duration::from_millis(50 * i);
        assert!(producer.push(PointerEvent::press(PointerButton::Middle, at)));
        assert!(producer.push(PointerEvent::release(PointerButton::Middle, at + Duration::from_millis(10))));
    }
}

#[test]
fn test_click_burst_starts_and_remote_off_stops() {
    let factory = Arc::new(ScriptedFactory::default());
    let mut ctl = controller(Arc::clone(&factory));
    let (mut clicks, click_rx) = TriggerRing::with_capacity(64).unwrap().split();
    let (mut remote, remote_rx) = TriggerRing::with_capacity(8).unwrap().split();
    let mut triggers = TriggerInputs::new().with_pointer(click_rx).with_remote(remote_rx);

    push_burst(&mut clicks, Instant::now());
    ctl.drain(&mut triggers);
    assert_eq!(ctl.mode(), Mode::Gesture);
    assert!(ctl.is_running());

    // Fists scroll down once the loop is going.
    assert!(wait_until(Duration::from_secs(5), || !factory.sink.is_empty()));
    assert_eq!(
        factory.sink.calls()[0],
        SinkCall::Scroll {
            amount: 5,
            direction: ScrollDirection::Down
        }
    );

    assert!(remote.push(ModeCommand::from_remote("Gesture Mode OFF\r\n").unwrap()));
    ctl.drain(&mut triggers);
    assert_eq!(ctl.mode(), Mode::Mouse);
    assert!(!ctl.is_running());
    assert_eq!(ctl.transitions(), 2);
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
    assert_eq!(factory.counters.detector_released.load(Ordering::SeqCst), 1);

    // No more input once stopped.
    let settled = factory.sink.len();
    thread::sleep(Duration::from_millis(200));
    assert_eq!(factory.sink.len(), settled);
}

#[test]
fn test_slow_clicks_do_not_toggle() {
    let factory = Arc::new(ScriptedFactory::default());
    let mut ctl = controller(Arc::clone(&factory));
    let (mut clicks, click_rx) = TriggerRing::with_capacity(64).unwrap().split();
    let mut triggers = TriggerInputs::new().with_pointer(click_rx);

    let start = Instant::now();
    for i in 0..5u64 {
        clicks.push(PointerEvent::press(PointerButton::Middle, start + Duration::from_millis(300 * i)));
    }
    // Other buttons never count.
    for i in 0..3u64 {
        clicks.push(PointerEvent::press(PointerButton::Left, start + Duration::from_millis(2000 + 10 * i)));
    }
    ctl.drain(&mut triggers);
    assert_eq!(ctl.mode(), Mode::Mouse);
    assert_eq!(factory.counters.sessions.load(Ordering::SeqCst), 0);
}

#[test]
fn test_remote_command_in_same_tick_has_last_word() {
    let factory = Arc::new(ScriptedFactory::default());
    let mut ctl = controller(Arc::clone(&factory));
    let (mut clicks, click_rx) = TriggerRing::with_capacity(64).unwrap().split();
    let (mut remote, remote_rx) = TriggerRing::with_capacity(8).unwrap().split();
    let mut triggers = TriggerInputs::new().with_pointer(click_rx).with_remote(remote_rx);

    push_burst(&mut clicks, Instant::now());
    remote.push(ModeCommand::Set(Mode::Mouse));
    ctl.drain(&mut triggers);

    assert_eq!(ctl.mode(), Mode::Mouse);
    assert!(!ctl.is_running());
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_repeated_on_does_not_start_second_loop() {
    let factory = Arc::new(ScriptedFactory::default());
    let mut ctl = controller(Arc::clone(&factory));

    ctl.handle_command(ModeCommand::Set(Mode::Gesture));
    ctl.handle_command(ModeCommand::Set(Mode::Gesture));
    assert_eq!(ctl.mode(), Mode::Gesture);
    assert_eq!(factory.counters.sessions.load(Ordering::SeqCst), 1);

    ctl.handle_command(ModeCommand::Set(Mode::Mouse));
    ctl.handle_command(ModeCommand::Set(Mode::Mouse));
    assert_eq!(ctl.mode(), Mode::Mouse);
    assert_eq!(ctl.transitions(), 2);
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panic_mid_frame_releases_once_and_falls_back() {
    let factory = Arc::new(ScriptedFactory {
        panic_at: Some(3),
        ..Default::default()
    });
    let mut ctl = controller(Arc::clone(&factory));

    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Gesture);
    assert!(wait_until(Duration::from_secs(5), || {
        ctl.poll();
        ctl.mode() == Mode::Mouse
    }));
    assert!(!ctl.is_running());
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
    assert_eq!(factory.counters.detector_released.load(Ordering::SeqCst), 1);

    // A new session can be started afterwards.
    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Gesture);
    assert_eq!(factory.counters.sessions.load(Ordering::SeqCst), 2);
}

#[test]
fn test_init_failure_stays_in_mouse_and_releases_source() {
    let factory = Arc::new(ScriptedFactory::default());
    factory.fail_detector.store(true, Ordering::SeqCst);
    let mut ctl = controller(Arc::clone(&factory));

    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Mouse);
    assert!(!ctl.is_running());
    assert_eq!(ctl.transitions(), 0);
    assert_eq!(factory.counters.sessions.load(Ordering::SeqCst), 1);
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
    assert_eq!(factory.counters.detector_released.load(Ordering::SeqCst), 0);

    factory.fail_detector.store(false, Ordering::SeqCst);
    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Gesture);
}

#[test]
fn test_run_until_stop_flag_shuts_everything_down() {
    let factory = Arc::new(ScriptedFactory::default());
    let mut ctl = controller(Arc::clone(&factory));
    let (mut remote, remote_rx) = TriggerRing::with_capacity(8).unwrap().split();
    let mut triggers = TriggerInputs::new().with_remote(remote_rx);
    remote.push(ModeCommand::Set(Mode::Gesture));

    let stop = Arc::new(AtomicBool::new(false));
    let stopper = {
        let stop = Arc::clone(&stop);
        let sink = factory.sink.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while sink.is_empty() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            stop.store(true, Ordering::SeqCst);
        })
    };

    ctl.run(&mut triggers, &stop).unwrap();
    stopper.join().unwrap();

    assert!(!factory.sink.is_empty());
    assert_eq!(ctl.mode(), Mode::Mouse);
    assert!(!ctl.is_running());
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 1);
    assert_eq!(factory.counters.detector_released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stuck_loop_is_detached_after_stop_timeout() {
    let factory = Arc::new(ScriptedFactory {
        frame_delay: Some(Duration::from_secs(2)),
        ..Default::default()
    });
    let config = ModeConfig {
        stop_timeout_ms: 100,
        ..Default::default()
    };
    let mut ctl = ModeController::new(
        Arc::clone(&factory),
        SessionConfig::new(Profile::Media.rules()),
        &config,
    );

    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Gesture);
    // Let the loop block inside its first frame read.
    thread::sleep(Duration::from_millis(50));

    let started = Instant::now();
    assert_eq!(ctl.set_mode(Mode::Mouse), Mode::Mouse);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(100), "returned after {:?}", waited);
    assert!(waited < Duration::from_secs(1), "returned after {:?}", waited);
    assert!(!ctl.is_running());
    assert_eq!(factory.counters.source_released.load(Ordering::SeqCst), 0);

    // The controller carries on with a fresh session.
    assert_eq!(ctl.set_mode(Mode::Gesture), Mode::Gesture);
    assert_eq!(factory.counters.sessions.load(Ordering::SeqCst), 2);
    assert_eq!(ctl.set_mode(Mode::Mouse), Mode::Mouse);

    // Detached loops still release their source once the read returns.
    assert!(wait_until(Duration::from_secs(6), || {
        factory.counters.source_released.load(Ordering::SeqCst) == 2
    }));
}

