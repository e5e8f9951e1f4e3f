//! Session wiring for the `run` command
//!
//! Each time Gesture mode is entered, a fresh landmark stream, detector and
//! input backend are opened on the gesture thread. A file input is read from
//! the top on every session; stdin continues where the last session stopped.

use crate::gesture::worker::SessionFactory;
use crate::hand::source::{JsonLinesSource, LandmarkInput, RecordDetector};
use crate::output::enigo_sink::EnigoSink;
use crate::output::sink::{ActionSink, LogSink};
use tracing::debug;

/// Opens a JSON-lines landmark stream and either the real input backend or
/// a dry-run logger.
#[derive(Debug, Clone)]
pub struct StreamSessionFactory {
    input: LandmarkInput,
    dry_run: bool,
    /// Screen size reported by the dry-run sink
    dry_run_screen: Option<(i32, i32)>,
}

impl StreamSessionFactory {
    pub fn new(input: LandmarkInput, dry_run: bool) -> Self {
        Self {
            input,
            dry_run,
            dry_run_screen: None,
        }
    }

    pub fn with_dry_run_screen(mut self, screen: Option<(i32, i32)>) -> Self {
        self.dry_run_screen = screen;
        self
    }

    pub fn input(&self) -> &LandmarkInput {
        &self.input
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl SessionFactory for StreamSessionFactory {
    type Source = JsonLinesSource;
    type Detector = RecordDetector;
    type Sink = Box<dyn ActionSink>;

    fn open_source(&self) -> crate::Result<JsonLinesSource> {
        JsonLinesSource::open_input(&self.input)
    }

    fn open_detector(&self) -> crate::Result<RecordDetector> {
        Ok(RecordDetector::new())
    }

    fn open_sink(&self) -> crate::Result<Box<dyn ActionSink>> {
        if self.dry_run {
            debug!("Dry run: actions are logged, not injected");
            return Ok(Box::new(match self.dry_run_screen {
                Some((w, h)) => LogSink::with_screen(w, h),
                None => LogSink::new(),
            }));
        }
        Ok(Box::new(EnigoSink::new()?))
    }
}
