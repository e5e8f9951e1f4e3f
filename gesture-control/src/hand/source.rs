//! Frame and landmark sources
//!
//! Camera capture and the landmark model are external. A frame source hands
//! the gesture loop one frame at a time; a detector turns a frame into at
//! most one hand. Both hold resources (camera handle, model session) that
//! must be released exactly once when a gesture session ends.
//!
//! The bundled implementation reads frames that an external detector has
//! already reduced to keypoints, one JSON record per line:
//!
//! ```text
//! {"t_ms": 0,  "hand": [[0, 240, 400], [1, 200, 300], ...]}
//! {"t_ms": 33, "hand": null}
//! ```

use super::landmarks::HandLandmarks;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Produces one frame per call.
pub trait FrameSource {
    type Frame;

    /// Read the next frame.
    ///
    /// `Ok(None)` means the source is exhausted. `Err(Error::FrameRead)` is
    /// transient: the caller pauses briefly and tries again.
    fn read_frame(&mut self) -> crate::Result<Option<Self::Frame>>;

    /// Release the underlying device. Called exactly once by [`ReleaseGuard`].
    fn release(&mut self) {}
}

/// Detects at most one hand in a frame.
pub trait LandmarkDetector {
    type Frame;

    /// `Ok(None)` means no hand is visible; `Err` is a detector failure.
    fn detect(&mut self, frame: &Self::Frame) -> crate::Result<Option<HandLandmarks>>;

    /// Release the model/session. Called exactly once by [`ReleaseGuard`].
    fn release(&mut self) {}
}

/// Anything that owns a releasable resource.
pub trait Release {
    fn release(&mut self);
}

/// Adapts a [`FrameSource`] to [`Release`].
pub struct SourceResource<S: FrameSource>(pub S);

impl<S: FrameSource> Release for SourceResource<S> {
    fn release(&mut self) {
        self.0.release();
    }
}

/// Adapts a [`LandmarkDetector`] to [`Release`].
pub struct DetectorResource<D: LandmarkDetector>(pub D);

impl<D: LandmarkDetector> Release for DetectorResource<D> {
    fn release(&mut self) {
        self.0.release();
    }
}

/// RAII guard that releases its resource on drop, including during unwind.
pub struct ReleaseGuard<R: Release> {
    resource: R,
    name: &'static str,
}

impl<R: Release> ReleaseGuard<R> {
    pub fn new(name: &'static str, resource: R) -> Self {
        Self { resource, name }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

impl<R: Release> Drop for ReleaseGuard<R> {
    fn drop(&mut self) {
        self.resource.release();
        debug!("Released {}", self.name);
    }
}

/// One recorded frame: optional timestamp plus the detected hand, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    /// Milliseconds since the start of the stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_ms: Option<u64>,
    /// `(id, x, y)` triples, or null when no hand was found
    #[serde(default)]
    pub hand: Option<Vec<[i32; 3]>>,
}

impl LandmarkRecord {
    pub fn empty(t_ms: Option<u64>) -> Self {
        Self { t_ms, hand: None }
    }

    pub fn with_hand(t_ms: Option<u64>, hand: &HandLandmarks) -> Self {
        let triples = hand
            .landmarks()
            .iter()
            .map(|lm| [lm.id as i32, lm.position.x, lm.position.y])
            .collect();
        Self {
            t_ms,
            hand: Some(triples),
        }
    }

    pub fn to_json_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Where a JSON-lines landmark stream comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandmarkInput {
    Stdin,
    File(PathBuf),
}

impl LandmarkInput {
    /// `-` selects stdin, anything else is a file path
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

/// Reads [`LandmarkRecord`]s from a line-oriented reader.
pub struct JsonLinesSource {
    reader: Box<dyn BufRead>,
    line_no: u64,
    frames_read: u64,
    label: String,
}

impl JsonLinesSource {
    pub fn from_reader(reader: impl BufRead + 'static, label: impl Into<String>) -> Self {
        Self {
            reader: Box::new(reader),
            line_no: 0,
            frames_read: 0,
            label: label.into(),
        }
    }

    /// Open a landmark file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be opened.
    pub fn open(path: &Path) -> crate::Result<Self> {
        let file = std::fs::File::open(path)?;
        info!("Opened landmark stream {:?}", path);
        Ok(Self::from_reader(BufReader::new(file), path.display().to_string()))
    }

    /// Read from stdin. The stdin buffer is process-wide, so a later
    /// session picks up exactly where an earlier one stopped.
    pub fn stdin() -> Self {
        info!("Reading landmark stream from stdin");
        Self::from_reader(std::io::stdin().lock(), "stdin")
    }

    pub fn open_input(input: &LandmarkInput) -> crate::Result<Self> {
        match input {
            LandmarkInput::Stdin => Ok(Self::stdin()),
            LandmarkInput::File(path) => Self::open(path),
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }
}

impl FrameSource for JsonLinesSource {
    type Frame = LandmarkRecord;

    fn read_frame(&mut self) -> crate::Result<Option<LandmarkRecord>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        let record = serde_json::from_str(line.trim()).map_err(|e| {
            crate::Error::FrameRead(format!("{} line {}: {}", self.label, self.line_no, e))
        })?;
        self.frames_read += 1;
        Ok(Some(record))
    }

    fn release(&mut self) {
        info!("Landmark stream {} closed after {} frames", self.label, self.frames_read);
    }
}

/// Passes through the keypoints an upstream detector already found.
#[derive(Debug, Default)]
pub struct RecordDetector {
    hands_seen: u64,
}

impl RecordDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LandmarkDetector for RecordDetector {
    type Frame = LandmarkRecord;

    fn detect(&mut self, frame: &LandmarkRecord) -> crate::Result<Option<HandLandmarks>> {
        match &frame.hand {
            None => Ok(None),
            Some(triples) => {
                let hand = HandLandmarks::from_triples(triples)
                    .map_err(|e| crate::Error::Detection(e.to_string()))?;
                self.hands_seen += 1;
                Ok(Some(hand))
            }
        }
    }

    fn release(&mut self) {
        debug!("Record detector saw {} hands", self.hands_seen);
    }
}
