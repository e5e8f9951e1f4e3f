//! Hand tracking layer
//!
//! Landmark types, the finger-pose classifier, and the frame/landmark
//! sources that feed the gesture loop.

pub mod landmarks;
pub mod classifier;
pub mod source;

pub use classifier::{classify, FingerState};
pub use landmarks::{HandLandmarks, Landmark, Point};
pub use source::{FrameSource, JsonLinesSource, LandmarkDetector, LandmarkRecord, RecordDetector};
