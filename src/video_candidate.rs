// src/video_candidate.rs

use std::path::PathBuf;

/// A file that passed content-based video classification.
/// Optionally carries the clip duration once it has been probed.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCandidate {
    /// The full path to the video file.
    pub path: PathBuf,
    /// Duration of the first video stream in seconds, if probed.
    pub duration: Option<f64>,
}

impl VideoCandidate {
    /// Creates a candidate for a path that has already been classified as video.
    pub fn new(path: PathBuf) -> Self {
        VideoCandidate {
            path,
            duration: None,
        }
    }

    /// Returns the candidate with its probed duration attached.
    pub fn with_duration(self, seconds: f64) -> Self {
        VideoCandidate {
            duration: Some(seconds),
            ..self
        }
    }
}
