// src/selection.rs

use crate::file_utils::{find_video_files, is_video, DiscoveryError};
use crate::video_candidate::VideoCandidate;
use rand::{seq::IndexedRandom, Rng};
use std::{
    fmt, io,
    path::{Path, PathBuf},
};

/// What the command line asked to play.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionRequest {
    /// A specific file. Takes precedence over `Random`.
    Explicit(PathBuf),
    /// Any video from the video directory.
    Random,
    /// No selection method was given.
    Nothing,
}

impl SelectionRequest {
    pub fn from_flags(video: Option<PathBuf>, random: bool) -> Self {
        match (video, random) {
            (Some(path), _) => SelectionRequest::Explicit(path),
            (None, true) => SelectionRequest::Random,
            (None, false) => SelectionRequest::Nothing,
        }
    }
}

/// A target that failed validation.
#[derive(Debug)]
pub enum SelectionError {
    NotFound(PathBuf),
    NotVideo(PathBuf),
    /// The file exists but its header could not be read.
    Unreadable(PathBuf, io::Error),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NotFound(path) => {
                write!(f, "Video does not exist {}", path.display())
            }
            SelectionError::NotVideo(path) => {
                write!(f, "File is not a video file {}", path.display())
            }
            SelectionError::Unreadable(path, e) => {
                write!(f, "Could not read video file {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectionError::Unreadable(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Checks that `path` is an existing file with video content.
pub fn validate_video(path: &Path) -> Result<VideoCandidate, Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(Box::new(SelectionError::NotFound(path.to_path_buf())));
    }
    let video = is_video(path).map_err(|e| SelectionError::Unreadable(path.to_path_buf(), e))?;
    if !video {
        return Err(Box::new(SelectionError::NotVideo(path.to_path_buf())));
    }
    Ok(VideoCandidate::new(path.to_path_buf()))
}

/// Picks one candidate uniformly at random.
pub fn pick_random<'a, R>(candidates: &'a [PathBuf], rng: &mut R) -> Option<&'a PathBuf>
where
    R: Rng + ?Sized,
{
    candidates.choose(rng)
}

/// Resolves the request to exactly one validated video.
///
/// Returns `Ok(None)` when nothing was requested.
///
/// # Errors
///
/// Returns an error if the explicit or randomly picked file is missing or is
/// not a video, or if scanning `video_dir` fails or finds nothing.
pub fn select_video<R>(
    request: &SelectionRequest,
    video_dir: &Path,
    rng: &mut R,
) -> Result<Option<VideoCandidate>, Box<dyn std::error::Error>>
where
    R: Rng + ?Sized,
{
    match request {
        SelectionRequest::Explicit(path) => validate_video(path).map(Some),
        SelectionRequest::Random => {
            let video_list = find_video_files(video_dir)?;
            log::debug!(
                "Found {} video(s) in {}",
                video_list.len(),
                video_dir.display()
            );
            let picked = pick_random(&video_list, rng)
                .ok_or_else(|| DiscoveryError::NoVideos(video_dir.to_path_buf()))?;
            // The file may have changed since the scan.
            validate_video(picked).map(Some)
        }
        SelectionRequest::Nothing => Ok(None),
    }
}
