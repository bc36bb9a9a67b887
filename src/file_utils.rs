// src/file_utils.rs

use crate::config::VIDEO_DIR_NAME;
use std::{
    env, fmt,
    io::{Error as IoError, ErrorKind as IoErrorKind},
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Errors that end a directory scan. All of them are fatal for the invocation.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The directory to scan does not exist (or is not a directory).
    MissingDirectory(PathBuf),
    /// The directory exists but contains no file with video content.
    NoVideos(PathBuf),
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::MissingDirectory(dir) => write!(
                f,
                "Video directory does not exist {}. Create it and place video files in it",
                dir.display()
            ),
            DiscoveryError::NoVideos(dir) => {
                write!(f, "No video files found in {}", dir.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Returns the default video directory: a `video` folder next to the executable.
///
/// # Errors
///
/// Returns an error if the path of the running executable cannot be determined.
pub fn default_video_dir() -> Result<PathBuf, IoError> {
    let exe_path = env::current_exe()?;
    let exe_dir = exe_path.parent().ok_or_else(|| {
        IoError::new(
            IoErrorKind::NotFound,
            format!("Executable has no parent directory: {}", exe_path.display()),
        )
    })?;
    Ok(exe_dir.join(VIDEO_DIR_NAME))
}

/// Reports whether the file at `file_path` holds video content.
///
/// The decision is made from the file's magic bytes only; the name and
/// extension are never consulted, so renamed or extensionless clips are
/// still recognized.
///
/// # Errors
///
/// Returns an error if the file header cannot be read.
pub fn is_video(file_path: &Path) -> Result<bool, IoError> {
    Ok(infer::get_from_path(file_path)?
        .map(|kind| kind.matcher_type() == infer::MatcherType::Video)
        .unwrap_or(false))
}

/// Recursively scans `folder_path` and returns every file with video content.
/// The order of the returned paths follows the directory walk and is not stable.
///
/// # Errors
///
/// * [`DiscoveryError::MissingDirectory`] if `folder_path` is not a directory.
/// * [`DiscoveryError::NoVideos`] if the scan finds no video.
///
/// Subdirectories and files that cannot be read are logged and skipped.
pub fn find_video_files(folder_path: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !folder_path.is_dir() {
        return Err(DiscoveryError::MissingDirectory(folder_path.to_path_buf()));
    }

    let mut video_files = Vec::new();

    // Unreadable entries (e.g. a locked lost+found) are skipped, not fatal.
    let entries = WalkDir::new(folder_path)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry_result| match entry_result {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry while scanning: {}", e);
                None
            }
        });

    for entry in entries {
        let path = entry.path();

        // is_file follows symlinks, so linked clips are picked up too.
        if !path.is_file() {
            continue;
        }
        match is_video(path) {
            Ok(true) => video_files.push(path.to_path_buf()),
            Ok(false) => {}
            Err(e) => log::warn!("Skipping unreadable file {}: {}", path.display(), e),
        }
    }

    if video_files.is_empty() {
        return Err(DiscoveryError::NoVideos(folder_path.to_path_buf()));
    }
    Ok(video_files)
}

/// Minimal MP4 header (`ftyp` box with the `isom` brand), shared by tests.
#[cfg(test)]
pub(crate) const MP4_HEADER: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
    0x00, b'i', b's', b'o', b'm', b'i', b's', b'o', b'2',
];
