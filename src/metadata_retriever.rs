// src/metadata_retriever.rs

use crate::config::FFPROBE_EXECUTABLE_NAME;
use serde::Deserialize;
use std::{
    env, fmt,
    io::Error as IoError,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// Custom error type for ffprobe command execution failures.
#[derive(Debug)]
pub struct FfprobeError {
    message: String,
}

impl FfprobeError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for FfprobeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ffprobe error: {}", self.message)
    }
}

impl std::error::Error for FfprobeError {}

// Internal structs for parsing ffprobe JSON output.
#[derive(Deserialize, Debug)]
struct FfprobeOutput {
    #[serde(default)] // Handles cases where 'streams' might be missing.
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize, Debug)]
struct FfprobeStream {
    duration: Option<String>, // Duration in seconds (string format).
}

/// Formats a number of seconds as HH:MM:SS, or MM:SS below one hour.
pub fn format_duration_string(secs_float: f64) -> String {
    let secs = secs_float.max(0.0).round() as u64;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Extracts the first stream's duration from ffprobe's JSON output.
///
/// ffprobe reports the duration as a decimal string; it is parsed here
/// explicitly and anything that is not a finite, non-negative number is an error.
pub fn parse_stream_duration(json_str: &str) -> Result<f64, FfprobeError> {
    let parsed_data: FfprobeOutput = serde_json::from_str(json_str)
        .map_err(|e| FfprobeError::new(format!("Failed to parse ffprobe JSON: {}", e)))?;

    let stream = parsed_data
        .streams
        .first()
        .ok_or_else(|| FfprobeError::new("no video stream found".to_string()))?;
    let duration_str = stream
        .duration
        .as_deref()
        .ok_or_else(|| FfprobeError::new("video stream has no duration".to_string()))?;

    match duration_str.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(FfprobeError::new(format!(
            "could not parse duration '{}' as a non-negative number of seconds",
            duration_str
        ))),
    }
}

/// Locates the ffprobe executable.
///
/// `ffprobe` is searched in the following locations:
/// 1. Next to the application executable.
/// 2. In a `tools` subdirectory next to the executable.
/// 3. In `CARGO_MANIFEST_DIR/tools` (debug builds only, for development).
/// 4. In the system's PATH.
fn locate_ffprobe() -> PathBuf {
    if let Ok(current_exe_path) = env::current_exe() {
        if let Some(exe_dir) = current_exe_path.parent() {
            let paths_to_check = [
                exe_dir.join(FFPROBE_EXECUTABLE_NAME),
                exe_dir.join("tools").join(FFPROBE_EXECUTABLE_NAME),
            ];
            if let Some(found) = paths_to_check.into_iter().find(|p| p.is_file()) {
                return found;
            }
        }
    }

    if cfg!(debug_assertions) {
        if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
            let project_tools_path = PathBuf::from(manifest_dir)
                .join("tools")
                .join(FFPROBE_EXECUTABLE_NAME);
            if project_tools_path.is_file() {
                return project_tools_path;
            }
        }
    }

    PathBuf::from(FFPROBE_EXECUTABLE_NAME) // Default to PATH.
}

/// Returns the duration, in seconds, of the first video stream of `file_path`.
///
/// Runs ffprobe once; there are no retries.
///
/// # Errors
///
/// Returns an error if ffprobe cannot be run, exits unsuccessfully, or its
/// output holds no parseable video stream duration.
pub fn get_video_duration(file_path: &Path) -> Result<f64, Box<dyn std::error::Error>> {
    let ffprobe_command_path = locate_ffprobe();

    let output = Command::new(&ffprobe_command_path)
        .args([
            "-v",
            "quiet",
            "-show_streams",
            "-select_streams",
            "v:0",
            "-of",
            "json",
        ])
        .arg(file_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            IoError::new(
                e.kind(),
                format!(
                    "Failed to execute ffprobe command '{}': {}",
                    ffprobe_command_path.display(),
                    e
                ),
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Box::new(FfprobeError::new(format!(
            "ffprobe failed (status: {}): {}",
            output.status,
            stderr.trim()
        ))));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    log::debug!("ffprobe output for {}: {}", file_path.display(), json_str);
    Ok(parse_stream_duration(&json_str)?)
}
