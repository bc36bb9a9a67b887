// src/config.rs

use std::time::Duration;

/// Name of the directory, next to the executable, that holds the video clips.
pub const VIDEO_DIR_NAME: &str = "video";

/// Format used for the timestamp prefixed to every console line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The name of the ffprobe executable, which is platform-dependent.
#[cfg(windows)]
pub const FFPROBE_EXECUTABLE_NAME: &str = "ffprobe.exe";
#[cfg(not(windows))]
pub const FFPROBE_EXECUTABLE_NAME: &str = "ffprobe";

/// The external player driven by the looper.
pub const PLAYER_EXECUTABLE_NAME: &str = "omxplayer";
/// Used to send MPRIS commands to the running player.
pub const DBUS_SEND_EXECUTABLE_NAME: &str = "dbus-send";

/// Test mode window size in pixels.
pub const TEST_WINDOW_WIDTH: u32 = 720;
pub const TEST_WINDOW_HEIGHT: u32 = 360;

/// How long to wait for the player's D-Bus interface to come up after launch.
pub const PLAYER_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval between readiness checks while the player starts.
pub const PLAYER_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long to wait for the player to exit after asking it to quit.
pub const PLAYER_QUIT_TIMEOUT: Duration = Duration::from_secs(3);
