// src/player.rs

use crate::config::{
    DBUS_SEND_EXECUTABLE_NAME, PLAYER_EXECUTABLE_NAME, PLAYER_POLL_INTERVAL, PLAYER_QUIT_TIMEOUT,
    PLAYER_STARTUP_TIMEOUT, TEST_WINDOW_HEIGHT, TEST_WINDOW_WIDTH,
};
use std::{env, fmt, fs, path::Path, process::Stdio};
use tokio::{
    process::{Child, Command},
    time::{self, Instant},
};

const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const MPRIS_PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";
const MPRIS_ROOT_INTERFACE: &str = "org.mpris.MediaPlayer2";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Error raised while launching or controlling the external player.
#[derive(Debug)]
pub struct PlayerError {
    message: String,
}

impl PlayerError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player error: {}", self.message)
    }
}

impl std::error::Error for PlayerError {}

/// How the clip is presented on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Full screen, rotated 180 degrees, stretched to fill the display.
    Normal,
    /// Small fixed window in the top-left corner, for local checks.
    Test,
}

/// Control surface of a running video player.
///
/// The looper only talks to the player through this trait, so it can be
/// driven by a fake in tests.
#[allow(async_fn_in_trait)]
pub trait Player {
    async fn play(&mut self) -> Result<(), PlayerError>;
    async fn pause(&mut self) -> Result<(), PlayerError>;
    /// Length of the loaded clip in seconds.
    async fn duration(&mut self) -> Result<f64, PlayerError>;
    /// Seeks to an absolute position in seconds.
    async fn set_position(&mut self, seconds: f64) -> Result<(), PlayerError>;
    /// Asks the player to terminate. Best effort.
    async fn quit(&mut self) -> Result<(), PlayerError>;
}

/// Command-line arguments for the player in the given display mode.
///
/// omxplayer's `--win` takes the corners `x1 y1 x2 y2`, so the test window
/// string is `0, 0, <width>, <height>`.
pub fn player_args(mode: DisplayMode) -> Vec<String> {
    let mut args = vec!["--no-osd".to_string(), "--loop".to_string()];
    match mode {
        DisplayMode::Test => {
            args.push("--win".to_string());
            args.push(format!("0, 0, {}, {}", TEST_WINDOW_WIDTH, TEST_WINDOW_HEIGHT));
        }
        DisplayMode::Normal => {
            args.extend(
                ["--orientation", "180", "--aspect-mode", "fill"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
    }
    args
}

/// Parses a `dbus-send --print-reply=literal` reply such as `   int64 16016000`.
fn parse_int64_reply(reply: &str) -> Option<i64> {
    reply.split_whitespace().last()?.parse().ok()
}

/// Session bus details omxplayer writes to `/tmp` on startup.
#[derive(Debug, Clone)]
struct BusEnv {
    address: String,
    pid: Option<String>,
}

impl BusEnv {
    /// Returns `None` while the player has not written its bus address yet.
    fn read() -> Option<Self> {
        let user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let bus_dir = Path::new("/tmp");
        let address = fs::read_to_string(bus_dir.join(format!("omxplayerdbus.{}", user)))
            .ok()?
            .trim()
            .to_string();
        if address.is_empty() {
            return None;
        }
        let pid = fs::read_to_string(bus_dir.join(format!("omxplayerdbus.{}.pid", user)))
            .ok()
            .map(|s| s.trim().to_string());
        Some(Self { address, pid })
    }
}

/// omxplayer driven through its MPRIS D-Bus interface.
pub struct OmxPlayer {
    child: Child,
    dbus_name: String,
    bus: BusEnv,
}

impl OmxPlayer {
    /// Starts omxplayer on `video_path` and waits until its D-Bus interface answers.
    ///
    /// The child is killed when the returned player (or this future, before
    /// it completes) is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the player cannot be spawned, exits during startup,
    /// or does not answer on D-Bus within the startup timeout.
    pub async fn launch(video_path: &Path, mode: DisplayMode) -> Result<Self, PlayerError> {
        let dbus_name = format!("org.mpris.MediaPlayer2.omxplayer{}", std::process::id());

        let mut command = Command::new(PLAYER_EXECUTABLE_NAME);
        command
            .args(player_args(mode))
            .arg("--dbus_name")
            .arg(&dbus_name)
            .arg(video_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);
        // Own process group: a terminal Ctrl-C reaches only us, and we quit the player.
        #[cfg(unix)]
        command.process_group(0);

        log::debug!("Launching {:?}", command);
        let mut child = command.spawn().map_err(|e| {
            PlayerError::new(format!(
                "Failed to launch '{}': {}",
                PLAYER_EXECUTABLE_NAME, e
            ))
        })?;

        let bus = wait_until_ready(&mut child, &dbus_name).await?;
        Ok(Self {
            child,
            dbus_name,
            bus,
        })
    }

    async fn send(&self, interface: &str, method: &str, extra_args: &[&str]) -> Result<String, PlayerError> {
        dbus_send(&self.bus, &self.dbus_name, interface, method, extra_args).await
    }
}

async fn wait_until_ready(child: &mut Child, dbus_name: &str) -> Result<BusEnv, PlayerError> {
    let deadline = Instant::now() + PLAYER_STARTUP_TIMEOUT;
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Err(PlayerError::new(format!(
                "'{}' exited during startup ({})",
                PLAYER_EXECUTABLE_NAME, status
            )));
        }

        if let Some(bus) = BusEnv::read() {
            let answered = dbus_send(&bus, dbus_name, PROPERTIES_INTERFACE, "Duration", &[]).await;
            if answered.is_ok() {
                return Ok(bus);
            }
        }

        if Instant::now() >= deadline {
            return Err(PlayerError::new(format!(
                "'{}' did not answer on D-Bus within {:?}",
                PLAYER_EXECUTABLE_NAME, PLAYER_STARTUP_TIMEOUT
            )));
        }
        time::sleep(PLAYER_POLL_INTERVAL).await;
    }
}

async fn dbus_send(
    bus: &BusEnv,
    dbus_name: &str,
    interface: &str,
    method: &str,
    extra_args: &[&str],
) -> Result<String, PlayerError> {
    let mut command = Command::new(DBUS_SEND_EXECUTABLE_NAME);
    command
        .args([
            "--print-reply=literal",
            "--session",
            "--reply-timeout=500",
        ])
        .arg(format!("--dest={}", dbus_name))
        .arg(MPRIS_OBJECT_PATH)
        .arg(format!("{}.{}", interface, method))
        .args(extra_args)
        .env("DBUS_SESSION_BUS_ADDRESS", &bus.address);
    if let Some(pid) = &bus.pid {
        command.env("DBUS_SESSION_BUS_PID", pid);
    }

    let output = command.stdin(Stdio::null()).output().await.map_err(|e| {
        PlayerError::new(format!(
            "Failed to execute '{}': {}",
            DBUS_SEND_EXECUTABLE_NAME, e
        ))
    })?;

    if !output.status.success() {
        return Err(PlayerError::new(format!(
            "{}.{} failed ({}): {}",
            interface,
            method,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl Player for OmxPlayer {
    async fn play(&mut self) -> Result<(), PlayerError> {
        self.send(MPRIS_PLAYER_INTERFACE, "Play", &[]).await.map(|_| ())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.send(MPRIS_PLAYER_INTERFACE, "Pause", &[]).await.map(|_| ())
    }

    async fn duration(&mut self) -> Result<f64, PlayerError> {
        let reply = self.send(PROPERTIES_INTERFACE, "Duration", &[]).await?;
        let micros = parse_int64_reply(&reply).ok_or_else(|| {
            PlayerError::new(format!("unexpected Duration reply: '{}'", reply.trim()))
        })?;
        Ok(micros as f64 / 1_000_000.0)
    }

    async fn set_position(&mut self, seconds: f64) -> Result<(), PlayerError> {
        let micros = format!("int64:{}", (seconds * 1_000_000.0).round() as i64);
        self.send(
            MPRIS_PLAYER_INTERFACE,
            "SetPosition",
            &["objpath:/not/used", micros.as_str()],
        )
        .await
        .map(|_| ())
    }

    async fn quit(&mut self) -> Result<(), PlayerError> {
        let requested = self.send(MPRIS_ROOT_INTERFACE, "Quit", &[]).await;

        if time::timeout(PLAYER_QUIT_TIMEOUT, self.child.wait()).await.is_ok() {
            return requested.map(|_| ());
        }

        log::warn!("Player did not exit after Quit, killing it");
        self.child
            .kill()
            .await
            .map_err(|e| PlayerError::new(format!("Failed to kill player: {}", e)))
    }
}
