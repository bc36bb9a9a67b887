// src/looper.rs

use crate::player::{DisplayMode, Player, PlayerError};
use log::{error, info};
use std::{future::Future, path::PathBuf, pin::Pin, time::Duration};
use tokio::time;

/// Settings for one looping session.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// The clip being played. Already validated as a video.
    pub video_path: PathBuf,
    /// Minutes to pause between plays. Zero restarts immediately.
    pub sleep_minutes: f64,
    pub mode: DisplayMode,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Interrupted,
}

/// Describes the pause between plays, in seconds below one minute.
pub fn describe_pause(sleep_minutes: f64) -> String {
    if sleep_minutes < 1.0 {
        format!("{} seconds", (60.0 * sleep_minutes) as u64)
    } else {
        format!("{} minute(s)", sleep_minutes)
    }
}

/// Converts seconds reported at runtime into a sleep duration.
fn checked_duration(seconds: f64, what: &str) -> Result<Duration, PlayerError> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| PlayerError::new(format!("invalid {}: {} seconds", what, seconds)))
}

/// Sleeps for `duration` unless `shutdown` completes first.
/// Returns true when interrupted.
async fn wait_or_shutdown<F>(duration: Duration, shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = time::sleep(duration) => false,
        _ = shutdown => true,
    }
}

/// Polls `shutdown` once without waiting.
async fn already_fired<F>(shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = std::future::ready(()) => false,
    }
}

async fn cycle<P, F>(
    player: &mut P,
    settings: &LoopSettings,
    mut shutdown: Pin<&mut F>,
) -> Result<LoopExit, PlayerError>
where
    P: Player,
    F: Future<Output = ()>,
{
    let mut play_message = format!("Playing {}", settings.video_path.display());
    if settings.mode == DisplayMode::Test {
        play_message.push_str(" in test mode");
    }

    loop {
        // An interrupt queued while the player started or during the last round.
        if already_fired(shutdown.as_mut()).await {
            return Ok(LoopExit::Interrupted);
        }

        player.pause().await?;
        info!("{}", play_message);
        player.play().await?;

        let clip = checked_duration(player.duration().await?, "clip duration")?;
        if wait_or_shutdown(clip, shutdown.as_mut()).await {
            return Ok(LoopExit::Interrupted);
        }

        player.pause().await?;
        player.set_position(0.0).await?;

        if settings.sleep_minutes > 0.0 {
            info!(
                "Sleeping {} before starting again",
                describe_pause(settings.sleep_minutes)
            );
            let pause = checked_duration(60.0 * settings.sleep_minutes, "pause length")?;
            if wait_or_shutdown(pause, shutdown.as_mut()).await {
                return Ok(LoopExit::Interrupted);
            }
        }
    }
}

/// Plays the loaded clip over and over until `shutdown` completes.
///
/// Each round pauses, plays, waits for the reported clip duration, pauses,
/// rewinds to 0.0 and then sleeps for the configured pause. `shutdown` is
/// checked at the start of each round and observed during both waits. The player is asked to quit on every way out
/// of the loop, including player errors, which are then returned unchanged.
pub async fn run_loop<P, F>(
    player: &mut P,
    settings: &LoopSettings,
    shutdown: F,
) -> Result<LoopExit, PlayerError>
where
    P: Player,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let outcome = cycle(player, settings, shutdown).await;

    if outcome.is_ok() {
        info!("Exiting");
    }
    if let Err(e) = player.quit().await {
        error!("Failed to stop the player cleanly: {}", e);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Play,
        Pause,
        Duration,
        SetPosition(f64),
        Quit,
    }

    /// Records every call together with the (paused) tokio clock.
    struct FakePlayer {
        clip_seconds: f64,
        started: Instant,
        calls: Vec<(Call, Duration)>,
        fail_set_position: bool,
    }

    impl FakePlayer {
        fn new(clip_seconds: f64) -> Self {
            FakePlayer {
                clip_seconds,
                started: Instant::now(),
                calls: Vec::new(),
                fail_set_position: false,
            }
        }

        fn record(&mut self, call: Call) {
            self.calls.push((call, self.started.elapsed()));
        }

        fn call_names(&self) -> Vec<Call> {
            self.calls.iter().map(|(c, _)| c.clone()).collect()
        }

        fn time_of(&self, call: &Call, nth: usize) -> Duration {
            self.calls
                .iter()
                .filter(|(c, _)| c == call)
                .nth(nth)
                .map(|(_, t)| *t)
                .unwrap()
        }
    }

    impl Player for FakePlayer {
        async fn play(&mut self) -> Result<(), PlayerError> {
            self.record(Call::Play);
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), PlayerError> {
            self.record(Call::Pause);
            Ok(())
        }

        async fn duration(&mut self) -> Result<f64, PlayerError> {
            self.record(Call::Duration);
            Ok(self.clip_seconds)
        }

        async fn set_position(&mut self, seconds: f64) -> Result<(), PlayerError> {
            self.record(Call::SetPosition(seconds));
            if self.fail_set_position {
                return Err(PlayerError::new("seek rejected".to_string()));
            }
            Ok(())
        }

        async fn quit(&mut self) -> Result<(), PlayerError> {
            self.record(Call::Quit);
            Ok(())
        }
    }

    fn settings(sleep_minutes: f64) -> LoopSettings {
        LoopSettings {
            video_path: PathBuf::from("clip.mp4"),
            sleep_minutes,
            mode: DisplayMode::Test,
        }
    }

    /// The paused clock lands on timer ticks, so allow a few milliseconds.
    fn assert_near(actual: Duration, secs: u64) {
        let expected = Duration::from_secs(secs);
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(10),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    fn interrupt_after(secs: u64) -> impl Future<Output = ()> {
        time::sleep(Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_cycle_with_pause() {
        let mut player = FakePlayer::new(16.0);

        // Interrupted during the second clip: 16s play + 30s pause + 4s.
        let exit = run_loop(&mut player, &settings(0.5), interrupt_after(50))
            .await
            .unwrap();
        assert_eq!(exit, LoopExit::Interrupted);

        assert_eq!(
            player.call_names(),
            vec![
                Call::Pause,
                Call::Play,
                Call::Duration,
                Call::Pause,
                Call::SetPosition(0.0),
                Call::Pause,
                Call::Play,
                Call::Duration,
                Call::Quit,
            ]
        );
        assert_near(player.time_of(&Call::Play, 0), 0);
        assert_near(player.time_of(&Call::Pause, 1), 16);
        assert_near(player.time_of(&Call::Play, 1), 46);
        assert_near(player.time_of(&Call::Quit, 0), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_pause_restarts_immediately() {
        let mut player = FakePlayer::new(16.0);

        run_loop(&mut player, &settings(0.0), interrupt_after(40))
            .await
            .unwrap();

        let rewind = player.time_of(&Call::SetPosition(0.0), 0);
        assert_near(rewind, 16);
        assert_eq!(player.time_of(&Call::Play, 1), rewind);
        assert_near(player.time_of(&Call::Play, 2), 32);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_clip_quits_once() {
        let mut player = FakePlayer::new(16.0);
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(5)).await;
            let _ = tx.send(());
        });

        let exit = run_loop(&mut player, &settings(0.5), async move {
            let _ = rx.await;
        })
        .await
        .unwrap();

        assert_eq!(exit, LoopExit::Interrupted);
        assert_eq!(
            player.call_names(),
            vec![Call::Pause, Call::Play, Call::Duration, Call::Quit]
        );
        assert_near(player.time_of(&Call::Quit, 0), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_pause_quits_once() {
        let mut player = FakePlayer::new(16.0);

        run_loop(&mut player, &settings(2.0), interrupt_after(60))
            .await
            .unwrap();

        let names = player.call_names();
        assert_eq!(names.last(), Some(&Call::Quit));
        assert_eq!(names.iter().filter(|c| **c == Call::Quit).count(), 1);
        assert_eq!(names.iter().filter(|c| **c == Call::Play).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_error_still_quits() {
        let mut player = FakePlayer::new(16.0);
        player.fail_set_position = true;

        let err = run_loop(&mut player, &settings(0.0), std::future::pending::<()>())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("seek rejected"));
        assert_eq!(player.call_names().last(), Some(&Call::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_clip_duration_is_an_error() {
        let mut player = FakePlayer::new(f64::NAN);

        let err = run_loop(&mut player, &settings(0.0), std::future::pending::<()>())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("clip duration"));
        assert_eq!(player.call_names().last(), Some(&Call::Quit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_before_first_round_quits_once() {
        let mut player = FakePlayer::new(16.0);

        // Ctrl-C arrived while the player was still starting.
        let exit = run_loop(&mut player, &settings(0.5), std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(exit, LoopExit::Interrupted);
        assert_eq!(player.call_names(), vec![Call::Quit]);
    }

    #[test]
    fn test_describe_pause() {
        assert_eq!(describe_pause(0.5), "30 seconds");
        assert_eq!(describe_pause(0.25), "15 seconds");
        assert_eq!(describe_pause(2.0), "2 minute(s)");
        assert_eq!(describe_pause(1.5), "1.5 minute(s)");
    }
}
