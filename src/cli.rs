// src/cli.rs

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Loops a single video clip, with an optional pause between plays.",
    long_about = "Loops a single video clip, with an optional pause between plays.\n\
                  Place video files in the ./video folder next to the executable."
)]
pub struct Cli {
    /// Run in test mode, inside a 720 x 360 window.
    #[clap(short, long, action = clap::ArgAction::SetTrue)]
    pub test: bool,

    /// The video clip to run.
    #[clap(short, long)]
    pub video: Option<String>,

    /// Minutes to pause between each loop.
    #[clap(short, long, default_value_t = 0.0, value_parser = parse_sleep_minutes)]
    pub sleep: f64,

    /// Select a video at random from the video folder.
    #[clap(short, long, action = clap::ArgAction::SetTrue)]
    pub random: bool,

    /// Folder scanned by --random. Defaults to ./video next to the executable.
    #[clap(short = 'd', long)]
    pub video_dir: Option<String>,

    /// Print the selected clip's duration and exit without playing it.
    #[clap(short, long, action = clap::ArgAction::SetTrue)]
    pub probe: bool,
}

/// Accepts any finite, non-negative number of minutes (fractions allowed).
fn parse_sleep_minutes(value: &str) -> Result<f64, String> {
    let minutes: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of minutes", value))?;
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(format!(
            "sleep must be a non-negative number of minutes, got '{}'",
            value
        ));
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from(["video_looper", "--video", "clip.mp4", "--sleep", "0.5", "--test"])
            .unwrap();
        assert_eq!(cli.video.as_deref(), Some("clip.mp4"));
        assert!((cli.sleep - 0.5).abs() < f64::EPSILON);
        assert!(cli.test);
        assert!(!cli.random);
        assert!(!cli.probe);
    }

    #[test]
    fn test_sleep_defaults_to_zero() {
        let cli = Cli::try_parse_from(["video_looper", "-r"]).unwrap();
        assert!(cli.random);
        assert_eq!(cli.sleep, 0.0);
    }

    #[test]
    fn test_rejects_negative_sleep() {
        assert!(Cli::try_parse_from(["video_looper", "--sleep", "-1"]).is_err());
        assert!(Cli::try_parse_from(["video_looper", "--sleep", "NaN"]).is_err());
        assert!(Cli::try_parse_from(["video_looper", "--sleep", "soon"]).is_err());
    }
}
