// src/main.rs

use chrono::Local;
use clap::Parser;
use log::{error, info, LevelFilter};
use std::io::Write;
use std::path::PathBuf;
use std::process;

// Module declarations
mod cli;
mod config;
mod file_utils;
mod interrupt;
mod looper;
mod metadata_retriever;
mod player;
mod selection;
mod video_candidate;

// Crate imports for convenience
use crate::cli::Cli;
use crate::config::TIMESTAMP_FORMAT;
use crate::file_utils::default_video_dir;
use crate::interrupt::Interrupt;
use crate::looper::{run_loop, LoopExit, LoopSettings};
use crate::metadata_retriever::{format_duration_string, get_video_duration};
use crate::player::{DisplayMode, OmxPlayer};
use crate::selection::{select_video, SelectionRequest};
use crate::video_candidate::VideoCandidate;

/// Exit status after a Ctrl-C, as a shell would report it.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Routes `log` records to stdout, each line prefixed with the local time.
fn init_logger() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let timestamp = Local::now().format(TIMESTAMP_FORMAT);
            if record.level() == log::Level::Error {
                writeln!(buf, "{} - Error - {}", timestamp, record.args())
            } else {
                writeln!(buf, "{} - {}", timestamp, record.args())
            }
        })
        .init();
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[tokio::main]
async fn main() {
    let cli_args = Cli::parse();
    init_logger();

    match run_app(cli_args).await {
        Ok(Some(LoopExit::Interrupted)) => process::exit(INTERRUPTED_EXIT_CODE),
        Ok(None) => {}
        Err(err) => {
            error!("{}", err);
            info!("Exiting");
            process::exit(1);
        }
    }
}

async fn run_app(cli_args: Cli) -> Result<Option<LoopExit>, Box<dyn std::error::Error>> {
    info!("Test mode:\t{}", cli_args.test);
    info!(
        "Video clip:\t{}",
        cli_args.video.as_deref().unwrap_or("None")
    );
    info!("Sleep time:\t{} minute(s)", cli_args.sleep);
    info!("Random clip:\t{}", cli_args.random);

    let video_dir = match cli_args.video_dir.as_deref() {
        Some(dir) => expand_path(dir),
        None => default_video_dir()?,
    };
    let request = SelectionRequest::from_flags(cli_args.video.as_deref().map(expand_path), cli_args.random);

    let Some(candidate) = select_video(&request, &video_dir, &mut rand::rng())? else {
        info!("No video selected. Run with --help for usage");
        info!("Exiting");
        return Ok(None);
    };

    if cli_args.probe {
        report_duration(candidate)?;
        return Ok(None);
    }

    let settings = LoopSettings {
        video_path: candidate.path,
        sleep_minutes: cli_args.sleep,
        mode: if cli_args.test {
            DisplayMode::Test
        } else {
            DisplayMode::Normal
        },
    };

    // Registered before the player exists so no Ctrl-C can orphan it.
    let mut interrupt = Interrupt::install()?;

    // Dropping an unfinished launch kills the half-started player.
    let mut player = tokio::select! {
        launched = OmxPlayer::launch(&settings.video_path, settings.mode) => launched?,
        _ = interrupt.recv() => {
            info!("Exiting");
            return Ok(Some(LoopExit::Interrupted));
        }
    };
    info!(
        "{} minute(s) pause between each play",
        settings.sleep_minutes
    );
    let exit = run_loop(&mut player, &settings, interrupt.recv()).await?;
    Ok(Some(exit))
}

fn report_duration(candidate: VideoCandidate) -> Result<(), Box<dyn std::error::Error>> {
    let seconds = get_video_duration(&candidate.path)?;
    let candidate = candidate.with_duration(seconds);
    if let Some(duration) = candidate.duration {
        info!(
            "ffprobe Duration:\t{} seconds ({}) {}",
            duration,
            format_duration_string(duration),
            candidate.path.display()
        );
    }
    Ok(())
}
