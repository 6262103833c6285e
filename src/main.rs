//! formcheck - replay a recorded pose stream and print the form report.

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};

use formcheck_lib::{
    replay::{replay, Recording},
    AnalysisSettings, Exercise, SettingsStore,
};

#[derive(Parser, Debug)]
#[command(name = "formcheck")]
#[command(about = "Score exercise form from a recorded keypoint stream")]
struct Args {
    /// Recording JSON: { "exercise": ..., "frames": [{ "t": ..., "keypoints": [...] }] }
    recording: PathBuf,

    /// Exercise to analyze (overrides the recording's own)
    #[arg(short, long)]
    exercise: Option<Exercise>,

    /// Settings file supplying the default exercise
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Write the report as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let settings = match &args.settings {
        Some(path) => SettingsStore::new(path.clone())?.analysis()?,
        None => AnalysisSettings::default(),
    };

    let recording = Recording::load(&args.recording)?;
    let exercise = args
        .exercise
        .or(recording.exercise)
        .unwrap_or(settings.default_exercise);

    log::info!(
        "replaying {} frames as {}",
        recording.frames.len(),
        exercise.display_name()
    );

    let outcome = replay(&recording, exercise)?;

    for issue in &outcome.live_issues {
        println!("{}", issue.message);
    }
    if !outcome.live_issues.is_empty() {
        println!();
    }

    let report = &outcome.report;
    println!("{} | score {}/100", report.exercise_name, report.score);
    for line in &report.feedback {
        println!("{line}");
    }
    println!();
    println!("{}", report.summary());

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("report written to {}", path.display());
    }

    Ok(())
}
