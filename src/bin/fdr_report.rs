//! Headless analysis of a flight log: load diagnostics, extreme attitude
//! changes, peak rates and a speed/distance unit check.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fdr_viewer::data::derived::{max_and_argmax, table_unit_consistency, DISTANCE_TO_STEERPOINT};
use fdr_viewer::{prepare_log, PreparedLog, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "fdr-report", version, about = "Summarize a flight data recorder CSV")]
struct Args {
    /// Recorder CSV to analyze.
    file: PathBuf,

    /// JSON viewer configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the assumed sample rate (Hz).
    #[arg(long)]
    sample_rate: Option<f64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(hz) = args.sample_rate {
        config.sample_rate_hz = hz;
        config.validate().context("applying --sample-rate")?;
    }

    let prepared = prepare_log(&args.file, &config);
    println!("== {} ==", args.file.display());
    for line in prepared.diagnostics() {
        println!("  {line}");
    }
    if !prepared.is_playable() {
        return Ok(false);
    }

    println!();
    attitude_changes(&prepared);
    peak_rates(&prepared);
    unit_check(&prepared, config.dt());
    Ok(true)
}

/// Largest change of roll and pitch over one second, and when it happened.
fn attitude_changes(prepared: &PreparedLog) {
    let table = &prepared.table;
    for angle in ["RollAngle", "PitchAngle"] {
        let name = format!("{angle}_Delta1s");
        let Some(series) = table.derived(&name) else {
            println!("{angle}: not in log");
            continue;
        };
        let abs: Vec<Option<f64>> = series.values().iter().map(|v| v.map(f64::abs)).collect();
        match max_and_argmax(&abs) {
            Some(peak) => println!(
                "max 1 s {angle} change: {:.2} deg at {}",
                peak.value,
                table.time_label(peak.index)
            ),
            None => println!("max 1 s {angle} change: log shorter than one second"),
        }
    }
}

fn peak_rates(prepared: &PreparedLog) {
    let table = &prepared.table;
    for rate in ["RollRate", "PitchRate", "YawRate"] {
        let name = format!("{rate}_Max");
        if let Some(peak) = table.derived(&name).and_then(|s| s.values().last().copied().flatten()) {
            println!("max |{rate}|: {peak:.2} deg/s");
        }
    }
}

fn unit_check(prepared: &PreparedLog, dt: f64) {
    let table = &prepared.table;
    if !table.has(DISTANCE_TO_STEERPOINT) {
        return;
    }
    match table_unit_consistency(table, dt) {
        Some(check) => println!(
            "distance vs ground speed: {:.3} observed / {:.3} expected per s (ratio {:.2}): {}",
            check.observed_per_second, check.expected_per_second, check.ratio, check.verdict
        ),
        None => println!("distance vs ground speed: no velocity data or aircraft never moves"),
    }
}
