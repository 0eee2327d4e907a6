mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::FdrViewerApp;
use clap::Parser;
use eframe::egui;
use fdr_viewer::ViewerConfig;
use state::AppState;

/// Replay a flight data recorder CSV.
#[derive(Parser, Debug)]
#[command(name = "fdr-viewer", version, about)]
struct Args {
    /// Log to open on start-up.
    file: Option<PathBuf>,

    /// JSON viewer configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut config_error = None;
    let config = match &args.config {
        Some(path) => ViewerConfig::load(path).unwrap_or_else(|e| {
            log::error!("{e:#}");
            config_error = Some(format!("Config error, using defaults: {e:#}"));
            ViewerConfig::default()
        }),
        None => ViewerConfig::default(),
    };

    let mut state = AppState::new(config);
    if let Some(path) = &args.file {
        state.open(path);
    }
    if state.status_message.is_none() {
        state.status_message = config_error;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FDR Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(FdrViewerApp::new(state)))),
    )
}
