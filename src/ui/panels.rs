use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – cockpit readouts
// ---------------------------------------------------------------------------

fn readout_row(ui: &mut Ui, label: &str, value: Option<f64>, unit: &str) {
    ui.label(label);
    match value {
        Some(v) => ui.monospace(format!("{v:>9.2} {unit}")),
        None => ui.weak("--"),
    };
    ui.end_row();
}

/// Render the readout panel for the current frame.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Cockpit");
    ui.separator();

    if state.snapshot.index.is_none() {
        ui.label("No log loaded.");
        return;
    }

    egui::Grid::new("readouts")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            readout_row(ui, "Ground speed", state.readout("GroundSpeed"), "kts");
            readout_row(ui, "Roll", state.readout("RollAngle"), "deg");
            readout_row(ui, "Pitch", state.readout("PitchAngle"), "deg");
            readout_row(ui, "True heading", state.readout("PresentTrueHeading"), "deg");
            readout_row(ui, "Azimuth", state.readout("PlatformAzimuth"), "deg");
            readout_row(ui, "Vertical speed", state.readout("VelocityZ"), "kts");
            readout_row(ui, "Altitude", state.altitude(), "ft");
        });

    ui.add_space(6.0);
    ui.strong("Rates  (current / max)");
    egui::Grid::new("rates")
        .num_columns(3)
        .show(ui, |ui: &mut Ui| {
            for axis in ["Roll", "Pitch", "Yaw"] {
                let cur = state.readout(&format!("{axis}Rate"));
                let max = state.readout(&format!("{axis}Rate_Max"));
                ui.label(axis);
                ui.monospace(cur.map_or("--".into(), |v| format!("{v:>7.2}")));
                ui.monospace(max.map_or("--".into(), |v| format!("{v:>7.2}")));
                ui.end_row();
            }
        });

    ui.separator();
    egui::CollapsingHeader::new(RichText::new("Load report").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ScrollArea::vertical()
                .auto_shrink([false, true])
                .max_height(240.0)
                .show(ui, |ui: &mut Ui| {
                    for line in &state.diagnostics {
                        ui.small(line);
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.snapshot.index.is_some() {
            let alt = state
                .altitude()
                .map_or("--".to_string(), |a| format!("{a:.0} ft"));
            ui.monospace(format!("TIME: {}   ALT: {alt}", state.snapshot.time_label));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom bar – playback controls
// ---------------------------------------------------------------------------

/// Play/pause, noise filter, timeline and speed.
pub fn control_bar(ui: &mut Ui, state: &mut AppState) {
    let total = state.total_frames();
    ui.add_enabled_ui(total > 0, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            let label = if state.is_playing() { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                state.toggle_play();
            }

            ui.checkbox(&mut state.noise_filter, "Noise Filter");

            ui.separator();
            ui.label("Speed");
            let mut speed = state.speed();
            let max_speed = state.config.max_speed.max(1) as usize;
            if ui
                .add(egui::Slider::new(&mut speed, 1..=max_speed).suffix("x"))
                .changed()
            {
                state.set_speed(speed);
            }
        });

        let mut frame = state.current_frame();
        let last = total.saturating_sub(1);
        ui.spacing_mut().slider_width = ui.available_width() - 80.0;
        if ui
            .add(egui::Slider::new(&mut frame, 0..=last).text("frame"))
            .changed()
        {
            state.seek(frame);
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open flight log")
        .add_filter("Flight logs", &["csv", "txt"])
        .add_filter("All files", &["*"])
        .pick_file();

    if let Some(path) = file {
        log::info!("opening {}", path.display());
        state.open(&path);
    }
}
