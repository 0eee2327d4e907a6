use std::time::Instant;

use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FdrViewerApp {
    pub state: AppState,
}

impl FdrViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for FdrViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.state.close();
        }

        // ---- Replay timer ----
        if let Some(wait) = self.state.poll(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Bottom panel: playback controls ----
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            panels::control_bar(ui, &mut self.state);
        });

        // ---- Left side panel: readouts ----
        egui::SidePanel::left("cockpit_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::channel_plots(ui, &self.state);
        });
    }
}
