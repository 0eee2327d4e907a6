use eframe::egui::{self, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Channel plots (central panel)
// ---------------------------------------------------------------------------

const PLOT_COLUMNS: usize = 2;

/// Vertical bounds with a margin around `[min, max]`, never narrower than
/// one unit so flat signals stay visible.
pub fn y_bounds(points: &[[f64; 2]]) -> Option<(f64, f64)> {
    let (min, max) = points
        .iter()
        .map(|p| p[1])
        .filter(|y| y.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })?;
    let margin = ((max - min) * 0.2).max(0.5);
    Some((min - margin, max + margin))
}

/// Render one windowed plot per configured channel, laid out in a grid.
pub fn channel_plots(ui: &mut Ui, state: &AppState) {
    if state.snapshot.index.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a flight log to replay it  (File → Open…)");
        });
        return;
    }

    let channels = &state.config.plot_channels;
    let rows = channels.len().div_ceil(PLOT_COLUMNS).max(1);
    let spacing = ui.spacing().item_spacing;
    let cell_w = (ui.available_width() - spacing.x) / PLOT_COLUMNS as f32;
    let cell_h = (ui.available_height() / rows as f32 - spacing.y).max(60.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("channel_grid")
                .num_columns(PLOT_COLUMNS)
                .show(ui, |ui: &mut Ui| {
                    for (i, channel) in channels.iter().enumerate() {
                        channel_plot(ui, state, channel, [cell_w, cell_h]);
                        if (i + 1) % PLOT_COLUMNS == 0 {
                            ui.end_row();
                        }
                    }
                });
        });
}

fn channel_plot(ui: &mut Ui, state: &AppState, channel: &str, size: [f32; 2]) {
    let points = state
        .snapshot
        .points(channel, state.noise_filter)
        .unwrap_or(&[]);
    let window = state.config.display_window as f64;

    let mut plot = Plot::new(format!("plot_{channel}"))
        .width(size[0])
        .height(size[1])
        .include_x(0.0)
        .include_x(window)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show_x(false)
        .y_axis_label(channel);
    if let Some((lo, hi)) = y_bounds(points) {
        plot = plot.include_y(lo).include_y(hi);
    }

    plot.show(ui, |plot_ui| {
        if points.is_empty() {
            return;
        }
        let line = Line::new(PlotPoints::from(points.to_vec()))
            .name(channel)
            .color(state.colors.color_for(channel))
            .width(1.5);
        plot_ui.line(line);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bounds_add_twenty_percent_margin() {
        let (lo, hi) = y_bounds(&[[0.0, 0.0], [1.0, 10.0]]).unwrap();
        assert_abs_diff_eq!(lo, -2.0);
        assert_abs_diff_eq!(hi, 12.0);
    }

    #[test]
    fn flat_signal_gets_minimum_margin() {
        let (lo, hi) = y_bounds(&[[0.0, 3.0], [1.0, 3.0]]).unwrap();
        assert_abs_diff_eq!(lo, 2.5);
        assert_abs_diff_eq!(hi, 3.5);
        assert!(y_bounds(&[]).is_none());
    }
}
