use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Channel colours: channel name → Color32
// ---------------------------------------------------------------------------

/// One distinct colour per plotted channel.
#[derive(Debug, Clone)]
pub struct ChannelColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl Default for ChannelColors {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl ChannelColors {
    pub fn new(channels: &[String]) -> Self {
        let mapping = channels
            .iter()
            .cloned()
            .zip(generate_palette(channels.len()))
            .collect();
        Self {
            mapping,
            default_color: Color32::LIGHT_BLUE,
        }
    }

    /// Colour for a channel; smoothed copies share the raw channel's colour.
    pub fn color_for(&self, channel: &str) -> Color32 {
        let base = channel
            .strip_suffix(fdr_viewer::data::filter::SMOOTH_SUFFIX)
            .unwrap_or(channel);
        self.mapping
            .get(base)
            .copied()
            .unwrap_or(self.default_color)
    }
}
