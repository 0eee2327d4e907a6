use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::data::filter::{SmoothMode, Smoother};
use crate::data::schema::{ChannelRole, RoleTable};
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// ViewerConfig
// ---------------------------------------------------------------------------

/// Everything tunable about loading and replaying a log. Every field has a
/// default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Assumed recorder rate. Timestamps in the log are not trusted for math.
    pub sample_rate_hz: f64,
    /// Wall-clock period of a replay tick.
    pub tick_interval_ms: u64,
    /// Rows visible in the sliding plot window.
    pub display_window: usize,
    /// Upper bound of the speed slider.
    pub max_speed: u32,
    pub smoothing: SmoothingConfig,
    /// Replace the built-in role of a channel (e.g. attitude stored normalized).
    pub role_overrides: BTreeMap<String, ChannelRole>,
    /// Channels that also get a `<name>_Rate` derived channel.
    pub rate_channels: Vec<String>,
    /// Rows averaged when smoothing the `<name>_Rate` channels.
    pub rate_window: usize,
    /// Channels drawn in the dashboard plot grid, in order.
    pub plot_channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,
    pub default_window: usize,
    pub overrides: BTreeMap<String, usize>,
    pub mode: SmoothMode,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        let overrides = [
            ("PresentMagneticHeading", 15),
            ("BlendedEllipsoidHeight", 20),
            ("RollRate", 1),
            ("PitchRate", 1),
            ("YawRate", 1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            enabled: true,
            default_window: 10,
            overrides,
            mode: SmoothMode::Retain,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let plot_channels = [
            "GroundSpeed",
            "DistanceToSteerpoint",
            "RollAngle",
            "PitchAngle",
            "PresentTrueHeading",
            "PlatformAzimuth",
            "GreatCircleSteeringError",
            "ComputedCourseDeviation",
            "VelocityZ",
            "VelocityX",
        ];
        Self {
            sample_rate_hz: 20.0,
            tick_interval_ms: 50,
            display_window: 200,
            max_speed: 500,
            smoothing: SmoothingConfig::default(),
            role_overrides: BTreeMap::new(),
            rate_channels: vec!["RollAngle".to_string(), "PitchAngle".to_string()],
            rate_window: 5,
            plot_channels: plot_channels.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading viewer config {}", path_ref.display()))?;
        let config: ViewerConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing viewer config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating viewer config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate_hz > 0.0 && self.sample_rate_hz.is_finite()) {
            return Err(ConfigError::SampleRate(self.sample_rate_hz));
        }
        if self.display_window == 0 {
            return Err(ConfigError::DisplayWindow);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        if self.max_speed == 0 {
            return Err(ConfigError::MaxSpeed);
        }
        if self.rate_window == 0 {
            return Err(ConfigError::RateWindow);
        }
        if self.smoothing.default_window == 0 {
            return Err(ConfigError::SmoothingWindow("default".to_string()));
        }
        if let Some((name, _)) = self.smoothing.overrides.iter().find(|(_, w)| **w == 0) {
            return Err(ConfigError::SmoothingWindow(name.clone()));
        }
        Ok(())
    }

    /// Fixed sample interval in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// Rows per second of recording, at least 1.
    pub fn samples_per_second(&self) -> usize {
        (self.sample_rate_hz.round() as usize).max(1)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn role_table(&self) -> RoleTable {
        RoleTable::new(self.role_overrides.clone())
    }

    pub fn smoother(&self) -> Smoother {
        Smoother::new(self.smoothing.default_window, self.smoothing.overrides.clone())
    }
}
