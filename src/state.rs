use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use fdr_viewer::config::ViewerConfig;
use fdr_viewer::data::filter::SMOOTH_SUFFIX;
use fdr_viewer::data::model::{RowView, WindowView};
use fdr_viewer::data::{prepare_log, PreparedLog};
use fdr_viewer::replay::{DeadlineScheduler, FrameRenderer, PlaybackState, ReplaySession};

use crate::color::ChannelColors;

/// Channels shown as cockpit readouts, besides the plotted ones.
pub const COCKPIT_CHANNELS: [&str; 14] = [
    "GroundSpeed",
    "RollAngle",
    "PitchAngle",
    "PresentTrueHeading",
    "PlatformAzimuth",
    "VelocityZ",
    "Altitude",
    "BlendedEllipsoidHeight",
    "RollRate",
    "PitchRate",
    "YawRate",
    "RollRate_Max",
    "PitchRate_Max",
    "YawRate_Max",
];

// ---------------------------------------------------------------------------
// FrameSnapshot – what the last rendered frame looked like
// ---------------------------------------------------------------------------

/// Renderer that copies what the UI needs out of each frame, so drawing does
/// not have to touch the table.
#[derive(Debug, Default, Clone)]
pub struct FrameSnapshot {
    /// Channels to capture; smoothed copies are captured alongside.
    watch: Vec<String>,
    pub index: Option<usize>,
    pub time_label: String,
    pub values: BTreeMap<String, f64>,
    /// `[x, y]` points over the window, x counted from the window start.
    pub series: BTreeMap<String, Vec<[f64; 2]>>,
}

impl FrameSnapshot {
    pub fn new(channels: &[String]) -> Self {
        let watch = channels
            .iter()
            .flat_map(|c| [c.clone(), format!("{c}{SMOOTH_SUFFIX}")])
            .collect();
        Self {
            watch,
            ..Self::default()
        }
    }

    /// Value of a channel, preferring its smoothed copy when `smoothed`.
    pub fn value(&self, channel: &str, smoothed: bool) -> Option<f64> {
        if smoothed {
            if let Some(v) = self.values.get(&format!("{channel}{SMOOTH_SUFFIX}")) {
                return Some(*v);
            }
        }
        self.values.get(channel).copied()
    }

    pub fn points(&self, channel: &str, smoothed: bool) -> Option<&[[f64; 2]]> {
        if smoothed {
            if let Some(p) = self.series.get(&format!("{channel}{SMOOTH_SUFFIX}")) {
                return Some(p);
            }
        }
        self.series.get(channel).map(Vec::as_slice)
    }
}

impl FrameRenderer for FrameSnapshot {
    fn on_frame(&mut self, current: RowView<'_>, window: WindowView<'_>) {
        self.index = Some(current.index());
        self.time_label = current.time_label();
        self.values.clear();
        self.series.clear();
        for name in &self.watch {
            if let Some(v) = current.get(name) {
                self.values.insert(name.clone(), v);
            }
            if let Some(values) = window.values(name) {
                let points = values
                    .iter()
                    .enumerate()
                    .filter_map(|(x, y)| y.map(|y| [x as f64, y]))
                    .collect();
                self.series.insert(name.clone(), points);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// Replay of the loaded log (None until a file is opened).
    pub session: Option<ReplaySession<DeadlineScheduler>>,

    /// Latest rendered frame.
    pub snapshot: FrameSnapshot,

    /// Per-stage load diagnostics of the current log.
    pub diagnostics: Vec<String>,

    /// Show smoothed channels where available.
    pub noise_filter: bool,

    pub colors: ChannelColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            colors: ChannelColors::new(&config.plot_channels),
            config,
            session: None,
            snapshot: FrameSnapshot::default(),
            diagnostics: Vec::new(),
            noise_filter: false,
            status_message: None,
        }
    }

    /// Load and prepare a file, replacing the current session.
    pub fn open(&mut self, path: &Path) {
        let prepared = prepare_log(path, &self.config);
        self.set_log(prepared);
    }

    /// Ingest a prepared log and start a paused replay of it.
    pub fn set_log(&mut self, prepared: PreparedLog) {
        if let Some(old) = self.session.as_mut() {
            old.close();
        }
        self.diagnostics = prepared.diagnostics();
        self.status_message = match &prepared.load.error {
            Some(e) => Some(format!("Error: {e}")),
            None if prepared.table.is_empty() => Some("Log has no rows".to_string()),
            None => None,
        };

        let watch: Vec<String> = self
            .config
            .plot_channels
            .iter()
            .cloned()
            .chain(COCKPIT_CHANNELS.iter().map(|c| c.to_string()))
            .collect();
        self.snapshot = FrameSnapshot::new(&watch);

        let mut session =
            ReplaySession::new(prepared.table, &self.config, DeadlineScheduler::default());
        session.start(&mut self.snapshot);
        self.session = Some(session);
    }

    pub fn total_frames(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.driver().cursor().total_frames())
    }

    pub fn current_frame(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.driver().cursor().frame())
    }

    pub fn speed(&self) -> usize {
        self.session
            .as_ref()
            .map_or(1, |s| s.driver().cursor().speed())
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.driver().is_playing())
    }

    pub fn toggle_play(&mut self) -> Option<PlaybackState> {
        self.session.as_mut().map(|s| s.toggle_play())
    }

    pub fn seek(&mut self, frame: usize) {
        if let Some(s) = self.session.as_mut() {
            s.seek(frame, &mut self.snapshot);
        }
    }

    pub fn set_speed(&mut self, multiplier: usize) {
        if let Some(s) = self.session.as_mut() {
            s.set_speed(multiplier);
        }
    }

    /// Run a due tick. Returns when the next one is due.
    pub fn poll(&mut self, now: Instant) -> Option<Duration> {
        let session = self.session.as_mut()?;
        session.poll(now, &mut self.snapshot)
    }

    /// Tear down the replay; no tick fires afterwards.
    pub fn close(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.close();
        }
    }

    /// Readout honouring the noise filter toggle.
    pub fn readout(&self, channel: &str) -> Option<f64> {
        self.snapshot.value(channel, self.noise_filter)
    }

    /// Altitude is derived from the raw height; the filtered reading comes
    /// from the smoothed height channel.
    pub fn altitude(&self) -> Option<f64> {
        if self.noise_filter {
            if let Some(h) = self.snapshot.value("BlendedEllipsoidHeight", true) {
                return Some(h);
            }
        }
        self.snapshot.value("Altitude", false)
    }
}
