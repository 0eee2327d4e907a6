use std::collections::BTreeSet;
use std::ops::Range;

use chrono::{DateTime, NaiveDateTime, NaiveTime};

// ---------------------------------------------------------------------------
// Channel – one recorder column after coercion and fill
// ---------------------------------------------------------------------------

/// A loaded channel. Every value is present: gaps were forward-filled (or
/// zero-filled at the start) by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub values: Vec<f64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// DerivedSeries – a computed channel, read-only once appended
// ---------------------------------------------------------------------------

/// A channel computed from other channels. `None` marks rows where the metric
/// is undefined (e.g. the first `n` rows of a windowed delta).
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    name: String,
    values: Vec<Option<f64>>,
}

impl DerivedSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Wrap a fully defined series.
    pub fn dense(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::new(name, values.into_iter().map(Some).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TimeAxis – display labels for each row
// ---------------------------------------------------------------------------

/// Row labels. Only ever used for display: timing math runs on the fixed
/// sample interval from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Raw `TimeMarker` text, one per row.
    Markers(Vec<String>),
    /// No marker column; rows are labelled by frame index.
    Frames(usize),
}

impl TimeAxis {
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Markers(m) => m.len(),
            TimeAxis::Frames(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display label for a row: time of day when the marker parses as a
    /// timestamp, the marker text otherwise, `F:{row}` without markers.
    pub fn label(&self, row: usize) -> String {
        match self {
            TimeAxis::Frames(_) => format!("F:{row}"),
            TimeAxis::Markers(markers) => match markers.get(row) {
                Some(raw) => marker_label(raw),
                None => format!("F:{row}"),
            },
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
];

/// Parse a `TimeMarker` cell into a time of day.
pub fn parse_marker(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.time());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.time());
        }
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()
}

fn marker_label(raw: &str) -> String {
    if let Some(t) = parse_marker(raw) {
        return t.format("%H:%M:%S%.3f").to_string();
    }
    let s = raw.trim();
    match s.split_once(' ') {
        Some((_, rest)) => rest.trim().to_string(),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// FlightLogTable – the complete loaded log
// ---------------------------------------------------------------------------

/// Column-oriented flight log. All channels (loaded and derived) share one
/// row index on a fixed-rate time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightLogTable {
    channels: Vec<Channel>,
    derived: Vec<DerivedSeries>,
    time: TimeAxis,
    /// Channels whose units were already converted by the normalizer.
    converted: BTreeSet<String>,
}

impl Default for FlightLogTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl FlightLogTable {
    /// Zero rows, zero channels: the terminal state after a failed load.
    pub fn empty() -> Self {
        Self {
            channels: Vec::new(),
            derived: Vec::new(),
            time: TimeAxis::Frames(0),
            converted: BTreeSet::new(),
        }
    }

    /// Build a table from aligned channels. Channels whose length differs from
    /// the time axis are dropped with a warning.
    pub fn new(time: TimeAxis, channels: Vec<Channel>) -> Self {
        let rows = time.len();
        let channels = channels
            .into_iter()
            .filter(|c| {
                let aligned = c.values.len() == rows;
                if !aligned {
                    log::warn!(
                        "dropping channel {}: {} rows, expected {rows}",
                        c.name,
                        c.values.len()
                    );
                }
                aligned
            })
            .collect();
        Self {
            channels,
            derived: Vec::new(),
            time,
            converted: BTreeSet::new(),
        }
    }

    /// Number of rows (frames).
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    pub fn time_label(&self, row: usize) -> String {
        self.time.label(row)
    }

    /// Loaded channels followed by derived ones, in insertion order.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| c.name.clone())
            .chain(self.derived.iter().map(|d| d.name.clone()))
            .collect()
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn derived_series(&self) -> &[DerivedSeries] {
        &self.derived
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub(crate) fn channel_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        self.channels
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.values)
    }

    pub fn derived(&self, name: &str) -> Option<&DerivedSeries> {
        self.derived.iter().find(|d| d.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.channel(name).is_some() || self.derived(name).is_some()
    }

    /// Value of any channel, loaded or derived, at `row`.
    pub fn sample(&self, name: &str, row: usize) -> Option<f64> {
        if let Some(values) = self.channel(name) {
            return values.get(row).copied();
        }
        self.derived(name)
            .and_then(|d| d.values.get(row).copied().flatten())
    }

    /// Append a derived channel. Rejected when the name is taken or the length
    /// does not match the table.
    pub fn push_derived(&mut self, series: DerivedSeries) -> bool {
        if self.has(&series.name) {
            log::warn!("derived channel {} already exists, keeping the first", series.name);
            return false;
        }
        if series.len() != self.len() {
            log::warn!(
                "derived channel {} has {} rows, table has {}",
                series.name,
                series.len(),
                self.len()
            );
            return false;
        }
        self.derived.push(series);
        true
    }

    pub fn is_converted(&self, name: &str) -> bool {
        self.converted.contains(name)
    }

    pub(crate) fn mark_converted(&mut self, name: &str) {
        self.converted.insert(name.to_string());
    }

    pub fn row(&self, index: usize) -> Option<RowView<'_>> {
        (index < self.len()).then_some(RowView { table: self, index })
    }

    /// View over `rows`, clipped to the table.
    pub fn window(&self, rows: Range<usize>) -> WindowView<'_> {
        let end = rows.end.min(self.len());
        let start = rows.start.min(end);
        WindowView {
            table: self,
            rows: start..end,
        }
    }
}

// ---------------------------------------------------------------------------
// Views handed to renderers
// ---------------------------------------------------------------------------

/// A single row of the table.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a FlightLogTable,
    index: usize,
}

impl<'a> RowView<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, channel: &str) -> Option<f64> {
        self.table.sample(channel, self.index)
    }

    pub fn time_label(&self) -> String {
        self.table.time_label(self.index)
    }
}

/// A contiguous range of rows of the table.
#[derive(Debug, Clone)]
pub struct WindowView<'a> {
    table: &'a FlightLogTable,
    rows: Range<usize>,
}

impl<'a> WindowView<'a> {
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of `channel` over the window, `None` if the channel is absent.
    pub fn values(&self, channel: &str) -> Option<Vec<Option<f64>>> {
        if !self.table.has(channel) {
            return None;
        }
        Some(
            self.rows
                .clone()
                .map(|i| self.table.sample(channel, i))
                .collect(),
        )
    }
}
