use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::{DerivedSeries, FlightLogTable};

/// Suffix of channels holding a smoothed copy when raw values are retained.
pub const SMOOTH_SUFFIX: &str = "_Smooth";

// ---------------------------------------------------------------------------
// Centered moving average
// ---------------------------------------------------------------------------

/// Centered moving average. Output `i` averages `[i - w/2, i + w/2]` clipped
/// to the series, so the edges use a shrinking window instead of leaving gaps.
/// A window of 0 or 1 returns the input unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }
    let half = window / 2;
    let n = values.len();

    // prefix[i] = sum of values[..i]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            (prefix[hi + 1] - prefix[lo]) / (hi + 1 - lo) as f64
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Smoother
// ---------------------------------------------------------------------------

/// Whether smoothing overwrites the loaded channels or keeps them alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothMode {
    /// Rewrite each channel in place.
    #[default]
    Replace,
    /// Keep raw channels and append `<name>_Smooth` derived channels.
    Retain,
}

/// Per-channel moving-average windows.
#[derive(Debug, Clone, PartialEq)]
pub struct Smoother {
    default_window: usize,
    overrides: BTreeMap<String, usize>,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(10, BTreeMap::new())
    }
}

impl Smoother {
    pub fn new(default_window: usize, overrides: BTreeMap<String, usize>) -> Self {
        Self {
            default_window,
            overrides,
        }
    }

    pub fn window_for(&self, channel: &str) -> usize {
        self.overrides
            .get(channel)
            .copied()
            .unwrap_or(self.default_window)
    }

    /// Smooth every loaded channel. Returns the names of channels that were
    /// smoothed (window > 1).
    pub fn apply(&self, table: &mut FlightLogTable, mode: SmoothMode) -> Vec<String> {
        let names: Vec<String> = table.channels().iter().map(|c| c.name.clone()).collect();
        let mut smoothed = Vec::new();

        for name in names {
            let window = self.window_for(&name);
            if window <= 1 {
                continue;
            }
            let Some(values) = table.channel(&name) else {
                continue;
            };
            let averaged = moving_average(values, window);
            match mode {
                SmoothMode::Replace => {
                    if let Some(target) = table.channel_mut(&name) {
                        *target = averaged;
                    }
                }
                SmoothMode::Retain => {
                    let series = DerivedSeries::dense(format!("{name}{SMOOTH_SUFFIX}"), averaged);
                    if !table.push_derived(series) {
                        continue;
                    }
                }
            }
            smoothed.push(name);
        }

        log::info!("Smoothed {} channel(s) ({mode:?})", smoothed.len());
        smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Channel, TimeAxis};
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_series_is_unchanged() {
        let values = vec![7.5; 25];
        assert_eq!(moving_average(&values, 10), values);
    }

    #[test]
    fn edges_use_shrinking_window() {
        // window 3 → half 1
        let out = moving_average(&[0.0, 3.0, 6.0, 9.0], 3);
        assert_abs_diff_eq!(out[0], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[2], 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[3], 7.5, epsilon = 1e-12);
    }

    #[test]
    fn even_window_spans_half_on_each_side() {
        // window 4 → half 2, index 2 averages [0, 4]
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_abs_diff_eq!(out[2], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn window_of_one_is_identity() {
        assert_eq!(moving_average(&[1.0, 5.0], 1), vec![1.0, 5.0]);
        assert!(moving_average(&[], 10).is_empty());
    }

    fn table() -> FlightLogTable {
        FlightLogTable::new(
            TimeAxis::Frames(5),
            vec![
                Channel::new("RollAngle", vec![0.0, 10.0, 0.0, 10.0, 0.0]),
                Channel::new("YawRate", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ],
        )
    }

    #[test]
    fn replace_keeps_row_count_and_channel_set() {
        let mut overrides = BTreeMap::new();
        overrides.insert("YawRate".to_string(), 1);
        let smoother = Smoother::new(3, overrides);
        let mut t = table();
        let before = t.channel_names();

        let smoothed = smoother.apply(&mut t, SmoothMode::Replace);

        assert_eq!(smoothed, vec!["RollAngle"]);
        assert_eq!(t.channel_names(), before);
        assert_eq!(t.len(), 5);
        assert_eq!(t.channel("YawRate"), Some(&[1.0, 2.0, 3.0, 4.0, 5.0][..]));
        assert_abs_diff_eq!(t.sample("RollAngle", 1).unwrap(), 10.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn retain_keeps_raw_alongside_smoothed() {
        let smoother = Smoother::new(3, BTreeMap::new());
        let mut t = table();
        smoother.apply(&mut t, SmoothMode::Retain);

        assert_eq!(t.sample("RollAngle", 1), Some(10.0));
        assert_abs_diff_eq!(t.sample("RollAngle_Smooth", 1).unwrap(), 10.0 / 3.0, epsilon = 1e-12);
        assert!(t.has("YawRate_Smooth"));
    }
}
