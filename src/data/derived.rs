use std::fmt;

use super::filter::moving_average;
use super::model::{DerivedSeries, FlightLogTable};
use super::normalize::knots_to_feet_per_second;
use crate::error::MissingChannel;

// ---------------------------------------------------------------------------
// Pure metric functions
// ---------------------------------------------------------------------------

/// Horizontal speed magnitude.
pub fn ground_speed(vx: f64, vy: f64) -> f64 {
    vx.hypot(vy)
}

pub fn ground_speed_series(vx: &[f64], vy: &[f64]) -> Vec<f64> {
    vx.iter().zip(vy).map(|(&x, &y)| ground_speed(x, y)).collect()
}

/// Cumulative Riemann sum of `velocity * dt`, starting from position 0.
/// Any error in `dt` accumulates as drift.
pub fn integrate_position(velocity: &[f64], dt: f64) -> Vec<f64> {
    velocity
        .iter()
        .scan(0.0, |pos, v| {
            *pos += v * dt;
            Some(*pos)
        })
        .collect()
}

/// `|s[i] - s[i - n]|`, undefined for the first `n` rows. With `n` equal to
/// the sample rate this is the change over one second.
pub fn delta_over_window(series: &[f64], n: usize) -> Vec<Option<f64>> {
    (0..series.len())
        .map(|i| (i >= n).then(|| (series[i] - series[i - n]).abs()))
        .collect()
}

/// Largest absolute value seen so far, including the current row.
pub fn running_max_abs(series: &[f64]) -> Vec<f64> {
    series
        .iter()
        .scan(0.0_f64, |max, v| {
            *max = max.max(v.abs());
            Some(*max)
        })
        .collect()
}

/// First difference divided by `dt`, then smoothed with a centered window.
/// Row 0 has no predecessor and is undefined.
pub fn rate_of_change(series: &[f64], dt: f64, window: usize) -> Vec<Option<f64>> {
    if series.is_empty() {
        return Vec::new();
    }
    let diffs: Vec<f64> = series.windows(2).map(|w| (w[1] - w[0]) / dt).collect();
    std::iter::once(None)
        .chain(moving_average(&diffs, window).into_iter().map(Some))
        .collect()
}

pub fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// A maximum and the row it occurs at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub value: f64,
    pub index: usize,
}

/// Largest defined value and its row (first occurrence on ties). `None` when
/// nothing in the series is defined.
pub fn max_and_argmax(series: &[Option<f64>]) -> Option<Peak> {
    series
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| !x.is_nan()).map(|x| Peak { value: x, index: i }))
        .fold(None, |best: Option<Peak>, p| match best {
            Some(b) if b.value >= p.value => Some(b),
            _ => Some(p),
        })
}

// ---------------------------------------------------------------------------
// Unit consistency check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitVerdict {
    /// Speed and distance agree.
    Consistent,
    /// Off by roughly a factor of two (knots vs. feet or similar).
    ScaleMismatch,
    Unexplained,
}

impl fmt::Display for UnitVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitVerdict::Consistent => "speed and distance units agree",
            UnitVerdict::ScaleMismatch => "units disagree by a constant scale (knots/feet?)",
            UnitVerdict::Unexplained => "no simple relation between speed and distance units",
        };
        f.write_str(s)
    }
}

/// Observed distance change compared with what ground speed predicts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCheck {
    /// Mean distance change per second from the distance channel.
    pub observed_per_second: f64,
    /// Mean distance per second predicted from ground speed.
    pub expected_per_second: f64,
    pub ratio: f64,
    pub verdict: UnitVerdict,
}

/// Compare `|Δdistance|` against `ground_speed * dt`. `None` when there are
/// fewer than two rows or the aircraft never moves.
pub fn unit_consistency(distance: &[f64], ground_speed: &[f64], dt: f64) -> Option<UnitCheck> {
    if distance.len() < 2 || ground_speed.is_empty() {
        return None;
    }
    let observed = distance.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>()
        / (distance.len() - 1) as f64;
    let expected = ground_speed.iter().map(|v| v * dt).sum::<f64>() / ground_speed.len() as f64;
    if expected == 0.0 {
        return None;
    }
    let ratio = observed / expected;
    let verdict = if (0.9..1.1).contains(&ratio) {
        UnitVerdict::Consistent
    } else if (0.4..0.6).contains(&ratio) {
        UnitVerdict::ScaleMismatch
    } else {
        UnitVerdict::Unexplained
    };
    Some(UnitCheck {
        observed_per_second: observed / dt,
        expected_per_second: expected / dt,
        ratio,
        verdict,
    })
}

/// Velocity channel in recorder units (ft/s), undoing the knot conversion if
/// the normalizer already ran on it.
fn feet_per_second(table: &FlightLogTable, name: &str) -> Option<Vec<f64>> {
    let values = table.channel(name)?;
    if table.is_converted(name) {
        Some(values.iter().map(|&k| knots_to_feet_per_second(k)).collect())
    } else {
        Some(values.to_vec())
    }
}

/// [`unit_consistency`] of `DistanceToSteerpoint` against ground speed
/// recomputed from the raw velocities. `None` when an input is missing.
pub fn table_unit_consistency(table: &FlightLogTable, dt: f64) -> Option<UnitCheck> {
    let distance = table.channel(DISTANCE_TO_STEERPOINT)?;
    let vx = feet_per_second(table, "VelocityX")?;
    let vy = feet_per_second(table, "VelocityY")?;
    unit_consistency(distance, &ground_speed_series(&vx, &vy), dt)
}

// ---------------------------------------------------------------------------
// DerivedCalculator – appends derived channels to a table
// ---------------------------------------------------------------------------

pub const GROUND_SPEED: &str = "GroundSpeed";
pub const ALTITUDE: &str = "Altitude";
pub const DISTANCE_TO_STEERPOINT: &str = "DistanceToSteerpoint";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DerivedReport {
    pub produced: Vec<String>,
    pub skipped: Vec<MissingChannel>,
}

/// Computes the derived channels once, after normalization and smoothing.
#[derive(Debug, Clone)]
pub struct DerivedCalculator {
    dt: f64,
    samples_per_second: usize,
    rate_channels: Vec<String>,
    rate_window: usize,
}

impl DerivedCalculator {
    pub fn new(dt: f64, samples_per_second: usize) -> Self {
        Self {
            dt,
            samples_per_second,
            rate_channels: Vec::new(),
            rate_window: 5,
        }
    }

    /// Also produce `<name>_Rate` (change per second) for these channels.
    pub fn with_rate_channels(mut self, channels: Vec<String>, window: usize) -> Self {
        self.rate_channels = channels;
        self.rate_window = window;
        self
    }

    pub fn apply(&self, table: &mut FlightLogTable) -> DerivedReport {
        let mut out = Outputs {
            table,
            report: DerivedReport::default(),
        };

        if let Some([vx, vy]) = out.inputs(GROUND_SPEED, ["VelocityX", "VelocityY"]) {
            out.push(DerivedSeries::dense(GROUND_SPEED, ground_speed_series(&vx, &vy)));
        }

        for (axis, pos) in [("VelocityX", "PosX"), ("VelocityY", "PosY"), ("VelocityZ", "PosZ")] {
            if let Some([v]) = out.inputs(pos, [axis]) {
                // integrate in ft/s so positions come out in feet
                let fps: Vec<f64> = if out.table.is_converted(axis) {
                    v.iter().map(|&k| knots_to_feet_per_second(k)).collect()
                } else {
                    v
                };
                out.push(DerivedSeries::dense(pos, integrate_position(&fps, self.dt)));
            }
        }

        for rate in ["RollRate", "PitchRate", "YawRate"] {
            let name = format!("{rate}_Max");
            if let Some([v]) = out.inputs(&name, [rate]) {
                out.push(DerivedSeries::dense(name, running_max_abs(&v)));
            }
        }

        for angle in ["RollAngle", "PitchAngle"] {
            let name = format!("{angle}_Delta1s");
            if let Some([v]) = out.inputs(&name, [angle]) {
                out.push(DerivedSeries::new(name, delta_over_window(&v, self.samples_per_second)));
            }
        }

        let diffs = [
            ("Diff_Azimuth_True", "PlatformAzimuth", "PresentTrueHeading"),
            ("Diff_True_Mag", "PresentTrueHeading", "PresentMagneticHeading"),
        ];
        for (name, a, b) in diffs {
            if let Some([a, b]) = out.inputs(name, [a, b]) {
                out.push(DerivedSeries::dense(name, difference(&a, &b)));
            }
        }

        if let Some([h]) = out.inputs(ALTITUDE, ["BlendedEllipsoidHeight"]) {
            out.push(DerivedSeries::dense(ALTITUDE, h));
        }

        for channel in &self.rate_channels {
            let name = format!("{channel}_Rate");
            if let Some([v]) = out.inputs(&name, [channel.as_str()]) {
                out.push(DerivedSeries::new(name, rate_of_change(&v, self.dt, self.rate_window)));
            }
        }

        for miss in &out.report.skipped {
            log::warn!("{miss}");
        }
        log::info!(
            "Derived {} channel(s), {} skipped",
            out.report.produced.len(),
            out.report.skipped.len()
        );
        out.report
    }
}

struct Outputs<'t> {
    table: &'t mut FlightLogTable,
    report: DerivedReport,
}

impl Outputs<'_> {
    /// Copies of the named input channels, or `None` after recording every
    /// absent one against `output`.
    fn inputs<const N: usize>(&mut self, output: &str, names: [&str; N]) -> Option<[Vec<f64>; N]> {
        let mut missing = false;
        for name in names {
            if self.table.channel(name).is_none() {
                self.report.skipped.push(MissingChannel {
                    output: output.to_string(),
                    channel: name.to_string(),
                });
                missing = true;
            }
        }
        if missing {
            return None;
        }
        Some(names.map(|n| self.table.channel(n).map(<[f64]>::to_vec).unwrap_or_default()))
    }

    fn push(&mut self, series: DerivedSeries) {
        let name = series.name().to_string();
        if self.table.push_derived(series) {
            self.report.produced.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Channel, TimeAxis};
    use approx::assert_abs_diff_eq;

    #[test]
    fn ground_speed_is_pythagorean() {
        assert_eq!(ground_speed(3.0, 4.0), 5.0);
        assert_eq!(ground_speed(0.0, 0.0), 0.0);
        assert_eq!(ground_speed_series(&[3.0, -6.0], &[4.0, 8.0]), vec![5.0, 10.0]);
    }

    #[test]
    fn integrate_position_is_cumulative_sum() {
        assert_eq!(integrate_position(&[2.0, 2.0, 2.0], 0.5), vec![1.0, 2.0, 3.0]);
        assert!(integrate_position(&[], 0.05).is_empty());
    }

    #[test]
    fn delta_over_window_leaves_first_rows_undefined() {
        let d = delta_over_window(&[0.0, 1.0, 2.0, 3.0, 10.0], 2);
        assert_eq!(d, vec![None, None, Some(2.0), Some(2.0), Some(8.0)]);
    }

    #[test]
    fn running_max_abs_is_monotone() {
        assert_eq!(running_max_abs(&[-1.0, 3.0, -5.0, 2.0]), vec![1.0, 3.0, 5.0, 5.0]);
    }

    #[test]
    fn max_and_argmax_ignores_missing() {
        let peak = max_and_argmax(&[None, Some(2.0), Some(8.0), Some(8.0), Some(-1.0)]).unwrap();
        assert_eq!(peak, Peak { value: 8.0, index: 2 });
        assert_eq!(max_and_argmax(&[None, None]), None);
        assert_eq!(max_and_argmax(&[]), None);
    }

    #[test]
    fn rate_of_change_divides_by_dt() {
        let r = rate_of_change(&[0.0, 1.0, 2.0, 3.0], 0.5, 1);
        assert_eq!(r, vec![None, Some(2.0), Some(2.0), Some(2.0)]);
        assert!(rate_of_change(&[], 0.5, 5).is_empty());
    }

    #[test]
    fn unit_check_classifies_ratio() {
        // 100 ft/s for 0.05 s per row, distance moves 5 per row → ratio 1
        let gs = vec![100.0; 4];
        let check = unit_consistency(&[20.0, 15.0, 10.0, 5.0], &gs, 0.05).unwrap();
        assert_abs_diff_eq!(check.ratio, 1.0, epsilon = 1e-9);
        assert_eq!(check.verdict, UnitVerdict::Consistent);
        assert_abs_diff_eq!(check.observed_per_second, 100.0, epsilon = 1e-9);

        let half = unit_consistency(&[10.0, 7.5, 5.0], &[100.0; 3], 0.05).unwrap();
        assert_eq!(half.verdict, UnitVerdict::ScaleMismatch);

        assert!(unit_consistency(&[1.0, 2.0], &[0.0, 0.0], 0.05).is_none());
        assert!(unit_consistency(&[1.0], &[1.0], 0.05).is_none());
    }

    #[test]
    fn table_unit_check_uses_recorder_units() {
        use crate::data::normalize::Normalizer;
        use crate::data::schema::RoleTable;

        let mut t = FlightLogTable::new(
            TimeAxis::Frames(4),
            vec![
                Channel::new("VelocityX", vec![100.0; 4]),
                Channel::new("VelocityY", vec![0.0; 4]),
                Channel::new(DISTANCE_TO_STEERPOINT, vec![20.0, 15.0, 10.0, 5.0]),
            ],
        );
        Normalizer::new(&RoleTable::default()).apply(&mut t);
        let check = table_unit_consistency(&t, 0.05).unwrap();
        assert_abs_diff_eq!(check.ratio, 1.0, epsilon = 1e-9);
        assert_eq!(check.verdict, UnitVerdict::Consistent);
    }

    #[test]
    fn missing_velocity_y_skips_only_ground_speed() {
        let mut t = FlightLogTable::new(
            TimeAxis::Frames(3),
            vec![
                Channel::new("VelocityX", vec![1.0, 1.0, 1.0]),
                Channel::new("RollRate", vec![-1.0, 0.5, 2.0]),
            ],
        );
        let report = DerivedCalculator::new(0.05, 20).apply(&mut t);

        assert!(!t.has(GROUND_SPEED));
        assert!(report.skipped.contains(&MissingChannel {
            output: GROUND_SPEED.to_string(),
            channel: "VelocityY".to_string(),
        }));
        assert!(report.produced.contains(&"PosX".to_string()));
        assert_eq!(t.sample("RollRate_Max", 2), Some(2.0));
        assert!(!t.has(ALTITUDE));
    }

    #[test]
    fn positions_integrate_in_feet_after_knot_conversion() {
        use crate::data::normalize::Normalizer;
        use crate::data::schema::RoleTable;

        let mut t = FlightLogTable::new(
            TimeAxis::Frames(2),
            vec![
                Channel::new("VelocityX", vec![100.0, 100.0]),
                Channel::new("VelocityY", vec![0.0, 0.0]),
            ],
        );
        Normalizer::new(&RoleTable::default()).apply(&mut t);
        DerivedCalculator::new(0.5, 2).apply(&mut t);

        assert_abs_diff_eq!(t.sample("PosX", 1).unwrap(), 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.sample(GROUND_SPEED, 0).unwrap(), 59.2484, epsilon = 1e-9);
    }

    #[test]
    fn rate_channels_are_opt_in() {
        let mut t = FlightLogTable::new(
            TimeAxis::Frames(3),
            vec![Channel::new("PresentTrueHeading", vec![0.0, 1.0, 2.0])],
        );
        DerivedCalculator::new(0.05, 20)
            .with_rate_channels(vec!["PresentTrueHeading".to_string()], 1)
            .apply(&mut t);
        assert_eq!(t.sample("PresentTrueHeading_Rate", 0), None);
        assert_abs_diff_eq!(t.sample("PresentTrueHeading_Rate", 2).unwrap(), 20.0, epsilon = 1e-9);
    }
}
