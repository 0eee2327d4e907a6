use std::f64::consts::PI;

use super::model::FlightLogTable;
use super::schema::{ChannelRole, RoleTable};

/// 1 ft/s expressed in knots.
pub const KNOTS_PER_FOOT_PER_SECOND: f64 = 0.592484;

pub fn radians_to_degrees(rad: f64) -> f64 {
    rad * (180.0 / PI)
}

/// -1.0..1.0 → -180°..180°.
pub fn normalized_to_degrees(v: f64) -> f64 {
    v * 180.0
}

pub fn feet_per_second_to_knots(fps: f64) -> f64 {
    fps * KNOTS_PER_FOOT_PER_SECOND
}

pub fn knots_to_feet_per_second(kts: f64) -> f64 {
    kts / KNOTS_PER_FOOT_PER_SECOND
}

/// Scale factor applied to a channel of the given role, `None` if the role is
/// already in display units.
pub fn conversion_factor(role: ChannelRole) -> Option<f64> {
    match role {
        ChannelRole::RawAngleRadians => Some(180.0 / PI),
        ChannelRole::RawAngleNormalized | ChannelRole::Rate => Some(180.0),
        ChannelRole::RawVelocity => Some(KNOTS_PER_FOOT_PER_SECOND),
        ChannelRole::Derived => None,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NormalizationReport {
    /// `(channel, role)` converted by this pass.
    pub converted: Vec<(String, ChannelRole)>,
    /// Channels skipped because an earlier pass already converted them.
    pub already_converted: Vec<String>,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Rewrites raw recorder units in place: angles to degrees, rates to
/// degrees per second, velocities to knots. Each channel is converted at most
/// once per table.
pub struct Normalizer<'a> {
    roles: &'a RoleTable,
}

impl<'a> Normalizer<'a> {
    pub fn new(roles: &'a RoleTable) -> Self {
        Self { roles }
    }

    pub fn apply(&self, table: &mut FlightLogTable) -> NormalizationReport {
        let mut report = NormalizationReport::default();
        let names: Vec<String> = table.channels().iter().map(|c| c.name.clone()).collect();

        for name in names {
            let Some(role) = self.roles.role(&name) else {
                continue;
            };
            let Some(factor) = conversion_factor(role) else {
                continue;
            };
            if table.is_converted(&name) {
                log::warn!("{name} already converted, not converting again");
                report.already_converted.push(name);
                continue;
            }
            if let Some(values) = table.channel_mut(&name) {
                values.iter_mut().for_each(|v| *v *= factor);
            }
            table.mark_converted(&name);
            report.converted.push((name, role));
        }

        log::info!(
            "Converted {} channel(s) to display units",
            report.converted.len()
        );
        report
    }
}
