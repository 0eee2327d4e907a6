use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChannelRole – how a recorder channel is encoded
// ---------------------------------------------------------------------------

/// Encoding of a channel as written by the recorder. Decides which unit
/// conversion applies and how the channel is smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    /// Feet per second.
    RawVelocity,
    RawAngleRadians,
    /// -1.0..1.0 meaning -180°..180°.
    RawAngleNormalized,
    /// Angular rate, normalized the same way as `RawAngleNormalized` (per second).
    Rate,
    /// Computed by this crate, never converted again.
    Derived,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelRole::RawVelocity => "velocity (ft/s)",
            ChannelRole::RawAngleRadians => "angle (rad)",
            ChannelRole::RawAngleNormalized => "angle (normalized)",
            ChannelRole::Rate => "rate (normalized)",
            ChannelRole::Derived => "derived",
        };
        f.write_str(s)
    }
}

/// Static classification of the recorder vocabulary.
pub fn default_role(name: &str) -> Option<ChannelRole> {
    use ChannelRole::*;
    match name {
        "VelocityX" | "VelocityY" | "VelocityZ" => Some(RawVelocity),
        "PlatformAzimuth"
        | "RollAngle"
        | "PitchAngle"
        | "PresentTrueHeading"
        | "PresentMagneticHeading"
        | "GreatCircleSteeringError"
        | "ComputedCourseDeviation" => Some(RawAngleRadians),
        "BlendedLatitude" | "BlendedLongitude" => Some(RawAngleNormalized),
        "RollRate" | "PitchRate" | "YawRate" => Some(Rate),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// RoleTable – static table plus configured overrides
// ---------------------------------------------------------------------------

/// Channel name → role lookup consulted by the normalizer and smoother.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    overrides: BTreeMap<String, ChannelRole>,
}

impl RoleTable {
    pub fn new(overrides: BTreeMap<String, ChannelRole>) -> Self {
        Self { overrides }
    }

    pub fn role(&self, name: &str) -> Option<ChannelRole> {
        self.overrides
            .get(name)
            .copied()
            .or_else(|| default_role(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_channels_have_fixed_roles() {
        assert_eq!(default_role("VelocityY"), Some(ChannelRole::RawVelocity));
        assert_eq!(default_role("RollAngle"), Some(ChannelRole::RawAngleRadians));
        assert_eq!(default_role("BlendedLongitude"), Some(ChannelRole::RawAngleNormalized));
        assert_eq!(default_role("YawRate"), Some(ChannelRole::Rate));
        assert_eq!(default_role("DistanceToSteerpoint"), None);
    }

    #[test]
    fn overrides_win_over_static_table() {
        let mut overrides = BTreeMap::new();
        overrides.insert("RollAngle".to_string(), ChannelRole::RawAngleNormalized);
        let table = RoleTable::new(overrides);
        assert_eq!(table.role("RollAngle"), Some(ChannelRole::RawAngleNormalized));
        assert_eq!(table.role("PitchAngle"), Some(ChannelRole::RawAngleRadians));
    }

    #[test]
    fn roles_deserialize_from_snake_case() {
        let role: ChannelRole = serde_json::from_str("\"raw_angle_normalized\"").unwrap();
        assert_eq!(role, ChannelRole::RawAngleNormalized);
    }
}
