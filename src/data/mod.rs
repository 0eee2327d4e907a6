/// Data layer: flight log table, loading and the preparation pipeline.
///
/// Architecture:
/// ```text
///   recorder .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  clean headers, coerce, fill → FlightLogTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  rad / normalized → deg, ft/s → kts (once per channel)
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  centered moving average, replace or retain raw
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ derived   │  ground speed, positions, running maxima, deltas
///   └──────────┘
///        │
///        ▼
///     replay (crate::replay) → renderer
/// ```

pub mod derived;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod schema;

use std::path::Path;

use crate::config::ViewerConfig;
use derived::{DerivedCalculator, DerivedReport};
use loader::{LoadOutcome, LoadReport};
use model::FlightLogTable;
use normalize::{NormalizationReport, Normalizer};

/// A table that went through the whole pipeline, with what each stage did.
#[derive(Debug)]
pub struct PreparedLog {
    pub table: FlightLogTable,
    pub load: LoadReport,
    pub normalization: NormalizationReport,
    pub smoothed: Vec<String>,
    pub derived: DerivedReport,
}

impl PreparedLog {
    /// Whether there is anything to replay.
    pub fn is_playable(&self) -> bool {
        self.load.error.is_none() && !self.table.is_empty()
    }

    /// Human-readable account of every stage, one line per fact.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(e) = &self.load.error {
            lines.push(format!("load failed: {e}"));
            return lines;
        }
        lines.push(format!(
            "{} rows, {} channels",
            self.table.len(),
            self.table.channels().len()
        ));
        for (from, to) in &self.load.renamed {
            lines.push(format!("duplicate column {from} renamed to {to}"));
        }
        for col in &self.load.skipped_columns {
            lines.push(format!("column {col} skipped (not numeric)"));
        }
        for col in &self.load.empty_columns {
            lines.push(format!("column {col} has no values, filled with 0"));
        }
        for w in &self.load.coercion_warnings {
            lines.push(w.to_string());
        }
        for (name, role) in &self.normalization.converted {
            lines.push(format!("{name}: converted from {role}"));
        }
        if !self.smoothed.is_empty() {
            lines.push(format!("smoothed: {}", self.smoothed.join(", ")));
        }
        if !self.derived.produced.is_empty() {
            lines.push(format!("derived: {}", self.derived.produced.join(", ")));
        }
        for miss in &self.derived.skipped {
            lines.push(miss.to_string());
        }
        lines
    }
}

/// Load `path` and run it through normalize → smooth → derive.
pub fn prepare_log(path: &Path, config: &ViewerConfig) -> PreparedLog {
    prepare_table(loader::load_flight_log(path), config)
}

/// Run an already loaded table through the rest of the pipeline. An empty
/// table passes through untouched.
pub fn prepare_table(outcome: LoadOutcome, config: &ViewerConfig) -> PreparedLog {
    let LoadOutcome { mut table, report } = outcome;
    if table.is_empty() {
        return PreparedLog {
            table,
            load: report,
            normalization: NormalizationReport::default(),
            smoothed: Vec::new(),
            derived: DerivedReport::default(),
        };
    }

    let roles = config.role_table();
    let normalization = Normalizer::new(&roles).apply(&mut table);

    let smoothed = if config.smoothing.enabled {
        config.smoother().apply(&mut table, config.smoothing.mode)
    } else {
        Vec::new()
    };

    let derived = DerivedCalculator::new(config.dt(), config.samples_per_second())
        .with_rate_channels(config.rate_channels.clone(), config.rate_window)
        .apply(&mut table);

    PreparedLog {
        table,
        load: report,
        normalization,
        smoothed,
        derived,
    }
}
