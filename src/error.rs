use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// LoadError – the file could not become a table
// ---------------------------------------------------------------------------

/// Why a flight log could not be loaded. The loader turns any of these into an
/// empty table plus a report rather than propagating it.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("file has no header row")]
    NoHeader,
    #[error("no usable numeric channels (skipped columns: {skipped:?})")]
    NoUsableChannels { skipped: Vec<String> },
}

// ---------------------------------------------------------------------------
// MissingChannel – a derived output whose input is absent
// ---------------------------------------------------------------------------

/// A derived output that could not be produced because `channel` is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingChannel {
    pub output: String,
    pub channel: String,
}

impl fmt::Display for MissingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} skipped: channel '{}' not in log", self.output, self.channel)
    }
}

// ---------------------------------------------------------------------------
// CoercionWarning – cells that failed numeric parsing
// ---------------------------------------------------------------------------

/// Non-numeric cells found in one channel. Those cells were treated as missing
/// and forward-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    pub channel: String,
    pub count: usize,
    pub first_row: usize,
    pub first_text: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} non-numeric cell(s), first at row {} ('{}')",
            self.channel, self.count, self.first_row, self.first_text
        )
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("sample_rate_hz must be positive, got {0}")]
    SampleRate(f64),
    #[error("display_window must be at least 1")]
    DisplayWindow,
    #[error("tick_interval_ms must be at least 1")]
    TickInterval,
    #[error("smoothing window for '{0}' must be at least 1")]
    SmoothingWindow(String),
    #[error("max_speed must be at least 1")]
    MaxSpeed,
    #[error("rate_window must be at least 1")]
    RateWindow,
}
