use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use super::model::{Channel, FlightLogTable, TimeAxis};
use crate::error::{CoercionWarning, LoadError};

/// Column holding wall-clock markers. Kept as text, never coerced.
pub const TIME_MARKER: &str = "TimeMarker";

// ---------------------------------------------------------------------------
// Load result
// ---------------------------------------------------------------------------

/// What happened while loading, good or bad.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub source: Option<PathBuf>,
    /// Set when the load failed; the table is then empty.
    pub error: Option<LoadError>,
    /// Cleaned and de-duplicated header, in file order.
    pub headers: Vec<String>,
    /// `(original, renamed)` for each duplicate header.
    pub renamed: Vec<(String, String)>,
    pub coercion_warnings: Vec<CoercionWarning>,
    /// Columns dropped because no cell in them was numeric.
    pub skipped_columns: Vec<String>,
    /// Columns with every cell missing; kept and zero-filled.
    pub empty_columns: Vec<String>,
}

/// A table plus its load report. A failed load still yields a (empty) table.
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: FlightLogTable,
    pub report: LoadReport,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.report.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a flight log CSV. Never fails: on error the returned table is empty
/// and `report.error` says why.
pub fn load_flight_log(path: &Path) -> LoadOutcome {
    match try_load(path) {
        Ok((table, report)) => LoadOutcome { table, report },
        Err(e) => {
            log::error!("Failed to load {}: {e}", path.display());
            LoadOutcome {
                table: FlightLogTable::empty(),
                report: LoadReport {
                    source: Some(path.to_path_buf()),
                    error: Some(e),
                    ..LoadReport::default()
                },
            }
        }
    }
}

/// Fallible variant of [`load_flight_log`].
pub fn try_load(path: &Path) -> Result<(FlightLogTable, LoadReport), LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let (table, mut report) = load_from_reader(file)?;
    report.source = Some(path.to_path_buf());
    log::info!(
        "Loaded {} rows with {} channels from {}",
        table.len(),
        table.channels().len(),
        path.display()
    );
    Ok((table, report))
}

/// Parse flight log CSV from any reader.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(FlightLogTable, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut records = rdr.records();

    let header_record = records.next().ok_or(LoadError::NoHeader)??;
    let raw_headers = split_header(&header_record);
    if raw_headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::NoHeader);
    }
    let (headers, renamed) = dedup_headers(&raw_headers);
    for (from, to) in &renamed {
        log::info!("Duplicate column {from} renamed to {to}");
    }

    let time_idx = headers.iter().position(|h| h == TIME_MARKER);
    let mut columns: Vec<ColumnBuilder> = headers.iter().map(|h| ColumnBuilder::new(h)).collect();
    let mut markers: Vec<String> = Vec::new();
    let mut rows = 0usize;

    for result in records {
        let record = result?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let cell = record.get(col_idx).unwrap_or("");
            if Some(col_idx) == time_idx {
                markers.push(cell.to_string());
            } else {
                column.push(cell, rows);
            }
        }
        rows += 1;
    }

    let mut report = LoadReport {
        headers: headers.clone(),
        renamed,
        ..LoadReport::default()
    };
    let mut channels = Vec::new();

    for (col_idx, column) in columns.into_iter().enumerate() {
        if Some(col_idx) == time_idx {
            continue;
        }
        if rows > 0 && column.valid == 0 {
            if column.invalid > 0 {
                log::warn!("Skipping column {}: no numeric values", column.name);
                report.skipped_columns.push(column.name);
                continue;
            }
            log::warn!("Column {} has no values, filled with 0", column.name);
            report.empty_columns.push(column.name.clone());
        }
        if let Some(w) = column.warning() {
            log::warn!("Coercion: {w}");
            report.coercion_warnings.push(w);
        }
        channels.push(Channel::new(column.name, forward_fill(&column.cells)));
    }

    if channels.is_empty() {
        return Err(LoadError::NoUsableChannels {
            skipped: report.skipped_columns,
        });
    }

    let time = match time_idx {
        Some(_) => TimeAxis::Markers(markers),
        None => TimeAxis::Frames(rows),
    };
    Ok((FlightLogTable::new(time, channels), report))
}

// ---------------------------------------------------------------------------
// Header cleanup
// ---------------------------------------------------------------------------

/// Split and clean the header record. Some recorders wrap the whole header
/// line in one pair of quotes, which the CSV reader returns as a single field.
fn split_header(record: &StringRecord) -> Vec<String> {
    let cells: Vec<&str> = if record.len() == 1 && record[0].contains(',') {
        record[0].split(',').collect()
    } else {
        record.iter().collect()
    };
    cells
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let cleaned = c.replace('"', "").trim().to_string();
            if cleaned.is_empty() {
                format!("Column{i}")
            } else {
                cleaned
            }
        })
        .collect()
}

/// Suffix repeated names left to right: the second `X` becomes `X_1`, the
/// third `X_2`. Returns the new names and the `(original, renamed)` pairs.
pub fn dedup_headers(headers: &[String]) -> (Vec<String>, Vec<(String, String)>) {
    let mut used: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());
    let mut renamed = Vec::new();

    for h in headers {
        if used.insert(h.clone()) {
            out.push(h.clone());
            continue;
        }
        let mut n = 1;
        let name = loop {
            let candidate = format!("{h}_{n}");
            if !used.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        used.insert(name.clone());
        renamed.push((h.clone(), name.clone()));
        out.push(name);
    }
    (out, renamed)
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

enum Cell {
    Value(f64),
    Missing,
    Invalid,
}

fn parse_cell(s: &str) -> Cell {
    let s = s.trim().trim_matches('"');
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") || s == "-" {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Invalid,
    }
}

struct ColumnBuilder {
    name: String,
    cells: Vec<Option<f64>>,
    valid: usize,
    invalid: usize,
    first_invalid: Option<(usize, String)>,
}

impl ColumnBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            valid: 0,
            invalid: 0,
            first_invalid: None,
        }
    }

    fn push(&mut self, raw: &str, row: usize) {
        match parse_cell(raw) {
            Cell::Value(v) => {
                self.valid += 1;
                self.cells.push(Some(v));
            }
            Cell::Missing => self.cells.push(None),
            Cell::Invalid => {
                self.invalid += 1;
                if self.first_invalid.is_none() {
                    self.first_invalid = Some((row, raw.to_string()));
                }
                self.cells.push(None);
            }
        }
    }

    fn warning(&self) -> Option<CoercionWarning> {
        let (first_row, first_text) = self.first_invalid.clone()?;
        Some(CoercionWarning {
            channel: self.name.clone(),
            count: self.invalid,
            first_row,
            first_text,
        })
    }
}

/// Carry the last seen value forward; rows before the first value become 0.
pub fn forward_fill(cells: &[Option<f64>]) -> Vec<f64> {
    let mut last = None;
    cells
        .iter()
        .map(|c| {
            if c.is_some() {
                last = *c;
            }
            last.unwrap_or(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(csv: &str) -> Result<(FlightLogTable, LoadReport), LoadError> {
        load_from_reader(csv.as_bytes())
    }

    #[test]
    fn duplicate_headers_get_counters() {
        let (table, report) = load_str("\"X\",\"Y\",\"X\"\n1,2,3\n").unwrap();
        assert_eq!(report.headers, vec!["X", "Y", "X_1"]);
        assert_eq!(table.channel_names(), vec!["X", "Y", "X_1"]);
        assert_eq!(table.channel("X_1"), Some(&[3.0][..]));
        assert_eq!(report.renamed, vec![("X".to_string(), "X_1".to_string())]);
    }

    #[test]
    fn dedup_skips_names_already_taken() {
        let headers: Vec<String> = ["X", "X_1", "X", "X"].iter().map(|s| s.to_string()).collect();
        let (out, _) = dedup_headers(&headers);
        assert_eq!(out, vec!["X", "X_1", "X_2", "X_3"]);
    }

    #[test]
    fn whole_line_quoted_header_is_split() {
        let (table, report) = load_str("\"RollAngle,PitchAngle, VelocityX \"\n0.1,0.2,3\n").unwrap();
        assert_eq!(report.headers, vec!["RollAngle", "PitchAngle", "VelocityX"]);
        assert_eq!(table.sample("VelocityX", 0), Some(3.0));
    }

    #[test]
    fn bad_cells_are_forward_filled_and_reported() {
        let csv = "A,B\n,1\n2,oops\nbad,3\n4,\n";
        let (table, report) = load_str(csv).unwrap();
        assert_eq!(table.channel("A"), Some(&[0.0, 2.0, 2.0, 4.0][..]));
        assert_eq!(table.channel("B"), Some(&[1.0, 1.0, 3.0, 3.0][..]));
        assert_eq!(report.coercion_warnings.len(), 2);
        let a = &report.coercion_warnings[0];
        assert_eq!(a.channel, "A");
        assert_eq!(a.count, 1);
        assert_eq!(a.first_row, 2);
        assert_eq!(a.first_text, "bad");
    }

    #[test]
    fn short_rows_are_padded_as_missing() {
        let (table, _) = load_str("A,B\n1,2\n3\n").unwrap();
        assert_eq!(table.channel("B"), Some(&[2.0, 2.0][..]));
    }

    #[test]
    fn text_columns_are_skipped() {
        let (table, report) = load_str("Mode,A\nNAV,1\nAA,2\n").unwrap();
        assert_eq!(report.skipped_columns, vec!["Mode"]);
        assert!(!table.has("Mode"));
        assert!(table.has("A"));
    }

    #[test]
    fn all_missing_column_is_zero_filled() {
        let (table, report) = load_str("VelocityX,VelocityY\n3,\n4,nan\n").unwrap();
        assert_eq!(table.channel("VelocityY"), Some(&[0.0, 0.0][..]));
        assert!(report.skipped_columns.is_empty());
        assert_eq!(report.empty_columns, vec!["VelocityY"]);
        assert!(report.coercion_warnings.is_empty());
    }

    #[test]
    fn time_marker_becomes_labels() {
        let (table, _) =
            load_str("TimeMarker,RollAngle\n2024-01-01 12:00:00.05,0\n2024-01-01 12:00:00.10,1\n").unwrap();
        assert!(!table.has(TIME_MARKER));
        assert_eq!(table.len(), 2);
        assert_eq!(table.time_label(1), "12:00:00.100");
    }

    #[test]
    fn no_numeric_channels_is_an_error() {
        let err = load_str("Mode\nNAV\n").unwrap_err();
        assert!(matches!(err, LoadError::NoUsableChannels { .. }));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(load_str(""), Err(LoadError::NoHeader)));
    }

    #[test]
    fn missing_file_yields_empty_table() {
        let outcome = load_flight_log(Path::new("/definitely/not/here.csv"));
        assert!(!outcome.is_ok());
        assert!(outcome.table.is_empty());
        assert!(matches!(outcome.report.error, Some(LoadError::Open { .. })));
    }

    #[test]
    fn loads_from_disk() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"VelocityX,VelocityY\n3,4\n6,8\n").unwrap();
        let outcome = load_flight_log(temp.path());
        assert!(outcome.is_ok());
        assert_eq!(outcome.table.len(), 2);
        assert_eq!(outcome.report.source.as_deref(), Some(temp.path()));
    }
}
