//! CSV ingestion of per-building simulation output files.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::AnalysisError;
use crate::series::SamplePoint;

/// Simulation output file expected inside each `<building>/<upgrade>/` dir.
pub const OUTPUT_FILE: &str = "ochre.csv";

/// Timestamp column header.
pub const TIME_COL: &str = "Time";
/// Real power column header.
pub const REAL_POWER_COL: &str = "Total Electric Power (kW)";
/// Reactive power column header (optional in the input).
pub const REACTIVE_POWER_COL: &str = "Total Reactive Power (kVAR)";

/// Timestamp formats accepted in the `Time` column.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Reads one building output file into raw samples.
///
/// The file must have a header row naming at least [`TIME_COL`] and
/// [`REAL_POWER_COL`]; [`REACTIVE_POWER_COL`] is used when present and
/// treated as zero otherwise.
///
/// # Errors
///
/// * [`AnalysisError::MissingInput`] when the file does not exist — fatal
///   for the run, since a partial roster invalidates aggregate statistics.
/// * [`AnalysisError::MalformedInput`] for a missing required column, an
///   unparseable timestamp, or a non-numeric power value.
pub fn read_load_series(path: &Path) -> Result<Vec<SamplePoint>, AnalysisError> {
    if !path.is_file() {
        return Err(AnalysisError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let mut rdr = csv::Reader::from_path(path).map_err(|e| malformed(path, 0, e.to_string()))?;

    let headers = rdr
        .headers()
        .map_err(|e| malformed(path, 0, e.to_string()))?
        .clone();
    let time_idx = column_index(&headers, TIME_COL)
        .ok_or_else(|| malformed(path, 0, format!("missing required column \"{TIME_COL}\"")))?;
    let real_idx = column_index(&headers, REAL_POWER_COL).ok_or_else(|| {
        malformed(path, 0, format!("missing required column \"{REAL_POWER_COL}\""))
    })?;
    let reactive_idx = column_index(&headers, REACTIVE_POWER_COL);

    let mut samples = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let row = i + 1;
        let record = record.map_err(|e| malformed(path, row, e.to_string()))?;

        let time_field = field(&record, time_idx, path, row, TIME_COL)?;
        let time = parse_timestamp(time_field)
            .ok_or_else(|| malformed(path, row, format!("invalid timestamp \"{time_field}\"")))?;

        let real_field = field(&record, real_idx, path, row, REAL_POWER_COL)?;
        let real_kw = parse_power(real_field)
            .ok_or_else(|| malformed(path, row, format!("invalid power \"{real_field}\"")))?;

        let reactive_kvar = match reactive_idx {
            Some(idx) => {
                let raw = field(&record, idx, path, row, REACTIVE_POWER_COL)?;
                parse_power(raw)
                    .ok_or_else(|| malformed(path, row, format!("invalid power \"{raw}\"")))?
            }
            None => 0.0,
        };

        samples.push(SamplePoint {
            time,
            real_kw,
            reactive_kvar,
        });
    }

    Ok(samples)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    path: &Path,
    row: usize,
    col: &str,
) -> Result<&'r str, AnalysisError> {
    record
        .get(idx)
        .ok_or_else(|| malformed(path, row, format!("row is missing column \"{col}\"")))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn parse_power(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

fn malformed(path: &Path, row: usize, message: String) -> AnalysisError {
    AnalysisError::MalformedInput {
        path: path.to_path_buf(),
        row,
        message,
    }
}
