//! Raw export loading: headerless tab-delimited files selected through a
//! column preset, returned as a DataFrame sorted ascending by timestamp.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::mapping::ColumnPreset;

#[derive(Debug, Clone)]
pub struct RawTable {
    pub df: DataFrame,
    /// Rows discarded because their timestamp field did not parse. Dropping
    /// them here satisfies the regularizer's no-null-timestamp precondition.
    pub skipped_rows: usize,
}

pub fn load_raw(path: &Path, preset: &ColumnPreset) -> Result<RawTable> {
    preset.validate()?;

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let timestamp_index = preset.columns[0];
    let payload_indices = &preset.columns[1..];

    let mut rows: Vec<(i64, Vec<String>)> = Vec::new();
    let mut skipped_rows = 0usize;

    for record in reader.records() {
        let record = record?;
        let Some(timestamp) = record
            .get(timestamp_index)
            .and_then(parse_day_first_timestamp)
        else {
            skipped_rows += 1;
            continue;
        };

        let payload = payload_indices
            .iter()
            .map(|index| record.get(*index).unwrap_or_default().trim().to_string())
            .collect();
        rows.push((timestamp, payload));
    }

    if rows.is_empty() {
        return Err(PipelineError::Validation(format!(
            "no rows with parsable timestamps in {}",
            path.display()
        )));
    }

    // Stable sort keeps duplicate timestamps in file order, which is what
    // the regularizer's assignment order relies on.
    rows.sort_by_key(|(timestamp, _)| *timestamp);

    if skipped_rows > 0 {
        tracing::warn!(
            skipped_rows,
            path = %path.display(),
            "skipped rows with unparsable timestamps"
        );
    }

    let timestamps: Vec<i64> = rows.iter().map(|(timestamp, _)| *timestamp).collect();
    let ts_series = Series::new(preset.headers[0].as_str().into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    let mut columns: Vec<Column> = Vec::with_capacity(preset.headers.len());
    columns.push(ts_series.into());

    for (position, header) in preset.headers.iter().enumerate().skip(1) {
        let values: Vec<&str> = rows
            .iter()
            .map(|(_, payload)| payload[position - 1].as_str())
            .collect();
        columns.push(build_payload_column(header, &values));
    }

    let df = DataFrame::new(columns)?;
    Ok(RawTable { df, skipped_rows })
}

/// A payload column becomes Float64 when every non-empty value parses as a
/// number; otherwise the raw strings are kept.
fn build_payload_column(header: &str, values: &[&str]) -> Column {
    let mut numeric: Vec<Option<f64>> = Vec::with_capacity(values.len());
    for value in values {
        match parse_optional_f64(value) {
            Some(parsed) => numeric.push(parsed),
            None => {
                let strings: Vec<Option<&str>> = values
                    .iter()
                    .map(|v| if v.is_empty() { None } else { Some(*v) })
                    .collect();
                return Series::new(header.into(), strings).into();
            }
        }
    }
    Series::new(header.into(), numeric).into()
}

/// `Ok`-like outer Option: `None` means the value is non-numeric, inner
/// `None` means it is missing.
fn parse_optional_f64(value: &str) -> Option<Option<f64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    value.parse::<f64>().ok().map(Some)
}

pub(crate) fn parse_day_first_timestamp(value: &str) -> Option<i64> {
    static FORMATS: &[&str] = &[
        "%d/%m/%Y %H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    let trimmed = value.trim();
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    None
}
