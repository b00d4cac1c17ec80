use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegularizeError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("table has no columns")]
    NoColumns,
    #[error("column '{column}' is not a datetime column (found {dtype})")]
    NotDatetime { column: String, dtype: String },
    #[error("null timestamp at row {row}; resolve null timestamps before regularizing")]
    NullTimestamp { row: usize },
}

#[derive(Debug, Clone)]
pub struct RegularizeResult {
    pub dataframe: DataFrame,
    pub dropped_rows: usize,
}

/// Rewrites duplicate timestamps in the first column onto free one-second
/// slots between their chronological neighbours, dropping rows for which no
/// slot exists. The input must already be sorted ascending by the first
/// column; duplicates are detected by adjacency only.
///
/// The returned frame has pairwise-distinct timestamps, is sorted strictly
/// ascending, and every surviving row keeps its payload unchanged. Because
/// candidate slots are assigned in ascending order, the first row of a
/// duplicate block can end up on an earlier slot than its original value.
pub fn regularize_timestamps(df: &DataFrame) -> Result<RegularizeResult, RegularizeError> {
    if df.width() == 0 {
        return Err(RegularizeError::NoColumns);
    }
    if df.is_empty() {
        return Ok(RegularizeResult {
            dataframe: df.clone(),
            dropped_rows: 0,
        });
    }

    let ts_column = &df.get_columns()[0];
    let ts_name = ts_column.name().clone();
    let (time_unit, time_zone) = match ts_column.dtype() {
        DataType::Datetime(unit, tz) => (*unit, tz.clone()),
        other => {
            return Err(RegularizeError::NotDatetime {
                column: ts_name.to_string(),
                dtype: other.to_string(),
            });
        }
    };
    let second = one_second(time_unit);

    let ts_series = ts_column.datetime()?;
    let mut stamps: Vec<i64> = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        match ts_series.get(row) {
            Some(value) => stamps.push(value),
            None => return Err(RegularizeError::NullTimestamp { row }),
        }
    }

    let mut adjusted = stamps.clone();
    let mut keep = vec![true; stamps.len()];
    let mut dropped_rows = 0usize;

    let mut i = 0;
    while i < stamps.len() {
        let current = stamps[i];
        let mut run_end = i;
        while run_end + 1 < stamps.len() && stamps[run_end + 1] == current {
            run_end += 1;
        }
        let run_length = run_end - i + 1;

        if run_length > 1 {
            // The predecessor boundary reads the adjusted value: an earlier
            // run may have pushed its last row forward, and bounding by that
            // value is what keeps two adjacent runs from claiming the same
            // slot.
            let prev_time = (i > 0).then(|| adjusted[i - 1]);
            let next_time = (run_end + 1 < stamps.len()).then(|| stamps[run_end + 1]);
            let slots = candidate_slots(current, prev_time, next_time, run_length, second);

            for (offset, row) in (i..=run_end).enumerate() {
                if offset < slots.len() {
                    adjusted[row] = slots[offset];
                } else {
                    keep[row] = false;
                    dropped_rows += 1;
                }
            }
        }

        i = run_end + 1;
    }

    let adjusted_series = Series::new(ts_name.clone(), adjusted)
        .cast(&DataType::Datetime(time_unit, time_zone))?;

    let mut dataframe = df.clone();
    dataframe.with_column(adjusted_series)?;
    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let dataframe = dataframe
        .filter(&mask)?
        .sort(vec![ts_name], SortMultipleOptions::default())?;

    if dropped_rows > 0 {
        tracing::warn!(
            dropped_rows,
            "dropped rows due to insufficient spacing for duplicate timestamps"
        );
    }

    Ok(RegularizeResult {
        dataframe,
        dropped_rows,
    })
}

/// Free one-second slots for one duplicate run, bounded by the run's sorted
/// neighbours so that no two runs ever claim the same slot.
fn candidate_slots(
    current: i64,
    prev_time: Option<i64>,
    next_time: Option<i64>,
    run_length: usize,
    second: i64,
) -> Vec<i64> {
    let mut forward = Vec::new();
    if let Some(next_time) = next_time {
        let mut candidate = current + second;
        while candidate < next_time {
            forward.push(candidate);
            candidate += second;
        }
    }

    let mut slots = Vec::new();
    match prev_time {
        Some(prev_time) => {
            let mut candidate = current - second;
            while candidate > prev_time {
                slots.push(candidate);
                candidate -= second;
            }
        }
        None => {
            // No lower bound to respect: extend backwards far enough to
            // cover every duplicate in the run.
            for step in 1..run_length as i64 {
                slots.push(current - step * second);
            }
        }
    }

    slots.push(current);
    slots.extend(forward);
    slots.sort_unstable();
    slots
}

fn one_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    }
}
