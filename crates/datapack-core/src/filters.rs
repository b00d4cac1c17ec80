//! Data pack hygiene: blanking excluded columns and columns that never carry
//! real signal (stuck at a sentinel value or entirely negative).

use polars::prelude::*;

use crate::error::Result;

/// Values a channel reports when it is disconnected or railed; a column that
/// only ever contains one of these carries no information.
pub const CONSTANT_SENTINELS: [f64; 2] = [0.0, 1372.0];

/// Replaces every value of the named columns with hyphens. Names not present
/// in the frame are ignored.
pub fn exclude_columns(df: &DataFrame, excluded: &[String]) -> Result<DataFrame> {
    let mut output = df.clone();
    for name in excluded {
        if output.get_column_names_str().contains(&name.as_str()) {
            output.with_column(hyphen_series(name, output.height()))?;
        }
    }
    Ok(output)
}

/// Replaces numeric columns that are entirely one sentinel value, or entirely
/// negative, with hyphens.
pub fn blank_constant_columns(df: &DataFrame, sentinels: &[f64]) -> Result<DataFrame> {
    let mut to_blank: Vec<String> = Vec::new();

    for column in df.get_columns() {
        if !is_numeric(column.dtype()) {
            continue;
        }
        let values = column.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut non_null = 0usize;
        let mut all_negative = true;
        let mut sentinel_hits = vec![true; sentinels.len()];

        for row in 0..values.len() {
            let Some(value) = values.get(row) else {
                continue;
            };
            non_null += 1;
            if value >= 0.0 {
                all_negative = false;
            }
            for (slot, sentinel) in sentinel_hits.iter_mut().zip(sentinels) {
                if value != *sentinel {
                    *slot = false;
                }
            }
        }

        if non_null == 0 {
            continue;
        }
        if sentinel_hits.iter().any(|hit| *hit) || all_negative {
            to_blank.push(column.name().to_string());
        }
    }

    let mut output = df.clone();
    for name in to_blank {
        output.with_column(hyphen_series(&name, output.height()))?;
    }
    Ok(output)
}

fn hyphen_series(name: &str, height: usize) -> Series {
    Series::new(name.into(), vec!["-"; height])
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}
