//! End-to-end processing of converted exports into final data pack tables:
//! sort, duplicate-timestamp regularization, dense time step index, column
//! hygiene, and CSV output.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::filters::{blank_constant_columns, exclude_columns, CONSTANT_SENTINELS};
use crate::outputs;
use crate::regularize::regularize_timestamps;
use crate::state::LastUsedPaths;

pub const TIME_STEP_COLUMN: &str = "Time Step";

/// Run configuration, deserialized from the operator-maintained
/// `inputs.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "Folder Path")]
    pub folder_path: PathBuf,
    #[serde(rename = "Data Pack Name")]
    pub data_pack_name: String,
    #[serde(rename = "Excluded Columns", default)]
    pub excluded_columns: Vec<String>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub label: String,
    pub rows: usize,
    pub duplicate_rows: usize,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub datalog: TableSummary,
    pub mfc: TableSummary,
    pub outputs: Vec<PathBuf>,
}

/// Processes one converted table into its final data pack form.
pub fn process_table(
    df: &DataFrame,
    label: &str,
    excluded_columns: &[String],
) -> Result<(DataFrame, TableSummary)> {
    let mut df = sort_by_timestamp(df)?;

    let duplicate_rows = count_duplicate_rows(&df)?;
    let mut dropped_rows = 0;
    if duplicate_rows > 0 {
        tracing::info!(label, duplicate_rows, "repeated timestamps found");
        let result = regularize_timestamps(&df)?;
        df = result.dataframe;
        dropped_rows = result.dropped_rows;
    } else {
        tracing::info!(label, "no repeated timestamps found");
    }

    let mut df = insert_time_step(df)?;
    df = blank_constant_columns(&df, &CONSTANT_SENTINELS)?;
    df = exclude_columns(&df, excluded_columns)?;

    let summary = TableSummary {
        label: label.to_string(),
        rows: df.height(),
        duplicate_rows,
        dropped_rows,
    };
    Ok((df, summary))
}

/// Full processing run over the last converted datalog and MFC exports.
pub fn run(config: &RunConfig, state_path: &Path) -> Result<RunSummary> {
    let state = LastUsedPaths::load(state_path)?.ok_or_else(|| {
        PipelineError::Validation(format!(
            "state file {} not found; convert the raw exports first",
            state_path.display()
        ))
    })?;

    let datalog = outputs::read_parquet(&parquet_sibling(&state.datalog_last_used_path))?;
    let mfc = outputs::read_parquet(&parquet_sibling(&state.mfc_last_used_path))?;

    let datalog_sorted = sort_by_timestamp(&datalog)?;
    let mfc_sorted = sort_by_timestamp(&mfc)?;

    let name = &config.data_pack_name;
    let datalog_precomparison = config.folder_path.join(format!("{name}_precomparison.csv"));
    let mfc_precomparison = config
        .folder_path
        .join(format!("{name}_MFC_precomparison.csv"));
    outputs::write_csv(&datalog_sorted, &datalog_precomparison)?;
    outputs::write_csv(&mfc_sorted, &mfc_precomparison)?;

    let (datalog_final, datalog_summary) =
        process_table(&datalog_sorted, "datalog", &config.excluded_columns)?;
    let (mfc_final, mfc_summary) = process_table(&mfc_sorted, "mfc", &config.excluded_columns)?;

    let datalog_out = config.folder_path.join(format!("{name}_DataPack_final.csv"));
    let mfc_out = config
        .folder_path
        .join(format!("{name}_MFC_DataPack_final.csv"));
    outputs::write_csv(&datalog_final, &datalog_out)?;
    outputs::write_csv(&mfc_final, &mfc_out)?;

    tracing::info!(
        datalog = %datalog_out.display(),
        mfc = %mfc_out.display(),
        "final outputs written"
    );

    Ok(RunSummary {
        datalog: datalog_summary,
        mfc: mfc_summary,
        outputs: vec![
            datalog_precomparison,
            mfc_precomparison,
            datalog_out,
            mfc_out,
        ],
    })
}

/// The converted parquet written next to a raw export path.
pub fn parquet_sibling(raw_path: &Path) -> PathBuf {
    let mut name = OsString::from(raw_path.as_os_str());
    name.push(".parquet");
    PathBuf::from(name)
}

pub fn csv_sibling(raw_path: &Path) -> PathBuf {
    let mut name = OsString::from(raw_path.as_os_str());
    name.push(".csv");
    PathBuf::from(name)
}

fn sort_by_timestamp(df: &DataFrame) -> Result<DataFrame> {
    let name = first_column_name(df)?;
    // Maintain order so that rows within a duplicate run keep their file
    // order; slot assignment depends on it.
    Ok(df.sort(
        vec![name],
        SortMultipleOptions::default().with_maintain_order(true),
    )?)
}

fn count_duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.is_empty() {
        return Ok(0);
    }
    let ts = df.get_columns()[0].datetime()?;
    let height = df.height();

    let mut duplicates = 0usize;
    let mut i = 0usize;
    while i < height {
        let mut run_end = i;
        while run_end + 1 < height && ts.get(run_end + 1) == ts.get(i) {
            run_end += 1;
        }
        if run_end > i {
            duplicates += run_end - i + 1;
        }
        i = run_end + 1;
    }
    Ok(duplicates)
}

fn insert_time_step(df: DataFrame) -> Result<DataFrame> {
    let mut df = df;
    if df.get_column_names_str().contains(&TIME_STEP_COLUMN) {
        df = df.drop(TIME_STEP_COLUMN)?;
    }
    let steps: Vec<i64> = (0..df.height() as i64).collect();
    df.insert_column(1, Series::new(TIME_STEP_COLUMN.into(), steps))?;
    Ok(df)
}

fn first_column_name(df: &DataFrame) -> Result<PlSmallStr> {
    df.get_columns()
        .first()
        .map(|column| column.name().clone())
        .ok_or_else(|| PipelineError::Validation("table has no columns".to_string()))
}
