// crates/datapack-cli/src/main.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use tracing::info;
use tracing_subscriber::EnvFilter;

use datapack_core::discovery::discover_files;
use datapack_core::loader::load_raw;
use datapack_core::mapping::ColumnPreset;
use datapack_core::outputs;
use datapack_core::pipeline::{self, RunConfig};
use datapack_core::state::{LastUsedPaths, STATE_FILE_NAME};

/// A CLI for the data pack processing pipeline
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Converts raw datalog and MFC exports to parquet/csv siblings and
    /// records their paths for later processing.
    Convert {
        #[arg(long)]
        datalog: PathBuf,
        #[arg(long)]
        mfc: PathBuf,
        /// JSON preset overriding the built-in datalog column mapping.
        #[arg(long)]
        preset: Option<PathBuf>,
        /// JSON preset overriding the built-in MFC column mapping.
        #[arg(long)]
        mfc_preset: Option<PathBuf>,
        /// Where to write the state file (defaults to state.json in the
        /// current directory).
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Runs the full processing pipeline over the last converted exports.
    Process {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Lists the raw files found in a directory, categorized.
    Discover {
        #[arg(short, long)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            datalog,
            mfc,
            preset,
            mfc_preset,
            state,
        } => {
            let datalog_preset = match preset {
                Some(path) => ColumnPreset::load(&path)
                    .with_context(|| format!("failed to load preset {}", path.display()))?,
                None => ColumnPreset::datalog(),
            };
            let mfc_column_preset = match mfc_preset {
                Some(path) => ColumnPreset::load(&path)
                    .with_context(|| format!("failed to load preset {}", path.display()))?,
                None => ColumnPreset::mfc(),
            };

            convert_one(&datalog, &datalog_preset)?;
            convert_one(&mfc, &mfc_column_preset)?;

            let state_path = state.unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME));
            LastUsedPaths::new(datalog.clone(), mfc.clone()).save(&state_path)?;
            info!(state = %state_path.display(), "conversion finished");
        }
        Commands::Process { config, state } => {
            let config = RunConfig::load(&config)
                .with_context(|| format!("failed to load run config {}", config.display()))?;
            let state_path = state.unwrap_or_else(|| PathBuf::from(STATE_FILE_NAME));
            let summary = pipeline::run(&config, &state_path)?;

            for table in [&summary.datalog, &summary.mfc] {
                println!(
                    "{}: {} rows ({} repeated timestamps, {} dropped)",
                    table.label, table.rows, table.duplicate_rows, table.dropped_rows
                );
            }
            for output in &summary.outputs {
                println!("wrote {}", output.display());
            }
        }
        Commands::Discover { dir } => {
            let discovered = discover_files(&dir)?;

            let mut table = Table::new();
            table.set_header(["Category", "File"]);
            for path in &discovered.datalog_files {
                table.add_row(vec!["datalog".to_string(), path.display().to_string()]);
            }
            for path in &discovered.mfc_files {
                table.add_row(vec!["mfc".to_string(), path.display().to_string()]);
            }
            println!("{table}");
        }
    }

    Ok(())
}

fn convert_one(path: &Path, preset: &ColumnPreset) -> Result<()> {
    info!(path = %path.display(), preset = %preset.name, "converting raw export");
    let raw = load_raw(path, preset)
        .with_context(|| format!("failed to load raw export {}", path.display()))?;

    outputs::write_parquet(&raw.df, &pipeline::parquet_sibling(path))?;
    outputs::write_csv(&raw.df, &pipeline::csv_sibling(path))?;

    info!(
        rows = raw.df.height(),
        skipped = raw.skipped_rows,
        "raw export converted"
    );
    Ok(())
}
