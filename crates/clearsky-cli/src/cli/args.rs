// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "clearsky")]
#[command(version, about = "Find clear sky days in PV power time series")]
#[command(
    long_about = "Find clear sky days in PV power time series.\n\
    \nA clear sky template is built per PV system from the maximum envelope of a\n\
    window of reference days. Days passing data quality screening are compared\n\
    with the template by distance and correlation.\n\
    \nExamples:\n  \
    clearsky inspect --csv power.csv\n  \
    clearsky classify --csv power.csv --column-id module_id\n  \
    clearsky classify --csv wide.csv --wide --auto-tune --output csv --out days.csv\n  \
    clearsky classify --sqlite data.db --table pv_power --workers 4"
)]
pub struct Cli {
    /// Log every day verdict (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify every day of every PV system
    Classify(ClassifyArgs),

    /// Show sampling interval, samples per day and data gaps
    #[command(
        long_about = "Summarize the input before classification.\n\
        \nPrints the inferred sampling interval, a histogram of samples per day and the\n\
        largest data gap of every PV system. Use it to choose sample_count_tolerance,\n\
        min_samples_per_day and max_gap."
    )]
    Inspect(InspectArgs),
}

/// Where the samples come from and how to read them
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV file with the power samples
    #[arg(long, value_name = "PATH", required_unless_present = "sqlite")]
    pub csv: Option<PathBuf>,

    /// SQLite database with the power samples (requires --table)
    #[arg(long, value_name = "PATH", conflicts_with = "csv", requires = "table")]
    pub sqlite: Option<PathBuf>,

    /// Table to read from the SQLite database
    #[arg(long)]
    pub table: Option<String>,

    /// One power column per PV system instead of an identifier column
    #[arg(long, default_value_t = false)]
    pub wide: bool,

    /// TOML file with [columns] and [classifier] sections
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the timestamp column
    #[arg(long)]
    pub column_time: Option<String>,

    /// Name of the power column
    #[arg(long)]
    pub column_power: Option<String>,

    /// Name of the PV system identifier column
    #[arg(long)]
    pub column_id: Option<String>,

    /// Sampling interval in seconds; inferred from the data when omitted
    #[arg(long, value_name = "SECONDS")]
    pub sampling_interval: Option<u32>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary table per PV system
    Table,
    /// One row per day
    Csv,
    /// Full reports
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    /// Consecutive blocks of comparison-interval days
    Tumbling,
    /// First comparison-interval days only
    Leading,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Reference days per template
    #[arg(long, value_name = "DAYS")]
    pub comparison_interval: Option<usize>,

    /// Which days the templates are built from
    #[arg(long, value_enum)]
    pub reference_window: Option<WindowArg>,

    /// Multiplicative correction of the template
    #[arg(long)]
    pub percentile: Option<f64>,

    /// Largest accepted distance to the template (W)
    #[arg(long)]
    pub distance_threshold: Option<f64>,

    /// Smallest accepted correlation with the template
    #[arg(long)]
    pub correlation_threshold: Option<f64>,

    /// Fill parameters left at their defaults (kernels, max gap, minimum
    /// samples, exceedances) with the recommended values for the finest
    /// sampling interval found; values from the config file are kept
    #[arg(long, default_value_t = false)]
    pub auto_tune: bool,

    /// Process PV systems in parallel on this many workers
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Stop scheduling PV systems after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Write the output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Also write the input samples of clear sky days, with their correlation
    #[arg(long, value_name = "PATH")]
    pub export_rows: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the per-day table as well
    #[arg(long, default_value_t = false)]
    pub days: bool,
}
