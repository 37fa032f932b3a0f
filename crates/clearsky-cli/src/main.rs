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

mod cli;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use clearsky_core::{
    BatchReport, Configuration, Dispatcher, SamplingInterval, Series, infer_sampling_interval,
    inspect_series,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{
    ClassifyArgs, Cli, CliConfig, Commands, CsvFormatter, CsvSource, InputArgs, InspectArgs,
    JsonFormatter, OutputFormat, SeriesSource, SqliteSource, TableFormatter,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Classify(args) => run_classify(&args),
        Commands::Inspect(args) => run_inspect(&args),
    }
}

/// Logs go to stderr so table, CSV and JSON output stay clean on stdout.
fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set the tracing subscriber")
}

fn source(input: &InputArgs) -> Result<Box<dyn SeriesSource>> {
    match (&input.csv, &input.sqlite, &input.table) {
        (Some(path), _, _) => Ok(Box::new(CsvSource::new(path.clone(), input.wide))),
        (None, Some(path), Some(table)) => {
            Ok(Box::new(SqliteSource::new(path.clone(), table.clone())))
        }
        (None, _, _) => bail!("Either --csv or --sqlite with --table is required"),
    }
}

fn finest_interval(inputs: &BTreeMap<String, Series>) -> Option<SamplingInterval> {
    inputs
        .values()
        .filter_map(|series| infer_sampling_interval(series).ok())
        .min()
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let mut config = CliConfig::resolve(&args.input)?;
    config.apply_classify_overrides(args);
    let inputs = source(&args.input)?.load(&config.columns)?;

    if args.auto_tune {
        let interval = match config.classifier.sampling_interval()? {
            Some(interval) => Some(interval),
            None => finest_interval(&inputs),
        };
        match interval {
            Some(interval) => {
                config.classifier.apply_preset(interval);
                info!("Auto-tuned parameters for {interval} sampling");
            }
            None => warn!("Sampling interval could not be inferred, keeping configured parameters"),
        }
    }

    let exported = args.export_rows.as_ref().map(|_| inputs.clone());
    let batch = dispatch(args, config.classifier, inputs)?;
    write_output(args, &batch)?;

    if let (Some(path), Some(inputs)) = (&args.export_rows, &exported) {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let rows = CsvFormatter::write_clear_sky_rows(&batch, inputs, file)?;
        info!("Wrote {rows} clear sky samples to {}", path.display());
    }

    if batch.reports().next().is_none() {
        bail!("No PV system could be classified");
    }
    Ok(())
}

fn dispatch(
    args: &ClassifyArgs,
    config: Configuration,
    inputs: BTreeMap<String, Series>,
) -> Result<BatchReport> {
    let mut dispatcher = Dispatcher::new(config)?;
    if let Some(secs) = args.timeout {
        dispatcher = dispatcher.with_deadline(Instant::now() + Duration::from_secs(secs));
    }

    let Some(workers) = args.workers else {
        return Ok(dispatcher.run(inputs));
    };
    let dispatcher = dispatcher.with_max_workers(workers);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let batch = runtime.block_on(async {
        let cancellation = dispatcher.cancellation().clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, waiting for running PV systems to finish");
                cancellation.cancel();
            }
        });
        dispatcher.run_concurrent(inputs).await
    });
    Ok(batch)
}

fn write_output(args: &ClassifyArgs, batch: &BatchReport) -> Result<()> {
    let mut writer: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match args.output {
        OutputFormat::Table => writer.write_all(TableFormatter::format_batch(batch).as_bytes())?,
        OutputFormat::Csv => CsvFormatter::write_days(batch, &mut writer)?,
        OutputFormat::Json => writeln!(writer, "{}", JsonFormatter::format_batch(batch)?)?,
    }
    writer.flush()?;

    if let Some(path) = &args.out {
        info!("Wrote results to {}", path.display());
    }
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> Result<()> {
    let config = CliConfig::resolve(&args.input)?;
    let interval = config.classifier.sampling_interval()?;
    let inputs = source(&args.input)?.load(&config.columns)?;

    let mut stdout = io::stdout().lock();
    for (identifier, series) in &inputs {
        match inspect_series(identifier, series, interval) {
            Ok(inspection) => write!(
                stdout,
                "{}",
                TableFormatter::format_inspection(&inspection, args.days)
            )?,
            Err(e) => warn!("{identifier}: {e}"),
        }
    }
    Ok(())
}
