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

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clearsky_core::{BatchReport, IdentifierReport, RejectionReason, Series, SeriesInspection};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use serde::Serialize;

/// Formatter for pretty tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

/// Formatter for JSON export
#[derive(Debug)]
pub struct JsonFormatter;

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn format_gap(secs: Option<i64>) -> String {
    match secs {
        Some(secs) if secs >= 3600 => format!("{:.1} h", secs as f64 / 3600.0),
        Some(secs) => format!("{:.0} min", secs as f64 / 60.0),
        None => "-".to_owned(),
    }
}

impl TableFormatter {
    /// One row per PV system, failures and skipped systems below the table
    pub fn format_batch(batch: &BatchReport) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&[
            "PV system",
            "Interval",
            "Days",
            "Templates",
            "Admitted",
            "Too few\nsamples",
            "Data\ngap",
            "Boundary\nnot low",
            "Clear sky",
        ]));

        for report in batch.reports() {
            let clear = report.clear_sky_count();
            let clear_cell = if clear > 0 {
                Cell::new(clear).fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                Cell::new(clear)
            };
            table.add_row(vec![
                Cell::new(&report.identifier),
                Cell::new(report.sampling_interval),
                Cell::new(report.days.len()),
                Cell::new(report.template_count),
                Cell::new(report.admitted_count()),
                Cell::new(report.rejected_count(RejectionReason::InsufficientSamples)),
                Cell::new(report.rejected_count(RejectionReason::DataGap)),
                Cell::new(report.rejected_count(RejectionReason::BoundaryNotLow)),
                clear_cell,
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');

        for (identifier, error) in batch.failures() {
            let _ = writeln!(output, "✗ {identifier}: {error}");
        }
        if !batch.skipped.is_empty() {
            let _ = writeln!(
                output,
                "Not processed (cancelled or timed out): {}",
                batch.skipped.join(", ")
            );
        }
        output
    }

    /// Sampling summary, sample count histogram and optionally every day
    pub fn format_inspection(inspection: &SeriesInspection, with_days: bool) -> String {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "{}: {} days at {} ({} samples per full day), largest gap {}",
            inspection.identifier,
            inspection.day_count(),
            inspection.sampling_interval,
            inspection.expected_samples_per_day,
            format_gap(inspection.max_gap_secs()),
        );

        let mut histogram = Table::new();
        histogram.load_preset(UTF8_FULL);
        histogram.set_header(header(&["Samples per day", "Days", "Days with at least"]));
        let last = inspection.histogram.len().saturating_sub(1);
        for (index, bin) in inspection.histogram.iter().enumerate() {
            let range = if index == last {
                format!("{}+", bin.lower)
            } else {
                format!("{} - {}", bin.lower, bin.upper - 1)
            };
            histogram.add_row(vec![
                Cell::new(range),
                Cell::new(bin.days),
                Cell::new(bin.days_at_or_above),
            ]);
        }
        output.push_str(&histogram.to_string());
        output.push('\n');

        if with_days {
            let mut days = Table::new();
            days.load_preset(UTF8_FULL);
            days.set_header(header(&["Date", "Samples", "Largest gap", "Peak (W)"]));
            for day in &inspection.days {
                days.add_row(vec![
                    Cell::new(day.date),
                    Cell::new(day.sample_count),
                    Cell::new(format_gap(day.max_gap_secs)),
                    Cell::new(
                        day.peak_power
                            .map_or_else(|| "-".to_owned(), |p| format!("{p:.1}")),
                    ),
                ]);
            }
            output.push_str(&days.to_string());
            output.push('\n');
        }
        output
    }
}

#[derive(Debug, Serialize)]
struct DayRow<'a> {
    identifier: &'a str,
    date: NaiveDate,
    template_block: usize,
    sample_count: usize,
    verdict: &'static str,
    reason: Option<&'static str>,
    distance: Option<f64>,
    correlation: Option<f64>,
    exceedances: Option<usize>,
    clear_sky: bool,
}

fn day_rows(report: &IdentifierReport) -> impl Iterator<Item = DayRow<'_>> {
    report.days.iter().map(|day| {
        let classification = day.classification.as_ref();
        DayRow {
            identifier: &report.identifier,
            date: day.date,
            template_block: day.template_block,
            sample_count: day.sample_count,
            verdict: if day.verdict.is_admitted() {
                "admitted"
            } else {
                "rejected"
            },
            reason: day.verdict.reason().map(RejectionReason::as_str),
            distance: classification.and_then(|c| c.distance),
            correlation: classification.and_then(|c| c.correlation),
            exceedances: classification.and_then(|c| c.exceedances),
            clear_sky: day.is_clear_sky(),
        }
    })
}

#[derive(Debug, Serialize)]
struct SampleRow<'a> {
    identifier: &'a str,
    time: String,
    power: f64,
    correlation: Option<f64>,
}

impl CsvFormatter {
    /// One row per day of every successful PV system
    pub fn write_days<W: Write>(batch: &BatchReport, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        for report in batch.reports() {
            for row in day_rows(report) {
                csv.serialize(row)?;
            }
        }
        csv.flush()?;
        Ok(())
    }

    /// Input samples of the clear sky days, each with its day's correlation
    pub fn write_clear_sky_rows<W: Write>(
        batch: &BatchReport,
        inputs: &BTreeMap<String, Series>,
        writer: W,
    ) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut written = 0;

        for report in batch.reports() {
            let Some(series) = inputs.get(&report.identifier) else {
                continue;
            };
            let correlations: BTreeMap<NaiveDate, Option<f64>> = report
                .days
                .iter()
                .filter(|d| d.is_clear_sky())
                .map(|d| (d.date, d.classification.as_ref().and_then(|c| c.correlation)))
                .collect();

            for sample in series.samples() {
                if let Some(correlation) = correlations.get(&sample.timestamp.date()) {
                    csv.serialize(SampleRow {
                        identifier: &report.identifier,
                        time: sample.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                        power: sample.power,
                        correlation: *correlation,
                    })?;
                    written += 1;
                }
            }
        }
        csv.flush()?;
        Ok(written)
    }
}

#[derive(Debug, Serialize)]
struct JsonBatch<'a> {
    reports: Vec<&'a IdentifierReport>,
    failures: BTreeMap<&'a str, String>,
    skipped: &'a [String],
}

impl JsonFormatter {
    pub fn format_batch(batch: &BatchReport) -> Result<String> {
        let view = JsonBatch {
            reports: batch.reports().collect(),
            failures: batch
                .failures()
                .map(|(id, e)| (id, e.to_string()))
                .collect(),
            skipped: &batch.skipped,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }
}
