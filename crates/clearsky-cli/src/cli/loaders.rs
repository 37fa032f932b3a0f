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
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDateTime};
use clearsky_core::{DEFAULT_IDENTIFIER, Sample, Series};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::{debug, info, warn};

use super::config::ColumnMapping;

/// Accepted textual timestamp layouts, tried in order
const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a naive local timestamp, or integer Unix seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim().trim_end_matches('.');
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn parse_power(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Samples collected per identifier, in input order
#[derive(Debug, Default)]
struct Collected {
    samples: BTreeMap<String, Vec<Sample>>,
    skipped_cells: usize,
}

impl Collected {
    fn push(&mut self, identifier: &str, sample: Sample) {
        if let Some(samples) = self.samples.get_mut(identifier) {
            samples.push(sample);
        } else {
            self.samples.insert(identifier.to_owned(), vec![sample]);
        }
    }

    fn into_series(self, source: &str) -> Result<BTreeMap<String, Series>> {
        if self.skipped_cells > 0 {
            warn!(
                "{source}: skipped {} empty or non-numeric power values",
                self.skipped_cells
            );
        }
        let series = self
            .samples
            .into_iter()
            .map(|(id, samples)| {
                let series = Series::from_unsorted(samples)
                    .with_context(|| format!("{source}: invalid series for '{id}'"))?;
                debug!("{source}: '{id}' has {} samples", series.len());
                Ok((id, series))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        info!("{source}: loaded {} PV systems", series.len());
        Ok(series)
    }
}

/// Source of per-identifier power series
pub trait SeriesSource {
    fn load(&self, columns: &ColumnMapping) -> Result<BTreeMap<String, Series>>;
}

/// CSV file in long (one power column) or wide (one column per system) shape
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    wide: bool,
}

impl CsvSource {
    pub fn new(path: PathBuf, wide: bool) -> Self {
        Self { path, wide }
    }

    fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow!("Column '{name}' not found in CSV header"))
    }

    fn load_long(
        reader: &mut csv::Reader<std::fs::File>,
        columns: &ColumnMapping,
    ) -> Result<Collected> {
        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let time_idx = Self::column_index(&headers, &columns.column_time)?;
        let power_idx = Self::column_index(&headers, &columns.column_power)?;
        let id_idx = columns
            .column_id
            .as_deref()
            .map(|name| Self::column_index(&headers, name))
            .transpose()?;

        let mut collected = Collected::default();
        for (line, result) in reader.records().enumerate() {
            let record = result.context("Failed to read CSV record")?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time).with_context(|| {
                format!("Failed to parse timestamp '{raw_time}' on row {}", line + 1)
            })?;

            let Some(power) = record.get(power_idx).and_then(parse_power) else {
                collected.skipped_cells += 1;
                continue;
            };
            let identifier = match id_idx {
                Some(idx) => record.get(idx).unwrap_or_default().trim(),
                None => DEFAULT_IDENTIFIER,
            };
            collected.push(identifier, Sample::new(timestamp, power));
        }
        Ok(collected)
    }

    fn load_wide(
        reader: &mut csv::Reader<std::fs::File>,
        columns: &ColumnMapping,
    ) -> Result<Collected> {
        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let time_idx = Self::column_index(&headers, &columns.column_time)?;
        let systems: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != time_idx)
            .map(|(idx, name)| (idx, name.trim().to_owned()))
            .collect();
        if systems.is_empty() {
            bail!("Wide CSV has no power columns besides '{}'", columns.column_time);
        }

        let mut collected = Collected::default();
        for (line, result) in reader.records().enumerate() {
            let record = result.context("Failed to read CSV record")?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let timestamp = parse_timestamp(raw_time).with_context(|| {
                format!("Failed to parse timestamp '{raw_time}' on row {}", line + 1)
            })?;

            for (idx, system) in &systems {
                match record.get(*idx).and_then(parse_power) {
                    Some(power) => collected.push(system, Sample::new(timestamp, power)),
                    None => collected.skipped_cells += 1,
                }
            }
        }
        Ok(collected)
    }
}

impl SeriesSource for CsvSource {
    fn load(&self, columns: &ColumnMapping) -> Result<BTreeMap<String, Series>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file {}", self.path.display()))?;

        let collected = if self.wide {
            Self::load_wide(&mut reader, columns)?
        } else {
            Self::load_long(&mut reader, columns)?
        };
        collected.into_series(&self.path.display().to_string())
    }
}

/// Table in an SQLite database; timestamps as Unix seconds or text
#[derive(Debug, Clone)]
pub struct SqliteSource {
    path: PathBuf,
    table: String,
}

impl SqliteSource {
    pub fn new(path: PathBuf, table: String) -> Self {
        Self { path, table }
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.path)
            .with_context(|| format!("Failed to open database at {}", self.path.display()))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_timestamp(value: ValueRef<'_>) -> Option<NaiveDateTime> {
    match value {
        ValueRef::Integer(secs) => DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc()),
        ValueRef::Real(secs) if secs.is_finite() => {
            #[expect(clippy::cast_possible_truncation)]
            let whole = secs.floor() as i64;
            #[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let nanos = ((secs - secs.floor()) * 1e9) as u32;
            DateTime::from_timestamp(whole, nanos).map(|dt| dt.naive_utc())
        }
        ValueRef::Text(text) => std::str::from_utf8(text).ok().and_then(parse_timestamp),
        ValueRef::Real(_) | ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn sql_power(value: ValueRef<'_>) -> Option<f64> {
    match value {
        #[expect(clippy::cast_precision_loss)]
        ValueRef::Integer(watts) => Some(watts as f64),
        ValueRef::Real(watts) if watts.is_finite() => Some(watts),
        ValueRef::Text(text) => std::str::from_utf8(text).ok().and_then(parse_power),
        ValueRef::Real(_) | ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

fn sql_identifier(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Integer(id) => Some(id.to_string()),
        ValueRef::Text(text) => std::str::from_utf8(text).ok().map(|s| s.trim().to_owned()),
        ValueRef::Real(_) | ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

impl SeriesSource for SqliteSource {
    fn load(&self, columns: &ColumnMapping) -> Result<BTreeMap<String, Series>> {
        let conn = self.connect()?;

        let mut selected = vec![
            quote_identifier(&columns.column_time),
            quote_identifier(&columns.column_power),
        ];
        if let Some(id) = &columns.column_id {
            selected.push(quote_identifier(id));
        }
        let query = format!(
            "SELECT {} FROM {}",
            selected.join(", "),
            quote_identifier(&self.table)
        );
        let mut stmt = conn
            .prepare(&query)
            .with_context(|| format!("Failed to query table '{}'", self.table))?;

        let with_id = columns.column_id.is_some();
        let mut rows = stmt.query([])?;
        let mut collected = Collected::default();
        let mut row_number = 0_usize;
        while let Some(row) = rows.next()? {
            row_number += 1;
            let timestamp = sql_timestamp(row.get_ref(0)?)
                .with_context(|| format!("Unreadable timestamp in row {row_number}"))?;
            let Some(power) = sql_power(row.get_ref(1)?) else {
                collected.skipped_cells += 1;
                continue;
            };
            let identifier = if with_id {
                sql_identifier(row.get_ref(2)?)
                    .with_context(|| format!("Missing identifier in row {row_number}"))?
            } else {
                DEFAULT_IDENTIFIER.to_owned()
            };
            collected.push(&identifier, Sample::new(timestamp, power));
        }

        collected.into_series(&format!("{}:{}", self.path.display(), self.table))
    }
}
