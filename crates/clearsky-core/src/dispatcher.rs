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

//! Identifier dispatcher.
//!
//! Runs the single-identifier pipeline once per PV system. Identifiers never
//! share templates, and a failure of one identifier is recorded next to the
//! results of the others instead of aborting the batch.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::NaiveDate;
use clearsky_types::{ClearSkyError, Configuration, IdentifierReport, Result, Series};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::pipeline::classify_series;

/// Identifier used for input without an identifier column
pub const DEFAULT_IDENTIFIER: &str = "default_id";

/// Caller input: one series, or several keyed by identifier
#[derive(Debug, Clone)]
pub enum SeriesInput {
    Single(Series),
    ByIdentifier(BTreeMap<String, Series>),
}

impl SeriesInput {
    fn into_map(self) -> BTreeMap<String, Series> {
        match self {
            Self::Single(series) => BTreeMap::from([(DEFAULT_IDENTIFIER.to_owned(), series)]),
            Self::ByIdentifier(map) => map,
        }
    }
}

impl From<Series> for SeriesInput {
    fn from(series: Series) -> Self {
        Self::Single(series)
    }
}

impl From<BTreeMap<String, Series>> for SeriesInput {
    fn from(map: BTreeMap<String, Series>) -> Self {
        Self::ByIdentifier(map)
    }
}

/// Results of one dispatcher run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per identifier: the report, or why that identifier failed
    pub results: BTreeMap<String, Result<IdentifierReport>>,
    /// Identifiers never started because of cancellation or the deadline
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Clear sky dates of every successful identifier
    pub fn clear_sky_dates(&self) -> BTreeMap<&str, BTreeSet<NaiveDate>> {
        self.results
            .iter()
            .filter_map(|(id, result)| {
                result
                    .as_ref()
                    .ok()
                    .map(|report| (id.as_str(), report.clear_sky_dates()))
            })
            .collect()
    }

    pub fn reports(&self) -> impl Iterator<Item = &IdentifierReport> {
        self.results.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ClearSkyError)> {
        self.results
            .iter()
            .filter_map(|(id, r)| r.as_ref().err().map(|e| (id.as_str(), e)))
    }
}

/// Shared flag that stops scheduling further identifiers
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Configuration,
    max_workers: usize,
    deadline: Option<Instant>,
    cancellation: CancellationFlag,
}

impl Dispatcher {
    /// Validates the configuration once for the whole batch.
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            max_workers: 1,
            deadline: None,
            cancellation: CancellationFlag::new(),
        })
    }

    /// Upper bound on identifiers processed at the same time (at least 1)
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    fn should_stop(&self) -> bool {
        self.cancellation.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Process identifiers one after another, in identifier order.
    pub fn run(&self, input: impl Into<SeriesInput>) -> BatchReport {
        let mut batch = BatchReport::default();
        let mut pending = input.into().into_map().into_iter();

        for (identifier, series) in pending.by_ref() {
            if self.should_stop() {
                batch.skipped.push(identifier);
                break;
            }
            let result = classify_series(&identifier, &series, &self.config);
            log_failure(&identifier, &result);
            batch.results.insert(identifier, result);
        }

        batch.skipped.extend(pending.map(|(identifier, _)| identifier));
        log_skipped(&batch.skipped);
        batch
    }

    /// Process identifiers on the blocking pool, at most `max_workers` at a time.
    pub async fn run_concurrent(&self, input: impl Into<SeriesInput>) -> BatchReport {
        let mut batch = BatchReport::default();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut pending = input.into().into_map().into_iter();

        for (identifier, series) in pending.by_ref() {
            if self.should_stop() {
                batch.skipped.push(identifier);
                break;
            }
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                batch.skipped.push(identifier);
                break;
            };
            // Waiting for a permit may have outlasted the deadline
            if self.should_stop() {
                batch.skipped.push(identifier);
                break;
            }

            let config = self.config.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let id = identifier.clone();
                let result =
                    tokio::task::spawn_blocking(move || classify_series(&id, &series, &config))
                        .await
                        .unwrap_or_else(|e| Err(ClearSkyError::WorkerFailed(e.to_string())));
                (identifier, result)
            });
        }
        batch.skipped.extend(pending.map(|(identifier, _)| identifier));

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((identifier, result)) => {
                    log_failure(&identifier, &result);
                    batch.results.insert(identifier, result);
                }
                Err(e) => tracing::error!("Dispatcher task aborted: {e}"),
            }
        }

        log_skipped(&batch.skipped);
        batch
    }
}

fn log_failure(identifier: &str, result: &Result<IdentifierReport>) {
    if let Err(e) = result {
        tracing::warn!("{identifier}: {e}");
    }
}

fn log_skipped(skipped: &[String]) {
    if !skipped.is_empty() {
        tracing::warn!(
            "Batch stopped early, {} identifiers skipped",
            skipped.len()
        );
    }
}
