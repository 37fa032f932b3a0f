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

//! Single-identifier classification pipeline.
//!
//! partition -> reference blocks -> template per block -> screen -> score.
//! Templates are plain values handed from one stage to the next; nothing is
//! cached between calls.

use clearsky_types::{
    Configuration, Day, DayOutcome, IdentifierReport, Result, SamplingInterval, Series, Template,
};

use crate::partition::partition_days;
use crate::resample::resample_day;
use crate::screening::screen_day;
use crate::similarity::classify;
use crate::smoothing::apply_filter;
use crate::template::{build_template, reference_blocks};

/// Screen and score one day against an already built template.
pub fn evaluate_day(
    day: &Day,
    template: &Template,
    template_block: usize,
    config: &Configuration,
) -> DayOutcome {
    let interval = template.interval();
    let verdict = screen_day(day, interval, config);

    let classification = verdict.is_admitted().then(|| {
        let mut curve = resample_day(day, interval);
        if let Some(filter) = config.day_prefilter {
            curve = apply_filter(&curve, filter);
        }
        classify(&curve, template, config)
    });

    if let Some(result) = &classification {
        tracing::debug!(
            "{}: distance={:?} correlation={:?} clear_sky={}",
            day.date(),
            result.distance,
            result.correlation,
            result.is_clear_sky
        );
    }

    DayOutcome {
        date: day.date(),
        sample_count: day.len(),
        template_block,
        verdict,
        classification,
    }
}

/// Run the whole pipeline for one identifier's series.
pub fn classify_series(
    identifier: &str,
    series: &Series,
    config: &Configuration,
) -> Result<IdentifierReport> {
    config.validate()?;

    let partitioned = partition_days(series, config.sampling_interval()?)?;
    let interval: SamplingInterval = partitioned.interval;
    let blocks = reference_blocks(&partitioned.days, config)?;

    let mut days = Vec::with_capacity(partitioned.days.len());
    for (index, block) in blocks.iter().enumerate() {
        let template = build_template(&block.reference, interval, config)?;
        days.extend(
            block
                .targets
                .iter()
                .map(|day| evaluate_day(day, &template, index, config)),
        );
    }
    days.sort_by_key(|d| d.date);

    let report = IdentifierReport {
        identifier: identifier.to_owned(),
        sampling_interval: interval,
        template_count: blocks.len(),
        days,
    };

    tracing::info!(
        "{identifier}: {} days at {interval}, {} admitted, {} clear sky",
        report.days.len(),
        report.admitted_count(),
        report.clear_sky_count()
    );

    Ok(report)
}
