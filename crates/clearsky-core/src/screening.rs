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

//! Per-day data quality screening.
//!
//! Checks run in order and the first failure decides the reason:
//! sample count, data holes, then low power at both ends of the day.

use clearsky_types::{
    Configuration, Day, QualityVerdict, RejectionReason, Sample, SamplingInterval,
};

/// Screen one day. Pure function of the day and the configuration.
pub fn screen_day(day: &Day, interval: SamplingInterval, config: &Configuration) -> QualityVerdict {
    let reason = if !has_enough_samples(day, interval, config) {
        Some(RejectionReason::InsufficientSamples)
    } else if has_data_gap(day, interval, config.max_gap) {
        Some(RejectionReason::DataGap)
    } else if !boundaries_are_low(day, config) {
        Some(RejectionReason::BoundaryNotLow)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            tracing::debug!("{} rejected: {reason} ({} samples)", day.date(), day.len());
            QualityVerdict::Rejected(reason)
        }
        None => QualityVerdict::Admitted,
    }
}

/// Minimum sample count a day needs to be admitted
#[must_use]
pub fn required_samples(interval: SamplingInterval, config: &Configuration) -> f64 {
    match config.min_samples_per_day {
        Some(min) => min as f64,
        None => interval.slots_per_day() as f64 * (1.0 - config.sample_count_tolerance),
    }
}

fn has_enough_samples(day: &Day, interval: SamplingInterval, config: &Configuration) -> bool {
    day.len() as f64 >= required_samples(interval, config)
}

fn has_data_gap(day: &Day, interval: SamplingInterval, max_gap: usize) -> bool {
    let factor = i32::try_from(max_gap).unwrap_or(i32::MAX);
    let Some(limit) = interval.as_delta().checked_mul(factor) else {
        return false;
    };
    day.max_gap().is_some_and(|gap| gap > limit)
}

fn mean_power(samples: &[Sample]) -> f64 {
    samples.iter().map(|s| s.power).sum::<f64>() / samples.len() as f64
}

fn boundaries_are_low(day: &Day, config: &Configuration) -> bool {
    let samples = day.samples();
    if samples.is_empty() {
        return false;
    }

    let window = config.boundary_window.min(samples.len());
    let ceiling = config
        .low_power_threshold
        .ceiling(day.peak_power().unwrap_or(0.0));

    let first = mean_power(&samples[..window]);
    let last = mean_power(&samples[samples.len() - window..]);
    first <= ceiling && last <= ceiling
}
