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

//! Data inspection helpers used to pick screening parameters

use chrono::NaiveDate;
use clearsky_types::{Result, SamplingInterval, Series};
use serde::Serialize;

use crate::partition::partition_days;

const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayInspection {
    pub date: NaiveDate,
    pub sample_count: usize,
    /// Largest spacing between consecutive samples, in seconds
    pub max_gap_secs: Option<i64>,
    pub peak_power: Option<f64>,
}

/// Days whose sample count falls in `[lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub lower: usize,
    pub upper: usize,
    pub days: usize,
    /// Days with at least `lower` samples
    pub days_at_or_above: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesInspection {
    pub identifier: String,
    pub sampling_interval: SamplingInterval,
    pub expected_samples_per_day: usize,
    pub histogram: Vec<HistogramBin>,
    pub days: Vec<DayInspection>,
}

impl SeriesInspection {
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Largest gap over all days, in seconds
    pub fn max_gap_secs(&self) -> Option<i64> {
        self.days.iter().filter_map(|d| d.max_gap_secs).max()
    }
}

/// Sample count histogram and per-day gaps of one series.
pub fn inspect_series(
    identifier: &str,
    series: &Series,
    interval_override: Option<SamplingInterval>,
) -> Result<SeriesInspection> {
    let partitioned = partition_days(series, interval_override)?;
    let expected = partitioned.interval.slots_per_day();

    let days: Vec<DayInspection> = partitioned
        .days
        .iter()
        .map(|day| DayInspection {
            date: day.date(),
            sample_count: day.len(),
            max_gap_secs: day.max_gap().map(|gap| gap.num_seconds()),
            peak_power: day.peak_power(),
        })
        .collect();

    let counts: Vec<usize> = days.iter().map(|d| d.sample_count).collect();

    Ok(SeriesInspection {
        identifier: identifier.to_owned(),
        sampling_interval: partitioned.interval,
        expected_samples_per_day: expected,
        histogram: histogram(&counts, expected),
        days,
    })
}

/// Equal-width bins over `[0, expected]`; fuller days land in the last bin
fn histogram(counts: &[usize], expected: usize) -> Vec<HistogramBin> {
    let width = expected.div_ceil(HISTOGRAM_BINS).max(1);
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|b| HistogramBin {
            lower: b * width,
            upper: (b + 1) * width,
            days: 0,
            days_at_or_above: 0,
        })
        .collect();

    for &count in counts {
        let index = (count / width).min(HISTOGRAM_BINS - 1);
        bins[index].days += 1;
    }

    let mut cumulative = 0;
    for bin in bins.iter_mut().rev() {
        cumulative += bin.days;
        bin.days_at_or_above = cumulative;
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use clearsky_types::Sample;

    #[test]
    fn test_histogram_bins() {
        let bins = histogram(&[0, 5, 95, 96, 120], 96);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins[0].lower, 0);
        assert_eq!(bins[0].upper, 10);
        assert_eq!(bins[0].days, 2);
        assert_eq!(bins[9].days, 3);
        assert_eq!(bins[0].days_at_or_above, 5);
        assert_eq!(bins[9].days_at_or_above, 3);
        assert_eq!(bins[5].days_at_or_above, 3);
    }

    #[test]
    fn test_inspect_reports_gaps() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut samples: Vec<Sample> = (0..48)
            .map(|i| Sample::new(start + TimeDelta::minutes(30 * i), 100.0))
            .collect();
        // Second day: only three samples, four hours apart
        for h in [0, 4, 8] {
            samples.push(Sample::new(start + TimeDelta::hours(24 + h), 50.0));
        }
        let series = Series::new(samples).unwrap();

        let inspection = inspect_series("roof", &series, None).unwrap();
        assert_eq!(inspection.sampling_interval.seconds(), 1800);
        assert_eq!(inspection.expected_samples_per_day, 48);
        assert_eq!(inspection.day_count(), 2);
        assert_eq!(inspection.days[0].max_gap_secs, Some(1800));
        assert_eq!(inspection.days[1].max_gap_secs, Some(4 * 3600));
        assert_eq!(inspection.days[1].peak_power, Some(50.0));
        assert_eq!(inspection.max_gap_secs(), Some(4 * 3600));
        assert_eq!(inspection.histogram[9].days, 1);
        assert_eq!(inspection.histogram[0].days, 1);
    }
}
