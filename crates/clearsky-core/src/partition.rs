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

//! Splitting a series into calendar days

use std::collections::BTreeMap;

use clearsky_types::{ClearSkyError, Day, Result, SamplingInterval, Series};

/// A series cut into days, with the interval used to align them
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedSeries {
    pub interval: SamplingInterval,
    /// Ordered by date; only dates with at least one sample
    pub days: Vec<Day>,
}

/// Most frequent spacing between consecutive samples.
///
/// Ties resolve to the smaller spacing.
pub fn infer_sampling_interval(series: &Series) -> Result<SamplingInterval> {
    if series.len() < 2 {
        return Err(ClearSkyError::InsufficientData(format!(
            "at least 2 samples needed to infer the sampling interval, got {}",
            series.len()
        )));
    }

    // Keyed by milliseconds so sub-second spacing is not truncated away
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in series.samples().windows(2) {
        let delta = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
        if delta > 0 {
            *counts.entry(delta).or_default() += 1;
        }
    }

    let mut mode: Option<(i64, usize)> = None;
    for (&delta, &count) in &counts {
        if mode.is_none_or(|(_, best)| count > best) {
            mode = Some((delta, count));
        }
    }

    let (millis, _) = mode.ok_or_else(|| {
        ClearSkyError::InsufficientData("no positive spacing between samples".to_owned())
    })?;
    if millis < 1000 {
        return Err(ClearSkyError::InsufficientData(format!(
            "dominant sample spacing of {millis}ms: sampling faster than 1 s is unsupported"
        )));
    }
    if millis.rem_euclid(1000) != 0 {
        return Err(ClearSkyError::InsufficientData(format!(
            "dominant sample spacing of {millis}ms is not a whole number of seconds, \
             set the sampling interval explicitly"
        )));
    }
    let seconds = millis.div_euclid(1000);

    u32::try_from(seconds)
        .ok()
        .and_then(|s| SamplingInterval::from_seconds(s).ok())
        .ok_or_else(|| {
            ClearSkyError::InsufficientData(format!(
                "dominant sample spacing of {seconds}s exceeds one day"
            ))
        })
}

/// Split a series into calendar days.
///
/// The override replaces the inferred interval; inference still requires two
/// samples when no override is given.
pub fn partition_days(
    series: &Series,
    interval_override: Option<SamplingInterval>,
) -> Result<PartitionedSeries> {
    let interval = match interval_override {
        Some(interval) => interval,
        None => infer_sampling_interval(series)?,
    };

    let mut days = Vec::new();
    let mut current = Vec::new();
    let mut current_date = None;

    // Series is sorted, so each date is one contiguous run
    for sample in series.samples() {
        let date = sample.timestamp.date();
        if current_date != Some(date) {
            if let Some(previous) = current_date {
                days.push(Day::new(previous, std::mem::take(&mut current)));
            }
            current_date = Some(date);
        }
        current.push(*sample);
    }
    if let Some(date) = current_date {
        days.push(Day::new(date, current));
    }

    tracing::debug!(
        "Partitioned {} samples into {} days at {interval}",
        series.len(),
        days.len()
    );

    Ok(PartitionedSeries { interval, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use clearsky_types::Sample;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series_with_steps(steps_minutes: &[i64]) -> Series {
        let mut ts = start();
        let mut samples = vec![Sample::new(ts, 0.0)];
        for step in steps_minutes {
            ts += TimeDelta::minutes(*step);
            samples.push(Sample::new(ts, 1.0));
        }
        Series::new(samples).unwrap()
    }

    #[test]
    fn test_infer_interval_mode() {
        let series = series_with_steps(&[5, 5, 5, 10, 5, 60]);
        let interval = infer_sampling_interval(&series).unwrap();
        assert_eq!(interval.seconds(), 300);
    }

    #[test]
    fn test_infer_interval_tie_prefers_smaller() {
        let series = series_with_steps(&[15, 1, 15, 1]);
        let interval = infer_sampling_interval(&series).unwrap();
        assert_eq!(interval.seconds(), 60);
    }

    #[test]
    fn test_infer_interval_needs_two_samples() {
        let series = Series::new(vec![Sample::new(start(), 1.0)]).unwrap();
        let err = infer_sampling_interval(&series).unwrap_err();
        assert!(matches!(err, ClearSkyError::InsufficientData(_)));

        let err = infer_sampling_interval(&Series::default()).unwrap_err();
        assert!(matches!(err, ClearSkyError::InsufficientData(_)));
    }

    fn series_with_millis(step: i64, count: i64) -> Series {
        let samples = (0..count)
            .map(|i| Sample::new(start() + TimeDelta::milliseconds(i * step), 1.0))
            .collect();
        Series::new(samples).unwrap()
    }

    #[test]
    fn test_infer_interval_rejects_sub_second_spacing() {
        let err = infer_sampling_interval(&series_with_millis(500, 10)).unwrap_err();
        assert!(err.to_string().contains("faster than 1 s"), "{err}");

        let err = infer_sampling_interval(&series_with_millis(1500, 10)).unwrap_err();
        assert!(err.to_string().contains("whole number of seconds"), "{err}");

        let interval = infer_sampling_interval(&series_with_millis(2000, 10)).unwrap();
        assert_eq!(interval.seconds(), 2);
    }

    #[test]
    fn test_infer_interval_longer_than_day() {
        let series = series_with_steps(&[3 * 24 * 60]);
        assert!(infer_sampling_interval(&series).is_err());
    }

    #[test]
    fn test_partition_by_date() {
        // 20:00 .. next day 04:00 at hourly steps, then a jump of two days
        let mut ts = start() + TimeDelta::hours(20);
        let mut samples = Vec::new();
        for _ in 0..9 {
            samples.push(Sample::new(ts, 0.0));
            ts += TimeDelta::hours(1);
        }
        samples.push(Sample::new(ts + TimeDelta::days(2), 0.0));
        let series = Series::new(samples).unwrap();

        let partitioned = partition_days(&series, None).unwrap();
        assert_eq!(partitioned.interval.seconds(), 3600);
        assert_eq!(partitioned.days.len(), 3);
        assert_eq!(partitioned.days[0].len(), 4);
        assert_eq!(partitioned.days[1].len(), 5);
        assert_eq!(partitioned.days[2].len(), 1);

        // Empty dates in between are never materialized
        let dates: Vec<NaiveDate> = partitioned.days.iter().map(Day::date).collect();
        assert_eq!(dates[1] - dates[0], TimeDelta::days(1));
        assert_eq!(dates[2] - dates[1], TimeDelta::days(2));
    }

    #[test]
    fn test_partition_with_override() {
        let series = Series::new(vec![Sample::new(start(), 1.0)]).unwrap();
        let interval = SamplingInterval::from_minutes(15).unwrap();
        let partitioned = partition_days(&series, Some(interval)).unwrap();
        assert_eq!(partitioned.interval, interval);
        assert_eq!(partitioned.days.len(), 1);
    }
}
