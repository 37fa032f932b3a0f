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

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClearSkyError, Result};

/// A single power reading of one PV system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// PV power (Watts)
    pub power: f64,
}

impl Sample {
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, power: f64) -> Self {
        Self { timestamp, power }
    }
}

/// Power readings of one PV system, strictly ascending by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Wrap already ordered samples. Fails on the first sample that does not
    /// strictly follow its predecessor.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(ClearSkyError::UnsortedSeries { index: index + 1 });
        }
        Ok(Self { samples })
    }

    /// Sort samples by timestamp first. Duplicate timestamps are still rejected.
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Result<Self> {
        samples.sort_by_key(|s| s.timestamp);
        Self::new(samples)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Dominant spacing between consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SamplingInterval {
    seconds: u32,
}

impl SamplingInterval {
    pub const DAY_SECONDS: u32 = 86_400;

    /// Interval must be between one second and one day
    pub fn from_seconds(seconds: u32) -> Result<Self> {
        if seconds == 0 || seconds > Self::DAY_SECONDS {
            return Err(ClearSkyError::InvalidConfiguration(format!(
                "sampling interval must be within 1..={} seconds, got {seconds}",
                Self::DAY_SECONDS
            )));
        }
        Ok(Self { seconds })
    }

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        Self::from_seconds(minutes.saturating_mul(60))
    }

    #[must_use]
    pub fn seconds(self) -> u32 {
        self.seconds
    }

    #[must_use]
    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.seconds))
    }

    /// Number of time-of-day slots in one day, a trailing partial slot included
    #[must_use]
    pub fn slots_per_day(self) -> usize {
        Self::DAY_SECONDS.div_ceil(self.seconds) as usize
    }

    /// Time-of-day slot of a timestamp
    #[must_use]
    pub fn slot_of(self, timestamp: NaiveDateTime) -> usize {
        (timestamp.num_seconds_from_midnight() / self.seconds) as usize
    }
}

impl TryFrom<u32> for SamplingInterval {
    type Error = ClearSkyError;

    fn try_from(seconds: u32) -> Result<Self> {
        Self::from_seconds(seconds)
    }
}

impl From<SamplingInterval> for u32 {
    fn from(interval: SamplingInterval) -> Self {
        interval.seconds
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds.is_multiple_of(60) {
            write!(f, "{}min", self.seconds / 60)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

/// All samples of one identifier that fall on one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    date: NaiveDate,
    samples: Vec<Sample>,
}

impl Day {
    #[must_use]
    pub fn new(date: NaiveDate, samples: Vec<Sample>) -> Self {
        Self { date, samples }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest power reading of the day, `None` for an empty day
    pub fn peak_power(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.power).reduce(f64::max)
    }

    /// Longest spacing between consecutive samples
    pub fn max_gap(&self) -> Option<TimeDelta> {
        self.samples
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .max()
    }
}

/// Clear sky power per time-of-day slot.
///
/// Slots never observed in the reference window are `None` and take no part
/// in any comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    interval: SamplingInterval,
    values: Vec<Option<f64>>,
}

impl Template {
    #[must_use]
    pub fn new(interval: SamplingInterval, values: Vec<Option<f64>>) -> Self {
        Self { interval, values }
    }

    #[must_use]
    pub fn interval(&self) -> SamplingInterval {
        self.interval
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn get(&self, slot: usize) -> Option<f64> {
        self.values.get(slot).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn defined_slots(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}
