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

//! Synthetic PV days for integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, TimeDelta};
use clearsky_core::{Sample, Series};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

pub fn date(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap() + TimeDelta::days(offset)
}

/// Textbook clear sky: half sine between 06:00 and 18:00, zero at night
pub fn clear_sky_power(minute: i64, peak: f64) -> f64 {
    if (360..=1080).contains(&minute) {
        let x = (minute - 360) as f64 / 720.0;
        peak * (std::f64::consts::PI * x).sin()
    } else {
        0.0
    }
}

/// One day at 1-minute sampling with power given per minute of day
pub fn minute_day(offset: i64, power: impl Fn(i64) -> f64) -> Vec<Sample> {
    let midnight = date(offset).and_hms_opt(0, 0, 0).unwrap();
    (0..MINUTES_PER_DAY)
        .map(|m| Sample::new(midnight + TimeDelta::minutes(m), power(m)))
        .collect()
}

pub fn clear_day(offset: i64, peak: f64) -> Vec<Sample> {
    minute_day(offset, |m| clear_sky_power(m, peak))
}

/// Clear sky modulated by a 20-minute ripple of the given relative amplitude
pub fn rippled_day(offset: i64, peak: f64, amplitude: f64) -> Vec<Sample> {
    minute_day(offset, |m| {
        let ripple = (2.0 * std::f64::consts::PI * m as f64 / 20.0).sin();
        clear_sky_power(m, peak) * (1.0 + amplitude * ripple)
    })
}

/// Heavy broken cloud: power collapses for 30 of every 60 minutes
pub fn cloudy_day(offset: i64, peak: f64) -> Vec<Sample> {
    minute_day(offset, |m| {
        let shade = if (m / 30) % 2 == 0 { 1.0 } else { 0.2 };
        clear_sky_power(m, peak) * shade
    })
}

pub fn series(days: Vec<Vec<Sample>>) -> Series {
    Series::new(days.into_iter().flatten().collect()).unwrap()
}

/// `count` clear days starting at offset 0
pub fn clear_days(count: i64, peak: f64) -> Vec<Vec<Sample>> {
    (0..count).map(|d| clear_day(d, peak)).collect()
}
