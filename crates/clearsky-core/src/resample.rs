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

use clearsky_types::{Day, SamplingInterval};

/// Align a day onto the time-of-day slot grid.
///
/// Samples sharing a slot are averaged; slots without samples stay `None`.
pub fn resample_day(day: &Day, interval: SamplingInterval) -> Vec<Option<f64>> {
    let slots = interval.slots_per_day();
    let mut sums = vec![0.0; slots];
    let mut counts = vec![0_u32; slots];

    for sample in day.samples() {
        let slot = interval.slot_of(sample.timestamp).min(slots - 1);
        sums[slot] += sample.power;
        counts[slot] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| sum / f64::from(count)))
        .collect()
}
