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

//! Clear sky template construction.
//!
//! The template is the empirical maximum envelope of a reference window:
//! clouds only ever lower PV power, so the highest value seen at a time of
//! day approximates the clear sky output. Raw maxima are biased high (cloud
//! edge enhancement, sensor noise), hence the smoothing and the percentile
//! correction.

use std::collections::BTreeSet;

use clearsky_types::{
    ClearSkyError, Configuration, Day, MIN_COMPARISON_INTERVAL, ReferenceWindow, Result,
    SamplingInterval, Template, WindowKind,
};

use crate::resample::resample_day;
use crate::smoothing::smooth_sparse;

/// Build one template from the given reference days.
pub fn build_template(
    reference: &[&Day],
    interval: SamplingInterval,
    config: &Configuration,
) -> Result<Template> {
    if reference.is_empty() {
        return Err(ClearSkyError::InsufficientData(
            "no reference days for template".to_owned(),
        ));
    }

    let mut envelope: Vec<Option<f64>> = vec![None; interval.slots_per_day()];
    for day in reference {
        let curve = smooth_sparse(
            &resample_day(day, interval),
            WindowKind::Mean,
            config.prep_smooth_kernel,
        );
        for (slot, value) in envelope.iter_mut().zip(curve) {
            if let Some(value) = value {
                *slot = Some(slot.map_or(value, |max| max.max(value)));
            }
        }
    }

    // Negative readings (inverter standby draw) would break non-negativity
    for value in envelope.iter_mut().flatten() {
        *value = value.max(0.0);
    }

    let values: Vec<Option<f64>> =
        smooth_sparse(&envelope, WindowKind::Mean, config.smooth_kernel)
            .into_iter()
            .map(|v| v.map(|v| v * config.percentile))
            .collect();

    let template = Template::new(interval, values);
    tracing::debug!(
        "Built template from {} days: {}/{} slots defined",
        reference.len(),
        template.defined_slots(),
        template.len()
    );
    Ok(template)
}

/// Days that share one template
#[derive(Debug, Clone)]
pub struct ReferenceBlock<'a> {
    /// Days the template is built from
    pub reference: Vec<&'a Day>,
    /// Days classified against the template
    pub targets: Vec<&'a Day>,
}

/// Group date-ordered days into reference blocks according to the configured
/// reference window.
pub fn reference_blocks<'a>(
    days: &'a [Day],
    config: &Configuration,
) -> Result<Vec<ReferenceBlock<'a>>> {
    let n = config.comparison_interval;

    match &config.reference_window {
        ReferenceWindow::Tumbling => {
            ensure_days(days.len(), n)?;
            let block_count = days.len() / n;
            let blocks = (0..block_count)
                .map(|b| {
                    let start = b * n;
                    // Trailing remainder joins the last full block
                    let end = if b + 1 == block_count {
                        days.len()
                    } else {
                        start + n
                    };
                    let block: Vec<&Day> = days[start..end].iter().collect();
                    ReferenceBlock {
                        reference: block.clone(),
                        targets: block,
                    }
                })
                .collect();
            Ok(blocks)
        }
        ReferenceWindow::Leading => {
            ensure_days(days.len(), n)?;
            Ok(vec![ReferenceBlock {
                reference: days[..n].iter().collect(),
                targets: days.iter().collect(),
            }])
        }
        ReferenceWindow::Explicit(dates) => {
            let wanted: BTreeSet<_> = dates.iter().collect();
            let reference: Vec<&Day> = days.iter().filter(|d| wanted.contains(&d.date())).collect();
            if reference.len() < MIN_COMPARISON_INTERVAL {
                return Err(ClearSkyError::InsufficientData(format!(
                    "only {} of {} reference dates present, at least {MIN_COMPARISON_INTERVAL} required",
                    reference.len(),
                    wanted.len()
                )));
            }
            Ok(vec![ReferenceBlock {
                reference,
                targets: days.iter().collect(),
            }])
        }
    }
}

fn ensure_days(available: usize, required: usize) -> Result<()> {
    if available < required {
        return Err(ClearSkyError::InsufficientData(format!(
            "comparison interval of {required} days exceeds the {available} days available"
        )));
    }
    Ok(())
}
