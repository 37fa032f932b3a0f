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

//! Scoring a day curve against its template.
//!
//! Only slots defined in both curves take part. A day is clear sky when all
//! enabled rules hold (distance, correlation and optionally the per-slot
//! exceedance count); there is no weighting between them.

use clearsky_types::{
    ClassificationResult, Configuration, DistanceNormalization, Template, UndefinedComparison,
};

/// Raw similarity figures for one day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMetrics {
    pub distance: f64,
    pub correlation: f64,
    pub exceedances: Option<usize>,
    pub comparison_slots: usize,
}

/// Compare a resampled day curve with a template on the same slot grid.
pub fn compare(
    curve: &[Option<f64>],
    template: &Template,
    config: &Configuration,
) -> Result<SimilarityMetrics, UndefinedComparison> {
    let pairs: Vec<(f64, f64)> = curve
        .iter()
        .zip(template.values())
        .filter_map(|(day, reference)| Some(((*day)?, (*reference)?)))
        .collect();

    if pairs.len() < config.min_comparison_slots {
        return Err(UndefinedComparison::TooFewSlots {
            found: pairs.len(),
            required: config.min_comparison_slots,
        });
    }

    let n = pairs.len() as f64;
    let squared: f64 = pairs.iter().map(|(a, b)| (a - b).powi(2)).sum();
    let distance = match config.distance_normalization {
        DistanceNormalization::None => squared.sqrt(),
        DistanceNormalization::PerSlot => (squared / n).sqrt(),
    };

    let correlation = pearson(&pairs).ok_or(UndefinedComparison::ConstantCurve)?;

    let exceedances = config.max_point_deviation.map(|limit| {
        pairs
            .iter()
            .filter(|(a, b)| (a - b).abs() > limit)
            .count()
    });

    Ok(SimilarityMetrics {
        distance,
        correlation,
        exceedances,
        comparison_slots: pairs.len(),
    })
}

/// Pearson correlation; `None` when either side has zero variance
fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (a, b) in pairs {
        let da = a - mean_a;
        let db = b - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

/// Apply the threshold rules to a day curve.
///
/// An undefined comparison becomes a NOT clear sky result carrying the
/// diagnostic.
pub fn classify(
    curve: &[Option<f64>],
    template: &Template,
    config: &Configuration,
) -> ClassificationResult {
    match compare(curve, template, config) {
        Ok(metrics) => {
            let within_distance = metrics.distance <= config.distance_threshold;
            let correlated = metrics.correlation >= config.correlation_threshold;
            let within_exceedances = metrics
                .exceedances
                .is_none_or(|count| count <= config.max_exceedances);

            ClassificationResult {
                distance: Some(metrics.distance),
                correlation: Some(metrics.correlation),
                exceedances: metrics.exceedances,
                comparison_slots: metrics.comparison_slots,
                is_clear_sky: within_distance && correlated && within_exceedances,
                diagnostic: None,
            }
        }
        Err(diagnostic) => {
            let slots = match diagnostic {
                UndefinedComparison::TooFewSlots { found, .. } => found,
                UndefinedComparison::ConstantCurve => curve
                    .iter()
                    .zip(template.values())
                    .filter(|(a, b)| a.is_some() && b.is_some())
                    .count(),
            };
            ClassificationResult::undefined(slots, diagnostic)
        }
    }
}
