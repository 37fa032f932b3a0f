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

//! Sliding window mean and median filters.
//!
//! Windows shrink at the sequence edges instead of padding, so a day curve
//! does not get an artificial drop at midnight.

use clearsky_types::{WindowFilter, WindowKind};

/// Index range `[start, end)` of the window centred on `index`
fn window_bounds(index: usize, len: usize, kernel: usize) -> (usize, usize) {
    let start = index.saturating_sub(kernel / 2);
    let end = index.saturating_add(kernel - kernel / 2).min(len);
    (start, end)
}

fn aggregate(kind: WindowKind, window: &mut [f64]) -> f64 {
    match kind {
        WindowKind::Mean => window.iter().sum::<f64>() / window.len() as f64,
        WindowKind::Median => {
            window.sort_by(f64::total_cmp);
            let mid = window.len() / 2;
            if window.len().is_multiple_of(2) {
                (window[mid - 1] + window[mid]) / 2.0
            } else {
                window[mid]
            }
        }
    }
}

/// Smooth a dense sequence. `None`, 0 and 1 return the input unchanged.
pub fn smooth(values: &[f64], kind: WindowKind, kernel: Option<usize>) -> Vec<f64> {
    let Some(kernel) = kernel.filter(|&k| k > 1) else {
        return values.to_vec();
    };

    let mut scratch = Vec::with_capacity(kernel.min(values.len()));
    (0..values.len())
        .map(|i| {
            let (start, end) = window_bounds(i, values.len(), kernel);
            scratch.clear();
            scratch.extend_from_slice(&values[start..end]);
            aggregate(kind, &mut scratch)
        })
        .collect()
}

/// Smooth a sequence with undefined entries.
///
/// Undefined entries stay undefined and are skipped inside every window.
pub fn smooth_sparse(
    values: &[Option<f64>],
    kind: WindowKind,
    kernel: Option<usize>,
) -> Vec<Option<f64>> {
    let Some(kernel) = kernel.filter(|&k| k > 1) else {
        return values.to_vec();
    };

    let mut scratch = Vec::with_capacity(kernel.min(values.len()));
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            value.and_then(|_| {
                let (start, end) = window_bounds(i, values.len(), kernel);
                scratch.clear();
                scratch.extend(values[start..end].iter().flatten());
                (!scratch.is_empty()).then(|| aggregate(kind, &mut scratch))
            })
        })
        .collect()
}

pub fn mean_window(values: &[f64], kernel: Option<usize>) -> Vec<f64> {
    smooth(values, WindowKind::Mean, kernel)
}

pub fn median_window(values: &[f64], kernel: Option<usize>) -> Vec<f64> {
    smooth(values, WindowKind::Median, kernel)
}

/// Apply a configured filter to a sparse curve
pub fn apply_filter(values: &[Option<f64>], filter: WindowFilter) -> Vec<Option<f64>> {
    smooth_sparse(values, filter.kind, Some(filter.kernel))
}
