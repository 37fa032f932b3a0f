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

//! Error types shared by the clear sky crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a day could not be scored against its template.
///
/// This is a diagnostic, not a failure: the classifier records it on the
/// day's result and marks the day as not clear sky.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedComparison {
    #[error("only {found} comparison slots, at least {required} required")]
    TooFewSlots { found: usize, required: usize },

    #[error("correlation undefined for a constant curve")]
    ConstantCurve,
}

#[derive(Debug, Error)]
pub enum ClearSkyError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Lets callers of the raw similarity scorer use `?`. The pipeline
    /// itself records undefined comparisons on the day instead.
    #[error("undefined comparison: {0}")]
    UndefinedComparison(#[from] UndefinedComparison),

    #[error("series is not strictly ascending at sample {index}")]
    UnsortedSeries { index: usize },

    #[error("worker failed: {0}")]
    WorkerFailed(String),
}

pub type Result<T> = std::result::Result<T, ClearSkyError>;
