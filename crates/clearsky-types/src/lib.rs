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

pub mod config;
pub mod error;
pub mod report;
pub mod series;

// Re-export common types for convenience
pub use config::{
    Configuration, DistanceNormalization, LowPowerThreshold, MIN_COMPARISON_INTERVAL,
    ParameterPreset, ReferenceWindow, WindowFilter, WindowKind,
};
pub use error::{ClearSkyError, Result, UndefinedComparison};
pub use report::{
    ClassificationResult, DayOutcome, IdentifierReport, QualityVerdict, RejectionReason,
};
pub use series::{Day, SamplingInterval, Sample, Series, Template};
