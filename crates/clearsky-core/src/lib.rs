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

//! Clear sky day detection for PV power time series.
//!
//! A template of the clear sky power curve is built from the maximum envelope
//! of a window of reference days. Every day that passes data quality
//! screening is then compared with the template by distance and correlation.

pub mod dispatcher;
pub mod inspect;
pub mod partition;
pub mod pipeline;
pub mod resample;
pub mod screening;
pub mod similarity;
pub mod smoothing;
pub mod template;

pub use dispatcher::{
    BatchReport, CancellationFlag, DEFAULT_IDENTIFIER, Dispatcher, SeriesInput,
};
pub use inspect::{DayInspection, HistogramBin, SeriesInspection, inspect_series};
pub use partition::{PartitionedSeries, infer_sampling_interval, partition_days};
pub use pipeline::{classify_series, evaluate_day};
pub use resample::resample_day;
pub use screening::{required_samples, screen_day};
pub use similarity::{SimilarityMetrics, classify, compare};
pub use smoothing::{apply_filter, mean_window, median_window, smooth, smooth_sparse};
pub use template::{ReferenceBlock, build_template, reference_blocks};

pub use clearsky_types::*;
