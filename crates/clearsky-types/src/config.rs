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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ClearSkyError, Result};
use crate::series::SamplingInterval;

/// Smallest reference window that still yields a usable envelope
pub const MIN_COMPARISON_INTERVAL: usize = 5;

// ============= Classifier Configuration =============

/// Parameters for one clear sky detection run.
///
/// One instance applies to every identifier of a run. Call [`validate`]
/// before use; the pipeline does it for you.
///
/// [`validate`]: Configuration::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Number of reference days per template
    pub comparison_interval: usize,

    /// Which days feed the template builder
    pub reference_window: ReferenceWindow,

    /// Explicit sampling interval (seconds); inferred from the data when unset
    pub sampling_interval_secs: Option<u32>,

    /// Mean window applied to each reference day before taking the maximum
    pub prep_smooth_kernel: Option<usize>,

    /// Mean window applied to the per-slot maximum curve
    pub smooth_kernel: Option<usize>,

    /// Multiplicative correction of the maximum envelope (e.g. 0.9 in Central Europe)
    pub percentile: f64,

    // ============= Day Quality Screening =============
    /// Allowed shortfall of samples against a full day (0.25 = 75% required)
    pub sample_count_tolerance: f64,

    /// Absolute minimum samples per day; replaces the tolerance bound when set
    pub min_samples_per_day: Option<usize>,

    /// Largest allowed spacing between samples, in sampling intervals
    pub max_gap: usize,

    /// Number of samples averaged at each end of the day
    pub boundary_window: usize,

    /// Night-time power ceiling for the first and last samples of a day
    pub low_power_threshold: LowPowerThreshold,

    // ============= Similarity Classification =============
    /// Optional filter applied to a day's curve before scoring
    pub day_prefilter: Option<WindowFilter>,

    /// Largest accepted distance to the template (Watts)
    pub distance_threshold: f64,

    pub distance_normalization: DistanceNormalization,

    /// Smallest accepted Pearson correlation with the template
    pub correlation_threshold: f64,

    /// Days with fewer overlapping slots are not scored
    pub min_comparison_slots: usize,

    /// Per-slot deviation (Watts) counted as an exceedance; `None` disables the rule
    pub max_point_deviation: Option<f64>,

    /// Largest accepted number of exceedances
    pub max_exceedances: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            comparison_interval: 30,
            reference_window: ReferenceWindow::default(),
            sampling_interval_secs: None,
            prep_smooth_kernel: Some(10),
            smooth_kernel: Some(60),
            percentile: 0.9,
            sample_count_tolerance: 0.25,
            min_samples_per_day: None,
            max_gap: 30,
            boundary_window: 1,
            low_power_threshold: LowPowerThreshold::default(),
            day_prefilter: None,
            distance_threshold: 50.0,
            distance_normalization: DistanceNormalization::default(),
            correlation_threshold: 0.98,
            min_comparison_slots: 10,
            max_point_deviation: None,
            max_exceedances: 50,
        }
    }
}

/// Selection of the days a template is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "dates", rename_all = "snake_case")]
pub enum ReferenceWindow {
    /// Consecutive blocks of `comparison_interval` days, one template each
    #[default]
    Tumbling,
    /// One template from the first `comparison_interval` days
    Leading,
    /// One template from the listed dates
    Explicit(Vec<NaiveDate>),
}

/// Ceiling for the boundary low-power check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum LowPowerThreshold {
    /// Watts
    Absolute(f64),
    /// Fraction of the day's own peak power
    RelativeToPeak(f64),
}

impl Default for LowPowerThreshold {
    fn default() -> Self {
        Self::Absolute(0.1)
    }
}

impl LowPowerThreshold {
    /// Resolve the ceiling for a day with the given peak power
    #[must_use]
    pub fn ceiling(self, peak_power: f64) -> f64 {
        match self {
            Self::Absolute(watts) => watts,
            Self::RelativeToPeak(fraction) => fraction * peak_power.max(0.0),
        }
    }

    fn raw(self) -> f64 {
        match self {
            Self::Absolute(v) | Self::RelativeToPeak(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceNormalization {
    /// Plain Euclidean distance
    None,
    /// Root-mean-square difference, comparable across sampling intervals
    #[default]
    PerSlot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Mean,
    Median,
}

/// Sliding window filter: kind plus kernel size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFilter {
    #[serde(default)]
    pub kind: WindowKind,
    pub kernel: usize,
}

impl Configuration {
    /// Check numeric ranges. Kernel sizes are unsigned and need no check.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: String) -> Result<()> {
            Err(ClearSkyError::InvalidConfiguration(msg))
        }

        if self.comparison_interval < MIN_COMPARISON_INTERVAL {
            return invalid(format!(
                "comparison_interval must be at least {MIN_COMPARISON_INTERVAL} days, got {}",
                self.comparison_interval
            ));
        }
        if let ReferenceWindow::Explicit(dates) = &self.reference_window
            && dates.len() < MIN_COMPARISON_INTERVAL
        {
            return invalid(format!(
                "explicit reference window needs at least {MIN_COMPARISON_INTERVAL} dates, got {}",
                dates.len()
            ));
        }
        if let Some(secs) = self.sampling_interval_secs {
            SamplingInterval::from_seconds(secs)?;
        }
        if !self.percentile.is_finite() || self.percentile <= 0.0 {
            return invalid(format!(
                "percentile must be a positive number, got {}",
                self.percentile
            ));
        }
        if !(0.0..1.0).contains(&self.sample_count_tolerance) {
            return invalid(format!(
                "sample_count_tolerance must be within [0, 1), got {}",
                self.sample_count_tolerance
            ));
        }
        if self.max_gap == 0 {
            return invalid("max_gap must be at least 1 sampling interval".to_owned());
        }
        if self.boundary_window == 0 {
            return invalid("boundary_window must be at least 1 sample".to_owned());
        }
        let low_power = self.low_power_threshold.raw();
        if !low_power.is_finite() || low_power < 0.0 {
            return invalid(format!(
                "low_power_threshold must be a non-negative number, got {low_power}"
            ));
        }
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return invalid(format!(
                "distance_threshold must be a non-negative number, got {}",
                self.distance_threshold
            ));
        }
        if !(-1.0..=1.0).contains(&self.correlation_threshold) {
            return invalid(format!(
                "correlation_threshold must be within [-1, 1], got {}",
                self.correlation_threshold
            ));
        }
        if self.min_comparison_slots == 0 {
            return invalid("min_comparison_slots must be at least 1".to_owned());
        }
        if let Some(deviation) = self.max_point_deviation
            && (!deviation.is_finite() || deviation < 0.0)
        {
            return invalid(format!(
                "max_point_deviation must be a non-negative number, got {deviation}"
            ));
        }
        Ok(())
    }

    /// Explicit sampling interval, if configured
    pub fn sampling_interval(&self) -> Result<Option<SamplingInterval>> {
        self.sampling_interval_secs
            .map(SamplingInterval::from_seconds)
            .transpose()
    }

    /// Fill frequency dependent parameters the caller left unset with the
    /// recommended values for the given sampling interval.
    ///
    /// A parameter counts as unset while it holds its default value.
    pub fn apply_preset(&mut self, interval: SamplingInterval) {
        let preset = ParameterPreset::for_interval(interval);
        let defaults = Self::default();

        if self.min_samples_per_day == defaults.min_samples_per_day {
            self.min_samples_per_day = Some(preset.min_samples_per_day);
        }
        if self.prep_smooth_kernel == defaults.prep_smooth_kernel {
            self.prep_smooth_kernel = Some(preset.prep_smooth_kernel);
        }
        if self.smooth_kernel == defaults.smooth_kernel {
            self.smooth_kernel = Some(preset.smooth_kernel);
        }
        if self.max_gap == defaults.max_gap {
            self.max_gap = preset.max_gap;
        }
        if self.max_exceedances == defaults.max_exceedances {
            self.max_exceedances = preset.max_exceedances;
        }
    }
}

// ============= Frequency Presets =============

/// Recommended frequency dependent parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterPreset {
    pub min_samples_per_day: usize,
    pub prep_smooth_kernel: usize,
    pub smooth_kernel: usize,
    /// Hole size limit, already converted to sampling intervals
    pub max_gap: usize,
    pub max_exceedances: usize,
}

impl ParameterPreset {
    #[must_use]
    pub fn for_interval(interval: SamplingInterval) -> Self {
        // (min samples, prep kernel, smooth kernel, hole minutes, exceedances)
        let (min_samples, prep, smooth, hole_minutes, exceedances) = match interval.seconds() {
            0..=60 => (300, 10, 60, 30, 300),
            61..=300 => (100, 5, 30, 30, 100),
            301..=600 => (70, 2, 15, 50, 70),
            601..=900 => (45, 2, 10, 60, 45),
            _ => (20, 2, 2, 120, 20),
        };

        let max_gap = (hole_minutes * 60_u32).div_ceil(interval.seconds()).max(1) as usize;

        Self {
            min_samples_per_day: min_samples,
            prep_smooth_kernel: prep,
            smooth_kernel: smooth,
            max_gap,
            max_exceedances: exceedances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.comparison_interval, 30);
        assert_eq!(config.reference_window, ReferenceWindow::Tumbling);
        assert!((config.percentile - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_comparison_interval() {
        let config = Configuration {
            comparison_interval: 4,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ClearSkyError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_validate_percentile() {
        for percentile in [0.0, -0.5, f64::NAN, f64::INFINITY] {
            let config = Configuration {
                percentile,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "percentile {percentile}");
        }
    }

    #[test]
    fn test_validate_thresholds() {
        let config = Configuration {
            correlation_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Configuration {
            distance_threshold: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Configuration {
            low_power_threshold: LowPowerThreshold::RelativeToPeak(-0.1),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Configuration {
            sample_count_tolerance: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_explicit_window() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let config = Configuration {
            reference_window: ReferenceWindow::Explicit(vec![date; 3]),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_sampling_interval() {
        let config = Configuration {
            sampling_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_low_power_ceiling() {
        assert!((LowPowerThreshold::Absolute(5.0).ceiling(1000.0) - 5.0).abs() < f64::EPSILON);
        assert!(
            (LowPowerThreshold::RelativeToPeak(0.01).ceiling(1000.0) - 10.0).abs() < f64::EPSILON
        );
        assert!(LowPowerThreshold::RelativeToPeak(0.01).ceiling(-3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_preset_tiers() {
        let minute = ParameterPreset::for_interval(SamplingInterval::from_minutes(1).unwrap());
        assert_eq!(minute.min_samples_per_day, 300);
        assert_eq!(minute.smooth_kernel, 60);
        assert_eq!(minute.max_gap, 30);

        let quarter = ParameterPreset::for_interval(SamplingInterval::from_minutes(15).unwrap());
        assert_eq!(quarter.min_samples_per_day, 45);
        assert_eq!(quarter.max_gap, 4);

        let hourly = ParameterPreset::for_interval(SamplingInterval::from_minutes(60).unwrap());
        assert_eq!(hourly.smooth_kernel, 2);
        assert_eq!(hourly.max_gap, 2);
    }

    #[test]
    fn test_apply_preset() {
        let mut config = Configuration::default();
        config.apply_preset(SamplingInterval::from_minutes(5).unwrap());
        assert_eq!(config.min_samples_per_day, Some(100));
        assert_eq!(config.prep_smooth_kernel, Some(5));
        assert_eq!(config.smooth_kernel, Some(30));
        assert_eq!(config.max_gap, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preset_keeps_user_values() {
        let mut config = Configuration {
            smooth_kernel: Some(45),
            min_samples_per_day: Some(120),
            max_gap: 3,
            ..Default::default()
        };
        config.apply_preset(SamplingInterval::from_minutes(5).unwrap());
        assert_eq!(config.smooth_kernel, Some(45));
        assert_eq!(config.min_samples_per_day, Some(120));
        assert_eq!(config.max_gap, 3);
        assert_eq!(config.prep_smooth_kernel, Some(5));
        assert_eq!(config.max_exceedances, 100);
    }

    #[test]
    fn test_toml_sections() {
        let config: Configuration = toml::from_str(
            r#"
            comparison_interval = 14
            percentile = 0.85
            smooth_kernel = 30
            reference_window = { kind = "leading" }
            low_power_threshold = { mode = "relative_to_peak", value = 0.02 }
            day_prefilter = { kind = "median", kernel = 5 }
            "#,
        )
        .unwrap();

        assert_eq!(config.comparison_interval, 14);
        assert_eq!(config.smooth_kernel, Some(30));
        assert_eq!(config.prep_smooth_kernel, Some(10));
        assert_eq!(config.reference_window, ReferenceWindow::Leading);
        assert_eq!(
            config.low_power_threshold,
            LowPowerThreshold::RelativeToPeak(0.02)
        );
        assert_eq!(
            config.day_prefilter,
            Some(WindowFilter {
                kind: WindowKind::Median,
                kernel: 5
            })
        );
    }

    #[test]
    fn test_toml_explicit_window() {
        let config: Configuration = toml::from_str(
            r#"
            reference_window = { kind = "explicit", dates = ["2025-06-01", "2025-06-02"] }
            "#,
        )
        .unwrap();
        let ReferenceWindow::Explicit(dates) = config.reference_window else {
            panic!("expected explicit window");
        };
        assert_eq!(dates.len(), 2);
    }
}
