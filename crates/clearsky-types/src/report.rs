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
use std::collections::BTreeSet;
use std::fmt;

use crate::error::UndefinedComparison;
use crate::series::SamplingInterval;

/// Reason a day was not admitted to similarity scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientSamples,
    DataGap,
    BoundaryNotLow,
}

impl RejectionReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientSamples => "insufficient_samples",
            Self::DataGap => "data_gap",
            Self::BoundaryNotLow => "boundary_not_low",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum QualityVerdict {
    Admitted,
    Rejected(RejectionReason),
}

impl QualityVerdict {
    #[must_use]
    pub fn is_admitted(self) -> bool {
        matches!(self, Self::Admitted)
    }

    #[must_use]
    pub fn reason(self) -> Option<RejectionReason> {
        match self {
            Self::Admitted => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Similarity of one admitted day to its template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// `None` when the comparison was undefined
    pub distance: Option<f64>,
    pub correlation: Option<f64>,
    /// Only counted when the exceedance rule is enabled
    pub exceedances: Option<usize>,
    pub comparison_slots: usize,
    pub is_clear_sky: bool,
    pub diagnostic: Option<UndefinedComparison>,
}

impl ClassificationResult {
    /// Result for a day that could not be scored
    #[must_use]
    pub fn undefined(comparison_slots: usize, diagnostic: UndefinedComparison) -> Self {
        Self {
            distance: None,
            correlation: None,
            exceedances: None,
            comparison_slots,
            is_clear_sky: false,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Everything the pipeline decided about one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub date: NaiveDate,
    pub sample_count: usize,
    /// Index of the template (reference block) the day was scored against
    pub template_block: usize,
    pub verdict: QualityVerdict,
    /// Present for admitted days only
    pub classification: Option<ClassificationResult>,
}

impl DayOutcome {
    #[must_use]
    pub fn is_clear_sky(&self) -> bool {
        self.classification
            .as_ref()
            .is_some_and(|c| c.is_clear_sky)
    }
}

/// Per-identifier result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierReport {
    pub identifier: String,
    pub sampling_interval: SamplingInterval,
    pub template_count: usize,
    /// Ordered by date
    pub days: Vec<DayOutcome>,
}

impl IdentifierReport {
    pub fn clear_sky_dates(&self) -> BTreeSet<NaiveDate> {
        self.days
            .iter()
            .filter(|d| d.is_clear_sky())
            .map(|d| d.date)
            .collect()
    }

    pub fn clear_sky_count(&self) -> usize {
        self.days.iter().filter(|d| d.is_clear_sky()).count()
    }

    pub fn admitted_count(&self) -> usize {
        self.days.iter().filter(|d| d.verdict.is_admitted()).count()
    }

    pub fn rejected_count(&self, reason: RejectionReason) -> usize {
        self.days
            .iter()
            .filter(|d| d.verdict.reason() == Some(reason))
            .count()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayOutcome> {
        self.days.iter().find(|d| d.date == date)
    }
}
