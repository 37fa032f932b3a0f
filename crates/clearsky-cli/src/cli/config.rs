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

//! TOML configuration of the command line tool.
//!
//! ```toml
//! [columns]
//! column_time = "time"
//! column_power = "power"
//! column_id = "module_id"
//!
//! [classifier]
//! comparison_interval = 30
//! percentile = 0.9
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clearsky_core::{ClearSkyError, Configuration, ReferenceWindow};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::args::{ClassifyArgs, InputArgs, WindowArg};

/// Which input fields hold the timestamp, the power and the PV system id.
///
/// Only the loaders look at this; the classifier never sees column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub column_time: String,
    pub column_power: String,
    /// `None`: the whole input is one PV system (or one per column with `--wide`)
    pub column_id: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            column_time: "time".to_owned(),
            column_power: "power".to_owned(),
            column_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub columns: ColumnMapping,
    pub classifier: Configuration,
}

impl CliConfig {
    /// Parse a TOML file. Values that do not fit their type (a negative
    /// kernel, for instance) are reported as invalid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| ClearSkyError::InvalidConfiguration(e.message().to_owned()).into())
    }

    /// File values (or defaults) with the command line input options applied
    pub fn resolve(input: &InputArgs) -> Result<Self> {
        let mut config = match &input.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_input_overrides(input);
        Ok(config)
    }

    pub fn apply_input_overrides(&mut self, input: &InputArgs) {
        if let Some(column) = &input.column_time {
            self.columns.column_time.clone_from(column);
        }
        if let Some(column) = &input.column_power {
            self.columns.column_power.clone_from(column);
        }
        if let Some(column) = &input.column_id {
            self.columns.column_id = Some(column.clone());
        }
        if let Some(secs) = input.sampling_interval {
            self.classifier.sampling_interval_secs = Some(secs);
        }
    }

    pub fn apply_classify_overrides(&mut self, args: &ClassifyArgs) {
        let classifier = &mut self.classifier;
        if let Some(days) = args.comparison_interval {
            classifier.comparison_interval = days;
        }
        if let Some(window) = args.reference_window {
            classifier.reference_window = match window {
                WindowArg::Tumbling => ReferenceWindow::Tumbling,
                WindowArg::Leading => ReferenceWindow::Leading,
            };
        }
        if let Some(percentile) = args.percentile {
            classifier.percentile = percentile;
        }
        if let Some(threshold) = args.distance_threshold {
            classifier.distance_threshold = threshold;
        }
        if let Some(threshold) = args.correlation_threshold {
            classifier.correlation_threshold = threshold;
        }
    }
}
