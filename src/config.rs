//! Configuration structures for the calibration workflow.
//!
//! This module gathers every user-tunable choice that shapes a calibration:
//! the working unit and metric, replicate aggregation, axis transforms, the
//! fit model and the magic-wand defaults.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use scan_assay::CalibrationConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = CalibrationConfig::from_json_file(Path::new("calibration.json"))?;
//!
//! // Or use defaults
//! let config = CalibrationConfig::default();
//! # Ok::<(), scan_assay::AnalysisError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`AggregationConfig`]: outlier policy and central tendency per level
//! - [`TransformConfig`]: optional log/reciprocal axis transforms
//! - [`FitConfig`]: model, weighting, blank level and limit method
//! - [`WandConfig`]: region-growing tolerance and visit budget

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::aggregate::{CentralTendency, OutlierPolicy};
use crate::calibration::fit::{FitModel, Weighting};
use crate::calibration::limits::LimitMethod;
use crate::calibration::transform::AxisTransform;
use crate::color::Metric;
use crate::constants::wand::DEFAULT_TOLERANCE_PERCENT;
use crate::error::Result;

/// Default concentration unit for new calibration points
pub const DEFAULT_UNIT: &str = "mg L^-1";

/// Complete calibration configuration.
///
/// Serializable to JSON so a calibration setup can be reproduced exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Unit assigned to new calibration points
    pub unit: String,

    /// Sample scalar that feeds the calibration
    pub metric: Metric,

    pub aggregation: AggregationConfig,

    pub transforms: TransformConfig,

    pub fit: FitConfig,

    pub wand: WandConfig,
}

/// Replicate aggregation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationConfig {
    pub outliers: OutlierPolicy,
    pub central_tendency: CentralTendency,
}

/// Axis transforms applied to aggregated levels before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Concentration axis
    pub x: AxisTransform,

    /// Response axis
    pub y: AxisTransform,
}

/// Fit and detection-limit settings.
///
/// Persisted inside calibration profiles with camelCase keys.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FitConfig {
    pub model: FitModel,
    pub weighting: Weighting,

    /// Level whose replicates estimate blank noise
    ///
    /// When unset, points flagged `isBlank` are used instead.
    pub blank_level: Option<f64>,

    pub method: LimitMethod,
}

/// Magic-wand region growing defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WandConfig {
    /// RGB distance tolerance as a percentage of full scale (0-100)
    pub tolerance_percent: f64,

    /// Abort region growing once more than this many pixels match
    pub max_visits: Option<usize>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT.to_string(),
            metric: Metric::default(),
            aggregation: AggregationConfig::default(),
            transforms: TransformConfig::default(),
            fit: FitConfig::default(),
            wand: WandConfig::default(),
        }
    }
}

impl Default for WandConfig {
    fn default() -> Self {
        Self {
            tolerance_percent: DEFAULT_TOLERANCE_PERCENT,
            max_visits: None,
        }
    }
}

impl CalibrationConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        log::debug!("Loaded calibration config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
