//! Detection and quantification limits
//!
//! LOD = 3.3·σ / |slope| and LOQ = 10·σ / |slope|, where σ is either the
//! residual RMSE of the fit or the standard deviation of blank replicates.

use serde::{Deserialize, Serialize};

use super::aggregate::LevelGroup;
use super::fit::FitResult;
use crate::constants::limits::{LOD_FACTOR, LOQ_FACTOR, SLOPE_FLOOR};

/// Source of the noise estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitMethod {
    /// Fit RMSE
    #[default]
    Resid,
    /// Blank replicate SD
    Blank,
    /// Blank replicate SD, labelled as the combined method
    Both,
}

impl LimitMethod {
    pub fn note(&self) -> &'static str {
        match self {
            LimitMethod::Resid => "Residual-based",
            LimitMethod::Blank => "Blank-based",
            LimitMethod::Both => "Both (blank shown)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitResult {
    pub lod: f64,
    pub loq: f64,
    pub note: String,
}

/// Compute LOD and LOQ for a fitted calibration
///
/// A missing `blank_std` counts as zero noise.
pub fn limits(fit: &FitResult, method: LimitMethod, blank_std: Option<f64>) -> LimitResult {
    let sigma = match method {
        LimitMethod::Resid => fit.rmse,
        LimitMethod::Blank | LimitMethod::Both => blank_std.unwrap_or(0.0),
    };
    let slope = fit.slope().abs().max(SLOPE_FLOOR);

    LimitResult {
        lod: LOD_FACTOR * sigma / slope,
        loq: LOQ_FACTOR * sigma / slope,
        note: method.note().to_string(),
    }
}

/// Population SD of the raw replicates at `blank_level`; 0 if no such level
pub fn blank_std(groups: &[LevelGroup], blank_level: f64) -> f64 {
    groups
        .iter()
        .find(|g| g.level == blank_level)
        .map(LevelGroup::std_dev)
        .unwrap_or(0.0)
}
