//! Persisted calibration profiles
//!
//! A profile stores the calibration annotations of a session together with
//! the fit settings. It never stores geometry or samples: loading a profile
//! into a session only re-attaches annotations to ROIs that still exist.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::point::CalibrationPoint;
use crate::color::Metric;
use crate::config::FitConfig;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub name: String,
    pub unit: String,
    pub metric: Metric,
    /// Annotations keyed by ROI id
    pub points: BTreeMap<u32, CalibrationPoint>,
    #[serde(default)]
    pub fit: FitConfig,
}

impl CalibrationProfile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a profile from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let profile = Self::from_json_str(&content)?;
        log::debug!(
            "Loaded profile '{}' with {} points from {}",
            profile.name,
            profile.points.len(),
            path.display()
        );
        Ok(profile)
    }

    /// Save a profile to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        log::debug!("Saved profile '{}' to {}", self.name, path.display());
        Ok(())
    }
}
