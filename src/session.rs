//! Measurement session: one image, its ROIs and the working calibration
//!
//! The session owns the immutable pixel grid, the ROI list in creation
//! order, the id counter and the calibration annotations. Every derived
//! quantity (aggregated levels, fit, limits, reports) is recomputed from
//! that state on demand.

use std::collections::BTreeMap;

use crate::calibration::{
    self, CalibrationPoint, CalibrationProfile, FitResult, LevelGroup,
    LimitResult, TransformedPoint,
};
use crate::color::{measure, Metric};
use crate::config::CalibrationConfig;
use crate::detection::RegionGrower;
use crate::error::{AnalysisError, Result};
use crate::grid::PixelGrid;
use crate::report::{self, Column};
use crate::roi::{Geometry, PixelRegion, Roi};

#[derive(Debug, Clone)]
pub struct Session {
    grid: PixelGrid,
    rois: Vec<Roi>,
    points: BTreeMap<u32, CalibrationPoint>,
    next_id: u32,
    config: CalibrationConfig,
}

impl Session {
    /// Start a session on `grid` with the default calibration settings
    pub fn new(grid: PixelGrid) -> Self {
        Self::with_config(grid, CalibrationConfig::default())
    }

    pub fn with_config(grid: PixelGrid, config: CalibrationConfig) -> Self {
        Self {
            grid,
            rois: Vec::new(),
            points: BTreeMap::new(),
            next_id: 1,
            config,
        }
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut CalibrationConfig {
        &mut self.config
    }

    /// Measure `geometry` and add it as a new ROI
    ///
    /// The ROI receives a fresh calibration annotation unless one is
    /// already stored under its id (for instance from a loaded profile).
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::DegenerateGeometry` if the region covers no
    /// pixel of the image. No id is consumed in that case.
    pub fn add_roi(&mut self, geometry: impl Into<Geometry>) -> Result<u32> {
        let geometry = geometry.into();
        let sample = measure(&self.grid, &geometry)?;
        let id = self.next_id;
        self.next_id += 1;

        log::info!("ROI {} added: {:?} ({} px, {})", id, geometry, sample.pixel_count, sample.hex);
        self.rois.push(Roi {
            id,
            geometry,
            sample,
        });
        let unit = self.config.unit.clone();
        self.points
            .entry(id)
            .or_insert_with(|| CalibrationPoint::new(unit));
        Ok(id)
    }

    /// Magic-wand ROI using the configured tolerance and visit budget
    pub fn add_wand_roi(&mut self, x: u32, y: u32) -> Result<Option<u32>> {
        self.add_wand_roi_with(x, y, self.config.wand.tolerance_percent)
    }

    /// Magic-wand ROI with an explicit tolerance
    ///
    /// Returns `Ok(None)` when the seed lies outside the image.
    pub fn add_wand_roi_with(&mut self, x: u32, y: u32, tolerance_percent: f64) -> Result<Option<u32>> {
        let mut grower = RegionGrower::with_tolerance(tolerance_percent);
        if let Some(limit) = self.config.wand.max_visits {
            grower = grower.with_max_visits(limit);
        }
        match grower.grow(&self.grid, x, y)? {
            Some(rect) => self.add_roi(rect).map(Some),
            None => Ok(None),
        }
    }

    /// Delete an ROI and its annotation
    pub fn remove_roi(&mut self, id: u32) -> Option<Roi> {
        let index = self.rois.iter().position(|r| r.id == id)?;
        self.points.remove(&id);
        log::debug!("ROI {} removed", id);
        Some(self.rois.remove(index))
    }

    /// Drop every ROI and annotation and restart ids at 1
    pub fn reset(&mut self) {
        self.rois.clear();
        self.points.clear();
        self.next_id = 1;
    }

    pub fn roi(&self, id: u32) -> Option<&Roi> {
        self.rois.iter().find(|r| r.id == id)
    }

    /// ROIs in creation order
    pub fn rois(&self) -> &[Roi] {
        &self.rois
    }

    /// First ROI, in creation order, whose geometry contains `(x, y)`
    pub fn roi_at(&self, x: i64, y: i64) -> Option<&Roi> {
        self.rois.iter().find(|r| r.geometry.contains(x, y))
    }

    pub fn point(&self, id: u32) -> Option<&CalibrationPoint> {
        self.points.get(&id)
    }

    pub fn point_mut(&mut self, id: u32) -> Option<&mut CalibrationPoint> {
        self.points.get_mut(&id)
    }

    /// Assign (or clear) the concentration level of an ROI
    pub fn set_level(&mut self, id: u32, level: Option<f64>) -> Result<()> {
        let point = self
            .points
            .get_mut(&id)
            .ok_or_else(|| AnalysisError::invalid("roi id", id))?;
        point.level = level;
        Ok(())
    }

    fn annotated(&self) -> impl Iterator<Item = (&Roi, &CalibrationPoint)> + '_ {
        self.rois
            .iter()
            .filter_map(move |roi| self.points.get(&roi.id).map(|p| (roi, p)))
    }

    /// Aggregate annotated ROIs into level groups
    pub fn aggregate(&self) -> Vec<LevelGroup> {
        let metric = self.config.metric;
        let agg = self.config.aggregation;
        calibration::aggregate(
            self.annotated().map(|(roi, p)| (p, roi.sample.metric(metric))),
            agg.outliers,
            agg.central_tendency,
        )
    }

    /// Aggregated levels in fitting coordinates
    pub fn transformed(&self) -> Vec<TransformedPoint> {
        let t = self.config.transforms;
        calibration::transform(&self.aggregate(), t.x, t.y)
    }

    /// Fit the configured model to the transformed levels
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InsufficientData` with fewer than two usable
    /// levels.
    pub fn fit(&self) -> Result<FitResult> {
        let points: Vec<(f64, f64)> = self.transformed().iter().map(|p| (p.x, p.y)).collect();
        calibration::fit(&points, self.config.fit.model, self.config.fit.weighting)
    }

    /// Blank noise estimate
    ///
    /// Uses the configured blank level if set, otherwise the included ROIs
    /// flagged as blanks. `None` when neither is available.
    pub fn blank_std(&self) -> Option<f64> {
        if let Some(level) = self.config.fit.blank_level {
            return Some(calibration::blank_std(&self.aggregate(), level));
        }
        let metric = self.config.metric;
        let blanks: Vec<f64> = self
            .annotated()
            .filter(|(_, p)| p.is_blank && p.include)
            .map(|(roi, _)| roi.sample.metric(metric))
            .collect();
        (!blanks.is_empty()).then(|| calibration::stats::std_dev(&blanks))
    }

    pub fn limits(&self, fit: &FitResult) -> LimitResult {
        calibration::limits(fit, self.config.fit.method, self.blank_std())
    }

    /// Concentration of ROI `id` read through the current calibration
    ///
    /// Axis transforms are applied to the metric value and undone on the
    /// result. `Ok(None)` means the calibration never reaches that value.
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidParameter` for an unknown id, or the
    /// fit error if no calibration can be fitted.
    pub fn predict(&self, id: u32, metric: Metric) -> Result<Option<f64>> {
        let roi = self
            .roi(id)
            .ok_or_else(|| AnalysisError::invalid("roi id", id))?;
        let points = self.transformed();
        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        let fit = calibration::fit(&xy, self.config.fit.model, self.config.fit.weighting)?;
        let max_level = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);

        let t = self.config.transforms;
        let Some(y) = t.y.apply(roi.sample.metric(metric)) else {
            return Ok(None);
        };
        Ok(calibration::concentration(&fit, y, max_level).and_then(|x| t.x.invert(x)))
    }

    /// Capture the working calibration as a named profile
    pub fn snapshot(&self, name: impl Into<String>) -> CalibrationProfile {
        CalibrationProfile {
            name: name.into(),
            unit: self.config.unit.clone(),
            metric: self.config.metric,
            points: self.points.clone(),
            fit: self.config.fit,
        }
    }

    /// Adopt a profile's settings and annotations
    ///
    /// Annotations for ids with no live ROI are kept but stay inert; live
    /// ROIs missing from the profile get a fresh annotation.
    pub fn load_profile(&mut self, profile: &CalibrationProfile) {
        self.config.unit = profile.unit.clone();
        self.config.metric = profile.metric;
        self.config.fit = profile.fit;
        self.points = profile.points.clone();
        for roi in &self.rois {
            self.points
                .entry(roi.id)
                .or_insert_with(|| CalibrationPoint::new(profile.unit.clone()));
        }
        log::info!(
            "Loaded profile '{}' ({} points, {} model)",
            profile.name,
            profile.points.len(),
            profile.fit.model
        );
    }

    pub fn results_csv(&self, columns: &[Column]) -> Result<String> {
        report::results_csv(&self.rois, columns)
    }

    /// Calibration table with fit parameters and limits
    pub fn calibration_csv(&self) -> Result<String> {
        let groups = self.aggregate();
        let t = self.config.transforms;
        let points = calibration::transform(&groups, t.x, t.y);
        let xy: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
        let fit = calibration::fit(&xy, self.config.fit.model, self.config.fit.weighting)?;
        let limits = self.limits(&fit);
        report::calibration_csv(&points, &groups, &fit, &limits)
    }
}
