//! # Scan Assay
//!
//! A Rust crate for colorimetric assays from digital photographs.
//!
//! This library turns regions of an image into quantitative measurements by:
//! - Reducing the pixels of a rectangle or circle to RGB, HSV, Lab and CMYK
//! - Growing regions of similar color from a seed pixel ("magic wand")
//! - Aggregating replicate regions per known concentration level
//! - Fitting weighted calibration curves and deriving LOD/LOQ
//! - Reading unknown concentrations back through the calibration
//!
//! ## Example
//!
//! ```rust,no_run
//! use scan_assay::{load_image, Rect, Session};
//! use std::path::Path;
//!
//! let grid = load_image(Path::new("plate.png"))?;
//! let mut session = Session::new(grid);
//! for (i, level) in [0.0, 5.0, 10.0].iter().enumerate() {
//!     let id = session.add_roi(Rect::new(40 + 60 * i as u32, 40, 30, 30))?;
//!     session.set_level(id, Some(*level))?;
//! }
//! let fit = session.fit()?;
//! let limits = session.limits(&fit);
//! println!("{} (LOD {})", fit.equation, limits.lod);
//! # Ok::<(), scan_assay::AnalysisError>(())
//! ```

use std::path::Path;

pub mod calibration;
pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod grid;
pub mod image_loader;
pub mod report;
pub mod roi;
pub mod session;

pub use calibration::{
    CalibrationPoint, CalibrationProfile, FitModel, FitResult, LimitMethod, LimitResult,
    Weighting,
};
pub use color::{Metric, Sample};
pub use config::CalibrationConfig;
pub use error::{AnalysisError, Result};
pub use grid::PixelGrid;
pub use image_loader::load_image;
pub use report::{nice, Column};
pub use roi::{Circle, Geometry, PixelRegion, Rect, Roi};
pub use session::Session;

/// Measure one region of an image file
///
/// Convenience entry point for a single measurement without a session.
///
/// # Errors
///
/// Returns `AnalysisError` if:
/// - The image cannot be loaded or decoded
/// - The region covers no pixel of the image
pub fn analyze_region(image_path: &Path, geometry: &Geometry) -> Result<Sample> {
    let grid = load_image(image_path)?;
    color::measure(&grid, geometry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serialization() {
        let sample = Sample::from_mean_rgb(51.0, 102.0, 204.0, 12);

        let json = serde_json::to_string(&sample).unwrap();
        let deserialized: Sample = serde_json::from_str(&json).unwrap();

        assert_eq!(sample, deserialized);
        assert_eq!(deserialized.hex, "#3366cc");
    }

    #[test]
    fn test_analyze_region_missing_file() {
        let geometry = Geometry::Rect(Rect::new(0, 0, 1, 1));
        let err = analyze_region(Path::new("/nonexistent/plate.png"), &geometry).unwrap_err();
        assert!(matches!(err, AnalysisError::ImageLoadError { .. }));
    }
}
