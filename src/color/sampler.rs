//! Pixel sampling: reduce the pixels inside a region to color metrics
//!
//! The sampler walks every pixel of the region (clipped to the image),
//! averages the RGB channels and derives HSV, Lab, CMYK and hex from the
//! mean color. Alpha is ignored.

use serde::{Deserialize, Serialize};

use crate::color::conversion::{CmykColor, ColorConverter, HsvColor, LabColor};
use crate::error::{AnalysisError, Result};
use crate::grid::PixelGrid;
use crate::roi::{Geometry, PixelRegion};

/// Color metrics of one region, computed once when the region is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Number of pixels averaged (always >= 1)
    pub pixel_count: usize,
    /// Mean red channel [0, 255]
    pub r: f64,
    /// Mean green channel [0, 255]
    pub g: f64,
    /// Mean blue channel [0, 255]
    pub b: f64,
    /// (r + g + b) / 3
    pub mean: f64,
    pub hsv: HsvColor,
    pub lab: LabColor,
    pub cmyk: CmykColor,
    pub hex: String,
}

impl Sample {
    /// Build a sample from mean channel values
    pub fn from_mean_rgb(r: f64, g: f64, b: f64, pixel_count: usize) -> Self {
        Self {
            pixel_count,
            r,
            g,
            b,
            mean: (r + g + b) / 3.0,
            hsv: ColorConverter::rgb_to_hsv(r, g, b),
            lab: ColorConverter::rgb_to_lab(r, g, b),
            cmyk: ColorConverter::rgb_to_cmyk(r, g, b),
            hex: ColorConverter::rgb_to_hex(r, g, b),
        }
    }

    /// Scalar value of the requested metric
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MeanRgb => self.mean,
            Metric::R => self.r,
            Metric::G => self.g,
            Metric::B => self.b,
            Metric::H => self.hsv.h,
            Metric::S => self.hsv.s,
            Metric::V => self.hsv.v,
            Metric::L => self.lab.l,
            Metric::LabA => self.lab.a,
            Metric::LabB => self.lab.b,
            Metric::C => self.cmyk.c,
            Metric::M => self.cmyk.m,
            Metric::Y => self.cmyk.y,
            Metric::K => self.cmyk.k,
        }
    }
}

/// Scalar extracted from a sample to build a calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    #[serde(rename = "meanRGB")]
    MeanRgb,
    R,
    G,
    B,
    H,
    S,
    V,
    L,
    #[serde(rename = "a")]
    LabA,
    #[serde(rename = "b")]
    LabB,
    C,
    M,
    Y,
    K,
}

impl Metric {
    /// Short label used in table headers
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MeanRgb => "Mean",
            Metric::R => "R",
            Metric::G => "G",
            Metric::B => "B",
            Metric::H => "H",
            Metric::S => "S",
            Metric::V => "V",
            Metric::L => "L*",
            Metric::LabA => "a*",
            Metric::LabB => "b*",
            Metric::C => "C",
            Metric::M => "M",
            Metric::Y => "Y",
            Metric::K => "K",
        }
    }
}

/// Measure the mean color of a region
///
/// Pixels of the region that fall outside the grid are skipped.
///
/// # Errors
///
/// Returns `AnalysisError::DegenerateGeometry` if the geometry has zero
/// extent or no pixel of it lies on the grid.
pub fn measure(grid: &PixelGrid, geometry: &Geometry) -> Result<Sample> {
    if geometry.is_degenerate() {
        return Err(AnalysisError::degenerate(format!(
            "zero-area geometry {:?}",
            geometry
        )));
    }

    let mut sums = [0u64; 3];
    let mut count = 0usize;
    geometry.for_each_pixel_within(grid.bounds(), |x, y| {
        let [r, g, b] = grid.rgb(x as u32, y as u32);
        sums[0] += u64::from(r);
        sums[1] += u64::from(g);
        sums[2] += u64::from(b);
        count += 1;
    });

    if count == 0 {
        return Err(AnalysisError::degenerate(format!(
            "{:?} does not overlap the {}x{} image",
            geometry,
            grid.width(),
            grid.height()
        )));
    }

    let n = count as f64;
    let sample = Sample::from_mean_rgb(
        sums[0] as f64 / n,
        sums[1] as f64 / n,
        sums[2] as f64 / n,
        count,
    );
    log::debug!("measured {} pixels, mean {}", count, sample.hex);
    Ok(sample)
}
