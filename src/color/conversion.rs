//! Color space conversion utilities
//!
//! Provides the conversions reported for every measured region:
//! - RGB to HSV (hexagonal model)
//! - RGB to CIE L*a*b* under D65
//! - RGB to naive subtractive CMYK
//! - Hex color representation
//!
//! All inputs are mean channel values in [0, 255]; they are not required
//! to be integers. The Lab and HSV paths go through `palette`, whose sRGB
//! transfer function, sRGB→XYZ matrix and CIE f(t) are the standard ones
//! (0.04045 threshold, 0.008856 epsilon, D65 white 0.95047/1/1.08883).

use palette::white_point::D65;
use palette::{FromColor, Hsv, Lab, Srgb};
use serde::{Deserialize, Serialize};

/// Hue in degrees [0, 360), saturation and value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HsvColor {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// CIE L*a*b* coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabColor {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

/// Subtractive CMYK fractions in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CmykColor {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

/// Stateless color converter
pub struct ColorConverter;

impl ColorConverter {
    fn srgb(r: f64, g: f64, b: f64) -> Srgb<f64> {
        Srgb::new(r / 255.0, g / 255.0, b / 255.0)
    }

    /// Convert RGB (0-255) to HSV
    ///
    /// Saturation is 0 for black; hue is 0 for any achromatic input.
    pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> HsvColor {
        let hsv: Hsv<palette::encoding::Srgb, f64> = Hsv::from_color(Self::srgb(r, g, b));
        let mut h = hsv.hue.into_positive_degrees();
        if h >= 360.0 {
            h -= 360.0;
        }
        HsvColor {
            h,
            s: hsv.saturation,
            v: hsv.value,
        }
    }

    /// Convert RGB (0-255) to Lab color space under D65
    pub fn rgb_to_lab(r: f64, g: f64, b: f64) -> LabColor {
        let lab: Lab<D65, f64> = Lab::from_color(Self::srgb(r, g, b));
        LabColor {
            l: lab.l,
            a: lab.a,
            b: lab.b,
        }
    }

    /// Convert RGB (0-255) to CMYK
    ///
    /// Pure black short-circuits to `(0, 0, 0, 1)` so the chromatic channels
    /// never divide by zero.
    pub fn rgb_to_cmyk(r: f64, g: f64, b: f64) -> CmykColor {
        let c = 1.0 - r / 255.0;
        let m = 1.0 - g / 255.0;
        let y = 1.0 - b / 255.0;
        let k = c.min(m).min(y);
        if k >= 1.0 {
            return CmykColor {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 1.0,
            };
        }
        CmykColor {
            c: (c - k) / (1.0 - k),
            m: (m - k) / (1.0 - k),
            y: (y - k) / (1.0 - k),
            k,
        }
    }

    /// Convert RGB (0-255) to a lowercase `#rrggbb` string
    ///
    /// Channels are rounded to the nearest integer first.
    pub fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
        let byte = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b))
    }
}
