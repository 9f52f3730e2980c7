//! Reference values and numeric guards for measurement and calibration
//!
//! This module contains compile-time constants for outlier rejection,
//! curve fitting, detection limits and report formatting.

/// Outlier rejection parameters for replicate groups
pub mod outliers {
    /// Minimum group size before the IQR fence is applied
    pub const IQR_MIN_GROUP: usize = 4;

    /// Fence multiplier applied to the interquartile range
    pub const IQR_FENCE: f64 = 1.5;

    /// Minimum group size before the Grubbs-style test is applied
    pub const GRUBBS_MIN_GROUP: usize = 3;

    /// Fixed normalized-deviation threshold (not a tabulated critical value)
    pub const GRUBBS_THRESHOLD: f64 = 2.0;

    /// Fraction trimmed from each tail by the trimmed mean
    pub const TRIM_FRACTION: f64 = 0.1;
}

/// Numeric guards for the curve fitter
pub mod fitting {
    /// Floor applied to y (or y²) when computing inverse weights
    pub const WEIGHT_EPSILON: f64 = 1e-9;

    /// Replacement for a zero determinant, SST or pivot
    pub const DEGENERATE_EPSILON: f64 = 1e-12;

    /// Floor applied to y before log-linearizing the exponential model
    pub const LOG_FLOOR: f64 = 1e-12;

    /// Minimum number of levels for any fit
    pub const MIN_LEVELS: usize = 2;

    /// Standardized residual magnitude above which a level is flagged
    pub const RESIDUAL_FLAG_SIGMA: f64 = 2.0;

    /// Bisection steps used to invert a cubic calibration
    pub const CUBIC_BISECTION_STEPS: usize = 80;
}

/// Detection and quantification limit factors
pub mod limits {
    /// LOD = 3.3 σ / |slope|
    pub const LOD_FACTOR: f64 = 3.3;

    /// LOQ = 10 σ / |slope|
    pub const LOQ_FACTOR: f64 = 10.0;

    /// Floor applied to the slope magnitude
    pub const SLOPE_FLOOR: f64 = 1e-12;
}

/// Magic-wand defaults
pub mod wand {
    /// RGB distance tolerance, percent of the full 0-255 channel range
    pub const DEFAULT_TOLERANCE_PERCENT: f64 = 15.0;
}

/// Report formatting thresholds
pub mod report {
    /// Values at or above this magnitude render in exponential form
    pub const EXP_UPPER: f64 = 1e4;

    /// Non-zero values below this magnitude render in exponential form
    pub const EXP_LOWER: f64 = 1e-3;
}
