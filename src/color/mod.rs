//! Color conversion and region sampling module
//!
//! This module handles color space conversions and the reduction of
//! region pixels to representative color metrics.

pub mod conversion;
pub mod sampler;

pub use conversion::{CmykColor, ColorConverter, HsvColor, LabColor};
pub use sampler::{measure, Metric, Sample};
