//! Region detection module
//!
//! Turns a click on the image into an ROI geometry by growing a region of
//! similar color around the clicked pixel.

pub mod region;

pub use region::{grow, RegionGrower};
