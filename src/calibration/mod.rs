//! Calibration: from per-ROI annotations to a fitted curve and limits
//!
//! The stages run in order: [`aggregate`] groups replicates per level,
//! [`transform`] applies optional axis transforms, [`fit`] fits a model,
//! [`limits`] derives LOD/LOQ and [`inverse`] maps responses back to
//! concentrations.

pub mod aggregate;
pub mod fit;
pub mod inverse;
pub mod limits;
pub mod point;
pub mod profile;
pub mod stats;
pub mod transform;

pub use aggregate::{aggregate, CentralTendency, LevelGroup, OutlierPolicy};
pub use fit::{fit, fit_named, FitModel, FitResult, Weighting};
pub use inverse::concentration;
pub use limits::{blank_std, limits, LimitMethod, LimitResult};
pub use point::CalibrationPoint;
pub use profile::CalibrationProfile;
pub use transform::{transform, AxisTransform, TransformedPoint};
