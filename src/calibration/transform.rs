//! Optional axis transforms applied before fitting
//!
//! Each axis may enable log10, natural log and reciprocal. Enabled steps
//! run in that fixed order and may compound. A point whose value leaves a
//! step's domain is dropped.

use serde::{Deserialize, Serialize};

use super::aggregate::LevelGroup;

/// Transform steps enabled for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisTransform {
    #[serde(default)]
    pub log10: bool,
    #[serde(default)]
    pub ln: bool,
    #[serde(default)]
    pub reciprocal: bool,
}

impl AxisTransform {
    pub const IDENTITY: AxisTransform = AxisTransform {
        log10: false,
        ln: false,
        reciprocal: false,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply the enabled steps; `None` on the first domain violation
    pub fn apply(&self, value: f64) -> Option<f64> {
        let mut v = value;
        if self.log10 {
            if v <= 0.0 {
                return None;
            }
            v = v.log10();
        }
        if self.ln {
            if v <= 0.0 {
                return None;
            }
            v = v.ln();
        }
        if self.reciprocal {
            if v == 0.0 {
                return None;
            }
            v = 1.0 / v;
        }
        Some(v)
    }

    /// Undo [`apply`](Self::apply), running the steps in reverse
    pub fn invert(&self, value: f64) -> Option<f64> {
        let mut v = value;
        if self.reciprocal {
            if v == 0.0 {
                return None;
            }
            v = 1.0 / v;
        }
        if self.ln {
            v = v.exp();
        }
        if self.log10 {
            v = 10f64.powf(v);
        }
        v.is_finite().then_some(v)
    }
}

/// A fitted-space point that remembers where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformedPoint {
    pub raw_level: f64,
    pub raw_y: f64,
    pub x: f64,
    pub y: f64,
}

/// Transform aggregated levels into fitting coordinates
pub fn transform(
    levels: &[LevelGroup],
    x_axis: AxisTransform,
    y_axis: AxisTransform,
) -> Vec<TransformedPoint> {
    levels
        .iter()
        .filter_map(|group| {
            let x = x_axis.apply(group.level)?;
            let y = y_axis.apply(group.value)?;
            Some(TransformedPoint {
                raw_level: group.level,
                raw_y: group.value,
                x,
                y,
            })
        })
        .collect()
}
