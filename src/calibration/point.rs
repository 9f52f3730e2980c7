//! Per-ROI calibration annotations

use serde::{Deserialize, Serialize};

/// Calibration annotation attached to one ROI
///
/// A point without a level never takes part in aggregation, whatever
/// `include` says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub include: bool,
    pub level: Option<f64>,
    pub unit: String,
    #[serde(default)]
    pub is_blank: bool,
}

impl CalibrationPoint {
    /// Fresh annotation for a newly created ROI
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            include: true,
            level: None,
            unit: unit.into(),
            is_blank: false,
        }
    }

    /// Annotation with a known level
    pub fn at_level(level: f64, unit: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            ..Self::new(unit)
        }
    }

    /// Whether this point contributes to aggregation
    pub fn is_usable(&self) -> bool {
        self.include && self.level.is_some_and(f64::is_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_requires_level_and_include() {
        let mut point = CalibrationPoint::new("mg/L");
        assert!(!point.is_usable());

        point.level = Some(5.0);
        assert!(point.is_usable());

        point.include = false;
        assert!(!point.is_usable());

        let nan = CalibrationPoint::at_level(f64::NAN, "mg/L");
        assert!(!nan.is_usable());
    }

    #[test]
    fn test_json_field_names() {
        let point = CalibrationPoint::at_level(2.5, "ppm");
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["isBlank"], false);
        assert_eq!(json["level"], 2.5);

        let parsed: CalibrationPoint =
            serde_json::from_str(r#"{"include":true,"level":null,"unit":"ppm"}"#).unwrap();
        assert_eq!(parsed.level, None);
        assert!(!parsed.is_blank);
    }
}
