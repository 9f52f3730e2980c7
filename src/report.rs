//! Number formatting and CSV exports
//!
//! Two CSV documents are produced: the per-ROI results table and the
//! calibration table followed by a parameter block. Both are rendered
//! with the `csv` crate into an in-memory string.

use crate::calibration::aggregate::LevelGroup;
use crate::calibration::fit::FitResult;
use crate::calibration::limits::LimitResult;
use crate::calibration::transform::TransformedPoint;
use crate::color::Metric;
use crate::constants::report::{EXP_LOWER, EXP_UPPER};
use crate::error::Result;
use crate::roi::Roi;

/// Compact human-readable rendering of a number
///
/// Large (>= 1e4) and tiny non-zero (< 1e-3) magnitudes use exponential
/// notation with three mantissa decimals and a signed exponent
/// (`1.235e+4`). Everything else uses up to four decimals with trailing
/// zeros removed.
pub fn nice(x: f64) -> String {
    if !x.is_finite() {
        return x.to_string();
    }
    let ax = x.abs();
    if ax >= EXP_UPPER || (ax > 0.0 && ax < EXP_LOWER) {
        let s = format!("{:.3e}", x);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }

    let s = format!("{:.4}", x);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Column of the results table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Metric(Metric),
    PixelCount,
    Hex,
}

impl Column {
    /// All columns in display order
    pub const ALL: [Column; 17] = [
        Column::Id,
        Column::Metric(Metric::MeanRgb),
        Column::Metric(Metric::R),
        Column::Metric(Metric::G),
        Column::Metric(Metric::B),
        Column::Metric(Metric::H),
        Column::Metric(Metric::S),
        Column::Metric(Metric::V),
        Column::Metric(Metric::L),
        Column::Metric(Metric::LabA),
        Column::Metric(Metric::LabB),
        Column::Metric(Metric::C),
        Column::Metric(Metric::M),
        Column::Metric(Metric::Y),
        Column::Metric(Metric::K),
        Column::PixelCount,
        Column::Hex,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Metric(metric) => metric.label(),
            Column::PixelCount => "px",
            Column::Hex => "hex",
        }
    }

    fn cell(&self, roi: &Roi) -> String {
        match self {
            Column::Id => roi.id.to_string(),
            Column::Metric(metric) => nice(roi.sample.metric(*metric)),
            Column::PixelCount => roi.sample.pixel_count.to_string(),
            Column::Hex => roi.sample.hex.clone(),
        }
    }
}

/// Render the results table for `rois` in the given order
pub fn results_csv(rois: &[Roi], columns: &[Column]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(columns.iter().map(Column::header))?;
    for roi in rois {
        wtr.write_record(columns.iter().map(|c| c.cell(roi)))?;
    }
    wtr.flush()?;
    let bytes = wtr.get_ref().clone();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render the calibration table and parameter block
///
/// `points` are the fitted-space points; replicate counts and SDs are taken
/// from the level group with the same raw level.
pub fn calibration_csv(
    points: &[TransformedPoint],
    groups: &[LevelGroup],
    fit: &FitResult,
    limits: &LimitResult,
) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();

    {
        let mut wtr = csv::Writer::from_writer(&mut buf);
        wtr.write_record(["Level", "Y", "n", "SD", "Y_pred", "Residual"])?;
        for p in points {
            let group = groups.iter().find(|g| g.level == p.raw_level);
            let n = group.map_or(0, LevelGroup::n);
            let sd = match group {
                Some(g) if n > 1 => g.std_dev(),
                _ => 0.0,
            };
            let y_pred = fit.predict(p.x);
            wtr.write_record([
                p.x.to_string(),
                p.y.to_string(),
                if n > 0 { n.to_string() } else { String::new() },
                if n > 0 { nice(sd) } else { String::new() },
                nice(y_pred),
                nice(p.y - y_pred),
            ])?;
        }
        wtr.flush()?;
    }

    // A single empty field would be written as `""`
    buf.push(b'\n');

    {
        let optional = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(&mut buf);
        wtr.write_record(["--- Parameters ---"])?;
        wtr.write_record(["Model", fit.equation.as_str()])?;
        wtr.write_record([
            "Slope".to_string(),
            fit.slope().to_string(),
            "SE_Slope".to_string(),
            optional(fit.se_slope),
        ])?;
        wtr.write_record([
            "Intercept".to_string(),
            fit.intercept().to_string(),
            "SE_Intercept".to_string(),
            optional(fit.se_intercept),
        ])?;
        wtr.write_record(["Correlation (r)".to_string(), fit.r.to_string()])?;
        wtr.write_record(["R2".to_string(), fit.r2.to_string()])?;
        wtr.write_record(["RMSE".to_string(), fit.rmse.to_string()])?;
        wtr.write_record(["LOD".to_string(), limits.lod.to_string()])?;
        wtr.write_record(["LOQ".to_string(), limits.loq.to_string()])?;
        wtr.write_record(["LOQ Method", limits.note.as_str()])?;
        wtr.flush()?;
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
