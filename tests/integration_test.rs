//! Integration tests for the measurement and calibration workflow
//!
//! These tests exercise the public API end to end:
//! - Image loading into a pixel grid
//! - Region measurement and magic-wand selection
//! - Replicate aggregation, fitting and detection limits
//! - Profile persistence and CSV reports

use approx::assert_relative_eq;
use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use scan_assay::calibration::{AxisTransform, OutlierPolicy};
use scan_assay::color::ColorConverter;
use scan_assay::{
    analyze_region, load_image, AnalysisError, CalibrationProfile, Circle, Column, FitModel,
    Geometry, LimitMethod, Metric, PixelGrid, Rect, Session,
};
use std::path::{Path, PathBuf};

/// Three 20x20 gray wells of value 10, 50 and 90 on a white 80x20 plate
fn plate() -> RgbaImage {
    RgbaImage::from_fn(80, 20, |x, _y| match x / 20 {
        0 => Rgba([10, 10, 10, 255]),
        1 => Rgba([50, 50, 50, 255]),
        2 => Rgba([90, 90, 90, 255]),
        _ => Rgba([255, 255, 255, 255]),
    })
}

fn plate_grid() -> PixelGrid {
    scan_assay::image_loader::from_rgba_image(plate()).unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("scan_assay_{}_{}", std::process::id(), name))
}

fn calibrated_session() -> Session {
    let mut session = Session::new(plate_grid());
    for (well, level) in [0.0, 5.0, 10.0].iter().enumerate() {
        let id = session
            .add_roi(Circle::new(well as u32 * 20 + 10, 10, 6))
            .unwrap();
        session.set_level(id, Some(*level)).unwrap();
    }
    session
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_analyze_region_file_not_found() {
    let geometry = Geometry::Rect(Rect::new(0, 0, 4, 4));
    let err = analyze_region(Path::new("nonexistent_file.png"), &geometry).unwrap_err();
    assert!(matches!(err, AnalysisError::ImageLoadError { .. }));
}

#[test]
fn test_unsupported_extension() {
    let err = load_image(Path::new("plate.bmp")).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
}

#[test]
fn test_region_outside_image() {
    let mut session = Session::new(plate_grid());
    let err = session.add_roi(Rect::new(200, 200, 5, 5)).unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateGeometry { .. }));
    assert!(!err.is_recoverable());
}

// ============================================================================
// Image Round Trip
// ============================================================================

#[test]
fn test_analyze_region_from_png() {
    let path = temp_path("plate.png");
    plate().save(&path).unwrap();

    let sample = analyze_region(&path, &Geometry::Rect(Rect::new(22, 2, 10, 10))).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(sample.pixel_count, 100);
    assert_relative_eq!(sample.mean, 50.0);
    assert_eq!(sample.hex, "#323232");
    assert_relative_eq!(sample.hsv.s, 0.0);
}

// ============================================================================
// Calibration Workflow
// ============================================================================

#[test]
fn test_linear_calibration_end_to_end() {
    let session = calibrated_session();

    let groups = session.aggregate();
    assert_eq!(groups.len(), 3);
    assert_relative_eq!(groups[1].value, 50.0);

    let fit = session.fit().unwrap();
    assert_relative_eq!(fit.slope(), 8.0, epsilon = 1e-9);
    assert_relative_eq!(fit.intercept(), 10.0, epsilon = 1e-9);
    assert_relative_eq!(fit.r2, 1.0, epsilon = 1e-9);
    assert!(fit.rmse.abs() < 1e-9);

    let limits = session.limits(&fit);
    assert!(limits.lod.abs() < 1e-9);
    assert!(limits.loq.abs() < 1e-9);
}

#[test]
fn test_replicates_and_outlier_rejection() {
    let mut session = calibrated_session();
    session.config_mut().aggregation.outliers = OutlierPolicy::Iqr;

    // three more replicates at level 5, one of them on the white background
    for rect in [
        Rect::new(21, 1, 4, 4),
        Rect::new(30, 12, 4, 4),
        Rect::new(65, 5, 4, 4),
    ] {
        let id = session.add_roi(rect).unwrap();
        session.set_level(id, Some(5.0)).unwrap();
    }

    let groups = session.aggregate();
    assert_eq!(groups[1].n(), 4);
    assert_eq!(groups[1].kept.len(), 3);
    assert_relative_eq!(groups[1].value, 50.0);
}

#[test]
fn test_blank_based_limits() {
    let mut session = calibrated_session();
    {
        let config = session.config_mut();
        config.fit.method = LimitMethod::Blank;
        config.fit.blank_level = Some(0.0);
    }
    // second blank replicate on a different gray
    let id = session.add_roi(Rect::new(22, 2, 3, 3)).unwrap();
    session.set_level(id, Some(0.0)).unwrap();

    let fit = session.fit().unwrap();
    let limits = session.limits(&fit);
    // blank SD of {10, 50} is 20
    let slope = fit.slope().abs();
    assert_relative_eq!(limits.lod, 3.3 * 20.0 / slope, epsilon = 1e-9);
    assert_eq!(limits.note, "Blank-based");
}

#[test]
fn test_log_transform_and_prediction() {
    let mut session = Session::new(plate_grid());
    for (well, level) in [1.0, 10.0, 100.0].iter().enumerate() {
        let id = session
            .add_roi(Rect::new(well as u32 * 20 + 5, 5, 10, 10))
            .unwrap();
        session.set_level(id, Some(*level)).unwrap();
    }
    session.config_mut().transforms.x = AxisTransform {
        log10: true,
        ..AxisTransform::default()
    };

    let fit = session.fit().unwrap();
    assert_relative_eq!(fit.slope(), 40.0, epsilon = 1e-9);

    let unknown = session.add_roi(Rect::new(25, 2, 2, 2)).unwrap();
    let conc = session.predict(unknown, Metric::MeanRgb).unwrap().unwrap();
    assert_relative_eq!(conc, 10.0, epsilon = 1e-9);
}

#[test]
fn test_unfit_model_name() {
    let err = "cubic-spline".parse::<FitModel>().unwrap_err();
    assert!(matches!(err, AnalysisError::FitNotImplemented { .. }));
}

#[test]
fn test_wand_then_calibrate() {
    let mut session = Session::new(plate_grid());
    let ids: Vec<u32> = [5u32, 25, 45]
        .iter()
        .map(|x| session.add_wand_roi(*x, 10).unwrap().unwrap())
        .collect();
    assert_eq!(
        session.roi(ids[1]).unwrap().geometry,
        Geometry::Rect(Rect::new(20, 0, 20, 20))
    );
    for (id, level) in ids.iter().zip([0.0, 1.0, 2.0]) {
        session.set_level(*id, Some(level)).unwrap();
    }
    let fit = session.fit().unwrap();
    assert_relative_eq!(fit.slope(), 40.0, epsilon = 1e-9);
}

// ============================================================================
// Persistence and Reports
// ============================================================================

#[test]
fn test_profile_file_roundtrip() {
    let session = calibrated_session();
    let profile = session.snapshot("gray wells");
    let path = temp_path("profile.json");
    profile.to_json_file(&path).unwrap();
    let loaded = CalibrationProfile::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, profile);

    let mut fresh = Session::new(plate_grid());
    for well in 0..3u32 {
        fresh.add_roi(Circle::new(well * 20 + 10, 10, 6)).unwrap();
    }
    fresh.load_profile(&loaded);
    let fit = fresh.fit().unwrap();
    assert_relative_eq!(fit.slope(), 8.0, epsilon = 1e-9);
}

#[test]
fn test_results_csv() {
    let session = calibrated_session();
    let csv = session
        .results_csv(&[Column::Id, Column::Metric(Metric::MeanRgb), Column::Hex])
        .unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["ID,Mean,hex", "1,10,#0a0a0a", "2,50,#323232", "3,90,#5a5a5a"]);
}

#[test]
fn test_calibration_csv() {
    let csv = calibrated_session().calibration_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Level,Y,n,SD,Y_pred,Residual");
    assert_eq!(lines[3], "10,90,1,0,90,0");
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "--- Parameters ---");
    assert_eq!(lines[6], "Model,y = 10 + 8 x");
    assert_eq!(lines.last().copied(), Some("LOQ Method,Residual-based"));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_conversions_stay_in_range(r in 0.0f64..=255.0, g in 0.0f64..=255.0, b in 0.0f64..=255.0) {
        let hsv = ColorConverter::rgb_to_hsv(r, g, b);
        prop_assert!(hsv.h >= 0.0 && hsv.h < 360.0);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&hsv.s));
        prop_assert!((0.0..=1.0 + 1e-12).contains(&hsv.v));

        let cmyk = ColorConverter::rgb_to_cmyk(r, g, b);
        for v in [cmyk.c, cmyk.m, cmyk.y, cmyk.k] {
            prop_assert!((-1e-12..=1.0 + 1e-12).contains(&v));
        }

        let lab = ColorConverter::rgb_to_lab(r, g, b);
        prop_assert!(lab.l >= -1e-6 && lab.l <= 100.0 + 1e-6);

        let hex = ColorConverter::rgb_to_hex(r, g, b);
        prop_assert_eq!(hex.len(), 7);
    }

    #[test]
    fn prop_uniform_region_mean_is_exact(v in 0u8..=255, w in 1u32..8, h in 1u32..8) {
        let grid = PixelGrid::filled(8, 8, [v, v, v]).unwrap();
        let sample = scan_assay::color::measure(&grid, &Geometry::Rect(Rect::new(0, 0, w, h))).unwrap();
        prop_assert_eq!(sample.pixel_count, (w * h) as usize);
        prop_assert!((sample.mean - f64::from(v)).abs() < 1e-9);
    }
}
