//! Inverse prediction: measured metric back to concentration

use super::fit::{polyval, FitModel, FitResult};
use crate::constants::fitting::{CUBIC_BISECTION_STEPS, DEGENERATE_EPSILON};

/// Concentration whose predicted response equals `y`
///
/// `max_level` bounds the bisection interval used for cubic calibrations.
/// Near-zero slopes and exp amplitudes are floored in magnitude with their
/// sign kept, so decreasing calibrations invert correctly.
/// Returns `None` when a quadratic calibration never reaches `y`.
pub fn concentration(fit: &FitResult, y: f64, max_level: f64) -> Option<f64> {
    let p = &fit.params;
    let linear_x = |a: f64, b: f64| (y - a) / floored(b);

    match fit.model {
        FitModel::Linear => Some(linear_x(p[0], p[1])),
        FitModel::Log => Some(linear_x(p[0], p[1]).exp()),
        FitModel::Log10 => Some(10f64.powf(linear_x(p[0], p[1]))),
        FitModel::Exp => {
            let ratio = (y / floored(p[0])).max(DEGENERATE_EPSILON);
            Some(ratio.ln() / floored(p[1]))
        }
        FitModel::Poly2 => quadratic_root(p[2], p[1], p[0] - y),
        FitModel::Poly3 => Some(bisect(p, y, max_level)),
    }
}

/// `v` with its magnitude raised to at least `DEGENERATE_EPSILON`
fn floored(v: f64) -> f64 {
    if v.abs() < DEGENERATE_EPSILON {
        DEGENERATE_EPSILON.copysign(v)
    } else {
        v
    }
}

/// Root of `a·x² + b·x + c` with the smaller magnitude
fn quadratic_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if a == 0.0 {
        return (b != 0.0).then(|| -c / b);
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let r1 = (-b + sq) / (2.0 * a);
    let r2 = (-b - sq) / (2.0 * a);
    Some(if r1.abs() < r2.abs() { r1 } else { r2 })
}

fn bisect(coeff: &[f64], y: f64, max_level: f64) -> f64 {
    let mut lo = 0.0;
    let mut hi = 2.0 * max_level.max(1.0);
    for _ in 0..CUBIC_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if polyval(coeff, mid) - y > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    0.5 * (lo + hi)
}
