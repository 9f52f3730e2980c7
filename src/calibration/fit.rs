//! Weighted least-squares calibration curve fitting
//!
//! Supported model families:
//! - `linear`: y = a + b·x, closed-form weighted moments with standard errors
//! - `log` / `log10`: y = a + b·ln(x) (or log10), positive x only
//! - `exp`: y = a·e^(b·x), fitted on ln(y)
//! - `poly2` / `poly3`: weighted normal equations, Gaussian elimination
//!
//! Degrees of freedom differ between families: the linear family divides
//! SSE by max(1, n − 2), while `exp` and the polynomials divide by n.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::stats;
use crate::constants::fitting::{
    DEGENERATE_EPSILON, LOG_FLOOR, MIN_LEVELS, RESIDUAL_FLAG_SIGMA, WEIGHT_EPSILON,
};
use crate::error::{AnalysisError, Result};
use crate::report::nice;

/// Calibration model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitModel {
    #[default]
    Linear,
    Log,
    Log10,
    Exp,
    Poly2,
    Poly3,
}

impl FitModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitModel::Linear => "linear",
            FitModel::Log => "log",
            FitModel::Log10 => "log10",
            FitModel::Exp => "exp",
            FitModel::Poly2 => "poly2",
            FitModel::Poly3 => "poly3",
        }
    }
}

impl fmt::Display for FitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitModel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(FitModel::Linear),
            "log" => Ok(FitModel::Log),
            "log10" => Ok(FitModel::Log10),
            "exp" => Ok(FitModel::Exp),
            "poly2" => Ok(FitModel::Poly2),
            "poly3" => Ok(FitModel::Poly3),
            other => Err(AnalysisError::FitNotImplemented {
                model: other.to_string(),
            }),
        }
    }
}

/// Per-point weighting scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    #[default]
    #[serde(rename = "none")]
    None,
    /// 1 / y
    #[serde(rename = "invY")]
    InvY,
    /// 1 / y²
    #[serde(rename = "invY2")]
    InvY2,
}

impl Weighting {
    pub fn weight(&self, y: f64) -> f64 {
        match self {
            Weighting::None => 1.0,
            Weighting::InvY => 1.0 / y.max(WEIGHT_EPSILON),
            Weighting::InvY2 => 1.0 / (y * y).max(WEIGHT_EPSILON),
        }
    }
}

/// Result of fitting one model to calibration points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: FitModel,
    /// `[a, b]` for linear/log/log10/exp, ascending coefficients for polynomials
    pub params: Vec<f64>,
    /// x of the points actually used (log models drop non-positive x)
    pub x: Vec<f64>,
    /// Observed y of the points actually used
    pub y: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub r2: f64,
    pub rmse: f64,
    /// sign(slope)·√R²
    pub r: f64,
    pub se_slope: Option<f64>,
    pub se_intercept: Option<f64>,
    pub equation: String,
}

impl FitResult {
    /// Sensitivity used for detection limits
    ///
    /// Polynomials report only their linear coefficient; the exponential
    /// model reports its derivative at x = 0.
    pub fn slope(&self) -> f64 {
        match self.model {
            FitModel::Exp => self.params[0] * self.params[1],
            _ => self.params[1],
        }
    }

    /// Constant term (multiplier `a` for the exponential model)
    pub fn intercept(&self) -> f64 {
        self.params[0]
    }

    /// Evaluate the fitted curve at `x`
    pub fn predict(&self, x: f64) -> f64 {
        let p = &self.params;
        match self.model {
            FitModel::Linear => p[0] + p[1] * x,
            FitModel::Log => p[0] + p[1] * x.max(LOG_FLOOR).ln(),
            FitModel::Log10 => p[0] + p[1] * x.max(LOG_FLOOR).log10(),
            FitModel::Exp => p[0] * (p[1] * x).exp(),
            FitModel::Poly2 | FitModel::Poly3 => polyval(p, x),
        }
    }

    /// Indices of points whose standardized residual exceeds 2σ
    pub fn flagged_residuals(&self) -> Vec<usize> {
        let s = stats::std_dev(&self.residuals);
        if s == 0.0 {
            return Vec::new();
        }
        self.residuals
            .iter()
            .enumerate()
            .filter(|(_, e)| (*e / s).abs() > RESIDUAL_FLAG_SIGMA)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Fit `model` to `(x, y)` points
///
/// # Errors
///
/// Returns `AnalysisError::InsufficientData` with fewer than two points, or
/// fewer than two positive-x points for the log models.
pub fn fit(points: &[(f64, f64)], model: FitModel, weighting: Weighting) -> Result<FitResult> {
    if points.len() < MIN_LEVELS {
        return Err(AnalysisError::insufficient(
            format!("{} fit", model),
            MIN_LEVELS,
            points.len(),
        ));
    }

    let x: Vec<f64> = points.iter().map(|p| p.0).collect();
    let y: Vec<f64> = points.iter().map(|p| p.1).collect();
    let w: Vec<f64> = y.iter().map(|yi| weighting.weight(*yi)).collect();

    let result = match model {
        FitModel::Linear => {
            let lin = linear_fit(&x, &y, &w);
            let equation = format!("y = {} + {} x", nice(lin.a), nice(lin.b));
            lin.into_result(model, x, y, equation)
        }
        FitModel::Log | FitModel::Log10 => log_fit(&x, &y, &w, model)?,
        FitModel::Exp => exp_fit(x, y, &w),
        FitModel::Poly2 => poly_fit(x, y, &w, 2, model),
        FitModel::Poly3 => poly_fit(x, y, &w, 3, model),
    };

    log::debug!(
        "{} fit over {} points: {} (R² {:.6}, RMSE {:.6})",
        model,
        result.x.len(),
        result.equation,
        result.r2,
        result.rmse
    );
    Ok(result)
}

/// Fit a model given by name
///
/// # Errors
///
/// Returns `AnalysisError::FitNotImplemented` for unknown names, otherwise
/// as [`fit`].
pub fn fit_named(points: &[(f64, f64)], model: &str, weighting: Weighting) -> Result<FitResult> {
    fit(points, model.parse()?, weighting)
}

struct LinearFit {
    a: f64,
    b: f64,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    r2: f64,
    rmse: f64,
    se_slope: f64,
    se_intercept: f64,
}

impl LinearFit {
    fn into_result(self, model: FitModel, x: Vec<f64>, y: Vec<f64>, equation: String) -> FitResult {
        FitResult {
            model,
            params: vec![self.a, self.b],
            x,
            y,
            fitted: self.fitted,
            residuals: self.residuals,
            r2: self.r2,
            rmse: self.rmse,
            r: correlation(self.b, self.r2),
            se_slope: Some(self.se_slope),
            se_intercept: Some(self.se_intercept),
            equation,
        }
    }
}

fn linear_fit(x: &[f64], y: &[f64], w: &[f64]) -> LinearFit {
    let n = x.len();
    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for ((xi, yi), wi) in x.iter().zip(y).zip(w) {
        sw += wi;
        sx += wi * xi;
        sy += wi * yi;
        sxx += wi * xi * xi;
        sxy += wi * xi * yi;
    }

    let den = nonzero(sw * sxx - sx * sx);
    let a = (sy * sxx - sx * sxy) / den;
    let b = (sw * sxy - sx * sy) / den;

    let fitted: Vec<f64> = x.iter().map(|xi| a + b * xi).collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let sse = sum_sq(&residuals);
    let r2 = 1.0 - sse / total_sum_sq(y);

    let dof = n.saturating_sub(2).max(1) as f64;
    let sigma2 = sse / dof;

    LinearFit {
        a,
        b,
        fitted,
        residuals,
        r2,
        rmse: sigma2.sqrt(),
        se_slope: (sigma2 * sw / den).sqrt(),
        se_intercept: (sigma2 * sxx / den).sqrt(),
    }
}

fn log_fit(x: &[f64], y: &[f64], w: &[f64], model: FitModel) -> Result<FitResult> {
    let (mut kept_x, mut tx, mut ty, mut tw) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for ((xi, yi), wi) in x.iter().zip(y).zip(w) {
        if *xi > 0.0 && xi.is_finite() {
            kept_x.push(*xi);
            tx.push(if model == FitModel::Log { xi.ln() } else { xi.log10() });
            ty.push(*yi);
            tw.push(*wi);
        }
    }
    if tx.len() < MIN_LEVELS {
        return Err(AnalysisError::insufficient(
            format!("{} fit (positive x)", model),
            MIN_LEVELS,
            tx.len(),
        ));
    }

    let lin = linear_fit(&tx, &ty, &tw);
    let func = if model == FitModel::Log { "ln(x)" } else { "log10(x)" };
    let equation = format!("y = {} + {} {}", nice(lin.a), nice(lin.b), func);
    Ok(lin.into_result(model, kept_x, ty, equation))
}

fn exp_fit(x: Vec<f64>, y: Vec<f64>, w: &[f64]) -> FitResult {
    let ln_y: Vec<f64> = y.iter().map(|v| v.max(LOG_FLOOR).ln()).collect();
    let lin = linear_fit(&x, &ln_y, w);
    let a = lin.a.exp();
    let b = lin.b;

    let fitted: Vec<f64> = x.iter().map(|xi| a * (b * xi).exp()).collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let r2 = 1.0 - sum_sq(&residuals) / total_sum_sq(&y);
    let rmse = stats::mean(&residuals.iter().map(|e| e * e).collect::<Vec<_>>()).sqrt();

    FitResult {
        model: FitModel::Exp,
        params: vec![a, b],
        equation: format!("y = {} · e^({}x)", nice(a), nice(b)),
        x,
        y,
        fitted,
        residuals,
        r2,
        rmse,
        r: correlation(a * b, r2),
        se_slope: None,
        se_intercept: None,
    }
}

fn poly_fit(x: Vec<f64>, y: Vec<f64>, w: &[f64], degree: usize, model: FitModel) -> FitResult {
    let m = degree + 1;
    let mut lhs = vec![vec![0.0; m]; m];
    let mut rhs = vec![0.0; m];
    for ((xi, yi), wi) in x.iter().zip(&y).zip(w) {
        for r in 0..m {
            for c in 0..m {
                lhs[r][c] += wi * xi.powi((r + c) as i32);
            }
            rhs[r] += wi * yi * xi.powi(r as i32);
        }
    }

    let coeff = solve(lhs, rhs);
    let fitted: Vec<f64> = x.iter().map(|xi| polyval(&coeff, *xi)).collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(yi, fi)| yi - fi).collect();
    let r2 = 1.0 - sum_sq(&residuals) / total_sum_sq(&y);
    let rmse = stats::mean(&residuals.iter().map(|e| e * e).collect::<Vec<_>>()).sqrt();

    let terms: Vec<String> = coeff
        .iter()
        .enumerate()
        .map(|(j, c)| {
            if j == 0 {
                nice(*c)
            } else {
                format!("{} x^{}", nice(*c), j)
            }
        })
        .collect();

    FitResult {
        model,
        equation: format!("y = {}", terms.join(" + ")),
        r: correlation(coeff[1], r2),
        params: coeff,
        x,
        y,
        fitted,
        residuals,
        r2,
        rmse,
        se_slope: None,
        se_intercept: None,
    }
}

/// Gauss-Jordan elimination with partial pivoting
///
/// A zero pivot is replaced by a tiny epsilon instead of failing.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for i in 0..n {
        let mut max = i;
        for r in (i + 1)..n {
            if a[r][i].abs() > a[max][i].abs() {
                max = r;
            }
        }
        if max != i {
            a.swap(i, max);
            b.swap(i, max);
        }

        let d = nonzero(a[i][i]);
        for c in i..n {
            a[i][c] /= d;
        }
        b[i] /= d;

        for r in 0..n {
            if r == i {
                continue;
            }
            let f = a[r][i];
            for c in i..n {
                a[r][c] -= f * a[i][c];
            }
            b[r] -= f * b[i];
        }
    }
    b
}

/// Evaluate a polynomial with ascending coefficients
pub(crate) fn polyval(coeff: &[f64], x: f64) -> f64 {
    coeff
        .iter()
        .enumerate()
        .map(|(j, c)| c * x.powi(j as i32))
        .sum()
}

fn correlation(slope: f64, r2: f64) -> f64 {
    let sign = if slope > 0.0 {
        1.0
    } else if slope < 0.0 {
        -1.0
    } else {
        0.0
    };
    sign * r2.max(0.0).sqrt()
}

fn nonzero(v: f64) -> f64 {
    if v == 0.0 {
        DEGENERATE_EPSILON
    } else {
        v
    }
}

fn sum_sq(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Total sum of squares about the unweighted mean, never zero
fn total_sum_sq(y: &[f64]) -> f64 {
    let ybar = stats::mean(y);
    nonzero(y.iter().map(|v| (v - ybar) * (v - ybar)).sum())
}
