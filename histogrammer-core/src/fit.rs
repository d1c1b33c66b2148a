//! Least-squares fitting of linear backgrounds and Gaussian peaks.
//!
//! The Gaussian uses the area-normalised form
//! `amplitude / (sigma·sqrt(2π)) · exp(-(x - center)² / (2·sigma²))`, so the
//! fitted `amplitude` is the area under the curve in x-units × counts.

use std::f64::consts::PI;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::format_float;
use crate::peak::FWHM_PER_SIGMA;
use crate::{Error, Result};

const MAX_ITERATIONS: usize = 500;
const CHI2_TOLERANCE: f64 = 1e-12;
const LAMBDA_START: f64 = 1e-3;
const LAMBDA_LIMIT: f64 = 1e14;

/// Minimum number of points a Gaussian fit accepts.
pub const MIN_GAUSSIAN_POINTS: usize = 4;

/// A fitted parameter with its standard error.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Parameter {
    /// Parameter name as shown in fit reports.
    pub name: String,
    /// Best-fit value.
    pub value: f64,
    /// One standard deviation uncertainty.
    pub stderr: f64,
}

impl Parameter {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: &str, value: f64, stderr: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            stderr,
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} +/- {}",
            self.name,
            format_float(round_to(self.value, 2)),
            format_float(round_to(self.stderr, 2))
        )
    }
}

/// Rounds to `digits` decimal places.
///
/// Rounds the exact binary value, so `1234.56785` (stored just below the
/// tie) becomes `1234.5678`.
#[must_use]
pub fn round_to(value: f64, digits: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.prec$}", prec = digits as usize)
        .parse()
        .unwrap_or(value)
}

// ─────────────────────────────────────────────────────────────
// Linear background
// ─────────────────────────────────────────────────────────────

/// Straight line `y = slope·x + intercept`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinearFit {
    pub slope: Parameter,
    pub intercept: Parameter,
}

impl LinearFit {
    /// Line value at `x`.
    #[must_use]
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope.value * x + self.intercept.value
    }
}

/// Fits a line through `(xs[i], ys[i])` by ordinary least squares.
///
/// Standard errors are zero when the line passes exactly through two points.
///
/// # Errors
/// Returns [`Error::InsufficientBackgroundPoints`] if fewer than two distinct
/// x values are supplied.
#[allow(clippy::cast_precision_loss)]
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<LinearFit> {
    let n = xs.len().min(ys.len());
    let mut distinct: Vec<f64> = xs[..n].to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(Error::InsufficientBackgroundPoints {
            distinct: distinct.len(),
        });
    }

    let nf = n as f64;
    let x_mean = xs[..n].iter().sum::<f64>() / nf;
    let y_mean = ys[..n].iter().sum::<f64>() / nf;
    let sxx: f64 = xs[..n].iter().map(|x| (x - x_mean).powi(2)).sum();
    let sxy: f64 = xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let (slope_err, intercept_err) = if n > 2 {
        let ssr: f64 = xs[..n]
            .iter()
            .zip(&ys[..n])
            .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
            .sum();
        let s2 = ssr / (nf - 2.0);
        (
            (s2 / sxx).sqrt(),
            (s2 * (1.0 / nf + x_mean * x_mean / sxx)).sqrt(),
        )
    } else {
        (0.0, 0.0)
    };

    Ok(LinearFit {
        slope: Parameter::new("slope", slope, slope_err),
        intercept: Parameter::new("intercept", intercept, intercept_err),
    })
}

// ─────────────────────────────────────────────────────────────
// Gaussian peak
// ─────────────────────────────────────────────────────────────

/// Starting values for a Gaussian fit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianGuess {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
    /// Peak height hint. Height is derived from the other three parameters,
    /// so this value is carried for reporting only.
    pub height: f64,
}

/// Area-normalised Gaussian.
#[must_use]
#[inline]
pub fn gaussian(x: f64, amplitude: f64, center: f64, sigma: f64) -> f64 {
    amplitude / (sigma * (2.0 * PI).sqrt()) * (-(x - center).powi(2) / (2.0 * sigma * sigma)).exp()
}

/// Result of a Gaussian fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaussianFit {
    pub amplitude: Parameter,
    pub center: Parameter,
    pub sigma: Parameter,
    pub fwhm: Parameter,
    pub height: Parameter,
    /// Sum of squared residuals at the solution.
    pub chi_square: f64,
    /// Levenberg-Marquardt iterations used.
    pub iterations: usize,
}

impl GaussianFit {
    /// Model value at `x`.
    #[must_use]
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        gaussian(x, self.amplitude.value, self.center.value, self.sigma.value)
    }

    /// All parameters in report order.
    #[must_use]
    pub fn parameters(&self) -> [&Parameter; 5] {
        [
            &self.amplitude,
            &self.center,
            &self.sigma,
            &self.fwhm,
            &self.height,
        ]
    }
}

type Vec3 = [f64; 3];
type Mat3 = [[f64; 3]; 3];

fn chi_square(xs: &[f64], ys: &[f64], p: &Vec3) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| (y - gaussian(x, p[0], p[1], p[2])).powi(2))
        .sum()
}

/// Builds `JᵀJ` and `Jᵀr` for the current parameters.
fn normal_equations(xs: &[f64], ys: &[f64], p: &Vec3) -> (Mat3, Vec3) {
    let mut jtj = [[0.0; 3]; 3];
    let mut jtr = [0.0; 3];
    let [amplitude, center, sigma] = *p;

    for (&x, &y) in xs.iter().zip(ys) {
        let unit = gaussian(x, 1.0, center, sigma);
        let f = amplitude * unit;
        let dx = x - center;
        let grad = [
            unit,
            f * dx / (sigma * sigma),
            f * (dx * dx / sigma.powi(3) - 1.0 / sigma),
        ];
        let r = y - f;
        for i in 0..3 {
            jtr[i] += grad[i] * r;
            for j in 0..3 {
                jtj[i][j] += grad[i] * grad[j];
            }
        }
    }
    (jtj, jtr)
}

fn invert_3x3(m: &Mat3) -> Option<Mat3> {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    if !det.is_finite() || det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
        ],
    ])
}

fn mat_vec(m: &Mat3, v: &Vec3) -> Vec3 {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Fits a Gaussian to `(xs, ys)` by Levenberg-Marquardt.
///
/// Standard errors come from the covariance `(JᵀJ)⁻¹·χ²/(n-3)`.
///
/// # Errors
/// Returns [`Error::EmptyFitRange`] with fewer than [`MIN_GAUSSIAN_POINTS`]
/// points, and [`Error::FitConvergenceError`] if the solver meets a singular
/// system, non-finite values, or runs out of iterations.
#[allow(clippy::cast_precision_loss, clippy::similar_names)]
pub fn fit_gaussian(xs: &[f64], ys: &[f64], guess: &GaussianGuess) -> Result<GaussianFit> {
    let n = xs.len().min(ys.len());
    if n < MIN_GAUSSIAN_POINTS {
        return Err(Error::EmptyFitRange { bins: n });
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let mut sigma0 = guess.sigma.abs();
    if !sigma0.is_finite() || sigma0 == 0.0 {
        let span = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            - xs.iter().copied().fold(f64::INFINITY, f64::min);
        sigma0 = span / 4.0;
        log::debug!("sigma guess unusable, starting from {sigma0}");
    }
    let mut amplitude0 = guess.amplitude;
    if amplitude0 == 0.0 || !amplitude0.is_finite() {
        amplitude0 = 1.0;
    }
    let mut p: Vec3 = [amplitude0, guess.center, sigma0];
    if p.iter().any(|v| !v.is_finite()) {
        return Err(Error::FitConvergenceError(
            "initial parameters are not finite".into(),
        ));
    }

    let mut chi2 = chi_square(xs, ys, &p);
    let mut lambda = LAMBDA_START;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let (jtj, jtr) = normal_equations(xs, ys, &p);

        let mut damped = jtj;
        for (i, row) in damped.iter_mut().enumerate() {
            row[i] += lambda * jtj[i][i].max(f64::EPSILON);
        }
        let Some(inv) = invert_3x3(&damped) else {
            return Err(Error::FitConvergenceError(
                "singular normal matrix".into(),
            ));
        };
        let delta = mat_vec(&inv, &jtr);
        let trial = [p[0] + delta[0], p[1] + delta[1], p[2] + delta[2]];

        let trial_chi2 = if trial[2] > 0.0 && trial.iter().all(|v| v.is_finite()) {
            chi_square(xs, ys, &trial)
        } else {
            f64::INFINITY
        };

        if trial_chi2 <= chi2 {
            let improvement = chi2 - trial_chi2;
            p = trial;
            chi2 = trial_chi2;
            lambda = (lambda / 10.0).max(1e-12);
            if improvement <= CHI2_TOLERANCE * chi2.max(f64::MIN_POSITIVE) {
                converged = true;
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > LAMBDA_LIMIT {
                // No direction lowers χ² any further.
                converged = true;
                break;
            }
        }
    }

    if !converged {
        return Err(Error::FitConvergenceError(format!(
            "no convergence after {MAX_ITERATIONS} iterations"
        )));
    }
    if !chi2.is_finite() {
        return Err(Error::FitConvergenceError("residuals are not finite".into()));
    }

    let (jtj, _) = normal_equations(xs, ys, &p);
    let cov_unscaled = invert_3x3(&jtj).ok_or_else(|| {
        Error::FitConvergenceError("covariance matrix is singular".into())
    })?;
    let scale = chi2 / (n - 3) as f64;
    let cov = cov_unscaled.map(|row| row.map(|v| v * scale));
    let err = |i: usize| cov[i][i].abs().sqrt();

    let [amplitude, center, sigma] = p;
    let norm = 1.0 / (sigma * (2.0 * PI).sqrt());
    let height = amplitude * norm;
    // dh/dA and dh/dσ
    let dh_da = norm;
    let dh_ds = -amplitude * norm / sigma;
    let height_var = dh_da * dh_da * cov[0][0]
        + dh_ds * dh_ds * cov[2][2]
        + 2.0 * dh_da * dh_ds * cov[0][2];

    log::debug!("gaussian fit converged in {iterations} iterations, chi2 = {chi2}");
    Ok(GaussianFit {
        amplitude: Parameter::new("amplitude", amplitude, err(0)),
        center: Parameter::new("center", center, err(1)),
        sigma: Parameter::new("sigma", sigma, err(2)),
        fwhm: Parameter::new("fwhm", FWHM_PER_SIGMA * sigma, FWHM_PER_SIGMA * err(2)),
        height: Parameter::new("height", height, height_var.abs().sqrt()),
        chi_square: chi2,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_line_through_two_points() {
        let fit = fit_line(&[10.0, 20.0], &[5.0, 15.0]).unwrap();
        assert_relative_eq!(fit.slope.value, 1.0);
        assert_relative_eq!(fit.intercept.value, -5.0);
        assert_eq!(fit.slope.stderr, 0.0);
        assert_relative_eq!(fit.evaluate(30.0), 25.0);
    }

    #[test]
    fn test_line_with_scatter_has_errors() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.1, 2.9, 5.2, 6.8, 9.1];
        let fit = fit_line(&xs, &ys).unwrap();
        assert_abs_diff_eq!(fit.slope.value, 1.99, epsilon = 1e-9);
        assert!(fit.slope.stderr > 0.0);
        assert!(fit.intercept.stderr > 0.0);
    }

    #[test]
    fn test_line_needs_two_distinct_positions() {
        assert_eq!(
            fit_line(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]),
            Err(Error::InsufficientBackgroundPoints { distinct: 1 })
        );
        assert_eq!(
            fit_line(&[], &[]),
            Err(Error::InsufficientBackgroundPoints { distinct: 0 })
        );
    }

    #[test]
    fn test_gaussian_recovers_parameters() {
        let xs: Vec<f64> = (0..60).map(|i| f64::from(i) * 0.5 + 0.25).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| gaussian(x, 800.0, 14.0, 2.5)).collect();
        let guess = GaussianGuess {
            amplitude: 500.0,
            center: 13.0,
            sigma: 3.0,
            height: 100.0,
        };
        let fit = fit_gaussian(&xs, &ys, &guess).unwrap();
        assert_relative_eq!(fit.amplitude.value, 800.0, max_relative = 1e-6);
        assert_relative_eq!(fit.center.value, 14.0, max_relative = 1e-6);
        assert_relative_eq!(fit.sigma.value, 2.5, max_relative = 1e-6);
        assert_relative_eq!(fit.fwhm.value, 2.5 * FWHM_PER_SIGMA, max_relative = 1e-6);
        assert_relative_eq!(fit.evaluate(14.0), fit.height.value, max_relative = 1e-9);
    }

    #[test]
    fn test_gaussian_too_few_points() {
        let guess = GaussianGuess {
            amplitude: 1.0,
            center: 0.0,
            sigma: 1.0,
            height: 1.0,
        };
        assert_eq!(
            fit_gaussian(&[0.0, 1.0, 2.0], &[1.0, 2.0, 1.0], &guess),
            Err(Error::EmptyFitRange { bins: 3 })
        );
    }

    #[test]
    fn test_parameter_display_rounds() {
        let p = Parameter::new("center", 101.23456, 0.0049);
        assert_eq!(p.to_string(), "center: 101.23 +/- 0.0");
        assert_relative_eq!(round_to(2.345_678, 4), 2.3457);
    }

    #[test]
    fn test_round_to_uses_exact_value() {
        assert_eq!(round_to(1234.56785, 4), 1234.5678);
        assert_eq!(round_to(100.12345, 4), 100.1235);
        assert_eq!(round_to(-2.5e-7, 4), 0.0);
        assert!(round_to(f64::NAN, 2).is_nan());
        assert_eq!(round_to(f64::INFINITY, 2), f64::INFINITY);
    }
}
