//! Small numeric helpers shared by the binner, the peak model and the fitters.

/// Absolute tolerance used by [`integrate`].
pub const INTEGRATION_TOLERANCE: f64 = 1e-10;

const MAX_SIMPSON_DEPTH: u32 = 50;

/// Integrate `f` over `[a, b]` with adaptive Simpson quadrature.
///
/// Returns 0 for an empty interval. The sign follows the orientation of the
/// bounds, so `integrate(f, b, a) == -integrate(f, a, b)`.
pub fn integrate<F>(f: F, a: f64, b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    adaptive_simpson(&f, a, b, fa, fm, fb, whole, INTEGRATION_TOLERANCE, MAX_SIMPSON_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adaptive_simpson<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tol: f64,
    depth: u32,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tol {
        // Richardson extrapolation
        return left + right + delta / 15.0;
    }

    adaptive_simpson(f, a, m, fa, flm, fm, left, tol / 2.0, depth - 1)
        + adaptive_simpson(f, m, b, fm, frm, fb, right, tol / 2.0, depth - 1)
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Index of the value closest to `target`, first occurrence on ties.
#[must_use]
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Arithmetic mean, `NaN` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by `n`), `NaN` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Formats a float the way analysis reports print it: shortest round-trip
/// digits, integral values keep a trailing `.0`, `nan`/`inf` in lower case.
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integrate_polynomial() {
        let area = integrate(|x| 3.0 * x * x, 0.0, 2.0);
        assert_relative_eq!(area, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_integrate_gaussian_three_sigma() {
        let sigma: f64 = 2.0;
        let area = integrate(|x| (-0.5 * (x / sigma).powi(2)).exp(), -3.0 * sigma, 3.0 * sigma);
        // sqrt(2π)·σ·erf(3/√2)
        let expected = (2.0 * std::f64::consts::PI).sqrt() * sigma * 0.997_300_203_936_739_8;
        assert_relative_eq!(area, expected, epsilon = 1e-8);
    }

    #[test]
    fn test_integrate_reversed_bounds() {
        let forward = integrate(|x| x.sin(), 0.0, 1.0);
        let backward = integrate(|x| x.sin(), 1.0, 0.0);
        assert_relative_eq!(forward, -backward, epsilon = 1e-12);
        assert_eq!(integrate(|x| x, 4.0, 4.0), 0.0);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(1.0, 2.0, 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], 1.0);
        assert_relative_eq!(v[2], 1.5);
        assert_relative_eq!(v[4], 2.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_nearest_index_first_on_tie() {
        let centers = [0.5, 1.5, 2.5];
        assert_eq!(nearest_index(&centers, 1.0), Some(0));
        assert_eq!(nearest_index(&centers, 2.4), Some(2));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(99.5), "99.5");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(f64::NAN), "nan");
    }

    #[test]
    fn test_population_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v), 5.0);
        assert_relative_eq!(std_dev(&v), 2.0);
        assert!(mean(&[]).is_nan());
    }
}
