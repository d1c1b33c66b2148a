//! Closed-form Gaussian peak shape normalised to a peak volume.

use crate::numeric::integrate;

/// FWHM of a Gaussian divided by its standard deviation, `2·sqrt(2·ln 2)`.
pub const FWHM_PER_SIGMA: f64 = 2.3548;

/// Gaussian peak described by its volume, center and FWHM.
///
/// The amplitude is fixed so that the curve, sampled once per bin, sums to
/// `volume` counts over `center ± 3σ`. The integral used for the
/// normalisation is taken numerically over that window only, so the tails
/// beyond 3σ are deliberately left uncorrected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakShape {
    center: f64,
    sigma: f64,
    amplitude: f64,
}

impl PeakShape {
    /// Builds the shape for a peak of `volume` counts.
    ///
    /// # Arguments
    ///
    /// * `volume` - Total counts attributed to the peak
    /// * `center` - Peak position
    /// * `fwhm` - Full width at half maximum
    /// * `bin_width` - Width of the histogram bins the curve is drawn over
    #[must_use]
    pub fn new(volume: f64, center: f64, fwhm: f64, bin_width: f64) -> Self {
        let sigma = fwhm / FWHM_PER_SIGMA;
        let window = integrate(
            |x| (-0.5 * ((x - center) / sigma).powi(2)).exp(),
            center - 3.0 * sigma,
            center + 3.0 * sigma,
        );
        let amplitude = (volume / window) * bin_width;
        Self {
            center,
            sigma,
            amplitude,
        }
    }

    /// Density at `x`.
    #[must_use]
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.amplitude * (-(x - self.center).powi(2) / (2.0 * self.sigma * self.sigma)).exp()
    }

    /// Standard deviation derived from the FWHM.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Peak height at the center.
    #[must_use]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Peak center.
    #[must_use]
    pub fn center(&self) -> f64 {
        self.center
    }

    /// The `center ± 3σ` window the normalisation is computed over.
    #[must_use]
    pub fn window(&self) -> (f64, f64) {
        (self.center - 3.0 * self.sigma, self.center + 3.0 * self.sigma)
    }
}

/// Density of a Gaussian peak of `volume` counts at `x`.
///
/// Shorthand for `PeakShape::new(volume, center, fwhm, bin_width).evaluate(x)`.
#[must_use]
pub fn evaluate(x: f64, volume: f64, center: f64, fwhm: f64, bin_width: f64) -> f64 {
    PeakShape::new(volume, center, fwhm, bin_width).evaluate(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_integral_equals_volume() {
        for &(volume, fwhm, bin_width) in &[(1000.0, 12.0, 1.0), (5.5, 0.8, 0.25), (42.0, 30.0, 4.0)] {
            let shape = PeakShape::new(volume, 100.0, fwhm, bin_width);
            let (lo, hi) = shape.window();
            let area = integrate(|x| shape.evaluate(x), lo, hi) / bin_width;
            assert_relative_eq!(area, volume, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_sigma_from_fwhm() {
        let shape = PeakShape::new(1.0, 0.0, 2.3548, 1.0);
        assert_relative_eq!(shape.sigma(), 1.0);
    }

    #[test]
    fn test_maximum_at_center() {
        let shape = PeakShape::new(500.0, 20.0, 4.0, 1.0);
        assert_relative_eq!(shape.evaluate(20.0), shape.amplitude());
        assert!(shape.evaluate(19.0) < shape.amplitude());
        assert_relative_eq!(shape.evaluate(18.0), shape.evaluate(22.0));
        assert_relative_eq!(evaluate(20.0, 500.0, 20.0, 4.0, 1.0), shape.amplitude());
    }
}
