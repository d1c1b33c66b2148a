//! Marker state of a 1-D view and the background and peak fits it drives.
//!
//! One [`MarkerStateMachine`] belongs to exactly one view. Every command
//! either completes or returns an error with the marker lists and overlays
//! untouched.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fit::{fit_gaussian, fit_line, round_to, GaussianFit, GaussianGuess, LinearFit, MIN_GAUSSIAN_POINTS};
use crate::histogram::Histogram;
use crate::marker::{remove_all, Marker, MarkerPair, MarkerRole};
use crate::numeric::{linspace, mean, nearest_index, std_dev};
use crate::render::{ArtifactId, CurveKind, RenderSurface};
use crate::{Error, Result};

/// Points per drawn fit curve.
pub const CURVE_POINTS: usize = 1000;

/// Outcome of a peak fit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitResult {
    /// Two-point background through the region boundary bins.
    pub background: LinearFit,
    /// Gaussian fitted to the background-subtracted counts.
    pub peak: GaussianFit,
    /// Peak area in counts, `amplitude / bin_width`.
    pub area: f64,
    pub area_error: f64,
    /// Spacing of the fitted bin centers.
    pub bin_width: f64,
    /// First and last fitted bin center.
    pub fit_range: (f64, f64),
}

impl FitResult {
    /// Report lines: one per peak parameter, then the area.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .peak
            .parameters()
            .iter()
            .map(ToString::to_string)
            .collect();
        lines.push(format!(
            "Area: {:.0} +/- {:.0}",
            whole(self.area),
            whole(self.area_error)
        ));
        lines
    }
}

/// Rounds to an integer, folding `-0` into `0`.
fn whole(value: f64) -> f64 {
    // -0 + 0 is +0
    round_to(value, 0) + 0.0
}

/// Region, background and peak markers of a 1-D view, plus the overlays
/// drawn by the fits.
#[derive(Debug)]
pub struct MarkerStateMachine {
    regions: MarkerPair,
    backgrounds: Vec<Marker>,
    peaks: Vec<Marker>,
    background_lines: Vec<ArtifactId>,
    peak_curves: Vec<ArtifactId>,
    last_fit: Option<FitResult>,
}

impl Default for MarkerStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerStateMachine {
    /// Creates a machine with no markers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: MarkerPair::new(MarkerRole::Region),
            backgrounds: Vec::new(),
            peaks: Vec::new(),
            background_lines: Vec::new(),
            peak_curves: Vec::new(),
            last_fit: None,
        }
    }

    /// Places a region marker at `x`, clearing a complete pair first.
    pub fn place_region<S: RenderSurface + ?Sized>(&mut self, x: f64, surface: &mut S) {
        self.regions.place(x, surface);
    }

    /// Appends a background marker at `x`.
    pub fn place_background<S: RenderSurface + ?Sized>(&mut self, x: f64, surface: &mut S) {
        self.backgrounds
            .push(Marker::place(MarkerRole::Background, x, surface));
    }

    /// Appends a peak marker at `x`.
    pub fn place_peak<S: RenderSurface + ?Sized>(&mut self, x: f64, surface: &mut S) {
        self.peaks.push(Marker::place(MarkerRole::Peak, x, surface));
    }

    /// Fits a line through the counts at the background markers and draws
    /// it across their span, replacing any previous background line.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientBackgroundPoints`] with fewer than two
    /// distinct marker positions.
    pub fn fit_background<S: RenderSurface + ?Sized>(
        &mut self,
        histogram: &Histogram,
        surface: &mut S,
    ) -> Result<LinearFit> {
        let mut positions: Vec<f64> = self.backgrounds.iter().map(|m| m.position).collect();
        positions.sort_by(f64::total_cmp);
        #[allow(clippy::cast_precision_loss)]
        let counts: Vec<f64> = positions
            .iter()
            .map(|&x| histogram.count_near(x) as f64)
            .collect();

        let fit = fit_line(&positions, &counts)?;

        for id in self.background_lines.drain(..) {
            surface.remove(id);
        }
        let (first, last) = (positions[0], positions[positions.len() - 1]);
        let id = surface.add_curve(sample_curve(first, last, |x| fit.evaluate(x)), CurveKind::Background);
        self.background_lines.push(id);

        log::info!(
            "background fit over {} markers: {}, {}",
            positions.len(),
            fit.slope,
            fit.intercept
        );
        Ok(fit)
    }

    /// Fits a Gaussian on top of a two-point background between the region
    /// markers and draws the background, the peak and their sum.
    ///
    /// # Errors
    /// Returns [`Error::RegionMarkerCountError`] unless exactly two region
    /// markers exist, [`Error::EmptyFitRange`] when too few bin centers lie
    /// between them, and [`Error::FitConvergenceError`] if the peak fit fails.
    pub fn fit_peak<S: RenderSurface + ?Sized>(
        &mut self,
        histogram: &Histogram,
        surface: &mut S,
    ) -> Result<FitResult> {
        let Some((lo, hi)) = self.regions.bounds() else {
            return Err(Error::RegionMarkerCountError {
                found: self.regions.len(),
            });
        };

        let centers = histogram.bin_centers();
        let in_range: Vec<usize> = (0..centers.len())
            .filter(|&i| centers[i] >= lo && centers[i] <= hi)
            .collect();
        if in_range.len() < MIN_GAUSSIAN_POINTS {
            return Err(Error::EmptyFitRange {
                bins: in_range.len(),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let counts: Vec<f64> = histogram.counts().iter().map(|&c| c as f64).collect();
        let edge_counts: Vec<f64> = [lo, hi]
            .iter()
            .map(|&x| nearest_index(&centers, x).map_or(0.0, |i| counts[i]))
            .collect();
        let background = fit_line(&[lo, hi], &edge_counts)?;

        let xs: Vec<f64> = in_range.iter().map(|&i| centers[i]).collect();
        let observed: Vec<f64> = in_range.iter().map(|&i| counts[i]).collect();
        let residual: Vec<f64> = xs
            .iter()
            .zip(&observed)
            .map(|(&x, &y)| y - background.evaluate(x))
            .collect();

        // The count mean stands in for the center when no single peak marker exists.
        let center = match self.peaks.as_slice() {
            [peak] => peak.position,
            _ => mean(&observed),
        };
        let guess = GaussianGuess {
            amplitude: observed.iter().sum(),
            center,
            sigma: std_dev(&observed),
            height: observed.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };
        let peak = fit_gaussian(&xs, &residual, &guess)?;

        let bin_width = xs[1] - xs[0];
        let result = FitResult {
            area: peak.amplitude.value / bin_width,
            area_error: peak.amplitude.stderr / bin_width,
            bin_width,
            fit_range: (xs[0], xs[xs.len() - 1]),
            background,
            peak,
        };

        for line in result.report_lines() {
            log::info!("{line}");
            surface.report(&line);
        }

        for id in self.peak_curves.drain(..) {
            surface.remove(id);
        }
        let (first, last) = result.fit_range;
        let bg = &result.background;
        let pk = &result.peak;
        self.peak_curves.push(surface.add_curve(
            sample_curve(first, last, |x| bg.evaluate(x)),
            CurveKind::Background,
        ));
        self.peak_curves.push(surface.add_curve(
            sample_curve(first, last, |x| pk.evaluate(x)),
            CurveKind::Peak,
        ));
        self.peak_curves.push(surface.add_curve(
            sample_curve(first, last, |x| pk.evaluate(x) + bg.evaluate(x)),
            CurveKind::PeakWithBackground,
        ));

        self.last_fit = Some(result.clone());
        Ok(result)
    }

    /// Removes every marker and every fit overlay.
    pub fn clear_all<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.regions.clear(surface);
        remove_all(&mut self.backgrounds, surface);
        remove_all(&mut self.peaks, surface);
        for id in self.background_lines.drain(..).chain(self.peak_curves.drain(..)) {
            surface.remove(id);
        }
        log::debug!("cleared all markers");
    }

    /// Region marker positions in placement order.
    #[must_use]
    pub fn regions(&self) -> Vec<f64> {
        self.regions.positions()
    }

    #[must_use]
    pub fn backgrounds(&self) -> Vec<f64> {
        self.backgrounds.iter().map(|m| m.position).collect()
    }

    #[must_use]
    pub fn peaks(&self) -> Vec<f64> {
        self.peaks.iter().map(|m| m.position).collect()
    }

    /// Number of live background-fit lines.
    #[must_use]
    pub fn background_line_count(&self) -> usize {
        self.background_lines.len()
    }

    /// The most recent successful peak fit.
    #[must_use]
    pub fn last_fit(&self) -> Option<&FitResult> {
        self.last_fit.as_ref()
    }

    /// Returns true if no marker and no overlay is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.backgrounds.is_empty()
            && self.peaks.is_empty()
            && self.background_lines.is_empty()
            && self.peak_curves.is_empty()
    }
}

/// Evaluates `f` on [`CURVE_POINTS`] points from `first` to `last`.
fn sample_curve<F: Fn(f64) -> f64>(first: f64, last: f64, f: F) -> Vec<[f64; 2]> {
    linspace(first, last, CURVE_POINTS)
        .into_iter()
        .map(|x| [x, f(x)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::HistogramConfig;
    use crate::render::RecordingSurface;
    use approx::assert_relative_eq;

    /// Unit bins over (0, 100) holding a Gaussian on a sloped background.
    fn peak_histogram() -> Histogram {
        let mut samples = Vec::new();
        for bin in 0..100u32 {
            let x = f64::from(bin) + 0.5;
            let background = 20.0 + 0.1 * x;
            let peak = 400.0 * (-(x - 50.0).powi(2) / (2.0 * 3.0 * 3.0)).exp();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = (background + peak).round() as usize;
            samples.extend(std::iter::repeat(x).take(n));
        }
        Histogram::from_samples(&samples, &HistogramConfig::new(100, (0.0, 100.0))).unwrap()
    }

    #[test]
    fn test_fit_peak_recovers_center() {
        let hist = peak_histogram();
        let mut surface = RecordingSurface::default();
        let mut machine = MarkerStateMachine::new();
        machine.place_region(35.5, &mut surface);
        machine.place_region(64.5, &mut surface);
        machine.place_peak(49.0, &mut surface);

        let result = machine.fit_peak(&hist, &mut surface).unwrap();
        assert_relative_eq!(result.peak.center.value, 50.0, epsilon = 0.1);
        assert_relative_eq!(result.peak.sigma.value, 3.0, epsilon = 0.1);
        assert_relative_eq!(result.bin_width, 1.0);
        assert_relative_eq!(result.fit_range.0, 35.5);
        assert_relative_eq!(result.fit_range.1, 64.5);
        // 400·σ·sqrt(2π) counts in the peak
        assert_relative_eq!(result.area, 400.0 * 3.0 * (2.0 * std::f64::consts::PI).sqrt(), max_relative = 0.02);

        assert_eq!(surface.curve_count(CurveKind::Background), 1);
        assert_eq!(surface.curve_count(CurveKind::Peak), 1);
        assert_eq!(surface.curve_count(CurveKind::PeakWithBackground), 1);
        assert!(surface.curves(CurveKind::Peak).all(|c| c.len() == CURVE_POINTS));
        assert_eq!(surface.messages.len(), 6);
        assert!(surface.messages[0].starts_with("amplitude: "));
        assert!(surface.messages[5].starts_with("Area: "));
        assert!(machine.last_fit().is_some());
    }

    #[test]
    fn test_fit_peak_without_regions_is_rejected() {
        let hist = peak_histogram();
        let mut surface = RecordingSurface::default();
        let mut machine = MarkerStateMachine::new();
        assert_eq!(
            machine.fit_peak(&hist, &mut surface),
            Err(Error::RegionMarkerCountError { found: 0 })
        );

        machine.place_region(40.0, &mut surface);
        machine.place_background(10.0, &mut surface);
        assert_eq!(
            machine.fit_peak(&hist, &mut surface),
            Err(Error::RegionMarkerCountError { found: 1 })
        );
        assert_eq!(machine.regions(), vec![40.0]);
        assert_eq!(machine.backgrounds(), vec![10.0]);
        assert_eq!(surface.artifact_count(), 2);
    }

    #[test]
    fn test_fit_peak_narrow_region() {
        let hist = peak_histogram();
        let mut surface = RecordingSurface::default();
        let mut machine = MarkerStateMachine::new();
        machine.place_region(50.2, &mut surface);
        machine.place_region(50.8, &mut surface);
        assert_eq!(
            machine.fit_peak(&hist, &mut surface),
            Err(Error::EmptyFitRange { bins: 1 })
        );
    }

    #[test]
    fn test_refit_replaces_overlays() {
        let hist = peak_histogram();
        let mut surface = RecordingSurface::default();
        let mut machine = MarkerStateMachine::new();
        machine.place_region(35.5, &mut surface);
        machine.place_region(64.5, &mut surface);
        machine.fit_peak(&hist, &mut surface).unwrap();
        machine.fit_peak(&hist, &mut surface).unwrap();
        assert_eq!(surface.curve_count(CurveKind::Peak), 1);

        machine.place_background(10.5, &mut surface);
        machine.place_background(90.5, &mut surface);
        machine.fit_background(&hist, &mut surface).unwrap();
        machine.fit_background(&hist, &mut surface).unwrap();
        assert_eq!(machine.background_line_count(), 1);
    }

    #[test]
    fn test_area_report_has_no_negative_zero() {
        let hist = peak_histogram();
        let mut surface = RecordingSurface::default();
        let mut machine = MarkerStateMachine::new();
        machine.place_region(35.5, &mut surface);
        machine.place_region(64.5, &mut surface);
        let mut result = machine.fit_peak(&hist, &mut surface).unwrap();

        result.area = -0.3;
        result.area_error = 0.4;
        assert_eq!(result.report_lines().last().map(String::as_str), Some("Area: 0 +/- 0"));

        result.area = -12.6;
        result.area_error = 3.2;
        assert_eq!(result.report_lines().last().map(String::as_str), Some("Area: -13 +/- 3"));
    }
}
