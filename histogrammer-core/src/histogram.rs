//! Uniform-width 1-D and 2-D histograms built from raw samples.
//!
//! Bins follow the half-open convention `[edge_i, edge_{i+1})`, except the
//! last bin which also holds samples equal to the upper bound. Samples
//! outside the declared range (and NaN) are dropped, never clipped.

use ndarray::Array2;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::{linspace, nearest_index};
use crate::{Error, Result};

/// Sample count above which binning is split across the rayon pool.
const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Chunk size for parallel binning.
const CHUNK_SIZE: usize = 1 << 14;

/// Binning parameters for a 1-D histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistogramConfig {
    /// Number of bins.
    pub bins: usize,
    /// Lower and upper bound of the binned range.
    pub range: (f64, f64),
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: 512,
            range: (0.0, 4096.0),
        }
    }
}

impl HistogramConfig {
    /// Creates a configuration with the given bin count and range.
    #[must_use]
    pub fn new(bins: usize, range: (f64, f64)) -> Self {
        Self { bins, range }
    }

    /// Sets the bin count.
    #[must_use]
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Sets the binned range.
    #[must_use]
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.range = (low, high);
        self
    }

    /// Checks that the configuration describes at least one finite bin.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for a zero bin count, non-finite
    /// bounds or `low >= high`.
    pub fn validate(&self) -> Result<()> {
        validate_axis(self.bins, self.range)
    }

    /// Width of a single bin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bin_width(&self) -> f64 {
        (self.range.1 - self.range.0) / self.bins as f64
    }
}

/// Binning parameters for a 2-D histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram2dConfig {
    /// Number of bins along x and y.
    pub bins: (usize, usize),
    /// Range along x.
    pub x_range: (f64, f64),
    /// Range along y.
    pub y_range: (f64, f64),
}

impl Histogram2dConfig {
    /// Creates a configuration with the given bin counts and ranges.
    #[must_use]
    pub fn new(bins: (usize, usize), x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            bins,
            x_range,
            y_range,
        }
    }

    /// Checks both axes.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if either axis is invalid.
    pub fn validate(&self) -> Result<()> {
        validate_axis(self.bins.0, self.x_range)?;
        validate_axis(self.bins.1, self.y_range)
    }

    /// 1-D configuration of the x axis.
    #[must_use]
    pub fn x_axis(&self) -> HistogramConfig {
        HistogramConfig::new(self.bins.0, self.x_range)
    }

    /// 1-D configuration of the y axis.
    #[must_use]
    pub fn y_axis(&self) -> HistogramConfig {
        HistogramConfig::new(self.bins.1, self.y_range)
    }
}

fn validate_axis(bins: usize, (low, high): (f64, f64)) -> Result<()> {
    if bins == 0 {
        return Err(Error::InvalidBinning("bin count must be positive".into()));
    }
    if !low.is_finite() || !high.is_finite() {
        return Err(Error::InvalidBinning(format!(
            "range bounds must be finite, got ({low}, {high})"
        )));
    }
    if low >= high {
        return Err(Error::InvalidBinning(format!(
            "range low must be below high, got ({low}, {high})"
        )));
    }
    Ok(())
}

/// Locates the bin of `value`, or `None` if it falls outside `[low, high]`.
///
/// The index guess from the scaled offset is corrected against the edges so
/// that values sitting exactly on an edge land in the upper bin.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn bin_index(value: f64, edges: &[f64]) -> Option<usize> {
    let n = edges.len() - 1;
    let low = edges[0];
    let high = edges[n];
    if !(value >= low && value <= high) {
        return None;
    }

    let norm = n as f64 / (high - low);
    let mut idx = ((value - low) * norm) as usize;
    if idx >= n {
        idx = n - 1;
    }
    if value < edges[idx] {
        idx = idx.saturating_sub(1);
    } else if idx != n - 1 && value >= edges[idx + 1] {
        idx += 1;
    }
    Some(idx)
}

fn count_into(values: &[f64], edges: &[f64], counts: &mut [u64]) {
    for &v in values {
        if let Some(i) = bin_index(v, edges) {
            counts[i] += 1;
        }
    }
}

/// A 1-D histogram with uniform bins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram {
    counts: Vec<u64>,
    edges: Vec<f64>,
}

impl Histogram {
    /// Bins `samples` according to `config`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if `config` is invalid.
    pub fn from_samples(samples: &[f64], config: &HistogramConfig) -> Result<Self> {
        config.validate()?;
        let edges = linspace(config.range.0, config.range.1, config.bins + 1);

        let counts = if samples.len() >= PARALLEL_THRESHOLD {
            samples
                .par_chunks(CHUNK_SIZE)
                .fold(
                    || vec![0u64; config.bins],
                    |mut acc, chunk| {
                        count_into(chunk, &edges, &mut acc);
                        acc
                    },
                )
                .reduce(
                    || vec![0u64; config.bins],
                    |mut a, b| {
                        for (x, y) in a.iter_mut().zip(b) {
                            *x += y;
                        }
                        a
                    },
                )
        } else {
            let mut counts = vec![0u64; config.bins];
            count_into(samples, &edges, &mut counts);
            counts
        };

        log::debug!(
            "binned {} samples into {} bins over ({}, {})",
            samples.len(),
            config.bins,
            config.range.0,
            config.range.1
        );
        Ok(Self { counts, edges })
    }

    /// Re-bins `samples` over a new range, keeping this histogram's bin count.
    ///
    /// The result depends only on the samples inside `range`, exactly as a
    /// fresh [`Histogram::from_samples`] call with that range would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if the new range is invalid.
    pub fn rebin(&self, samples: &[f64], range: (f64, f64)) -> Result<Self> {
        Self::from_samples(samples, &HistogramConfig::new(self.bin_count(), range))
    }

    /// Number of bins.
    #[must_use]
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// Lower and upper bound.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    /// Configuration reproducing this binning.
    #[must_use]
    pub fn config(&self) -> HistogramConfig {
        HistogramConfig::new(self.bin_count(), self.range())
    }

    /// Counts per bin, ordered by bin index.
    #[must_use]
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// The `bin_count + 1` ascending bin edges.
    #[must_use]
    #[inline]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Midpoint of every bin.
    #[must_use]
    pub fn bin_centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Width of a single bin.
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    /// Sum of all counts.
    #[must_use]
    pub fn integral(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Index of the bin whose center is nearest to `x` (first on ties).
    #[must_use]
    pub fn nearest_bin(&self, x: f64) -> usize {
        nearest_index(&self.bin_centers(), x).unwrap_or(0)
    }

    /// Count of the bin whose center is nearest to `x`.
    #[must_use]
    pub fn count_near(&self, x: f64) -> u64 {
        self.counts[self.nearest_bin(x)]
    }
}

/// A 2-D histogram with a count grid indexed `[x_bin, y_bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    counts: Array2<u64>,
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
}

impl Histogram2D {
    /// Bins coordinate pairs according to `config`.
    ///
    /// A pair is counted only when both coordinates fall inside their range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if `config` is invalid.
    pub fn from_pairs(pairs: &[(f64, f64)], config: &Histogram2dConfig) -> Result<Self> {
        config.validate()?;
        let (nx, ny) = config.bins;
        let x_edges = linspace(config.x_range.0, config.x_range.1, nx + 1);
        let y_edges = linspace(config.y_range.0, config.y_range.1, ny + 1);

        let fill = |chunk: &[(f64, f64)], grid: &mut Array2<u64>| {
            for &(x, y) in chunk {
                if let (Some(i), Some(j)) = (bin_index(x, &x_edges), bin_index(y, &y_edges)) {
                    grid[[i, j]] += 1;
                }
            }
        };

        let counts = if pairs.len() >= PARALLEL_THRESHOLD {
            pairs
                .par_chunks(CHUNK_SIZE)
                .fold(
                    || Array2::<u64>::zeros((nx, ny)),
                    |mut acc, chunk| {
                        fill(chunk, &mut acc);
                        acc
                    },
                )
                .reduce(|| Array2::<u64>::zeros((nx, ny)), |a, b| a + b)
        } else {
            let mut grid = Array2::<u64>::zeros((nx, ny));
            fill(pairs, &mut grid);
            grid
        };

        Ok(Self {
            counts,
            x_edges,
            y_edges,
        })
    }

    /// Count grid, shape `(x_bins, y_bins)`.
    #[must_use]
    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    /// Count of bin `(i, j)`, if in bounds.
    #[must_use]
    pub fn get(&self, x_bin: usize, y_bin: usize) -> Option<u64> {
        self.counts.get([x_bin, y_bin]).copied()
    }

    /// Number of bins along x and y.
    #[must_use]
    pub fn bin_counts(&self) -> (usize, usize) {
        self.counts.dim()
    }

    /// Bin edges along x.
    #[must_use]
    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    /// Bin edges along y.
    #[must_use]
    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    /// Range along x.
    #[must_use]
    pub fn x_range(&self) -> (f64, f64) {
        (self.x_edges[0], self.x_edges[self.x_edges.len() - 1])
    }

    /// Range along y.
    #[must_use]
    pub fn y_range(&self) -> (f64, f64) {
        (self.y_edges[0], self.y_edges[self.y_edges.len() - 1])
    }

    /// Configuration reproducing this binning.
    #[must_use]
    pub fn config(&self) -> Histogram2dConfig {
        Histogram2dConfig::new(self.bin_counts(), self.x_range(), self.y_range())
    }

    /// Sum of all counts.
    #[must_use]
    pub fn integral(&self) -> u64 {
        self.counts.sum()
    }

    /// Largest single-bin count.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spec_example_counts() {
        let samples = [1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let hist = Histogram::from_samples(&samples, &HistogramConfig::new(10, (0.0, 11.0))).unwrap();
        assert_eq!(hist.bin_count(), 10);
        assert_eq!(hist.edges().len(), 11);
        assert_eq!(hist.counts()[9], 5);
        assert_eq!(hist.integral(), 12);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let samples = [-1.0, 0.0, 0.5, 4.0, 4.5, f64::NAN];
        let hist = Histogram::from_samples(&samples, &HistogramConfig::new(4, (0.0, 4.0))).unwrap();
        // 0.0 -> bin 0, 0.5 -> bin 0, 4.0 (upper bound) -> last bin
        assert_eq!(hist.counts(), &[2, 0, 0, 1]);
        assert_eq!(hist.integral(), 3);
    }

    #[test]
    fn test_edge_value_goes_up() {
        let hist = Histogram::from_samples(&[1.0, 2.0], &HistogramConfig::new(4, (0.0, 4.0))).unwrap();
        assert_eq!(hist.counts(), &[0, 1, 1, 0]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Histogram::from_samples(&[1.0], &HistogramConfig::new(0, (0.0, 1.0))),
            Err(Error::InvalidBinning(_))
        ));
        assert!(matches!(
            Histogram::from_samples(&[1.0], &HistogramConfig::new(4, (2.0, 1.0))),
            Err(Error::InvalidBinning(_))
        ));
        assert!(HistogramConfig::new(4, (0.0, f64::INFINITY)).validate().is_err());
    }

    #[test]
    fn test_centers_and_width() {
        let hist = Histogram::from_samples(&[], &HistogramConfig::new(4, (0.0, 2.0))).unwrap();
        assert_relative_eq!(hist.bin_width(), 0.5);
        let centers = hist.bin_centers();
        assert_relative_eq!(centers[0], 0.25);
        assert_relative_eq!(centers[3], 1.75);
        assert_eq!(hist.nearest_bin(1.0), 1);
    }

    #[test]
    fn test_rebin_narrower_matches_subset() {
        let samples: Vec<f64> = (0..500).map(|i| f64::from(i) * 0.37 % 100.0).collect();
        let full = Histogram::from_samples(&samples, &HistogramConfig::new(20, (0.0, 100.0))).unwrap();
        let narrow = full.rebin(&samples, (20.0, 60.0)).unwrap();

        let subset: Vec<f64> = samples.iter().copied().filter(|v| (20.0..=60.0).contains(v)).collect();
        let direct = Histogram::from_samples(&subset, &HistogramConfig::new(20, (20.0, 60.0))).unwrap();
        assert_eq!(narrow, direct);
        assert_eq!(narrow.integral(), subset.len() as u64);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let samples: Vec<f64> = (0..PARALLEL_THRESHOLD + 1234)
            .map(|i| (f64::from(u32::try_from(i).unwrap()) * 0.618_033_988_7) % 50.0)
            .collect();
        let config = HistogramConfig::new(37, (0.0, 50.0));
        let parallel = Histogram::from_samples(&samples, &config).unwrap();

        let mut sequential = vec![0u64; 37];
        count_into(&samples, parallel.edges(), &mut sequential);
        assert_eq!(parallel.counts(), sequential.as_slice());
    }

    #[test]
    fn test_2d_grid_indexing() {
        let pairs = [(0.5, 3.5), (0.5, 3.5), (3.9, 0.1), (5.0, 1.0), (1.0, 4.0)];
        let config = Histogram2dConfig::new((4, 4), (0.0, 4.0), (0.0, 4.0));
        let hist = Histogram2D::from_pairs(&pairs, &config).unwrap();
        assert_eq!(hist.bin_counts(), (4, 4));
        assert_eq!(hist.get(0, 3), Some(2));
        assert_eq!(hist.get(3, 0), Some(1));
        // (1.0, 4.0): x lands in bin 1, y on the upper bound lands in the last bin
        assert_eq!(hist.get(1, 3), Some(1));
        assert_eq!(hist.integral(), 4);
        assert_eq!(hist.max_count(), 2);
    }
}
