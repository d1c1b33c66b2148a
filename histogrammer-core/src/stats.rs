//! Summary statistics shown in a view's text box.

use std::fmt;

use crate::histogram::Histogram;
use crate::numeric::{mean, std_dev};
use crate::sample::Samples;

/// Statistics of the samples inside the visible range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Sum of the counts binned over the visible range.
    pub integral: u64,
}

impl Statistics {
    /// Computes statistics for samples with `lo <= v <= hi`, taking the
    /// integral from `histogram` binned over that same range.
    #[must_use]
    pub fn visible(samples: &Samples, histogram: &Histogram) -> Self {
        let (lo, hi) = histogram.range();
        let visible = samples.within(lo, hi);
        Self {
            mean: mean(&visible),
            std_dev: std_dev(&visible),
            integral: histogram.integral(),
        }
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mean: {}\nStd Dev: {}\nIntegral: {}",
            fixed(self.mean),
            fixed(self.std_dev),
            self.integral
        )
    }
}

fn fixed(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Text box contents of a 2-D view.
#[must_use]
pub fn integral_text(integral: u64) -> String {
    format!("Integral: {integral}")
}
