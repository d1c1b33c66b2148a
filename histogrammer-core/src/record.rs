//! Externally produced peak fits used as overlays.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::linspace;
use crate::peak::PeakShape;

/// One fitted peak in calibrated units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitRecord {
    pub position: f64,
    pub position_error: f64,
    /// Full width at half maximum.
    pub width: f64,
    pub width_error: f64,
    pub volume: f64,
    pub volume_error: f64,
}

impl FitRecord {
    /// Fields in the order `(position, position_error, width, width_error,
    /// volume, volume_error)`.
    #[must_use]
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64, f64) {
        (
            self.position,
            self.position_error,
            self.width,
            self.width_error,
            self.volume,
            self.volume_error,
        )
    }

    /// Peak shape of this record for bins of `bin_width`.
    #[must_use]
    pub fn shape(&self, bin_width: f64) -> PeakShape {
        PeakShape::new(self.volume, self.position, self.width, bin_width)
    }

    /// `n` points of the peak shape over `position ± 3·width`.
    #[must_use]
    pub fn curve(&self, bin_width: f64, n: usize) -> Vec<[f64; 2]> {
        let shape = self.shape(bin_width);
        linspace(
            self.position - 3.0 * self.width,
            self.position + 3.0 * self.width,
            n,
        )
        .into_iter()
        .map(|x| [x, shape.evaluate(x)])
        .collect()
    }
}

impl From<(f64, f64, f64, f64, f64, f64)> for FitRecord {
    fn from(t: (f64, f64, f64, f64, f64, f64)) -> Self {
        Self {
            position: t.0,
            position_error: t.1,
            width: t.2,
            width_error: t.3,
            volume: t.4,
            volume_error: t.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_curve_spans_three_widths() {
        let record = FitRecord::from((100.0, 0.1, 4.0, 0.2, 1000.0, 30.0));
        let curve = record.curve(1.0, 1000);
        assert_eq!(curve.len(), 1000);
        assert_relative_eq!(curve[0][0], 88.0);
        assert_relative_eq!(curve[999][0], 112.0);
        assert_eq!(record.as_tuple().4, 1000.0);
    }
}
