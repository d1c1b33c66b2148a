//! Error types for histogrammer-core.

use thiserror::Error;

use crate::marker::Axis;

/// Result type alias for histogrammer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for binning, fitting and marker commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bin count or range cannot produce a histogram.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// A line fit needs at least two distinct x positions.
    #[error("background fit needs at least 2 distinct positions, got {distinct}")]
    InsufficientBackgroundPoints { distinct: usize },

    /// Peak fit requested without exactly two region markers.
    #[error("must have two region markers, found {found}")]
    RegionMarkerCountError { found: usize },

    /// Projection requested without exactly two projection lines.
    #[error("{axis}-projection needs two lines, found {found}")]
    ProjectionLineCountError { axis: Axis, found: usize },

    /// The region between the markers does not hold enough bins to fit.
    #[error("fit range holds {bins} bin(s), not enough to fit")]
    EmptyFitRange { bins: usize },

    /// Nonlinear solver failed.
    #[error("fit did not converge: {0}")]
    FitConvergenceError(String),

    /// A column store has no column with this name.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Paired x and y columns hold different numbers of values.
    #[error("x column has {x} values but y column has {y}")]
    LengthMismatch { x: usize, y: usize },
}
