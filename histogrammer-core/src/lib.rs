//! histogrammer-core: Binning, peak fitting and marker state for interactive
//! spectrum analysis.
//!
//! This crate provides the histogram binner, the Gaussian peak shape, the
//! least-squares fitters, and the view controllers that turn key presses on
//! a plot into marker placement, background and peak fits, and projections.
//! Drawing goes through the [`RenderSurface`] trait so the same controllers
//! run behind a GUI or headless.
//!

pub mod error;
pub mod fit;
pub mod histogram;
pub mod input;
pub mod marker;
pub mod markers;
pub mod numeric;
pub mod peak;
pub mod record;
pub mod render;
pub mod sample;
pub mod stats;
pub mod view;

pub use error::{Error, Result};
pub use fit::{fit_gaussian, fit_line, GaussianFit, GaussianGuess, LinearFit, Parameter};
pub use histogram::{Histogram, Histogram2D, Histogram2dConfig, HistogramConfig};
pub use input::{Command, InputEvent, MatrixCommand};
pub use marker::{Axis, Marker, MarkerPair, MarkerRole};
pub use markers::{FitResult, MarkerStateMachine};
pub use peak::PeakShape;
pub use record::FitRecord;
pub use render::{ArtifactId, CurveKind, Orientation, RecordingSurface, RenderSurface};
pub use sample::{ColumnStore, ColumnTable, PairSamples, SampleSource, Samples};
pub use stats::Statistics;
pub use view::{HistogramView, MatrixView, Outcome, Projection, ViewOptions};
