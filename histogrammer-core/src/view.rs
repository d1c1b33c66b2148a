//! View controllers binding samples, a histogram and a render surface.
//!
//! A controller owns its surface. Hosts feed it [`InputEvent`]s and range
//! changes; command failures are logged, reported on the surface and
//! returned as [`Outcome::Failed`] without touching the view's state.

use crate::fit::{round_to, LinearFit};
use crate::histogram::{Histogram, Histogram2D, Histogram2dConfig, HistogramConfig};
use crate::input::{Command, InputEvent, MatrixCommand};
use crate::marker::{Axis, MarkerPair, MarkerRole};
use crate::markers::{FitResult, MarkerStateMachine};
use crate::numeric::format_float;
use crate::record::FitRecord;
use crate::render::{ArtifactId, CurveKind, RenderSurface};
use crate::sample::{PairSamples, Samples};
use crate::stats::{integral_text, Statistics};
use crate::{Error, Result};

/// Points per fit-record overlay curve.
pub const OVERLAY_POINTS: usize = 1000;

/// Presentation options of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    /// Show the statistics text box and keep it current on zoom.
    pub display_stats: bool,
    pub title: Option<String>,
    /// Defaults to the sample name.
    pub x_label: Option<String>,
    /// Defaults to `Counts` for 1-D views.
    pub y_label: Option<String>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            display_stats: true,
            title: None,
            x_label: None,
            y_label: None,
        }
    }
}

impl ViewOptions {
    #[must_use]
    pub fn with_display_stats(mut self, display_stats: bool) -> Self {
        self.display_stats = display_stats;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = Some(label.into());
        self
    }
}

/// Result of handing an input event to a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The key is not bound, or needs a pointer position that was missing.
    Ignored,
    /// A marker was placed or cleared.
    Handled,
    BackgroundFit(LinearFit),
    PeakFit(FitResult),
    /// A projection is ready to be shown in a new view.
    Projection(Projection),
    /// The command was rejected; the view is unchanged.
    Failed(Error),
}

/// 1-D histogram view with its marker state.
pub struct HistogramView<S: RenderSurface> {
    samples: Samples,
    config: HistogramConfig,
    histogram: Histogram,
    options: ViewOptions,
    markers: MarkerStateMachine,
    overlays: Vec<ArtifactId>,
    surface: S,
}

impl<S: RenderSurface> HistogramView<S> {
    /// Bins `samples` and draws the view on `surface`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if `config` is invalid.
    pub fn new(samples: Samples, config: HistogramConfig, options: ViewOptions, mut surface: S) -> Result<Self> {
        let histogram = Histogram::from_samples(samples.values(), &config)?;

        surface.draw_steps(histogram.edges(), histogram.counts());
        if let Some(title) = &options.title {
            surface.set_title(title);
        }
        surface.set_axis_labels(
            options.x_label.as_deref().unwrap_or(samples.name()),
            options.y_label.as_deref().unwrap_or("Counts"),
        );
        if options.display_stats {
            surface.set_text_box(&Statistics::visible(&samples, &histogram).to_string());
        }

        Ok(Self {
            samples,
            config,
            histogram,
            options,
            markers: MarkerStateMachine::new(),
            overlays: Vec::new(),
            surface,
        })
    }

    /// Dispatches a key press to the marker state machine.
    ///
    /// Keys are only acted on with the pointer inside the plot.
    pub fn handle_key(&mut self, event: InputEvent) -> Outcome {
        let (Some(command), Some(x)) = (Command::from_key(event.key), event.x) else {
            return Outcome::Ignored;
        };

        let result = match command {
            Command::PlaceRegion => {
                self.markers.place_region(x, &mut self.surface);
                Ok(Outcome::Handled)
            }
            Command::PlaceBackground => {
                self.markers.place_background(x, &mut self.surface);
                Ok(Outcome::Handled)
            }
            Command::PlacePeak => {
                self.markers.place_peak(x, &mut self.surface);
                Ok(Outcome::Handled)
            }
            Command::ClearAll => {
                self.markers.clear_all(&mut self.surface);
                Ok(Outcome::Handled)
            }
            Command::FitBackground => self
                .markers
                .fit_background(&self.histogram, &mut self.surface)
                .map(Outcome::BackgroundFit),
            Command::FitPeak => self
                .markers
                .fit_peak(&self.histogram, &mut self.surface)
                .map(Outcome::PeakFit),
        };

        result.unwrap_or_else(|err| self.reject(err))
    }

    /// Rebins over the new visible range and refreshes the statistics.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for an empty or inverted range; the
    /// view keeps its previous histogram.
    pub fn on_range_change(&mut self, low: f64, high: f64) -> Result<()> {
        self.histogram = self.histogram.rebin(self.samples.values(), (low, high))?;
        self.surface
            .draw_steps(self.histogram.edges(), self.histogram.counts());
        if self.options.display_stats {
            self.surface
                .set_text_box(&Statistics::visible(&self.samples, &self.histogram).to_string());
        }
        Ok(())
    }

    /// Draws the shape of every record, sized for the initial bin width.
    pub fn overlay_fit_records(&mut self, records: &[FitRecord]) -> usize {
        let bin_width = self.config.bin_width();
        for record in records {
            let id = self
                .surface
                .add_curve(record.curve(bin_width, OVERLAY_POINTS), CurveKind::FitRecordOverlay);
            self.overlays.push(id);
        }
        log::debug!("overlaid {} fit records", records.len());
        records.len()
    }

    /// Passes a message to the analyst.
    pub fn report(&mut self, message: &str) {
        self.surface.report(message);
    }

    fn reject(&mut self, err: Error) -> Outcome {
        log::warn!("{err}");
        self.surface.report(&err.to_string());
        Outcome::Failed(err)
    }

    /// Statistics of the visible range.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics::visible(&self.samples, &self.histogram)
    }

    /// Histogram over the visible range.
    #[must_use]
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Binning the view was created with.
    #[must_use]
    pub fn config(&self) -> HistogramConfig {
        self.config
    }

    #[must_use]
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    #[must_use]
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerStateMachine {
        &self.markers
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Number of fit-record overlays drawn.
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }
}

/// A 1-D slice of a 2-D view, ready to become a [`HistogramView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Axis the samples were projected onto.
    pub axis: Axis,
    /// Sorted bounds on the other axis.
    pub bounds: (f64, f64),
    pub samples: Samples,
    pub config: HistogramConfig,
    pub title: String,
    /// Name of the projected coordinate.
    pub label: String,
}

impl Projection {
    /// Opens the projection as a new view drawn on `surface`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if the axis binning is invalid.
    pub fn into_view<T: RenderSurface>(self, surface: T) -> Result<HistogramView<T>> {
        let options = ViewOptions::default()
            .with_title(self.title)
            .with_x_label(self.label);
        HistogramView::new(self.samples, self.config, options, surface)
    }
}

/// 2-D histogram view with projection lines.
pub struct MatrixView<S: RenderSurface> {
    samples: PairSamples,
    config: Histogram2dConfig,
    histogram: Histogram2D,
    options: ViewOptions,
    x_lines: MarkerPair,
    y_lines: MarkerPair,
    surface: S,
}

impl<S: RenderSurface> MatrixView<S> {
    /// Bins the pairs and draws the colour map on `surface`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if `config` is invalid.
    pub fn new(samples: PairSamples, config: Histogram2dConfig, options: ViewOptions, mut surface: S) -> Result<Self> {
        let histogram = Histogram2D::from_pairs(&samples.pairs(), &config)?;

        surface.draw_color_map(&histogram);
        if let Some(title) = &options.title {
            surface.set_title(title);
        }
        surface.set_axis_labels(
            options.x_label.as_deref().unwrap_or(samples.x().name()),
            options.y_label.as_deref().unwrap_or(samples.y().name()),
        );
        if options.display_stats {
            surface.set_text_box(&integral_text(histogram.integral()));
        }

        Ok(Self {
            samples,
            config,
            histogram,
            options,
            x_lines: MarkerPair::new(MarkerRole::ProjectionX),
            y_lines: MarkerPair::new(MarkerRole::ProjectionY),
            surface,
        })
    }

    /// Dispatches a key press.
    ///
    /// `x` and `y` need the pointer inside the plot; `X` and `Y` do not.
    pub fn handle_key(&mut self, event: InputEvent) -> Outcome {
        let Some(command) = MatrixCommand::from_key(event.key) else {
            return Outcome::Ignored;
        };

        match command {
            MatrixCommand::PlaceLine(Axis::X) => match event.y {
                Some(y) => {
                    self.x_lines.place(y, &mut self.surface);
                    Outcome::Handled
                }
                None => Outcome::Ignored,
            },
            MatrixCommand::PlaceLine(Axis::Y) => match event.x {
                Some(x) => {
                    self.y_lines.place(x, &mut self.surface);
                    Outcome::Handled
                }
                None => Outcome::Ignored,
            },
            MatrixCommand::ShowProjection(axis) => match self.project(axis) {
                Ok(projection) => Outcome::Projection(projection),
                Err(err) => {
                    log::warn!("{err}");
                    self.surface.report(&err.to_string());
                    Outcome::Failed(err)
                }
            },
        }
    }

    /// Slices the raw pairs between the two lines bounding `axis` and
    /// returns the values of the `axis` coordinate, binned with that axis'
    /// binning.
    ///
    /// # Errors
    /// Returns [`Error::ProjectionLineCountError`] unless exactly two lines
    /// bound the projection.
    pub fn project(&self, axis: Axis) -> Result<Projection> {
        let (lines, kept, filter, config) = match axis {
            Axis::X => (&self.x_lines, self.samples.x(), self.samples.y(), self.config.x_axis()),
            Axis::Y => (&self.y_lines, self.samples.y(), self.samples.x(), self.config.y_axis()),
        };
        let (lo, hi) = lines.bounds().ok_or(Error::ProjectionLineCountError {
            axis,
            found: lines.len(),
        })?;

        let values: Vec<f64> = kept
            .values()
            .iter()
            .zip(filter.values())
            .filter(|(_, f)| **f >= lo && **f <= hi)
            .map(|(v, _)| *v)
            .collect();

        let title = format!(
            "{}-Projection: {} to {}",
            axis.to_string().to_uppercase(),
            format_float(round_to(lo, 2)),
            format_float(round_to(hi, 2))
        );
        log::info!("{title}: {} samples", values.len());

        Ok(Projection {
            axis,
            bounds: (lo, hi),
            samples: Samples::unnamed(values),
            config,
            title,
            label: kept.name().to_string(),
        })
    }

    /// Recomputes the integral over the visible ranges and returns it.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] for an empty or inverted range.
    pub fn on_range_change(&mut self, x_range: (f64, f64), y_range: (f64, f64)) -> Result<u64> {
        let visible = Histogram2D::from_pairs(
            &self.samples.pairs(),
            &Histogram2dConfig::new(self.config.bins, x_range, y_range),
        )?;
        let integral = visible.integral();
        if self.options.display_stats {
            self.surface.set_text_box(&integral_text(integral));
        }
        Ok(integral)
    }

    #[must_use]
    pub fn histogram(&self) -> &Histogram2D {
        &self.histogram
    }

    #[must_use]
    pub fn samples(&self) -> &PairSamples {
        &self.samples
    }

    #[must_use]
    pub fn config(&self) -> Histogram2dConfig {
        self.config
    }

    /// Positions of the lines bounding the projection onto `axis`.
    #[must_use]
    pub fn lines(&self, axis: Axis) -> Vec<f64> {
        match axis {
            Axis::X => self.x_lines.positions(),
            Axis::Y => self.y_lines.positions(),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;

    fn matrix() -> MatrixView<RecordingSurface> {
        let x = Samples::new("e1", vec![1.0, 2.0, 3.0, 8.0]);
        let y = Samples::new("e2", vec![5.0, 6.0, 7.0, 9.0]);
        MatrixView::new(
            PairSamples::new(x, y).unwrap(),
            Histogram2dConfig::new((10, 10), (0.0, 10.0), (0.0, 10.0)),
            ViewOptions::default(),
            RecordingSurface::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_y_projection_between_vertical_lines() {
        let mut view = matrix();
        assert_eq!(view.surface().text_box.as_deref(), Some("Integral: 4"));
        view.handle_key(InputEvent::at('y', 3.5, 0.0));
        view.handle_key(InputEvent::at('y', 0.5, 0.0));

        let Outcome::Projection(projection) = view.handle_key(InputEvent::outside('Y')) else {
            panic!("expected a projection");
        };
        assert_eq!(projection.axis, Axis::Y);
        assert_eq!(projection.samples.values(), &[5.0, 6.0, 7.0]);
        assert_eq!(projection.title, "Y-Projection: 0.5 to 3.5");
        assert_eq!(projection.label, "e2");

        let child = projection.into_view(RecordingSurface::default()).unwrap();
        assert_eq!(child.histogram().integral(), 3);
        assert_eq!(child.surface().title.as_deref(), Some("Y-Projection: 0.5 to 3.5"));
    }

    #[test]
    fn test_x_projection_needs_two_lines() {
        let mut view = matrix();
        view.handle_key(InputEvent::at('x', 0.0, 5.5));
        let outcome = view.handle_key(InputEvent::outside('X'));
        assert_eq!(
            outcome,
            Outcome::Failed(Error::ProjectionLineCountError {
                axis: Axis::X,
                found: 1
            })
        );
        assert_eq!(view.surface().messages.len(), 1);
        assert_eq!(view.lines(Axis::X), vec![5.5]);
    }

    #[test]
    fn test_line_keys_need_pointer() {
        let mut view = matrix();
        assert_eq!(view.handle_key(InputEvent::outside('y')), Outcome::Ignored);
        assert_eq!(view.handle_key(InputEvent::at('q', 1.0, 1.0)), Outcome::Ignored);
        assert!(view.lines(Axis::Y).is_empty());
    }

    #[test]
    fn test_matrix_range_change_updates_integral() {
        let mut view = matrix();
        assert_eq!(view.on_range_change((0.0, 4.0), (0.0, 10.0)).unwrap(), 3);
        assert_eq!(view.surface().text_box.as_deref(), Some("Integral: 3"));
        assert!(view.on_range_change((4.0, 4.0), (0.0, 10.0)).is_err());
        assert_eq!(view.histogram().integral(), 4);
    }
}
