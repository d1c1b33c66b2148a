//! An egui plot as the drawing surface of a view.

use std::collections::BTreeMap;

use eframe::egui::{self, Color32, TextureHandle, TextureOptions};
use egui_plot::{HLine, Line, LineStyle, Plot, PlotBounds, PlotImage, PlotPoint, PlotPoints, VLine};
use histogrammer_core::{ArtifactId, CurveKind, Histogram2D, MarkerRole, Orientation, RenderSurface};

use crate::util::{f64_to_f32, u64_to_f64};
use crate::viewer::{color_map_image, Colormap};

/// Messages kept for the window's report area.
const MAX_MESSAGES: usize = 200;

struct MarkerLine {
    orientation: Orientation,
    position: f64,
    role: MarkerRole,
}

struct Curve {
    kind: CurveKind,
    points: Vec<[f64; 2]>,
}

struct ColorMapLayer {
    image: egui::ColorImage,
    texture: Option<TextureHandle>,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

/// What the analyst did to the plot during one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotInteraction {
    /// The pointer is over the plot.
    pub hovered: bool,
    /// Pointer position in data coordinates.
    pub pointer: Option<PlotPoint>,
    /// Visible x range.
    pub x_range: (f64, f64),
    /// Visible y range.
    pub y_range: (f64, f64),
    /// A drag is still in progress.
    pub dragging: bool,
    /// Bounds were set programmatically this frame; the ranges above are stale.
    pub reframed: bool,
}

/// Retained plot contents, drawn every frame by [`EguiSurface::show`].
pub struct EguiSurface {
    colormap: Colormap,
    next_id: u64,
    steps: Vec<[f64; 2]>,
    color_map: Option<ColorMapLayer>,
    markers: BTreeMap<ArtifactId, MarkerLine>,
    curves: BTreeMap<ArtifactId, Curve>,
    text_box: Option<String>,
    messages: Vec<String>,
    title: String,
    x_label: String,
    y_label: String,
    /// Bounds to apply on the next frame.
    pending_bounds: Option<PlotBounds>,
    /// Initial bounds were chosen.
    framed: bool,
}

impl EguiSurface {
    #[must_use]
    pub fn new(colormap: Colormap) -> Self {
        Self {
            colormap,
            next_id: 0,
            steps: Vec::new(),
            color_map: None,
            markers: BTreeMap::new(),
            curves: BTreeMap::new(),
            text_box: None,
            messages: Vec::new(),
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            pending_bounds: None,
            framed: false,
        }
    }

    #[must_use]
    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn text_box(&self) -> Option<&str> {
        self.text_box.as_deref()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Changes the colormap and re-renders the colour map texture.
    pub fn set_colormap(&mut self, colormap: Colormap, histogram: &Histogram2D) {
        if self.colormap != colormap {
            self.colormap = colormap;
            self.draw_color_map(histogram);
        }
    }

    fn next_id(&mut self) -> ArtifactId {
        self.next_id += 1;
        ArtifactId(self.next_id)
    }

    /// Draws the plot and reports how it was interacted with.
    pub fn show(&mut self, ui: &mut egui::Ui, id: egui::Id) -> PlotInteraction {
        if let Some(layer) = &mut self.color_map {
            if layer.texture.is_none() {
                layer.texture =
                    Some(ui.ctx().load_texture("color_map", layer.image.clone(), TextureOptions::NEAREST));
            }
        }
        let pending = self.pending_bounds.take();

        let response = Plot::new(id)
            .x_axis_label(self.x_label.clone())
            .y_axis_label(self.y_label.clone())
            .auto_bounds(egui::Vec2b::new(false, false))
            .show(ui, |plot_ui| {
                if let Some(bounds) = pending {
                    plot_ui.set_plot_bounds(bounds);
                }

                if let Some(layer) = &self.color_map {
                    if let Some(texture) = &layer.texture {
                        let (x0, x1) = layer.x_range;
                        let (y0, y1) = layer.y_range;
                        plot_ui.image(PlotImage::new(
                            texture,
                            PlotPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0),
                            [f64_to_f32(x1 - x0), f64_to_f32(y1 - y0)],
                        ));
                    }
                }

                if !self.steps.is_empty() {
                    plot_ui.line(
                        Line::new(PlotPoints::from(self.steps.clone()))
                            .color(Color32::from_rgb(31, 119, 180))
                            .name("Counts"),
                    );
                }

                for curve in self.curves.values() {
                    let (color, name) = curve_style(curve.kind);
                    plot_ui.line(
                        Line::new(PlotPoints::from(curve.points.clone()))
                            .color(color)
                            .width(1.5)
                            .name(name),
                    );
                }

                for marker in self.markers.values() {
                    let color = marker_color(marker.role);
                    match marker.orientation {
                        Orientation::Vertical => plot_ui.vline(
                            VLine::new(marker.position)
                                .color(color)
                                .style(LineStyle::dashed_loose()),
                        ),
                        Orientation::Horizontal => plot_ui.hline(
                            HLine::new(marker.position)
                                .color(color)
                                .style(LineStyle::dashed_loose()),
                        ),
                    }
                }

                let bounds = plot_ui.plot_bounds();
                PlotInteraction {
                    hovered: false,
                    pointer: plot_ui.pointer_coordinate(),
                    x_range: (bounds.min()[0], bounds.max()[0]),
                    y_range: (bounds.min()[1], bounds.max()[1]),
                    dragging: false,
                    reframed: pending.is_some(),
                }
            });

        PlotInteraction {
            hovered: response.response.hovered(),
            dragging: response.response.dragged(),
            ..response.inner
        }
    }
}

fn marker_color(role: MarkerRole) -> Color32 {
    match role {
        MarkerRole::Region => Color32::from_rgb(11, 0, 233),
        MarkerRole::Background | MarkerRole::ProjectionX => Color32::from_rgb(0, 160, 0),
        MarkerRole::Peak => Color32::from_rgb(128, 0, 128),
        MarkerRole::ProjectionY => Color32::RED,
    }
}

fn curve_style(kind: CurveKind) -> (Color32, &'static str) {
    match kind {
        CurveKind::Background => (Color32::from_rgb(0, 160, 0), "Background"),
        CurveKind::Peak => (Color32::from_rgb(214, 39, 40), "Peak"),
        CurveKind::PeakWithBackground => (Color32::from_rgb(255, 127, 14), "Peak + background"),
        CurveKind::FitRecordOverlay => (Color32::from_rgb(240, 128, 128), "Fit file"),
    }
}

impl RenderSurface for EguiSurface {
    fn draw_steps(&mut self, edges: &[f64], counts: &[u64]) {
        self.steps = edges
            .windows(2)
            .zip(counts)
            .flat_map(|(bin, &count)| {
                let y = u64_to_f64(count);
                [[bin[0], y], [bin[1], y]]
            })
            .collect();

        if !self.framed {
            if let (Some(&low), Some(&high)) = (edges.first(), edges.last()) {
                let top = counts.iter().copied().max().map_or(1.0, u64_to_f64).max(1.0);
                self.pending_bounds = Some(PlotBounds::from_min_max([low, 0.0], [high, top * 1.05]));
                self.framed = true;
            }
        }
    }

    fn draw_color_map(&mut self, histogram: &Histogram2D) {
        let layer = ColorMapLayer {
            image: color_map_image(histogram, self.colormap),
            texture: None,
            x_range: histogram.x_range(),
            y_range: histogram.y_range(),
        };
        if !self.framed {
            self.pending_bounds = Some(PlotBounds::from_min_max(
                [layer.x_range.0, layer.y_range.0],
                [layer.x_range.1, layer.y_range.1],
            ));
            self.framed = true;
        }
        self.color_map = Some(layer);
    }

    fn add_marker(&mut self, orientation: Orientation, position: f64, role: MarkerRole) -> ArtifactId {
        let id = self.next_id();
        self.markers.insert(
            id,
            MarkerLine {
                orientation,
                position,
                role,
            },
        );
        id
    }

    fn add_curve(&mut self, points: Vec<[f64; 2]>, kind: CurveKind) -> ArtifactId {
        let id = self.next_id();
        self.curves.insert(id, Curve { kind, points });
        id
    }

    fn remove(&mut self, id: ArtifactId) {
        self.markers.remove(&id);
        self.curves.remove(&id);
    }

    fn set_text_box(&mut self, text: &str) {
        self.text_box = Some(text.to_string());
    }

    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_axis_labels(&mut self, x: &str, y: &str) {
        self.x_label = x.to_string();
        self.y_label = y.to_string();
    }
}
