//! View window rendering.
//!
//! Each window shows one controller's surface. Typed keys are forwarded to
//! the controller while the pointer is over the plot, and a settled change
//! of the visible range rebins the view.

use eframe::egui;
use histogrammer_core::{HistogramView, InputEvent, MatrixView, Outcome, Projection};
use histogrammer_io::{export_view, overlay_fit_file};
use rfd::FileDialog;

use crate::app::{HistogrammerApp, ViewKind};
use crate::util::format_count;
use crate::viewer::{Colormap, EguiSurface, PlotInteraction};

type Ranges = ((f64, f64), (f64, f64));

impl HistogrammerApp {
    /// Render every open view window and open the projections they produce.
    pub(crate) fn render_view_windows(&mut self, ctx: &egui::Context) {
        let colormap = self.colormap;
        let mut projections = Vec::new();

        for window in &mut self.windows {
            let title = match &window.kind {
                ViewKind::Spectrum(view) => window_title(view.surface(), view.samples().name()),
                ViewKind::Matrix(view) => {
                    let samples = view.samples();
                    let name = format!("{} vs {}", samples.y().name(), samples.x().name());
                    window_title(view.surface(), &name)
                }
            };
            let id = window.id;
            let mut open = window.open;

            egui::Window::new(title)
                .id(egui::Id::new(("view", id)))
                .open(&mut open)
                .default_size([720.0, 480.0])
                .show(ctx, |ui| match &mut window.kind {
                    ViewKind::Spectrum(view) => show_spectrum(ui, id, view, &mut window.applied),
                    ViewKind::Matrix(view) => {
                        if let Some(projection) =
                            show_matrix(ui, id, view, &mut window.applied, colormap)
                        {
                            projections.push(projection);
                        }
                    }
                });

            window.open = open;
        }

        self.windows.retain(|w| w.open);
        for projection in projections {
            self.open_projection(projection);
        }
    }
}

fn window_title(surface: &EguiSurface, fallback: &str) -> String {
    if surface.title().is_empty() {
        fallback.to_string()
    } else {
        surface.title().to_string()
    }
}

/// Characters typed this frame.
fn typed_keys(ui: &egui::Ui) -> Vec<char> {
    ui.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Text(text) => Some(text.chars().collect::<Vec<_>>()),
                _ => None,
            })
            .flatten()
            .collect()
    })
}

fn key_event(key: char, interaction: &PlotInteraction) -> InputEvent {
    match interaction.pointer {
        Some(p) => InputEvent::at(key, p.x, p.y),
        None => InputEvent::outside(key),
    }
}

/// Whether `new` differs from `old` by more than rounding noise.
fn range_changed(old: (f64, f64), new: (f64, f64)) -> bool {
    let tolerance = 1e-9 * (old.1 - old.0).abs().max(f64::MIN_POSITIVE);
    (old.0 - new.0).abs() > tolerance || (old.1 - new.1).abs() > tolerance
}

/// The visible ranges once the plot has settled.
fn settled_ranges(interaction: &PlotInteraction) -> Option<Ranges> {
    (!interaction.reframed && !interaction.dragging)
        .then_some((interaction.x_range, interaction.y_range))
}

fn show_text_box(ui: &mut egui::Ui, surface: &EguiSurface) {
    if let Some(text) = surface.text_box() {
        ui.monospace(text);
    }
}

fn show_messages(ui: &mut egui::Ui, id: u64, surface: &EguiSurface) {
    if surface.messages().is_empty() {
        return;
    }
    ui.push_id(("report", id), |ui| {
        egui::CollapsingHeader::new("Report")
            .default_open(true)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(110.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in surface.messages() {
                            ui.monospace(message);
                        }
                    });
            });
    });
}

fn export_spectrum(view: &mut HistogramView<EguiSurface>) {
    let Some(path) = FileDialog::new()
        .set_file_name(view.samples().export_name())
        .add_filter("HDTV spectrum", &["txt"])
        .save_file()
    else {
        return;
    };
    let message = match export_view(view, Some(&path)) {
        Ok(path) => format!("Wrote {}", path.display()),
        Err(err) => {
            log::warn!("{err}");
            err.to_string()
        }
    };
    view.report(&message);
}

fn overlay_from_dialog(view: &mut HistogramView<EguiSurface>) {
    let Some(path) = FileDialog::new().add_filter("HDTV fit", &["xml"]).pick_file() else {
        return;
    };
    let peaks = overlay_fit_file(view, &path);
    if peaks > 0 {
        view.report(&format!("Overlaid {peaks} peaks from {}", path.display()));
    }
}

fn show_spectrum(
    ui: &mut egui::Ui,
    id: u64,
    view: &mut HistogramView<EguiSurface>,
    applied: &mut Ranges,
) {
    ui.horizontal(|ui| {
        if ui.button("Export…").clicked() {
            export_spectrum(view);
        }
        if ui.button("Overlay fit file…").clicked() {
            overlay_from_dialog(view);
        }
        ui.label(format!("{} bins", view.histogram().bin_count()));
    });
    show_text_box(ui, view.surface());
    show_messages(ui, id, view.surface());

    let interaction = view.surface_mut().show(ui, egui::Id::new(("plot", id)));

    if interaction.hovered {
        for key in typed_keys(ui) {
            let outcome = view.handle_key(key_event(key, &interaction));
            log::debug!("{key:?} -> {outcome:?}");
        }
    }

    if let Some((x_range, _)) = settled_ranges(&interaction) {
        if range_changed(applied.0, x_range) {
            if let Err(err) = view.on_range_change(x_range.0, x_range.1) {
                log::warn!("{err}");
            }
            applied.0 = x_range;
        }
    }
}

fn show_matrix(
    ui: &mut egui::Ui,
    id: u64,
    view: &mut MatrixView<EguiSurface>,
    applied: &mut Ranges,
    colormap: Colormap,
) -> Option<Projection> {
    if view.surface().colormap() != colormap {
        let histogram = view.histogram().clone();
        view.surface_mut().set_colormap(colormap, &histogram);
    }

    ui.label(format!(
        "{} × {} bins, {} pairs binned",
        view.histogram().bin_counts().0,
        view.histogram().bin_counts().1,
        format_count(view.histogram().integral())
    ));
    show_text_box(ui, view.surface());
    show_messages(ui, id, view.surface());

    let interaction = view.surface_mut().show(ui, egui::Id::new(("plot", id)));

    let mut projection = None;
    if interaction.hovered {
        for key in typed_keys(ui) {
            match view.handle_key(key_event(key, &interaction)) {
                Outcome::Projection(p) => projection = Some(p),
                outcome => log::debug!("{key:?} -> {outcome:?}"),
            }
        }
    }

    if let Some(ranges) = settled_ranges(&interaction) {
        if range_changed(applied.0, ranges.0) || range_changed(applied.1, ranges.1) {
            if let Err(err) = view.on_range_change(ranges.0, ranges.1) {
                log::warn!("{err}");
            }
            *applied = ranges;
        }
    }

    projection
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_changed_ignores_rounding() {
        assert!(!range_changed((0.0, 100.0), (0.0, 100.0 + 1e-12)));
        assert!(range_changed((0.0, 100.0), (10.0, 100.0)));
        assert!(range_changed((0.0, 100.0), (0.0, 50.0)));
    }

    #[test]
    fn test_unsettled_plot_keeps_range() {
        let mut interaction = PlotInteraction {
            x_range: (1.0, 2.0),
            y_range: (3.0, 4.0),
            ..PlotInteraction::default()
        };
        assert_eq!(settled_ranges(&interaction), Some(((1.0, 2.0), (3.0, 4.0))));

        interaction.dragging = true;
        assert_eq!(settled_ranges(&interaction), None);

        interaction.dragging = false;
        interaction.reframed = true;
        assert_eq!(settled_ranges(&interaction), None);
    }

    #[test]
    fn test_key_event_carries_pointer() {
        let mut interaction = PlotInteraction::default();
        assert_eq!(key_event('f', &interaction), InputEvent::outside('f'));

        interaction.pointer = Some(egui_plot::PlotPoint::new(2.5, 7.0));
        assert_eq!(key_event('r', &interaction), InputEvent::at('r', 2.5, 7.0));
    }
}
