//! Control panel (left sidebar) rendering.

use eframe::egui;
use rfd::FileDialog;

use crate::app::HistogrammerApp;
use crate::viewer::Colormap;

/// Key bindings listed in the help section.
const KEY_HELP: &[(&str, &str)] = &[
    ("r", "region marker (two bound the fit)"),
    ("b", "background marker"),
    ("B", "fit background line"),
    ("p", "peak marker"),
    ("f", "fit peak in region"),
    ("-", "clear markers and fits"),
    ("x / y", "2-D: horizontal / vertical line"),
    ("X / Y", "2-D: show projection"),
];

fn range_row(ui: &mut egui::Ui, label: &str, range: &mut (f64, f64)) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(&mut range.0).speed(1.0));
        ui.label("to");
        ui.add(egui::DragValue::new(&mut range.1).speed(1.0));
    });
}

fn bins_row(ui: &mut egui::Ui, label: &str, bins: &mut usize) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(bins).range(1..=1_000_000));
    });
}

impl HistogrammerApp {
    /// Render the left control panel.
    pub(crate) fn render_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_file_section(ui);
                    ui.separator();
                    self.render_spectrum_section(ui);
                    ui.separator();
                    self.render_matrix_section(ui);
                    ui.separator();
                    Self::render_key_help(ui);
                    ui.separator();
                    ui.label(egui::RichText::new(&self.status).small());
                });
            });
    }

    fn render_file_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Histogrammer");
        if ui.button("Open events…").clicked() {
            if let Some(path) = FileDialog::new()
                .add_filter("Event columns", &["csv", "tsv", "txt", "h5", "hdf5"])
                .pick_file()
            {
                self.load_file(path);
            }
        }
        if let Some(file) = &self.file {
            let name = file
                .path
                .file_name()
                .map_or_else(|| file.path.display().to_string(), |n| n.to_string_lossy().to_string());
            ui.label(format!("{name}: {} columns", file.columns.len()));
        }
        ui.checkbox(&mut self.settings.display_stats, "Show statistics");
    }

    fn render_spectrum_section(&mut self, ui: &mut egui::Ui) {
        ui.strong("1-D histogram");
        let Some(file) = &self.file else {
            ui.label("No data loaded");
            return;
        };

        ui.label("Columns (several are concatenated)");
        for (name, ticked) in file.columns.iter().zip(self.selected.iter_mut()) {
            ui.checkbox(ticked, name.as_str());
        }
        bins_row(ui, "Bins", &mut self.settings.bins);
        range_row(ui, "Range", &mut self.settings.range);

        if ui.button("Histogram").clicked() {
            self.open_spectrum();
        }
    }

    fn render_matrix_section(&mut self, ui: &mut egui::Ui) {
        ui.strong("2-D histogram");
        let Some(file) = &self.file else {
            return;
        };

        let column_name = |i: usize| file.columns.get(i).cloned().unwrap_or_default();
        egui::ComboBox::from_label("X column")
            .selected_text(column_name(self.x_column))
            .show_ui(ui, |ui| {
                for (i, name) in file.columns.iter().enumerate() {
                    ui.selectable_value(&mut self.x_column, i, name.as_str());
                }
            });
        egui::ComboBox::from_label("Y column")
            .selected_text(column_name(self.y_column))
            .show_ui(ui, |ui| {
                for (i, name) in file.columns.iter().enumerate() {
                    ui.selectable_value(&mut self.y_column, i, name.as_str());
                }
            });

        bins_row(ui, "X bins", &mut self.settings.matrix_bins.0);
        bins_row(ui, "Y bins", &mut self.settings.matrix_bins.1);
        range_row(ui, "X range", &mut self.settings.x_range);
        range_row(ui, "Y range", &mut self.settings.y_range);

        egui::ComboBox::from_label("Colormap")
            .selected_text(self.colormap.to_string())
            .show_ui(ui, |ui| {
                for colormap in Colormap::ALL {
                    ui.selectable_value(&mut self.colormap, colormap, colormap.to_string());
                }
            });

        if ui.button("2-D histogram").clicked() {
            self.open_matrix();
        }
    }

    fn render_key_help(ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Keys").show(ui, |ui| {
            egui::Grid::new("key_help").num_columns(2).show(ui, |ui| {
                for (key, action) in KEY_HELP {
                    ui.monospace(*key);
                    ui.label(*action);
                    ui.end_row();
                }
            });
        });
    }

    /// Render the central panel hint shown behind the view windows.
    pub(crate) fn render_central_panel(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.windows.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("Open an event file and create a histogram. Keys act on the plot under the pointer.");
                });
            }
        });
    }
}
