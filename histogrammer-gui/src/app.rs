//! Main application state and logic.
//!
//! Contains the `HistogrammerApp` struct which holds the loaded event
//! columns, the binning settings, and the open view windows.

use std::path::{Path, PathBuf};

use anyhow::Context;
use eframe::egui;
use histogrammer_core::{
    ColumnStore, Histogram2dConfig, HistogramConfig, HistogramView, MatrixView, PairSamples,
    Projection, SampleSource, ViewOptions,
};
use histogrammer_io::{CsvColumnStore, Hdf5ColumnStore};

use crate::viewer::{Colormap, EguiSurface};

/// Event columns of the opened file.
pub(crate) struct LoadedFile {
    pub(crate) path: PathBuf,
    pub(crate) store: Box<dyn ColumnStore>,
    pub(crate) columns: Vec<String>,
}

/// Binning chosen in the control panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BinningSettings {
    pub(crate) bins: usize,
    pub(crate) range: (f64, f64),
    pub(crate) matrix_bins: (usize, usize),
    pub(crate) x_range: (f64, f64),
    pub(crate) y_range: (f64, f64),
    pub(crate) display_stats: bool,
}

impl Default for BinningSettings {
    fn default() -> Self {
        Self {
            bins: 512,
            range: (0.0, 4096.0),
            matrix_bins: (512, 512),
            x_range: (0.0, 4096.0),
            y_range: (0.0, 4096.0),
            display_stats: true,
        }
    }
}

/// The controller behind a view window.
pub(crate) enum ViewKind {
    Spectrum(HistogramView<EguiSurface>),
    Matrix(MatrixView<EguiSurface>),
}

/// One open view window.
pub(crate) struct ViewWindow {
    pub(crate) id: u64,
    pub(crate) kind: ViewKind,
    pub(crate) open: bool,
    /// Visible `(x, y)` ranges the controller last rebinned to.
    pub(crate) applied: ((f64, f64), (f64, f64)),
}

/// Main application state.
pub struct HistogrammerApp {
    /// Opened event file.
    pub(crate) file: Option<LoadedFile>,
    /// Columns ticked for the 1-D histogram; several are concatenated.
    pub(crate) selected: Vec<bool>,
    /// Column indices of the 2-D histogram axes.
    pub(crate) x_column: usize,
    pub(crate) y_column: usize,

    pub(crate) settings: BinningSettings,
    pub(crate) colormap: Colormap,

    pub(crate) windows: Vec<ViewWindow>,
    next_window_id: u64,

    /// Last status line.
    pub(crate) status: String,
}

impl Default for HistogrammerApp {
    fn default() -> Self {
        Self {
            file: None,
            selected: Vec::new(),
            x_column: 0,
            y_column: 0,
            settings: BinningSettings::default(),
            colormap: Colormap::default(),
            windows: Vec::new(),
            next_window_id: 0,
            status: "Open a CSV or HDF5 file of event columns".to_string(),
        }
    }
}

/// Opens the column store matching the file extension.
fn open_store(path: &Path) -> anyhow::Result<Box<dyn ColumnStore>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let store: Box<dyn ColumnStore> = match extension.as_deref() {
        Some("h5" | "hdf5") => Box::new(Hdf5ColumnStore::open(path)?),
        Some("tsv") => Box::new(CsvColumnStore::open_with_delimiter(path, b'\t')?),
        _ => Box::new(CsvColumnStore::open(path)?),
    };
    Ok(store)
}

impl HistogrammerApp {
    /// Load the event columns of a file.
    pub fn load_file(&mut self, path: PathBuf) {
        match open_store(&path).with_context(|| format!("cannot open {}", path.display())) {
            Ok(store) => {
                let columns = store.column_names();
                self.status = format!("Loaded {} columns", columns.len());
                self.selected = vec![false; columns.len()];
                if let Some(first) = self.selected.first_mut() {
                    *first = true;
                }
                self.x_column = 0;
                self.y_column = usize::from(columns.len() > 1);
                self.file = Some(LoadedFile {
                    path,
                    store,
                    columns,
                });
            }
            Err(err) => {
                log::warn!("{err:#}");
                self.status = format!("Error: {err:#}");
            }
        }
    }

    /// Names of the ticked 1-D columns.
    pub(crate) fn selected_columns(&self) -> Vec<String> {
        let Some(file) = &self.file else {
            return Vec::new();
        };
        file.columns
            .iter()
            .zip(&self.selected)
            .filter(|(_, ticked)| **ticked)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn view_options(&self) -> ViewOptions {
        ViewOptions::default().with_display_stats(self.settings.display_stats)
    }

    /// Open a 1-D histogram of the ticked columns.
    pub fn open_spectrum(&mut self) {
        if let Err(err) = self.try_open_spectrum() {
            log::warn!("{err:#}");
            self.status = format!("Error: {err:#}");
        }
    }

    fn try_open_spectrum(&mut self) -> anyhow::Result<()> {
        let file = self.file.as_ref().context("no file loaded")?;
        let source = match self.selected_columns().as_slice() {
            [] => anyhow::bail!("no column selected"),
            [column] => SampleSource::Column(column.clone()),
            columns => SampleSource::Concat(columns.to_vec()),
        };
        let samples = source.resolve(file.store.as_ref())?;
        let config = HistogramConfig::new(self.settings.bins, self.settings.range);
        let view = HistogramView::new(
            samples,
            config,
            self.view_options(),
            EguiSurface::new(self.colormap),
        )?;
        self.status = format!("Binned {} samples", view.samples().len());
        self.push_window(ViewKind::Spectrum(view), (config.range, (0.0, 0.0)));
        Ok(())
    }

    /// Open a 2-D histogram of the chosen x and y columns.
    pub fn open_matrix(&mut self) {
        if let Err(err) = self.try_open_matrix() {
            log::warn!("{err:#}");
            self.status = format!("Error: {err:#}");
        }
    }

    fn try_open_matrix(&mut self) -> anyhow::Result<()> {
        let file = self.file.as_ref().context("no file loaded")?;
        let name = |i: usize| file.columns.get(i).cloned().context("no such column");
        let pair = (
            SampleSource::Column(name(self.x_column)?),
            SampleSource::Column(name(self.y_column)?),
        );
        let samples = PairSamples::resolve(&[pair], file.store.as_ref())?;
        let config = Histogram2dConfig::new(
            self.settings.matrix_bins,
            self.settings.x_range,
            self.settings.y_range,
        );
        let view = MatrixView::new(
            samples,
            config,
            self.view_options(),
            EguiSurface::new(self.colormap),
        )?;
        self.status = format!("Binned {} pairs", view.samples().len());
        self.push_window(ViewKind::Matrix(view), (config.x_range, config.y_range));
        Ok(())
    }

    /// Open a projection as a new 1-D window.
    pub(crate) fn open_projection(&mut self, projection: Projection) {
        let range = projection.config.range;
        match projection.into_view(EguiSurface::new(self.colormap)) {
            Ok(view) => self.push_window(ViewKind::Spectrum(view), (range, (0.0, 0.0))),
            Err(err) => {
                log::warn!("{err}");
                self.status = format!("Error: {err}");
            }
        }
    }

    fn push_window(&mut self, kind: ViewKind, applied: ((f64, f64), (f64, f64))) {
        self.next_window_id += 1;
        self.windows.push(ViewWindow {
            id: self.next_window_id,
            kind,
            open: true,
            applied,
        });
    }
}

impl eframe::App for HistogrammerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_side_panel(ctx);
        self.render_central_panel(ctx);
        self.render_view_windows(ctx);
    }
}
