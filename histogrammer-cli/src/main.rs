//! Command-line interface for histogrammer.
//!
//! Bins event columns, exports spectra for HDTV, lists HDTV fit files, and
//! runs the interactive marker commands headless.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

mod script;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use histogrammer_core::{
    Axis, Histogram2dConfig, HistogramConfig, HistogramView, InputEvent, MatrixView, Outcome,
    PairSamples, RecordingSurface, SampleSource, ViewOptions,
};
use histogrammer_io::{
    export_view, overlay_fit_file, read_fit_records_in, CsvColumnStore, HistogramWriter, Units,
};
use thiserror::Error;

use crate::script::Step;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    HistogrammerIo(#[from] histogrammer_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] histogrammer_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Command failed: {0}")]
    Command(String),
}

/// Projection axis selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AxisArg {
    /// Project x values between two y bounds
    X,
    /// Project y values between two x bounds
    Y,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
        }
    }
}

/// Histogramming and peak fitting for nuclear physics event data.
#[derive(Parser)]
#[command(name = "histogrammer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input columns and binning of a 1-D histogram.
#[derive(Args)]
struct HistArgs {
    /// Input CSV file with a header row
    input: PathBuf,

    /// Column(s) to bin; several are concatenated
    #[arg(short, long = "column", required = true)]
    columns: Vec<String>,

    /// Number of bins
    #[arg(long, default_value = "512")]
    bins: usize,

    /// Binned range
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], default_values_t = [0.0, 4096.0], allow_negative_numbers = true)]
    range: Vec<f64>,

    /// Field delimiter of the input file
    #[arg(long, default_value = ",")]
    delimiter: char,
}

impl HistArgs {
    fn view(&self) -> Result<HistogramView<RecordingSurface>> {
        let store = open_store(&self.input, self.delimiter)?;
        let source = match self.columns.as_slice() {
            [column] => SampleSource::Column(column.clone()),
            columns => SampleSource::Concat(columns.to_vec()),
        };
        let samples = source.resolve(&store)?;
        let config = HistogramConfig::new(self.bins, (self.range[0], self.range[1]));
        Ok(HistogramView::new(
            samples,
            config,
            ViewOptions::default(),
            RecordingSurface::default(),
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Bin columns, print statistics and export the spectrum
    Hist {
        #[command(flatten)]
        hist: HistArgs,

        /// Output file path (default: <column>_hist.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write bin edges and counts as CSV instead of the HDTV format
        #[arg(long)]
        csv: bool,
    },

    /// List the peaks of an HDTV fit file
    FitRecords {
        /// Input fit file
        input: PathBuf,

        /// Read the uncalibrated values
        #[arg(long)]
        raw: bool,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Fit a peak between two region bounds
    Fit {
        #[command(flatten)]
        hist: HistArgs,

        /// Region bounds
        #[arg(long, num_args = 2, value_names = ["A", "B"], required = true, allow_negative_numbers = true)]
        region: Vec<f64>,

        /// Peak center hint
        #[arg(long, allow_negative_numbers = true)]
        peak: Option<f64>,

        /// Background marker positions; fitted before the peak
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        background: Vec<f64>,

        /// HDTV fit file to overlay
        #[arg(long)]
        fit_file: Option<PathBuf>,

        /// Print the fit result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project a 2-D histogram between two bounds and export it
    Project {
        /// Input CSV file with a header row
        input: PathBuf,

        /// Column of x values
        #[arg(long)]
        x_column: String,

        /// Column of y values
        #[arg(long)]
        y_column: String,

        /// Bins along x and y
        #[arg(long, num_args = 2, value_names = ["NX", "NY"], default_values_t = [512, 512])]
        bins: Vec<usize>,

        /// Binned x range
        #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], default_values_t = [0.0, 4096.0], allow_negative_numbers = true)]
        x_range: Vec<f64>,

        /// Binned y range
        #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], default_values_t = [0.0, 4096.0], allow_negative_numbers = true)]
        y_range: Vec<f64>,

        /// Axis to project onto
        #[arg(long, value_enum)]
        axis: AxisArg,

        /// Bounds on the other axis
        #[arg(long, num_args = 2, value_names = ["A", "B"], required = true, allow_negative_numbers = true)]
        between: Vec<f64>,

        /// Output file path (default: _hist.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter of the input file
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Replay a key script against a histogram
    Replay {
        #[command(flatten)]
        hist: HistArgs,

        /// Script file, one `<key> [<x> [<y>]]` or `range <low> <high>` per line
        #[arg(long)]
        script: PathBuf,

        /// HDTV fit file to overlay
        #[arg(long)]
        fit_file: Option<PathBuf>,
    },
}

fn open_store(path: &Path, delimiter: char) -> Result<CsvColumnStore> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| CliError::Command(format!("delimiter {delimiter:?} is not a single byte")))?;
    Ok(CsvColumnStore::open_with_delimiter(path, delimiter)?)
}

/// Presses `key` at `x` and turns a rejected command into an error.
fn press(view: &mut HistogramView<RecordingSurface>, key: char, x: f64) -> Result<Outcome> {
    match view.handle_key(InputEvent::at(key, x, 0.0)) {
        Outcome::Failed(err) => Err(err.into()),
        outcome => Ok(outcome),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Hist { hist, output, csv } => {
            let view = hist.view()?;
            println!("{}", view.statistics());

            if csv {
                let path = output.unwrap_or_else(|| PathBuf::from(format!("{}_hist.csv", view.samples().name())));
                HistogramWriter::create(&path)?.write_csv(view.histogram())?;
                println!("Wrote {}", path.display());
            } else {
                let path = export_view(&view, output.as_deref())?;
                println!("Wrote {}", path.display());
            }
        }

        Commands::FitRecords { input, raw, json } => {
            let units = if raw { Units::Raw } else { Units::Calibrated };
            let records = read_fit_records_in(&input, units)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!(
                    "{:>12} {:>10} {:>10} {:>10} {:>12} {:>10}",
                    "Position", "Error", "FWHM", "Error", "Volume", "Error"
                );
                for r in &records {
                    println!(
                        "{:>12.4} {:>10.4} {:>10.4} {:>10.4} {:>12.4} {:>10.4}",
                        r.position, r.position_error, r.width, r.width_error, r.volume, r.volume_error
                    );
                }
            }
        }

        Commands::Fit {
            hist,
            region,
            peak,
            background,
            fit_file,
            json,
        } => {
            let mut view = hist.view()?;
            if let Some(path) = fit_file {
                overlay_fit_file(&mut view, path);
            }

            if !background.is_empty() {
                for x in &background {
                    press(&mut view, 'b', *x)?;
                }
                if let Outcome::BackgroundFit(line) = press(&mut view, 'B', background[0])? {
                    println!("Background: {}, {}", line.slope, line.intercept);
                }
            }

            press(&mut view, 'r', region[0])?;
            press(&mut view, 'r', region[1])?;
            if let Some(x) = peak {
                press(&mut view, 'p', x)?;
            }

            let Outcome::PeakFit(result) = press(&mut view, 'f', region[0])? else {
                return Err(CliError::Command("peak fit produced no result".into()));
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for line in result.report_lines() {
                    println!("{}", line);
                }
            }
        }

        Commands::Project {
            input,
            x_column,
            y_column,
            bins,
            x_range,
            y_range,
            axis,
            between,
            output,
            delimiter,
        } => {
            let store = open_store(&input, delimiter)?;
            let samples = PairSamples::resolve(
                &[(SampleSource::Column(x_column), SampleSource::Column(y_column))],
                &store,
            )?;
            let config = Histogram2dConfig::new(
                (bins[0], bins[1]),
                (x_range[0], x_range[1]),
                (y_range[0], y_range[1]),
            );
            let mut matrix = MatrixView::new(samples, config, ViewOptions::default(), RecordingSurface::default())?;
            println!("Integral: {}", matrix.histogram().integral());

            let axis = Axis::from(axis);
            let (line_key, show_key) = match axis {
                Axis::X => ('x', 'X'),
                Axis::Y => ('y', 'Y'),
            };
            for bound in &between {
                let event = match axis {
                    Axis::X => InputEvent::at(line_key, 0.0, *bound),
                    Axis::Y => InputEvent::at(line_key, *bound, 0.0),
                };
                matrix.handle_key(event);
            }

            let projection = match matrix.handle_key(InputEvent::outside(show_key)) {
                Outcome::Projection(projection) => projection,
                Outcome::Failed(err) => return Err(err.into()),
                _ => return Err(CliError::Command("projection produced no result".into())),
            };
            println!("{}", projection.title);
            let view = projection.into_view(RecordingSurface::default())?;
            println!("{}", view.statistics());
            let path = export_view(&view, output.as_deref())?;
            println!("Wrote {}", path.display());
        }

        Commands::Replay {
            hist,
            script: script_path,
            fit_file,
        } => {
            let text = std::fs::read_to_string(&script_path)?;
            let steps = script::parse(&text).map_err(CliError::Script)?;

            let mut view = hist.view()?;
            if let Some(path) = fit_file {
                overlay_fit_file(&mut view, path);
            }

            let mut reported = 0;
            for step in steps {
                match step {
                    Step::Key(event) => {
                        match view.handle_key(event) {
                            Outcome::Ignored => log::warn!("key {:?} is not bound", event.key),
                            outcome => log::debug!("{:?} -> {:?}", event, outcome),
                        }
                    }
                    Step::Range(low, high) => {
                        if let Err(err) = view.on_range_change(low, high) {
                            log::warn!("{}", err);
                        }
                    }
                }
                let messages = &view.surface().messages;
                for message in &messages[reported..] {
                    println!("{}", message);
                }
                reported = messages.len();
            }

            if let Some(text) = &view.surface().text_box {
                println!("{}", text);
            }
        }
    }

    Ok(())
}
