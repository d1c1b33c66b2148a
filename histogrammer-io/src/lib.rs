//! histogrammer-io: File I/O for histogrammer.
//!
//! This crate reads HDTV fit files for peak overlays, writes histograms in
//! the HDTV spectrum text format, and loads event columns from CSV (and,
//! with the `hdf5` feature, HDF5) files.
//!

mod error;
pub mod fit_records;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use fit_records::{overlay_fit_file, parse_fit_records, read_fit_records, read_fit_records_in, Units};
#[cfg(feature = "hdf5")]
pub use hdf5::Hdf5ColumnStore;
pub use reader::CsvColumnStore;
pub use writer::{export_histogram, export_view, HistogramWriter};
