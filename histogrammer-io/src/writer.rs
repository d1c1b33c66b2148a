//! Histogram writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use histogrammer_core::numeric::format_float;
use histogrammer_core::{Histogram, HistogramView, RenderSurface};

use crate::Result;

/// Writes histograms to files.
pub struct HistogramWriter {
    writer: BufWriter<File>,
}

impl HistogramWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes counts in the HDTV spectrum text format.
    ///
    /// Two comment lines, then one count per line in bin order. The second
    /// line carries the HDTV command that calibrates channel numbers back to
    /// the histogram's x values.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_hdtv(&mut self, histogram: &Histogram) -> Result<()> {
        let (low, _) = histogram.range();
        writeln!(self.writer, "# Counts")?;
        writeln!(
            self.writer,
            "# Calibrate in HDTV with: calibration position set {} 1",
            format_float(low - 0.5)
        )?;

        for count in histogram.counts() {
            writeln!(self.writer, "{count}")?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes bins as CSV with columns `bin_low,bin_high,count`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_csv(self, histogram: &Histogram) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(self.writer);
        wtr.write_record(["bin_low", "bin_high", "count"])?;
        for (bin, count) in histogram.edges().windows(2).zip(histogram.counts()) {
            wtr.write_record(&[bin[0].to_string(), bin[1].to_string(), count.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Writes `histogram` to `path` in the HDTV text format.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn export_histogram<P: AsRef<Path>>(histogram: &Histogram, path: P) -> Result<()> {
    let mut writer = HistogramWriter::create(path.as_ref())?;
    writer.write_hdtv(histogram)?;
    log::info!(
        "wrote {} bins to {}",
        histogram.bin_count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Exports the visible histogram of `view`.
///
/// Without a path the file is named after the samples, `<name>_hist.txt`.
/// Returns the path written.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn export_view<S: RenderSurface>(view: &HistogramView<S>, path: Option<&Path>) -> Result<PathBuf> {
    let path = path.map_or_else(|| PathBuf::from(view.samples().export_name()), Path::to_path_buf);
    export_histogram(view.histogram(), &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use histogrammer_core::HistogramConfig;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_hdtv() {
        let file = NamedTempFile::new().unwrap();
        let hist = Histogram::from_samples(&[0.5, 1.5, 1.7], &HistogramConfig::new(3, (0.0, 3.0))).unwrap();
        export_histogram(&hist, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            content,
            "# Counts\n# Calibrate in HDTV with: calibration position set -0.5 1\n1\n2\n0\n"
        );
    }

    #[test]
    fn test_calibration_offset_keeps_decimal() {
        let file = NamedTempFile::new().unwrap();
        let hist = Histogram::from_samples(&[], &HistogramConfig::new(2, (1.5, 3.5))).unwrap();
        export_histogram(&hist, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.lines().nth(1), Some("# Calibrate in HDTV with: calibration position set 1.0 1"));
    }

    #[test]
    fn test_write_csv() {
        let file = NamedTempFile::new().unwrap();
        let hist = Histogram::from_samples(&[0.5, 1.5, 1.7], &HistogramConfig::new(2, (0.0, 2.0))).unwrap();
        HistogramWriter::create(file.path()).unwrap().write_csv(&hist).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "bin_low,bin_high,count\n0,1,1\n1,2,2\n");
    }
}
