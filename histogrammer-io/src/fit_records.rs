//! Reader for HDTV fit files.
//!
//! The document holds `fit` elements with `peak` children. Every peak has an
//! `uncal` and a `cal` block, each with `pos`, `width` and `vol` elements
//! carrying a `value` and an `error`. Both blocks are parsed whichever one
//! is kept, so a malformed block fails the whole document:
//!
//! ```xml
//! <hdtv>
//!   <fit>
//!     <peak>
//!       <uncal><pos><value>812.3</value><error>0.1</error></pos>...</uncal>
//!       <cal><pos><value>1173.2</value><error>0.2</error></pos>...</cal>
//!     </peak>
//!   </fit>
//! </hdtv>
//! ```

use std::path::Path;

use histogrammer_core::fit::round_to;
use histogrammer_core::{FitRecord, HistogramView, RenderSurface};
use roxmltree::Node;

use crate::{Error, Result};

/// Decimal places kept from every value.
const DIGITS: u32 = 4;

/// Which unit block of a peak to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// The `cal` block.
    #[default]
    Calibrated,
    /// The `uncal` block, in channels.
    Raw,
}

impl Units {
    fn tag(self) -> &'static str {
        match self {
            Units::Calibrated => "cal",
            Units::Raw => "uncal",
        }
    }
}

/// Reads the calibrated fit records of an HDTV fit file, in document order.
///
/// # Errors
/// Returns [`Error::MissingFitFile`] if `path` does not exist, and
/// [`Error::Xml`] for a malformed document or peak.
pub fn read_fit_records<P: AsRef<Path>>(path: P) -> Result<Vec<FitRecord>> {
    read_fit_records_in(path, Units::Calibrated)
}

/// Reads the fit records of one unit block.
///
/// # Errors
/// See [`read_fit_records`].
pub fn read_fit_records_in<P: AsRef<Path>>(path: P, units: Units) -> Result<Vec<FitRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingFitFile {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let records = parse_fit_records(&text, units)
        .map_err(|e| Error::Xml(format!("{}: {e}", path.display())))?;
    log::debug!("read {} fit records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses fit records from document text.
///
/// # Errors
/// Returns a description of the first problem found.
pub fn parse_fit_records(text: &str, units: Units) -> std::result::Result<Vec<FitRecord>, String> {
    let doc = roxmltree::Document::parse(text).map_err(|e| e.to_string())?;

    let mut records = Vec::new();
    for fit in doc.root_element().children().filter(|n| n.has_tag_name("fit")) {
        for peak in fit.children().filter(|n| n.has_tag_name("peak")) {
            let raw = block_record(child(peak, Units::Raw.tag())?)?;
            let calibrated = block_record(child(peak, Units::Calibrated.tag())?)?;
            records.push(match units {
                Units::Raw => raw,
                Units::Calibrated => calibrated,
            });
        }
    }
    Ok(records)
}

/// Draws the records of `path` onto `view`.
///
/// A missing or unreadable file is logged and reported on the view; the
/// view is otherwise unchanged. Returns the number of overlays drawn.
pub fn overlay_fit_file<S: RenderSurface, P: AsRef<Path>>(view: &mut HistogramView<S>, path: P) -> usize {
    match read_fit_records(path) {
        Ok(records) => view.overlay_fit_records(&records),
        Err(err) => {
            log::warn!("{err}");
            view.report(&err.to_string());
            0
        }
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> std::result::Result<Node<'a, 'input>, String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .ok_or_else(|| format!("<{}> has no <{tag}> element", node.tag_name().name()))
}

fn block_record(block: Node) -> std::result::Result<FitRecord, String> {
    let (position, position_error) = measurement(block, "pos")?;
    let (width, width_error) = measurement(block, "width")?;
    let (volume, volume_error) = measurement(block, "vol")?;
    Ok(FitRecord {
        position,
        position_error,
        width,
        width_error,
        volume,
        volume_error,
    })
}

fn measurement(block: Node, tag: &str) -> std::result::Result<(f64, f64), String> {
    let node = child(block, tag)?;
    Ok((leaf(node, "value")?, leaf(node, "error")?))
}

fn leaf(node: Node, tag: &str) -> std::result::Result<f64, String> {
    let text = child(node, tag)?.text().unwrap_or("").trim();
    text.parse::<f64>()
        .map(|v| round_to(v, DIGITS))
        .map_err(|e| format!("<{}><{tag}> {text:?}: {e}", node.tag_name().name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn measurement_xml(tag: &str, value: &str, error: &str) -> String {
        format!("<{tag}><value>{value}</value><error>{error}</error></{tag}>")
    }

    fn peak_xml(uncal_pos: &str, cal_pos: &str) -> String {
        format!(
            "<peak><uncal>{}{}{}</uncal><cal>{}{}{}</cal></peak>",
            measurement_xml("pos", uncal_pos, "0.5"),
            measurement_xml("width", "3.0", "0.1"),
            measurement_xml("vol", "900", "30"),
            measurement_xml("pos", cal_pos, "0.25"),
            measurement_xml("width", "4.56789", "0.2"),
            measurement_xml("vol", "1000", "31.622777"),
        )
    }

    #[test]
    fn test_calibrated_values_rounded() {
        let xml = format!("<hdtv><fit>{}</fit></hdtv>", peak_xml("55.5", "100.12345"));
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();

        let records = read_fit_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].position, 100.1235);
        assert_eq!(
            records[0].as_tuple(),
            (100.1235, 0.25, 4.5679, 0.2, 1000.0, 31.6228)
        );

        let raw = read_fit_records_in(file.path(), Units::Raw).unwrap();
        assert_eq!(raw[0].position, 55.5);
    }

    #[test]
    fn test_document_order_across_fits() {
        let xml = format!(
            "<hdtv><fit>{}{}</fit><fit/><fit>{}</fit></hdtv>",
            peak_xml("1", "10"),
            peak_xml("2", "20"),
            peak_xml("3", "30")
        );
        let records = parse_fit_records(&xml, Units::Calibrated).unwrap();
        let positions: Vec<f64> = records.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.xml");
        match read_fit_records(&path) {
            Err(Error::MissingFitFile { path: p }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_malformed_uncal_block_fails_calibrated_read() {
        let xml = format!(
            "<hdtv><fit><peak><uncal>{}{}{}</uncal><cal>{}{}{}</cal></peak></fit></hdtv>",
            measurement_xml("pos", "abc", "0.1"),
            measurement_xml("width", "3", "0.1"),
            measurement_xml("vol", "900", "30"),
            measurement_xml("pos", "100", "0.25"),
            measurement_xml("width", "4", "0.2"),
            measurement_xml("vol", "1000", "31"),
        );
        let err = parse_fit_records(&xml, Units::Calibrated).unwrap_err();
        assert!(err.contains("abc"), "{err}");

        let without_uncal = xml.replace("<uncal>", "<skipped>").replace("</uncal>", "</skipped>");
        let err = parse_fit_records(&without_uncal, Units::Calibrated).unwrap_err();
        assert!(err.contains("<uncal>"), "{err}");
    }

    #[test]
    fn test_values_rounded_from_exact_binary() {
        let xml = format!("<hdtv><fit>{}</fit></hdtv>", peak_xml("1234.56785", "100.12345"));
        let raw = parse_fit_records(&xml, Units::Raw).unwrap();
        assert_eq!(raw[0].position, 1234.5678);
        let calibrated = parse_fit_records(&xml, Units::Calibrated).unwrap();
        assert_eq!(calibrated[0].position, 100.1235);
    }

    #[test]
    fn test_incomplete_peak_is_rejected() {
        let xml = "<hdtv><fit><peak><uncal><pos><value>1</value></pos></uncal><cal/></peak></fit></hdtv>";
        let err = parse_fit_records(xml, Units::Calibrated).unwrap_err();
        assert!(err.contains("error"), "{err}");
        assert!(parse_fit_records("<hdtv>", Units::Calibrated).is_err());
    }
}
