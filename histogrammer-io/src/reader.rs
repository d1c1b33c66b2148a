//! Columnar event stores backed by files.

use std::path::Path;

use histogrammer_core::{ColumnStore, ColumnTable, Samples};

use crate::{Error, Result};

/// Event columns read from a delimited text file with a header row.
///
/// Empty or non-numeric cells become NaN so the columns stay row-aligned;
/// NaN samples are never binned.
#[derive(Debug, Clone)]
pub struct CsvColumnStore {
    table: ColumnTable,
}

impl CsvColumnStore {
    /// Reads a comma-separated file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or has no header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_delimiter(path, b',')
    }

    /// Reads a file separated by `delimiter`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or has no header.
    pub fn open_with_delimiter<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(Error::InvalidFormat(format!(
                "{} has no header row",
                path.display()
            )));
        }

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (j, column) in columns.iter_mut().enumerate() {
                let value = record
                    .get(j)
                    .and_then(|cell| cell.trim().parse::<f64>().ok())
                    .unwrap_or(f64::NAN);
                column.push(value);
            }
        }

        let mut table = ColumnTable::new();
        for (name, values) in headers.into_iter().zip(columns) {
            table.insert(name, values);
        }
        log::info!(
            "read {} rows of {} columns from {}",
            table.row_count(),
            table.column_names().len(),
            path.display()
        );
        Ok(Self { table })
    }
}

impl ColumnStore for CsvColumnStore {
    fn column(&self, name: &str) -> histogrammer_core::Result<Samples> {
        self.table.column(name)
    }

    fn column_names(&self) -> Vec<String> {
        self.table.column_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use histogrammer_core::SampleSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_columns_by_header() {
        let file = write_csv("e1,e2\n1.5,2\n3,\nx,4.25\n");
        let store = CsvColumnStore::open(file.path()).unwrap();
        assert_eq!(store.table.row_count(), 3);
        assert_eq!(store.column_names(), vec!["e1", "e2"]);

        let e2 = store.column("e2").unwrap();
        assert_eq!(e2.values()[0], 2.0);
        assert!(e2.values()[1].is_nan());
        assert_eq!(e2.values()[2], 4.25);

        let both = SampleSource::Concat(vec!["e1".into(), "e2".into()])
            .resolve(&store)
            .unwrap();
        assert_eq!(both.name(), "e1_e2");
        assert_eq!(both.len(), 6);
    }

    #[test]
    fn test_tab_delimited_and_unknown_column() {
        let file = write_csv("a\tb\n1\t2\n");
        let store = CsvColumnStore::open_with_delimiter(file.path(), b'\t').unwrap();
        assert_eq!(store.column("b").unwrap().values(), &[2.0]);
        assert!(store.column("c").is_err());
    }
}
