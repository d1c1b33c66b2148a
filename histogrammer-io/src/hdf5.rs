//! HDF5 event columns.
//!
//! Every one-dimensional numeric dataset directly under the chosen group is
//! a column, named after the dataset.

use std::path::Path;

use hdf5::{File, Group};
use histogrammer_core::{ColumnStore, ColumnTable, Samples};

use crate::Result;

/// Event columns read from the datasets of one HDF5 group.
#[derive(Debug, Clone)]
pub struct Hdf5ColumnStore {
    table: ColumnTable,
}

impl Hdf5ColumnStore {
    /// Reads the datasets of the root group.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or a dataset read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_group(path, "/")
    }

    /// Reads the datasets of `group`.
    ///
    /// # Errors
    /// Returns an error if the file or group cannot be opened or a dataset
    /// read.
    pub fn open_group<P: AsRef<Path>>(path: P, group: &str) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let group = file.group(group)?;
        let table = read_group(&group)?;
        log::info!(
            "read {} columns from {}",
            table.column_names().len(),
            path.as_ref().display()
        );
        Ok(Self { table })
    }
}

fn read_group(group: &Group) -> Result<ColumnTable> {
    let mut table = ColumnTable::new();
    for name in group.member_names()? {
        let Ok(dataset) = group.dataset(&name) else {
            continue;
        };
        if dataset.ndim() != 1 {
            log::debug!("skipping {name}: {} dimensions", dataset.ndim());
            continue;
        }
        match dataset.read_raw::<f64>() {
            Ok(values) => table.insert(name, values),
            Err(err) => log::debug!("skipping {name}: {err}"),
        }
    }
    Ok(table)
}

impl ColumnStore for Hdf5ColumnStore {
    fn column(&self, name: &str) -> histogrammer_core::Result<Samples> {
        self.table.column(name)
    }

    fn column_names(&self) -> Vec<String> {
        self.table.column_names()
    }
}
