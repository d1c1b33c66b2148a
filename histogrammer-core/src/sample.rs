//! Sample sources and their resolution into flat sample arrays.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A named, immutable array of event samples.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Samples {
    name: String,
    values: Vec<f64>,
}

impl Samples {
    /// Creates a named sample array.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates an unnamed sample array.
    #[must_use]
    pub fn unnamed(values: Vec<f64>) -> Self {
        Self::new(String::new(), values)
    }

    /// Column name, or empty for raw arrays.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values with `lo <= v <= hi`.
    #[must_use]
    pub fn within(&self, lo: f64, hi: f64) -> Vec<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| *v >= lo && *v <= hi)
            .collect()
    }

    /// Default export file name, `<name>_hist.txt`.
    #[must_use]
    pub fn export_name(&self) -> String {
        format!("{}_hist.txt", self.name)
    }
}

/// Columnar event store supplying named sample arrays.
pub trait ColumnStore {
    /// Returns the named column.
    ///
    /// # Errors
    /// Returns [`Error::UnknownColumn`] if the store has no such column.
    fn column(&self, name: &str) -> Result<Samples>;

    /// Names of all columns, in store order.
    fn column_names(&self) -> Vec<String>;
}

/// In-memory column store.
#[derive(Debug, Clone, Default)]
pub struct ColumnTable {
    order: Vec<String>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl ColumnTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a column.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        if !self.columns.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.columns.insert(name, values);
    }

    /// Builder form of [`ColumnTable::insert`].
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    /// Number of rows in the longest column.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }
}

impl ColumnStore for ColumnTable {
    fn column(&self, name: &str) -> Result<Samples> {
        self.columns
            .get(name)
            .map(|values| Samples::new(name, values.clone()))
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    fn column_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Where the samples of a 1-D view come from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SampleSource {
    /// A sample array supplied directly.
    Raw(Samples),
    /// One column of a store.
    Column(String),
    /// Several columns concatenated in order.
    Concat(Vec<String>),
}

impl SampleSource {
    /// Flattens the source into one named sample array.
    ///
    /// Concatenated columns are joined by name with `_`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownColumn`] for a column missing from `store`.
    pub fn resolve<C: ColumnStore + ?Sized>(&self, store: &C) -> Result<Samples> {
        match self {
            SampleSource::Raw(samples) => Ok(samples.clone()),
            SampleSource::Column(name) => store.column(name),
            SampleSource::Concat(names) => {
                let mut values = Vec::new();
                for name in names {
                    values.extend_from_slice(store.column(name)?.values());
                }
                Ok(Samples::new(names.join("_"), values))
            }
        }
    }
}

impl From<Vec<f64>> for SampleSource {
    fn from(values: Vec<f64>) -> Self {
        SampleSource::Raw(Samples::unnamed(values))
    }
}

/// Coordinate pairs of a 2-D view, stored column-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairSamples {
    x: Samples,
    y: Samples,
}

impl PairSamples {
    /// Pairs two equally long sample arrays.
    ///
    /// # Errors
    /// Returns [`Error::LengthMismatch`] if the lengths differ.
    pub fn new(x: Samples, y: Samples) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        Ok(Self { x, y })
    }

    /// Resolves and stacks a list of `(x, y)` sources.
    ///
    /// # Errors
    /// Propagates column lookup failures and [`Error::LengthMismatch`].
    pub fn resolve<C: ColumnStore + ?Sized>(
        sources: &[(SampleSource, SampleSource)],
        store: &C,
    ) -> Result<Self> {
        let mut x_names = Vec::new();
        let mut y_names = Vec::new();
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (x_source, y_source) in sources {
            let x = x_source.resolve(store)?;
            let y = y_source.resolve(store)?;
            if x.len() != y.len() {
                return Err(Error::LengthMismatch {
                    x: x.len(),
                    y: y.len(),
                });
            }
            x_names.push(x.name().to_string());
            y_names.push(y.name().to_string());
            xs.extend_from_slice(x.values());
            ys.extend_from_slice(y.values());
        }
        Ok(Self {
            x: Samples::new(x_names.join("_"), xs),
            y: Samples::new(y_names.join("_"), ys),
        })
    }

    #[must_use]
    pub fn x(&self) -> &Samples {
        &self.x
    }

    #[must_use]
    pub fn y(&self) -> &Samples {
        &self.y
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Pairs as `(x, y)` tuples.
    #[must_use]
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.x
            .values()
            .iter()
            .copied()
            .zip(self.y.values().iter().copied())
            .collect()
    }
}
