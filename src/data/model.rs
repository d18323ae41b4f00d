use std::collections::BTreeMap;
use std::fmt;

use crate::data::imputer::ImputeError;

// ---------------------------------------------------------------------------
// Column – one named column of the table
// ---------------------------------------------------------------------------

/// A single column. `None` marks a missing cell (empty field or `NA`).
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Name of the storage type, used in error messages.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Numeric(_) => ColumnKind::Numeric,
            Column::Text(_) => ColumnKind::Text,
        }
    }

    /// `None` and NaN cells both count as missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Column::Numeric(v) => !matches!(v.get(row), Some(Some(x)) if !x.is_nan()),
            Column::Text(v) => !matches!(v.get(row), Some(Some(_))),
        }
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(cells: &mut Vec<T>, keep: &[bool]) {
            let mut i = 0;
            cells.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(true);
                i += 1;
                k
            });
        }
        match self {
            Column::Numeric(v) => retain(v, keep),
            Column::Text(v) => retain(v, keep),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
        }
    }
}

// ---------------------------------------------------------------------------
// AirQualityDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Column-oriented table as read from a PRSA station file.
///
/// All columns have the same length; `column_names` keeps the file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AirQualityDataset {
    pub column_names: Vec<String>,
    pub columns: BTreeMap<String, Column>,
}

impl AirQualityDataset {
    /// Build a dataset from `(name, column)` pairs, keeping their order.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Self {
        let column_names = columns.iter().map(|(name, _)| name.clone()).collect();
        AirQualityDataset {
            column_names,
            columns: columns.into_iter().collect(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Column::len)
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Borrow a column as numeric cells.
    pub fn numeric(&self, name: &str) -> Result<&[Option<f64>], ImputeError> {
        match self.columns.get(name) {
            Some(Column::Numeric(cells)) => Ok(cells),
            Some(other) => Err(ImputeError::TypeMismatch {
                column: name.to_string(),
                found: other.kind(),
            }),
            None => Err(ImputeError::ColumnNotFound(name.to_string())),
        }
    }

    /// Mutably borrow a column as numeric cells.
    pub fn numeric_mut(&mut self, name: &str) -> Result<&mut Vec<Option<f64>>, ImputeError> {
        match self.columns.get_mut(name) {
            Some(Column::Numeric(cells)) => Ok(cells),
            Some(other) => Err(ImputeError::TypeMismatch {
                column: name.to_string(),
                found: other.kind(),
            }),
            None => Err(ImputeError::ColumnNotFound(name.to_string())),
        }
    }

    /// Remove every row with a missing cell in any column.
    /// Returns the number of rows removed.
    pub fn drop_incomplete_rows(&mut self) -> usize {
        let n = self.len();
        let keep: Vec<bool> = (0..n)
            .map(|row| !self.columns.values().any(|c| c.is_missing(row)))
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            for column in self.columns.values_mut() {
                column.retain_rows(&keep);
            }
        }
        dropped
    }
}
