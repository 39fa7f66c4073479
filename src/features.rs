//! Feature selection.
//!
//! Picks the numeric columns an analysis runs on and lays them out as a dense
//! matrix. No scaling or centering is applied: k-means sees raw heights,
//! diameters and degrees.

use crate::dataset::{Column, Record};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Dense feature matrix, one row per record, columns in selection order.
///
/// The column set is fixed at construction, so every row has the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<Column>,
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from row vectors.
    pub fn from_rows(columns: Vec<Column>, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.is_empty() || columns.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * d);
        for row in rows {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((rows.len(), d), flat)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self { columns, data })
    }

    /// Columns in matrix order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows (records).
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of feature columns.
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Borrow the underlying matrix.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// One row.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }
}

/// Chooses which record columns become features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSelector {
    columns: Vec<Column>,
}

impl FeatureSelector {
    /// Select the given columns, in this order.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Height plus geographic position, used by the cluster-count analysis.
    pub fn height_geo() -> Self {
        Self::new(vec![Column::Height, Column::Longitude, Column::Latitude])
    }

    /// Height and trunk diameter, used by the density and agglomerative paths.
    pub fn height_diameter() -> Self {
        Self::new(vec![Column::Height, Column::TrunkDiameter])
    }

    /// Trunk diameter then height, used by the fixed-k k-means scatter.
    pub fn diameter_height() -> Self {
        Self::new(vec![Column::TrunkDiameter, Column::Height])
    }

    /// Selected columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Extract the feature matrix from records.
    pub fn select(&self, records: &[Record]) -> Result<FeatureMatrix> {
        if records.is_empty() || self.columns.is_empty() {
            return Err(Error::EmptyInput);
        }

        let d = self.columns.len();
        let mut data = Array2::zeros((records.len(), d));
        for (i, record) in records.iter().enumerate() {
            for (j, &column) in self.columns.iter().enumerate() {
                data[[i, j]] = record
                    .value(column)
                    .ok_or_else(|| Error::MissingColumn(column.header().to_string()))?;
            }
        }

        tracing::debug!(rows = records.len(), cols = d, "selected features");
        Ok(FeatureMatrix {
            columns: self.columns.clone(),
            data,
        })
    }
}
