//! The dense [`CountMatrix`] feature-by-cell table and its row/column
//! operations.

use std::collections::HashSet;

use indexmap::IndexMap;
use ndarray::{Array2, Axis};

use crate::error::MultiomeError;

/// Per-feature totals: feature identifier mapped to the row sum of its
/// counts across all cells. Iteration order follows the source matrix.
pub type FeatureTotals = IndexMap<String, f64>;

/// A dense feature-by-cell count table.
///
/// Rows are features (genes or peaks), columns are cell barcodes. Feature
/// identifiers are unique within a matrix and all counts are non-negative;
/// both invariants are checked at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct CountMatrix {
    features: Vec<String>,
    cells: Vec<String>,
    counts: Array2<f64>,
}

impl CountMatrix {
    /// Create a new [`CountMatrix`], validating shape, feature uniqueness,
    /// and count non-negativity.
    pub fn new(
        features: Vec<String>,
        cells: Vec<String>,
        counts: Array2<f64>,
    ) -> Result<Self, MultiomeError> {
        if counts.nrows() != features.len() || counts.ncols() != cells.len() {
            return Err(MultiomeError::DataLoad(format!(
                "count matrix shape {}x{} does not match {} features and {} cells",
                counts.nrows(),
                counts.ncols(),
                features.len(),
                cells.len()
            )));
        }
        let mut seen = HashSet::new();
        for feature in &features {
            if !seen.insert(feature.as_str()) {
                return Err(MultiomeError::DataLoad(format!(
                    "duplicate feature identifier '{}'",
                    feature
                )));
            }
        }
        if counts.iter().any(|v| *v < 0.0) {
            return Err(MultiomeError::DataLoad(
                "count matrix contains negative values".to_string(),
            ));
        }
        Ok(Self {
            features,
            cells,
            counts,
        })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn counts(&self) -> &Array2<f64> {
        &self.counts
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Compute per-feature totals: the row sum of each feature's counts
    /// across all cells. A zero-row matrix yields an empty mapping.
    pub fn row_sums(&self) -> FeatureTotals {
        let sums = self.counts.sum_axis(Axis(1));
        self.features
            .iter()
            .zip(sums.iter())
            .map(|(feature, sum)| (feature.clone(), *sum))
            .collect()
    }

    /// Build a new matrix from the feature rows at `indices`, in that order.
    /// Cell columns are carried over unchanged.
    pub fn subset_features(&self, indices: &[usize]) -> Self {
        let features = indices.iter().map(|i| self.features[*i].clone()).collect();
        let counts = self.counts.select(Axis(0), indices);
        Self {
            features,
            cells: self.cells.clone(),
            counts,
        }
    }
}
