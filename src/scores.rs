//! The gene-by-test score matrix input type.
//!
//! A [`ScoreMatrix`] holds one row per gene and one named column per evidence source
//! (test), with every value a p-value in `[0, 1]`. Validation happens once at
//! construction; the matrix is immutable afterwards, and every derived structure in the
//! pipeline is recomputed from it per invocation.

use anyhow::{Result, anyhow};
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::HashSet;

/// Gene-by-test matrix of p-values.
///
/// Rows are genes (unique, case-sensitive identifiers), columns are named tests.
/// Missing values are not representable: callers must pre-resolve them to `1.0`
/// before constructing the matrix.
#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    genes: Vec<String>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ScoreMatrix {
    /// Create a validated score matrix.
    ///
    /// # Arguments
    ///
    /// * `genes` - Row identifiers, one per matrix row, unique
    /// * `columns` - Test names, one per matrix column
    /// * `values` - P-values, shape `(genes.len(), columns.len())`
    ///
    /// # Errors
    ///
    /// Fails on empty dimensions, mismatched shapes, duplicate gene identifiers,
    /// or any value outside `[0, 1]` (NaN included).
    pub fn new(genes: Vec<String>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if genes.is_empty() {
            return Err(anyhow!("Score matrix must contain at least one gene row"));
        }
        if columns.is_empty() {
            return Err(anyhow!("Score matrix must contain at least one test column"));
        }
        if values.dim() != (genes.len(), columns.len()) {
            return Err(anyhow!(
                "Score matrix shape {:?} does not match {} genes x {} columns",
                values.dim(),
                genes.len(),
                columns.len()
            ));
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(genes.len());
        for gene in &genes {
            if !seen.insert(gene.as_str()) {
                return Err(anyhow!("Duplicate gene identifier in score matrix: {}", gene));
            }
        }

        for (i, row) in values.rows().into_iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(anyhow!(
                        "Invalid p-value {} for gene {} in column {}: values must lie in [0, 1] \
                         and missing values must be resolved to 1.0 by the caller",
                        v,
                        genes[i],
                        columns[j]
                    ));
                }
            }
        }

        Ok(ScoreMatrix {
            genes,
            columns,
            values,
        })
    }

    /// Number of gene rows.
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    /// Number of test columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Gene identifiers in row order.
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Test names in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One gene's row of p-values.
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// One test's column of p-values across all genes.
    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.column(index)
    }

    /// The underlying value array.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Restrict the matrix to genes present in `keep`, preserving row order.
    ///
    /// # Errors
    ///
    /// Fails when no rows remain, since every downstream statistic would be
    /// undefined on an empty universe.
    pub fn select_genes(&self, keep: &HashSet<String>) -> Result<ScoreMatrix> {
        let kept: Vec<usize> = self
            .genes
            .iter()
            .enumerate()
            .filter(|(_, gene)| keep.contains(gene.as_str()))
            .map(|(i, _)| i)
            .collect();

        if kept.is_empty() {
            return Err(anyhow!(
                "No genes from the score matrix are present in the background"
            ));
        }

        let genes = kept.iter().map(|&i| self.genes[i].clone()).collect();
        let values = self.values.select(Axis(0), &kept);

        Ok(ScoreMatrix {
            genes,
            columns: self.columns.clone(),
            values,
        })
    }
}
