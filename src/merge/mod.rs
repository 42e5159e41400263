//! Merging of per-test p-values into one value per gene.
//!
//! Each gene's row of p-values is collapsed to a single merged significance value.
//! Fisher's method treats the evidence columns as independent; Brown's method rescales
//! Fisher's reference distribution using the empirical covariance of the transformed
//! columns, estimated once from the full matrix, to correct for non-independence
//! between tests.

use crate::scores::ScoreMatrix;
use anyhow::{Result, anyhow};
use ndarray::ArrayView1;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Floor applied to p-values of exactly zero before the log transform.
///
/// `ln(0)` would make the Fisher statistic infinite; the floor keeps the statistic
/// finite while staying below any p-value representable in practice.
pub const P_VALUE_FLOOR: f64 = 1e-300;

/// P-value merging method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMethod {
    /// Fisher's method: assumes independent evidence columns.
    Fisher,
    /// Empirical Brown's method: Fisher rescaled by the inter-column covariance.
    Brown,
}

/// Reference-distribution parameters for the merged Fisher statistic.
///
/// The statistic `x = -2 * sum(ln p)` for a gene row is evaluated as the upper tail
/// of a chi-squared distribution with `degrees_of_freedom` at `x / scale`. Fisher's
/// method uses `degrees_of_freedom = 2k, scale = 1`; Brown's method shrinks the
/// degrees of freedom and inflates the scale when columns covary.
#[derive(Debug, Clone, Copy)]
pub struct MergeParams {
    pub degrees_of_freedom: f64,
    pub scale: f64,
}

impl MergeParams {
    /// Fisher's parameters for `n_columns` independent tests.
    pub fn fisher(n_columns: usize) -> MergeParams {
        MergeParams {
            degrees_of_freedom: 2.0 * n_columns as f64,
            scale: 1.0,
        }
    }
}

/// Merge each gene's row of p-values into one value.
///
/// Requires at least one column. A single-column matrix degenerates to the identity:
/// the column is returned unchanged.
///
/// # Arguments
///
/// * `matrix` - The validated gene-by-test score matrix
/// * `method` - Merging method to apply
///
/// # Returns
///
/// One merged p-value per gene, aligned with the matrix row order.
pub fn merge_p_values(matrix: &ScoreMatrix, method: MergeMethod) -> Result<Vec<f64>> {
    let k = matrix.n_columns();
    if k == 0 {
        return Err(anyhow!("P-value merging requires at least one test column"));
    }
    if k == 1 {
        return Ok(matrix.column(0).to_vec());
    }

    let params = match method {
        MergeMethod::Fisher => MergeParams::fisher(k),
        MergeMethod::Brown => brown_params(matrix),
    };

    let reference = ChiSquared::new(params.degrees_of_freedom)
        .map_err(|e| anyhow!("Invalid chi-squared reference distribution: {}", e))?;

    let merged = (0..matrix.n_genes())
        .map(|i| {
            let x = fisher_statistic(matrix.row(i));
            reference.sf(x / params.scale).clamp(0.0, 1.0)
        })
        .collect();

    Ok(merged)
}

/// Fisher's combined statistic for one gene row: `-2 * sum(ln p)`.
///
/// Zero p-values are floored at [`P_VALUE_FLOOR`] before the logarithm.
fn fisher_statistic(row: ArrayView1<'_, f64>) -> f64 {
    -2.0 * row.iter().map(|&p| p.max(P_VALUE_FLOOR).ln()).sum::<f64>()
}

/// Estimate Brown's reference-distribution parameters from the full matrix.
///
/// The empirical covariance of `-2 ln p` is computed for every column pair; the
/// chi-squared reference is then rescaled so its first two moments match the
/// correlated sum. Falls back to Fisher's parameters when the covariance estimate is
/// non-positive or when the columns are uncorrelated or negatively correlated (which
/// would otherwise inflate the degrees of freedom past `2k`).
///
/// This is a pure function of the matrix: it is computed once per invocation and the
/// result passed explicitly into the per-gene step.
pub fn brown_params(matrix: &ScoreMatrix) -> MergeParams {
    let k = matrix.n_columns();
    let fisher = MergeParams::fisher(k);
    if matrix.n_genes() < 2 {
        return fisher;
    }

    // Transformed columns: w_j = -2 ln p_j, floored like the per-row statistic.
    let transformed: Vec<Vec<f64>> = (0..k)
        .map(|j| {
            matrix
                .column(j)
                .iter()
                .map(|&p| -2.0 * p.max(P_VALUE_FLOOR).ln())
                .collect()
        })
        .collect();

    let mut cov_sum = 0.0;
    for i in 0..k {
        for j in (i + 1)..k {
            cov_sum += sample_covariance(&transformed[i], &transformed[j]);
        }
    }

    let expected = 2.0 * k as f64;
    let variance = 4.0 * k as f64 + 2.0 * cov_sum;
    if variance <= 0.0 {
        return fisher;
    }

    let degrees_of_freedom = 2.0 * expected * expected / variance;
    let scale = variance / (2.0 * expected);
    if degrees_of_freedom > fisher.degrees_of_freedom {
        return fisher;
    }

    MergeParams {
        degrees_of_freedom,
        scale,
    }
}

fn sample_covariance(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_x = x.iter().sum::<f64>() / n_f;
    let mean_y = y.iter().sum::<f64>() / n_f;
    x.iter()
        .zip(y.iter())
        .map(|(&a, &b)| (a - mean_x) * (b - mean_y))
        .sum::<f64>()
        / (n_f - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn matrix(genes: &[&str], columns: &[&str], values: ndarray::Array2<f64>) -> ScoreMatrix {
        ScoreMatrix::new(
            genes.iter().map(|s| s.to_string()).collect(),
            columns.iter().map(|s| s.to_string()).collect(),
            values,
        )
        .unwrap()
    }

    #[test]
    fn single_column_is_identity() {
        let m = matrix(&["g1", "g2", "g3"], &["mut"], array![[0.01], [0.5], [1.0]]);
        let merged = merge_p_values(&m, MergeMethod::Fisher).unwrap();
        assert_eq!(merged, vec![0.01, 0.5, 1.0]);

        let merged = merge_p_values(&m, MergeMethod::Brown).unwrap();
        assert_eq!(merged, vec![0.01, 0.5, 1.0]);
    }

    #[test]
    fn fisher_two_columns_reference_value() {
        // x = -2 (ln 0.05 + ln 0.05) = 11.9829; chi2(4) upper tail at x is
        // exp(-x/2) * (1 + x/2) = 0.0025 * 6.991465 = 0.01747866.
        let m = matrix(&["g1"], &["a", "b"], array![[0.05, 0.05]]);
        let merged = merge_p_values(&m, MergeMethod::Fisher).unwrap();
        assert_relative_eq!(merged[0], 0.01747866, epsilon = 1e-6);
    }

    #[test]
    fn merging_is_monotonic_in_each_column() {
        let base = matrix(&["g1"], &["a", "b"], array![[0.2, 0.3]]);
        let lowered = matrix(&["g1"], &["a", "b"], array![[0.05, 0.3]]);

        let p_base = merge_p_values(&base, MergeMethod::Fisher).unwrap()[0];
        let p_lowered = merge_p_values(&lowered, MergeMethod::Fisher).unwrap()[0];
        assert!(p_lowered <= p_base);
    }

    #[test]
    fn zero_p_value_is_floored() {
        let m = matrix(&["g1"], &["a", "b"], array![[0.0, 0.5]]);
        let merged = merge_p_values(&m, MergeMethod::Fisher).unwrap();
        assert!(merged[0].is_finite());
        assert!(merged[0] >= 0.0 && merged[0] <= 1.0);

        let merged = merge_p_values(&m, MergeMethod::Brown).unwrap();
        assert!(merged[0].is_finite());
    }

    #[test]
    fn brown_falls_back_to_fisher_for_uncorrelated_columns() {
        // Column b is a permutation chosen so -2 ln p covaries negatively with a;
        // Brown must then keep Fisher's reference parameters.
        let m = matrix(
            &["g1", "g2", "g3", "g4"],
            &["a", "b"],
            array![[0.01, 0.9], [0.2, 0.4], [0.6, 0.1], [0.9, 0.02]],
        );
        let params = brown_params(&m);
        let fisher = MergeParams::fisher(2);
        assert_relative_eq!(params.degrees_of_freedom, fisher.degrees_of_freedom);
        assert_relative_eq!(params.scale, fisher.scale);
    }

    #[test]
    fn brown_shrinks_degrees_of_freedom_for_correlated_columns() {
        // Identical columns: maximal positive covariance, df well below 2k.
        let m = matrix(
            &["g1", "g2", "g3", "g4"],
            &["a", "b"],
            array![[0.01, 0.01], [0.2, 0.2], [0.6, 0.6], [0.9, 0.9]],
        );
        let params = brown_params(&m);
        assert!(params.degrees_of_freedom < 4.0);
        assert!(params.scale > 1.0);
    }

    #[test]
    fn brown_merged_values_stay_in_unit_interval() {
        let m = matrix(
            &["g1", "g2", "g3"],
            &["a", "b", "c"],
            array![[0.01, 0.02, 0.3], [0.5, 0.4, 0.6], [0.9, 0.95, 0.8]],
        );
        let merged = merge_p_values(&m, MergeMethod::Brown).unwrap();
        for p in merged {
            assert!((0.0..=1.0).contains(&p));
        }
    }
}
