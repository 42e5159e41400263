use crate::testing::CorrectionMethod;
use crate::testing::utils::{ascending_order, clamp_unit, harmonic_number, validate_p_values};
use anyhow::{Result, anyhow};

/// Multiple testing correction across term p-values.
///
/// All methods reproduce the adjusted p-values of R's `p.adjust`, so results are
/// directly comparable with the statistical literature.

/// Apply the selected correction method to a slice of p-values.
///
/// Dispatches through the closed [`CorrectionMethod`] enum; `CorrectionMethod::None`
/// returns the validated input unchanged.
///
/// # Arguments
/// * `p_values` - Raw p-values to adjust
/// * `method` - Correction method
///
/// # Returns
/// * `Result<Vec<f64>>` - Adjusted p-values, aligned with the input order
pub fn adjust(p_values: &[f64], method: CorrectionMethod) -> Result<Vec<f64>> {
    match method {
        CorrectionMethod::Holm => holm(p_values),
        CorrectionMethod::Fdr => benjamini_hochberg(p_values),
        CorrectionMethod::Hochberg => hochberg(p_values),
        CorrectionMethod::Hommel => hommel(p_values),
        CorrectionMethod::Bonferroni => bonferroni(p_values),
        CorrectionMethod::BenjaminiYekutieli => benjamini_yekutieli(p_values),
        CorrectionMethod::None => {
            validate(p_values)?;
            Ok(p_values.to_vec())
        }
    }
}

fn validate(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    validate_p_values(p_values)
}

/// Bonferroni correction: each p-value multiplied by the number of tests, capped at 1.
pub fn bonferroni(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| clamp_unit(p * n)).collect())
}

/// Holm's step-down correction (family-wise error rate).
///
/// Sorted ascending, each p-value is multiplied by the number of remaining
/// hypotheses and a running maximum enforces monotonicity.
pub fn holm(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut running_max = 0.0_f64;
    for (rank, &orig_idx) in order.iter().enumerate() {
        let weighted = (n - rank) as f64 * p_values[orig_idx];
        running_max = running_max.max(weighted);
        adjusted[orig_idx] = clamp_unit(running_max);
    }
    Ok(adjusted)
}

/// Hochberg's step-up correction (family-wise error rate).
///
/// The mirror image of Holm: processed from the largest p-value down, taking a
/// running minimum of the same weighted values.
pub fn hochberg(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for (rank, &orig_idx) in order.iter().enumerate().rev() {
        let weighted = (n - rank) as f64 * p_values[orig_idx];
        running_min = running_min.min(weighted);
        adjusted[orig_idx] = clamp_unit(running_min);
    }
    Ok(adjusted)
}

/// Hommel's closed-testing correction (family-wise error rate).
///
/// Direct port of the `p.adjust(method = "hommel")` algorithm: iteratively tightens
/// a lower envelope over all intersection hypotheses. Uniformly more powerful than
/// Hochberg, at quadratic cost in the number of tests.
pub fn hommel(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);
    let sorted: Vec<f64> = order.iter().map(|&i| p_values[i]).collect();

    let floor = (0..n)
        .map(|i| n as f64 * sorted[i] / (i + 1) as f64)
        .fold(f64::INFINITY, f64::min);
    let mut q = vec![floor; n];
    let mut envelope = vec![floor; n];

    for m in (2..n).rev() {
        // Tail indices n-m+1..n carry denominators 2..=m.
        let mut q1 = f64::INFINITY;
        for (offset, idx) in ((n - m + 1)..n).enumerate() {
            q1 = q1.min(m as f64 * sorted[idx] / (offset + 2) as f64);
        }
        for (idx, q_val) in q.iter_mut().enumerate().take(n - m + 1) {
            *q_val = (m as f64 * sorted[idx]).min(q1);
        }
        let head = q[n - m];
        for q_val in q.iter_mut().take(n).skip(n - m + 1) {
            *q_val = head;
        }
        for (e, &q_val) in envelope.iter_mut().zip(q.iter()) {
            *e = e.max(q_val);
        }
    }

    let mut adjusted = vec![0.0; n];
    for (rank, &orig_idx) in order.iter().enumerate() {
        adjusted[orig_idx] = envelope[rank].max(sorted[rank]);
    }
    Ok(adjusted)
}

/// Benjamini-Hochberg false discovery rate correction.
pub fn benjamini_hochberg(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for (rank, &orig_idx) in order.iter().enumerate().rev() {
        let weighted = p_values[orig_idx] * n as f64 / (rank + 1) as f64;
        running_min = running_min.min(weighted);
        adjusted[orig_idx] = clamp_unit(running_min);
    }
    Ok(adjusted)
}

/// Benjamini-Yekutieli false discovery rate correction, valid under arbitrary
/// dependence between tests.
pub fn benjamini_yekutieli(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    let c_n = harmonic_number(n);
    let order = ascending_order(p_values);

    let mut adjusted = vec![0.0; n];
    let mut running_min = 1.0_f64;
    for (rank, &orig_idx) in order.iter().enumerate().rev() {
        let weighted = p_values[orig_idx] * c_n * n as f64 / (rank + 1) as f64;
        running_min = running_min.min(weighted);
        adjusted[orig_idx] = clamp_unit(running_min);
    }
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_relative_eq(a: &[f64], b: &[f64], epsilon: f64) {
        assert_eq!(a.len(), b.len(), "Vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            if (x - y).abs() > epsilon {
                panic!("Vectors differ at index {}: {} != {}", i, x, y);
            }
        }
    }

    #[test]
    fn test_bonferroni() {
        let p_values = vec![0.01, 0.02, 0.03, 0.1, 0.2];
        let expected = vec![0.05, 0.1, 0.15, 0.5, 1.0];
        let adjusted = bonferroni(&p_values).unwrap();
        assert_vec_relative_eq(&adjusted, &expected, 1e-10);
    }

    #[test]
    fn test_holm() {
        // p.adjust(c(0.01, 0.02, 0.03), "holm") = 0.03 0.04 0.04
        let adjusted = holm(&[0.01, 0.02, 0.03]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.03, 0.04, 0.04], 1e-10);
    }

    #[test]
    fn test_holm_unordered_input() {
        // p.adjust(c(0.03, 0.01, 0.02), "holm") = 0.04 0.03 0.04
        let adjusted = holm(&[0.03, 0.01, 0.02]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.04, 0.03, 0.04], 1e-10);
    }

    #[test]
    fn test_hochberg() {
        // p.adjust(c(0.01, 0.02, 0.03), "hochberg") = 0.03 0.03 0.03
        let adjusted = hochberg(&[0.01, 0.02, 0.03]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.03, 0.03, 0.03], 1e-10);
    }

    #[test]
    fn test_hommel() {
        // p.adjust(c(0.01, 0.2, 0.8), "hommel") = 0.03 0.40 0.80
        let adjusted = hommel(&[0.01, 0.2, 0.8]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.03, 0.4, 0.8], 1e-10);
    }

    #[test]
    fn test_hommel_two_values() {
        // p.adjust(c(0.02, 0.1), "hommel") = 0.04 0.10
        let adjusted = hommel(&[0.02, 0.1]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.04, 0.1], 1e-10);
    }

    #[test]
    fn test_hommel_single_value() {
        let adjusted = hommel(&[0.025]).unwrap();
        assert_relative_eq!(adjusted[0], 0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_benjamini_hochberg_unordered() {
        // p.adjust(c(0.05, 0.01, 0.1, 0.04, 0.02), "BH") = 0.0625 0.05 0.1 0.0625 0.05
        let adjusted = benjamini_hochberg(&[0.05, 0.01, 0.1, 0.04, 0.02]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.0625, 0.05, 0.1, 0.0625, 0.05], 1e-10);
    }

    #[test]
    fn test_benjamini_hochberg_identical_values() {
        let adjusted = benjamini_hochberg(&[0.05, 0.05, 0.05]).unwrap();
        assert_vec_relative_eq(&adjusted, &[0.05, 0.05, 0.05], 1e-10);
    }

    #[test]
    fn test_benjamini_yekutieli() {
        // BH gives 0.03 for all three; c(3) = 1 + 1/2 + 1/3 = 11/6.
        let adjusted = benjamini_yekutieli(&[0.01, 0.02, 0.03]).unwrap();
        let expected = 0.03 * (11.0 / 6.0);
        assert_vec_relative_eq(&adjusted, &[expected, expected, expected], 1e-10);
    }

    #[test]
    fn adjusted_never_below_raw() {
        let p_values = vec![0.001, 0.02, 0.3, 0.7, 0.04];
        for method in [
            CorrectionMethod::Holm,
            CorrectionMethod::Fdr,
            CorrectionMethod::Hochberg,
            CorrectionMethod::Hommel,
            CorrectionMethod::Bonferroni,
            CorrectionMethod::BenjaminiYekutieli,
        ] {
            let adjusted = adjust(&p_values, method).unwrap();
            for (raw, adj) in p_values.iter().zip(adjusted.iter()) {
                assert!(adj >= raw, "{:?}: {} < {}", method, adj, raw);
                assert!(*adj <= 1.0);
            }
        }
    }

    #[test]
    fn none_method_is_identity() {
        let p_values = vec![0.5, 0.01, 0.99];
        let adjusted = adjust(&p_values, CorrectionMethod::None).unwrap();
        assert_eq!(adjusted, p_values);
    }

    #[test]
    fn holm_and_bh_preserve_raw_order() {
        let p_values = vec![0.2, 0.01, 0.05, 0.8, 0.03];
        for method in [CorrectionMethod::Holm, CorrectionMethod::Fdr] {
            let adjusted = adjust(&p_values, method).unwrap();
            for i in 0..p_values.len() {
                for j in 0..p_values.len() {
                    if p_values[i] < p_values[j] {
                        assert!(
                            adjusted[i] <= adjusted[j],
                            "{:?} broke monotonicity at ({}, {})",
                            method,
                            i,
                            j
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(bonferroni(&[]).is_err());
        assert!(holm(&[]).is_err());
        assert!(hommel(&[]).is_err());
        assert!(adjust(&[], CorrectionMethod::None).is_err());

        let invalid = vec![-0.1, 0.5, 1.1];
        assert!(bonferroni(&invalid).is_err());
        assert!(benjamini_hochberg(&invalid).is_err());
        assert!(hochberg(&invalid).is_err());
    }
}
