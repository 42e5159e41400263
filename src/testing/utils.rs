use anyhow::{Result, anyhow};
use num_traits::Float;
use std::cmp::Ordering;

/// Clamp a value into the unit interval.
pub fn clamp_unit<T: Float>(value: T) -> T {
    value.max(T::zero()).min(T::one())
}

/// Partial sum of the harmonic series, `sum(1/i)` for `i` in `1..=n`.
pub fn harmonic_number(n: usize) -> f64 {
    (1..=n).map(|i| 1.0 / i as f64).sum()
}

/// Check that every p-value lies in `[0, 1]`.
pub fn validate_p_values(p_values: &[f64]) -> Result<()> {
    for (i, &p) in p_values.iter().enumerate() {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

/// Indices that sort `p_values` ascending, stable on ties.
pub fn ascending_order(p_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p_values.len()).collect();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(Ordering::Equal)
    });
    order
}
