//! Statistical machinery for the enrichment pipeline.
//!
//! - **[`hypergeom`]**: the rank-scanning hypergeometric enrichment test
//! - **[`correction`]**: multiple testing correction across terms
//! - **[`utils`]**: small shared numeric helpers

pub mod correction;
pub mod hypergeom;
pub mod utils;

/// Multiple testing correction methods applied across term p-values.
///
/// The rank-scan correction inside the hypergeometric tester is separate: it accounts
/// for scanning prefixes within one term and is always applied there. These methods
/// correct across terms afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMethod {
    /// Holm's step-down procedure (family-wise error rate).
    Holm,
    /// Benjamini-Hochberg false discovery rate.
    Fdr,
    /// Hochberg's step-up procedure.
    Hochberg,
    /// Hommel's closed-testing procedure.
    Hommel,
    /// Bonferroni single-step correction.
    Bonferroni,
    /// Benjamini-Yekutieli false discovery rate under dependence.
    BenjaminiYekutieli,
    /// No correction; p-values pass through unchanged.
    None,
}
