//! # pathway-statistics
//!
//! A Rust library for pathway enrichment analysis over multiple ranked evidence sources.
//!
//! Given a gene-by-test matrix of p-values, this crate combines each gene's scores into
//! one merged significance value, ranks genes by that value, and tests whether predefined
//! gene sets ("terms") are over-represented among the top-ranked genes using a
//! rank-scanning hypergeometric procedure with multiple testing correction. It also
//! determines, per term, which individual evidence columns independently support the
//! enrichment.
//!
//! ## Core Features
//!
//! - **P-value Merging**: Fisher's method and the empirical Brown's method for combining
//!   per-test p-values across evidence columns
//! - **Rank-Based Enrichment**: hypergeometric testing over all prefixes of a ranked gene
//!   list, with a rank-scan correction for the implicit multiple comparisons
//! - **Multiple Testing Correction**: Holm, FDR, Hochberg, Hommel, Bonferroni and
//!   Benjamini-Yekutieli adjustments
//! - **Evidence Attribution**: per-column re-analysis marking which inputs independently
//!   support each significant term
//!
//! ## Quick Start
//!
//! Build a [`scores::ScoreMatrix`] from your per-test p-values, load a gene-set library
//! with [`geneset::read_gmt`] (or construct one directly), and call
//! [`analysis::run_pathway_analysis`]. The returned rows carry adjusted p-values, the
//! overlap genes driving each enrichment, and the evidence labels.
//!
//! ## Module Organization
//!
//! - **[`scores`]**: the validated gene-by-test score matrix input
//! - **[`geneset`]**: terms, gene-set libraries and GMT parsing
//! - **[`merge`]**: merging of per-test p-values into one value per gene
//! - **[`testing`]**: hypergeometric rank-scan test and multiple testing correction
//! - **[`enrichment`]**: the per-term enrichment engine and column contribution analysis
//! - **[`analysis`]**: the top-level pipeline tying everything together
//! - **[`io`]**: result export and visualization-ready output files

pub mod analysis;
pub mod enrichment;
pub mod geneset;
pub mod io;
pub mod merge;
pub mod scores;
pub mod testing;
