//! Per-term enrichment over a ranked gene list.
//!
//! The engine applies the rank-scanning hypergeometric test to every term of a
//! gene-set library against one ranked gene list. Terms are independent, so the
//! per-term loop runs on the rayon thread pool; results come back in library order
//! because the parallel iterator is indexed, not completion-ordered.

pub mod contribution;

use crate::geneset::GeneSetLibrary;
use crate::testing::hypergeom::ranked_hypergeom_test;
use rayon::prelude::*;

/// One term's enrichment result against a ranked gene list.
///
/// `p_value` is already corrected for the rank scan within this term; correction
/// across terms is the caller's responsibility. `overlap` is `None` when no term
/// gene appears in the chosen prefix, which is distinct from "not tested".
#[derive(Debug, Clone)]
pub struct EnrichmentRow {
    pub term_id: String,
    pub term_name: String,
    pub p_value: f64,
    pub term_size: usize,
    pub overlap: Option<Vec<String>>,
}

/// Build a ranked gene list from per-gene scores.
///
/// Genes with a score above `cutoff` are dropped; the rest are ordered ascending by
/// score, most significant first. The sort is stable, so genes with equal scores
/// keep their input order.
pub fn ranked_gene_list(genes: &[String], scores: &[f64], cutoff: f64) -> Vec<String> {
    let mut passing: Vec<(usize, f64)> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &score)| score <= cutoff)
        .map(|(i, &score)| (i, score))
        .collect();
    passing.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    passing.into_iter().map(|(i, _)| genes[i].clone()).collect()
}

/// Test every term of the library against one ranked gene list.
///
/// # Arguments
///
/// * `ranked_genes` - Gene identifiers, most significant first, background-filtered
/// * `library` - The gene-set library; one output row per term, in library order
/// * `background_size` - Size of the statistical universe N
pub fn run_enrichment(
    ranked_genes: &[String],
    library: &GeneSetLibrary,
    background_size: usize,
) -> Vec<EnrichmentRow> {
    library
        .terms()
        .par_iter()
        .map(|term| {
            let gene_set = term.gene_set();
            let (p_value, cutoff) = ranked_hypergeom_test(ranked_genes, background_size, &gene_set);

            let overlap: Vec<String> = ranked_genes[..cutoff]
                .iter()
                .filter(|gene| gene_set.contains(gene.as_str()))
                .cloned()
                .collect();

            EnrichmentRow {
                term_id: term.id.clone(),
                term_name: term.name.clone(),
                p_value,
                term_size: term.size(),
                overlap: if overlap.is_empty() { None } else { Some(overlap) },
            }
        })
        .collect()
}
