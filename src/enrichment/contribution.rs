//! Per-column evidence attribution for significant terms.
//!
//! Each evidence column is re-analyzed on its own: a ranked list is built directly
//! from that column's raw p-values (no merging), the enrichment engine and the same
//! global correction are applied, and a term's overlap from that column is retained
//! only when the column alone reaches significance. From the retained overlaps each
//! term gets an evidence label.

use crate::geneset::GeneSetLibrary;
use crate::scores::ScoreMatrix;
use crate::testing::{CorrectionMethod, correction};
use crate::{enrichment, enrichment::ranked_gene_list};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashSet;

/// Which inputs support a term's enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    /// These evidence columns are independently significant for the term.
    Columns(Vec<String>),
    /// No single column is significant, but the merged analysis is.
    Combined,
    /// Neither any single column nor the merged analysis is significant.
    None,
}

/// Per-term evidence: the label plus each column's retained overlap.
///
/// `column_overlaps` is aligned with the score matrix columns; `None` marks a column
/// that does not independently support the term.
#[derive(Debug, Clone)]
pub struct TermEvidence {
    pub term_id: String,
    pub evidence: Evidence,
    pub column_overlaps: Vec<Option<Vec<String>>>,
}

/// Analyze each evidence column independently and derive per-term evidence.
///
/// # Arguments
///
/// * `scores` - The background-restricted score matrix
/// * `library` - The terms to attribute, typically the significant subset
/// * `background_size` - Size of the statistical universe N
/// * `cutoff` - Ranked-list inclusion cutoff, as in the merged analysis
/// * `significance` - Threshold a column's corrected p-value must meet
/// * `method` - The same correction method used by the merged analysis
/// * `merged_significant` - Term ids significant in the merged analysis, consulted
///   when no individual column supports a term
///
/// # Returns
///
/// One [`TermEvidence`] per library term, in library order.
pub fn column_contributions(
    scores: &ScoreMatrix,
    library: &GeneSetLibrary,
    background_size: usize,
    cutoff: f64,
    significance: f64,
    method: CorrectionMethod,
    merged_significant: &HashSet<String>,
) -> Result<Vec<TermEvidence>> {
    // One pass per column; columns are independent, order restored by index.
    let per_column: Vec<Vec<Option<Vec<String>>>> = (0..scores.n_columns())
        .into_par_iter()
        .map(|column| -> Result<Vec<Option<Vec<String>>>> {
            let values = scores.column(column).to_vec();
            let ranked = ranked_gene_list(scores.genes(), &values, cutoff);
            let rows = enrichment::run_enrichment(&ranked, library, background_size);

            let p_values: Vec<f64> = rows.iter().map(|row| row.p_value).collect();
            let adjusted = correction::adjust(&p_values, method)?;

            Ok(rows
                .into_iter()
                .zip(adjusted)
                .map(|(row, p)| if p <= significance { row.overlap } else { None })
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;

    let column_names = scores.columns();
    let evidence = library
        .terms()
        .iter()
        .enumerate()
        .map(|(term_idx, term)| {
            let column_overlaps: Vec<Option<Vec<String>>> = per_column
                .iter()
                .map(|overlaps| overlaps[term_idx].clone())
                .collect();

            let supporting: Vec<String> = column_overlaps
                .iter()
                .zip(column_names)
                .filter(|(overlap, _)| overlap.is_some())
                .map(|(_, name)| name.clone())
                .collect();

            let evidence = if !supporting.is_empty() {
                Evidence::Columns(supporting)
            } else if merged_significant.contains(term.id.as_str()) {
                Evidence::Combined
            } else {
                Evidence::None
            };

            TermEvidence {
                term_id: term.id.clone(),
                evidence,
                column_overlaps,
            }
        })
        .collect();

    Ok(evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geneset::Term;
    use ndarray::array;

    fn str_vec(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn significant_ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strong_column_is_named_as_evidence() {
        // Column "mut" carries the signal for T1; column "cnv" carries none.
        let scores = ScoreMatrix::new(
            str_vec(&["g1", "g2", "g3", "g4", "g5"]),
            str_vec(&["mut", "cnv"]),
            array![
                [1e-6, 0.8],
                [1e-5, 0.9],
                [0.7, 0.85],
                [0.8, 0.95],
                [0.9, 0.75]
            ],
        )
        .unwrap();
        let library = GeneSetLibrary::new(vec![Term::new("T1", "one", str_vec(&["g1", "g2"]))]);

        let evidence = column_contributions(
            &scores,
            &library,
            100,
            0.1,
            0.05,
            CorrectionMethod::Holm,
            &significant_ids(&["T1"]),
        )
        .unwrap();

        assert_eq!(evidence.len(), 1);
        assert_eq!(
            evidence[0].evidence,
            Evidence::Columns(vec!["mut".to_string()])
        );
        assert_eq!(
            evidence[0].column_overlaps[0].as_deref(),
            Some(&str_vec(&["g1", "g2"])[..])
        );
        assert_eq!(evidence[0].column_overlaps[1], None);
    }

    #[test]
    fn no_supporting_column_falls_back_to_combined() {
        // Neither column is significant alone; the merged analysis was.
        let scores = ScoreMatrix::new(
            str_vec(&["g1", "g2", "g3"]),
            str_vec(&["mut", "cnv"]),
            array![[0.04, 0.05], [0.9, 0.8], [0.85, 0.9]],
        )
        .unwrap();
        let library = GeneSetLibrary::new(vec![Term::new("T1", "one", str_vec(&["g1"]))]);

        let evidence = column_contributions(
            &scores,
            &library,
            1000,
            0.1,
            1e-4,
            CorrectionMethod::Holm,
            &significant_ids(&["T1"]),
        )
        .unwrap();

        assert_eq!(evidence[0].evidence, Evidence::Combined);
        assert!(evidence[0].column_overlaps.iter().all(Option::is_none));
    }

    #[test]
    fn no_support_anywhere_is_labelled_none() {
        let scores = ScoreMatrix::new(
            str_vec(&["g1", "g2"]),
            str_vec(&["mut", "cnv"]),
            array![[0.5, 0.6], [0.9, 0.8]],
        )
        .unwrap();
        let library = GeneSetLibrary::new(vec![Term::new("T1", "one", str_vec(&["g1"]))]);

        let evidence = column_contributions(
            &scores,
            &library,
            1000,
            0.95,
            1e-4,
            CorrectionMethod::Holm,
            &HashSet::new(),
        )
        .unwrap();

        assert_eq!(evidence[0].evidence, Evidence::None);
    }
}
