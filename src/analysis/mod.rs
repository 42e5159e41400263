//! The top-level pathway analysis pipeline.
//!
//! [`run_pathway_analysis`] validates its inputs, filters the gene-set library and
//! score matrix, merges per-test p-values into one ranked gene list, runs the
//! enrichment engine over every term, applies a global multiple-testing correction,
//! and attributes evidence columns to the significant terms. A run either fully
//! succeeds, returns an empty table with a warning when nothing is significant, or
//! fails before producing any row.

use crate::enrichment::contribution::{Evidence, TermEvidence, column_contributions};
use crate::enrichment::{EnrichmentRow, ranked_gene_list, run_enrichment};
use crate::geneset::{GeneSetLibrary, read_gmt};
use crate::merge::{MergeMethod, merge_p_values};
use crate::scores::ScoreMatrix;
use crate::io;
use crate::testing::{CorrectionMethod, correction};
use anyhow::{Result, anyhow};
use std::collections::HashSet;
use std::path::PathBuf;

/// A gene-set library, or where to parse one from.
#[derive(Debug, Clone)]
pub enum GeneSetSource {
    /// An already-parsed library.
    Library(GeneSetLibrary),
    /// A GMT file to parse on demand.
    GmtFile(PathBuf),
}

/// Gene-set size bounds for library filtering. An unset bound is unbounded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// Configuration for one pathway analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Merged p-value a gene must not exceed to enter the ranked list.
    pub cutoff: f64,
    /// Corrected p-value a term must not exceed to be reported.
    pub significance: f64,
    /// How per-test p-values are merged per gene.
    pub merge_method: MergeMethod,
    /// Global correction applied across term p-values.
    pub correction: CorrectionMethod,
    /// Optional gene-set size filter for the library.
    pub term_size_bounds: Option<SizeBounds>,
    /// Statistical universe; defaults to the union of all library genes.
    pub background: Option<HashSet<String>>,
    /// Destination prefix for visualization output files; unset skips the writer.
    pub network_output: Option<PathBuf>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            cutoff: 0.1,
            significance: 0.05,
            merge_method: MergeMethod::Fisher,
            correction: CorrectionMethod::Holm,
            term_size_bounds: None,
            background: None,
            network_output: None,
        }
    }
}

impl AnalysisOptions {
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    pub fn with_merge_method(mut self, method: MergeMethod) -> Self {
        self.merge_method = method;
        self
    }

    pub fn with_correction(mut self, method: CorrectionMethod) -> Self {
        self.correction = method;
        self
    }

    pub fn with_term_size_bounds(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.term_size_bounds = Some(SizeBounds { min, max });
        self
    }

    pub fn with_background(mut self, background: HashSet<String>) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_network_output(mut self, destination: PathBuf) -> Self {
        self.network_output = Some(destination);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.cutoff.is_finite() || !(0.0..=1.0).contains(&self.cutoff) {
            return Err(anyhow!("Cutoff must lie in [0, 1], got {}", self.cutoff));
        }
        if !self.significance.is_finite() || !(0.0..=1.0).contains(&self.significance) {
            return Err(anyhow!(
                "Significance threshold must lie in [0, 1], got {}",
                self.significance
            ));
        }
        if let Some(bounds) = self.term_size_bounds
            && let (Some(min), Some(max)) = (bounds.min, bounds.max)
            && min > max
        {
            return Err(anyhow!(
                "Gene-set size filter lower bound {} exceeds upper bound {}",
                min,
                max
            ));
        }
        Ok(())
    }
}

/// One significant term with its evidence annotation.
#[derive(Debug, Clone)]
pub struct PathwayResult {
    pub term_id: String,
    pub term_name: String,
    /// Globally adjusted p-value.
    pub p_value: f64,
    /// Raw annotated gene-set size.
    pub term_size: usize,
    /// Overlap genes from the merged analysis, `None` when empty.
    pub overlap: Option<Vec<String>>,
    /// Which inputs support the enrichment.
    pub evidence: Evidence,
    /// Per-column retained overlaps, aligned with `columns`; empty for
    /// single-column input where contribution analysis is disabled.
    pub column_overlaps: Vec<Option<Vec<String>>>,
}

/// Run the full pathway analysis pipeline.
///
/// # Arguments
///
/// * `scores` - The validated gene-by-test score matrix
/// * `source` - Gene-set library, parsed or as a GMT path
/// * `options` - Thresholds, method selectors and optional destinations
///
/// # Returns
///
/// The significant terms with adjusted p-values and evidence annotations, in
/// library order. An empty vector (after a logged warning) means no term met the
/// significance threshold; that is not an error.
pub fn run_pathway_analysis(
    scores: &ScoreMatrix,
    source: GeneSetSource,
    options: &AnalysisOptions,
) -> Result<Vec<PathwayResult>> {
    options.validate()?;

    let library = match source {
        GeneSetSource::Library(library) => library,
        GeneSetSource::GmtFile(path) => read_gmt(&path)?,
    };
    if library.is_empty() {
        return Err(anyhow!("Gene-set library contains no terms"));
    }

    // Library size filter.
    let bounds = options.term_size_bounds.unwrap_or_default();
    let filtered = library.filter_by_size(bounds.min, bounds.max);
    let removed = library.len() - filtered.len();
    if removed > 0 {
        log::info!(
            "Gene-set size filter removed {} of {} terms",
            removed,
            library.len()
        );
    }
    if filtered.is_empty() {
        return Err(anyhow!("No gene sets remain after size filtering"));
    }

    // Background restriction.
    let background = match &options.background {
        Some(background) => {
            if background.is_empty() {
                return Err(anyhow!("Background gene universe is empty"));
            }
            background.clone()
        }
        None => library.gene_universe(),
    };
    let restricted = scores.select_genes(&background)?;

    // Merge and rank.
    let merged = merge_p_values(&restricted, options.merge_method)?;
    let ranked = ranked_gene_list(restricted.genes(), &merged, options.cutoff);
    if ranked.is_empty() {
        return Err(anyhow!(
            "No gene passed the merged p-value cutoff of {}",
            options.cutoff
        ));
    }

    // Enrichment across all terms, then global correction.
    let rows = run_enrichment(&ranked, &filtered, background.len());
    let p_values: Vec<f64> = rows.iter().map(|row| row.p_value).collect();
    let adjusted = correction::adjust(&p_values, options.correction)?;

    let significant: Vec<EnrichmentRow> = rows
        .into_iter()
        .zip(adjusted)
        .filter(|(_, p)| *p <= options.significance)
        .map(|(row, p)| EnrichmentRow { p_value: p, ..row })
        .collect();

    if significant.is_empty() {
        log::warn!(
            "No term significant at threshold {}; returning empty result",
            options.significance
        );
        return Ok(Vec::new());
    }

    // Evidence attribution over the significant subset.
    let significant_ids: HashSet<&str> = significant.iter().map(|r| r.term_id.as_str()).collect();
    let significant_library = filtered.subset(&significant_ids);

    let evidence = if restricted.n_columns() > 1 {
        let merged_significant: HashSet<String> =
            significant.iter().map(|r| r.term_id.clone()).collect();
        Some(column_contributions(
            &restricted,
            &significant_library,
            background.len(),
            options.cutoff,
            options.significance,
            options.correction,
            &merged_significant,
        )?)
    } else {
        log::info!("Single evidence column: contribution analysis disabled");
        None
    };

    let results = assemble_results(significant, evidence);

    if let Some(destination) = &options.network_output {
        io::write_network_files(&results, &significant_library, restricted.columns(), destination)?;
    }

    Ok(results)
}

/// Join enrichment rows with their evidence by index.
///
/// Both sequences were produced from the same significant-term library, in the same
/// order, so the join is positional rather than an in-place table mutation.
fn assemble_results(
    rows: Vec<EnrichmentRow>,
    evidence: Option<Vec<TermEvidence>>,
) -> Vec<PathwayResult> {
    match evidence {
        Some(evidence) => rows
            .into_iter()
            .zip(evidence)
            .map(|(row, term_evidence)| {
                debug_assert_eq!(row.term_id, term_evidence.term_id);
                PathwayResult {
                    term_id: row.term_id,
                    term_name: row.term_name,
                    p_value: row.p_value,
                    term_size: row.term_size,
                    overlap: row.overlap,
                    evidence: term_evidence.evidence,
                    column_overlaps: term_evidence.column_overlaps,
                }
            })
            .collect(),
        None => rows
            .into_iter()
            .map(|row| {
                // Single-column input: the merged analysis is the only evidence.
                let evidence = Evidence::Combined;
                PathwayResult {
                    term_id: row.term_id,
                    term_name: row.term_name,
                    p_value: row.p_value,
                    term_size: row.term_size,
                    overlap: row.overlap,
                    evidence,
                    column_overlaps: Vec::new(),
                }
            })
            .collect(),
    }
}
