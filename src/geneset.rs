//! Gene sets, gene-set libraries and GMT parsing.
//!
//! A [`Term`] is a named, identified gene set (a pathway or process annotation); a
//! [`GeneSetLibrary`] is an ordered collection of terms. Libraries can be parsed from
//! the tab-separated GMT format, filtered by gene-set size, and collapsed into a
//! default background universe.

use anyhow::{Context, Result, anyhow};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A named, identified gene set.
///
/// Gene identifiers are deduplicated at construction (first occurrence wins) so that
/// a gene annotated twice in the source never double-counts in overlap statistics.
#[derive(Debug, Clone)]
pub struct Term {
    pub id: String,
    pub name: String,
    genes: Vec<String>,
}

impl Term {
    pub fn new(id: impl Into<String>, name: impl Into<String>, genes: Vec<String>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(genes.len());
        let genes = genes
            .into_iter()
            .filter(|gene| seen.insert(gene.clone()))
            .collect();
        Term {
            id: id.into(),
            name: name.into(),
            genes,
        }
    }

    /// Annotated genes in source order.
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    /// Annotated gene-set size.
    pub fn size(&self) -> usize {
        self.genes.len()
    }

    /// The annotated genes as a set, for overlap computation.
    pub fn gene_set(&self) -> HashSet<&str> {
        self.genes.iter().map(|g| g.as_str()).collect()
    }
}

/// An ordered collection of terms.
#[derive(Debug, Clone, Default)]
pub struct GeneSetLibrary {
    terms: Vec<Term>,
}

impl GeneSetLibrary {
    pub fn new(terms: Vec<Term>) -> Self {
        GeneSetLibrary { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Keep only terms whose gene-set size lies within the given bounds.
    ///
    /// An unset bound means unbounded on that side. Term order is preserved.
    pub fn filter_by_size(&self, min: Option<usize>, max: Option<usize>) -> GeneSetLibrary {
        let terms = self
            .terms
            .iter()
            .filter(|term| {
                let size = term.size();
                min.is_none_or(|lo| size >= lo) && max.is_none_or(|hi| size <= hi)
            })
            .cloned()
            .collect();
        GeneSetLibrary { terms }
    }

    /// Keep only terms with the given identifiers, preserving library order.
    pub fn subset(&self, ids: &HashSet<&str>) -> GeneSetLibrary {
        let terms = self
            .terms
            .iter()
            .filter(|term| ids.contains(term.id.as_str()))
            .cloned()
            .collect();
        GeneSetLibrary { terms }
    }

    /// The default background universe: the union of all genes across every term.
    pub fn gene_universe(&self) -> HashSet<String> {
        let mut universe = HashSet::new();
        for term in &self.terms {
            for gene in &term.genes {
                universe.insert(gene.clone());
            }
        }
        universe
    }
}

/// Parse a gene-set library from a GMT file.
///
/// Each non-empty line is one term: `id <TAB> name <TAB> gene [<TAB> gene ...]`.
/// Terms with no genes are degenerate and excluded at parse time, so they never
/// reach the statistical core.
///
/// # Errors
///
/// Fails on I/O errors and on lines with fewer than two tab-separated fields.
pub fn read_gmt<P: AsRef<Path>>(path: P) -> Result<GeneSetLibrary> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Cannot open GMT file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut terms = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Cannot read GMT file {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let id = fields
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("GMT line {}: missing term identifier", line_no + 1))?;
        let name = fields
            .next()
            .map(str::trim)
            .ok_or_else(|| anyhow!("GMT line {}: missing term name", line_no + 1))?;

        let genes: Vec<String> = fields
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();

        if genes.is_empty() {
            continue;
        }

        terms.push(Term::new(id, name, genes));
    }

    Ok(GeneSetLibrary::new(terms))
}
