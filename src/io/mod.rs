//! Result export and visualization-ready output files.
//!
//! The exporter serializes the final result table to a flat tab-delimited file, one
//! row per term, with list-valued cells joined by semicolons and absent values
//! written as an explicit `NA` marker. The network writer emits the small set of
//! text artifacts downstream network-visualization tooling consumes.

use crate::analysis::PathwayResult;
use crate::enrichment::contribution::Evidence;
use crate::geneset::GeneSetLibrary;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Marker written for absent lists and absent evidence.
const ABSENT: &str = "NA";

fn join_genes(genes: &Option<Vec<String>>) -> String {
    match genes {
        Some(genes) => genes.join(";"),
        None => ABSENT.to_string(),
    }
}

fn evidence_label(evidence: &Evidence) -> String {
    match evidence {
        Evidence::Columns(columns) => columns.join(";"),
        Evidence::Combined => "combined".to_string(),
        Evidence::None => "none".to_string(),
    }
}

/// Write the result table to a tab-delimited file.
///
/// Columns: `term.id`, `term.name`, `adjusted.p.val`, `term.size`, `overlap`,
/// `evidence`, then one `Genes_<column>` per evidence column when contribution
/// analysis ran.
pub fn write_results<P: AsRef<Path>>(
    results: &[PathwayResult],
    columns: &[String],
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Cannot create result file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let with_contributions = results.iter().any(|r| !r.column_overlaps.is_empty());

    write!(writer, "term.id\tterm.name\tadjusted.p.val\tterm.size\toverlap\tevidence")?;
    if with_contributions {
        for column in columns {
            write!(writer, "\tGenes_{}", column)?;
        }
    }
    writeln!(writer)?;

    for row in results {
        write!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.term_id,
            row.term_name,
            row.p_value,
            row.term_size,
            join_genes(&row.overlap),
            evidence_label(&row.evidence)
        )?;
        if with_contributions {
            for index in 0..columns.len() {
                let cell = row
                    .column_overlaps
                    .get(index)
                    .map(join_genes)
                    .unwrap_or_else(|| ABSENT.to_string());
                write!(writer, "\t{}", cell)?;
            }
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the artifacts consumed by network visualization tooling.
///
/// Three files are produced next to the destination prefix: `<tag>.pathways.txt`
/// with id, name and adjusted p-value; `<tag>.gmt` with the significant terms in
/// GMT form; `<tag>.evidence.txt` with one indicator column per evidence source.
/// The caller invokes this only when at least one significant term exists.
pub fn write_network_files<P: AsRef<Path>>(
    results: &[PathwayResult],
    library: &GeneSetLibrary,
    columns: &[String],
    destination: P,
) -> Result<()> {
    let tag = destination.as_ref();
    let display = tag.display();

    let pathways_path = format!("{}.pathways.txt", display);
    let file = File::create(&pathways_path)
        .with_context(|| format!("Cannot create {}", pathways_path))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "term.id\tterm.name\tadjusted.p.val")?;
    for row in results {
        writeln!(writer, "{}\t{}\t{}", row.term_id, row.term_name, row.p_value)?;
    }
    writer.flush()?;

    let gmt_path = format!("{}.gmt", display);
    let file = File::create(&gmt_path).with_context(|| format!("Cannot create {}", gmt_path))?;
    let mut writer = BufWriter::new(file);
    for term in library.terms() {
        writeln!(writer, "{}\t{}\t{}", term.id, term.name, term.genes().join("\t"))?;
    }
    writer.flush()?;

    let evidence_path = format!("{}.evidence.txt", display);
    let file = File::create(&evidence_path)
        .with_context(|| format!("Cannot create {}", evidence_path))?;
    let mut writer = BufWriter::new(file);
    write!(writer, "term.id\tevidence")?;
    for column in columns {
        write!(writer, "\t{}", column)?;
    }
    writeln!(writer)?;
    for row in results {
        write!(writer, "{}\t{}", row.term_id, evidence_label(&row.evidence))?;
        for index in 0..columns.len() {
            let supported = row
                .column_overlaps
                .get(index)
                .map(|overlap| overlap.is_some())
                .unwrap_or(false);
            write!(writer, "\t{}", if supported { 1 } else { 0 })?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geneset::Term;

    fn str_vec(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn example_results() -> Vec<PathwayResult> {
        vec![
            PathwayResult {
                term_id: "T1".to_string(),
                term_name: "pathway one".to_string(),
                p_value: 0.01,
                term_size: 3,
                overlap: Some(str_vec(&["g1", "g2"])),
                evidence: Evidence::Columns(vec!["mut".to_string()]),
                column_overlaps: vec![Some(str_vec(&["g1", "g2"])), None],
            },
            PathwayResult {
                term_id: "T2".to_string(),
                term_name: "pathway two".to_string(),
                p_value: 0.04,
                term_size: 5,
                overlap: None,
                evidence: Evidence::Combined,
                column_overlaps: vec![None, None],
            },
        ]
    }

    #[test]
    fn results_table_is_flat_and_joined() {
        let path = std::env::temp_dir().join("pathway_statistics_export.tsv");
        let columns = str_vec(&["mut", "cnv"]);
        write_results(&example_results(), &columns, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "term.id\tterm.name\tadjusted.p.val\tterm.size\toverlap\tevidence\tGenes_mut\tGenes_cnv"
        );
        assert_eq!(
            lines[1],
            "T1\tpathway one\t0.01\t3\tg1;g2\tmut\tg1;g2\tNA"
        );
        assert!(lines[2].contains("\tNA\tcombined\t"));
    }

    #[test]
    fn single_column_results_omit_contribution_columns() {
        let results = vec![PathwayResult {
            term_id: "T1".to_string(),
            term_name: "pathway one".to_string(),
            p_value: 0.01,
            term_size: 2,
            overlap: Some(str_vec(&["g1"])),
            evidence: Evidence::Combined,
            column_overlaps: Vec::new(),
        }];

        let path = std::env::temp_dir().join("pathway_statistics_export_single.tsv");
        write_results(&results, &str_vec(&["score"]), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!content.contains("Genes_"));
        assert!(content.lines().next().unwrap().ends_with("evidence"));
    }

    #[test]
    fn network_writer_emits_three_files() {
        let library = GeneSetLibrary::new(vec![
            Term::new("T1", "pathway one", str_vec(&["g1", "g2", "g3"])),
            Term::new("T2", "pathway two", str_vec(&["g4"])),
        ]);
        let tag = std::env::temp_dir().join("pathway_statistics_network");
        let columns = str_vec(&["mut", "cnv"]);

        write_network_files(&example_results(), &library, &columns, &tag).unwrap();

        let pathways =
            std::fs::read_to_string(format!("{}.pathways.txt", tag.display())).unwrap();
        let gmt = std::fs::read_to_string(format!("{}.gmt", tag.display())).unwrap();
        let evidence =
            std::fs::read_to_string(format!("{}.evidence.txt", tag.display())).unwrap();

        for suffix in ["pathways.txt", "gmt", "evidence.txt"] {
            std::fs::remove_file(format!("{}.{}", tag.display(), suffix)).ok();
        }

        assert!(pathways.contains("T1\tpathway one\t0.01"));
        assert!(gmt.starts_with("T1\tpathway one\tg1\tg2\tg3"));
        assert!(evidence.contains("T1\tmut\t1\t0"));
        assert!(evidence.contains("T2\tcombined\t0\t0"));
    }
}
