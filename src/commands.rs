//! The pipeline steps and their orchestration.
//!
//! [`run_pipeline`] chains the eight steps — load, split, summarize, build
//! intervals, map overlaps, finalize, integrate, write — each logging under
//! its own target so a failing run identifies its step. Fatal errors abort
//! immediately; non-fatal conditions are logged, collected into a
//! [`Report`], and degrade to placeholder outputs so every run that loads
//! its inputs produces a full output set.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::MultiomeError;
use crate::io::{read_mex_dir, OutputFile};
use crate::modality::split_modalities;
use crate::normalize::{integrate, IntegrationResult};
use crate::overlap::map_overlaps;
use crate::plot;
use crate::ranges::{gene_intervals, peak_intervals, IntervalSet};
use crate::reporting::{Report, RunOutput};
use crate::annotation::read_gtf_genes;

/// The merged table, the protein-coding interval collection its rows refer
/// to, and the diagnostics.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub integration: IntegrationResult,
    pub coding_genes: IntervalSet,
}

/// One row of the persisted merged table: the merged record joined with its
/// gene's chromosome.
#[derive(Serialize)]
struct MergedRow<'a> {
    gene_id: &'a str,
    chrom: &'a str,
    mean_expression: f64,
    accessibility: Option<f64>,
}

/// Run the whole pipeline on `config`, writing all outputs under
/// `config.output_dir`.
pub fn run_pipeline(
    config: &PipelineConfig,
) -> Result<RunOutput<PipelineOutput>, MultiomeError> {
    let mut report = Report::new();

    info!(target: "load_counts", "loading counts from {}", config.counts_dir.display());
    let counts = read_mex_dir(&config.counts_dir)?;
    info!(
        target: "load_counts",
        "{} features x {} cells",
        counts.num_features(),
        counts.num_cells()
    );

    info!(target: "split_modalities", "splitting modalities (gene prefix '{}')", config.gene_prefix);
    let split = split_modalities(&counts, &config.gene_prefix, config.unassigned)?;
    info!(
        target: "split_modalities",
        "{} expression rows, {} accessibility rows, {} unassigned",
        split.expression.num_features(),
        split.accessibility.num_features(),
        split.unassigned
    );
    if split.unassigned > 0 {
        report.add_issue(format!(
            "{} count-table rows matched neither modality predicate and were dropped",
            split.unassigned
        ));
    }

    info!(target: "summarize_features", "computing per-feature totals");
    let expression_totals = split.expression.row_sums();
    let accessibility_totals = split.accessibility.row_sums();

    info!(target: "build_intervals", "reading annotation {}", config.annotation.display());
    let annotation = read_gtf_genes(&config.annotation)?;
    info!(target: "build_intervals", "{} annotated genes", annotation.len());
    let peaks = peak_intervals(&accessibility_totals)?;
    let (genes, unannotated) = gene_intervals(&expression_totals, &annotation)?;
    if unannotated > 0 {
        info!(
            target: "build_intervals",
            "{} expressed genes absent from the annotation were dropped",
            unannotated
        );
    }

    info!(target: "map_overlaps", "mapping {} peaks onto genes", peaks.len());
    let (overlaps, mut coding_genes) = map_overlaps(&genes, &peaks, config.chrom_naming)?;
    info!(
        target: "map_overlaps",
        "{} overlap pairs over {} protein-coding genes",
        overlaps.len(),
        coding_genes.len()
    );
    if overlaps.is_empty() {
        warn!(target: "map_overlaps", "no peak/gene overlaps found; accessibility will be missing for every gene");
        report.add_issue("no peak/gene overlaps were found".to_string());
    }

    info!(target: "finalize", "renaming gene_name to gene_symbol");
    coding_genes.rename_attr("gene_name", "gene_symbol");

    info!(target: "integrate", "normalizing and merging modalities");
    let integration = integrate(
        &split.expression,
        &split.accessibility,
        &coding_genes,
        &peaks,
        &overlaps,
    );
    info!(
        target: "integrate",
        "merged table: {} genes, {} with accessibility",
        integration.gene_summary.total_genes,
        integration.gene_summary.genes_with_accessibility
    );

    info!(target: "write_outputs", "writing outputs to {}", config.output_dir.display());
    write_outputs(&config.output_dir, &integration, &coding_genes, &mut report)?;

    for issue in report.issues() {
        warn!(target: "report", "{}", issue);
    }
    Ok(RunOutput::new(
        PipelineOutput {
            integration,
            coding_genes,
        },
        report,
    ))
}

const MERGED_HEADER: &[&str] = &["gene_id", "chrom", "mean_expression", "accessibility"];
const PEAK_SUMMARY_HEADER: &[&str] = &["Total_Peaks", "Mapped_Peaks", "Unmapped_Peaks"];
const GENE_SUMMARY_HEADER: &[&str] = &[
    "Total_Genes",
    "Genes_With_Accessibility",
    "Genes_Without_Accessibility",
];

/// Serialize `rows` as a delimited-text file. The header row is written
/// explicitly, so zero-row tables still carry their column names; a `.gz`
/// path gzip-compresses the output.
fn write_csv<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: &[T],
) -> Result<(), MultiomeError> {
    let output = OutputFile::new(path);
    let writer = output.writer().map_err(|e| {
        MultiomeError::OutputWrite(format!("{}: {}", path.display(), e))
    })?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Persist every output: the scatter (or its placeholder), the two
/// diagnostic boxplots, the two diagnostic summaries, and the merged table.
fn write_outputs(
    output_dir: &Path,
    integration: &IntegrationResult,
    coding_genes: &IntervalSet,
    report: &mut Report,
) -> Result<(), MultiomeError> {
    fs::create_dir_all(output_dir).map_err(|e| {
        MultiomeError::OutputWrite(format!("{}: {}", output_dir.display(), e))
    })?;

    // The merged table, with each gene's chromosome joined on.
    let merged_rows: Vec<MergedRow> = integration
        .merged
        .iter()
        .zip(coding_genes.iter())
        .map(|(record, gene)| MergedRow {
            gene_id: &record.gene_id,
            chrom: &gene.chrom,
            mean_expression: record.mean_expression,
            accessibility: record.accessibility,
        })
        .collect();
    write_csv(
        &output_dir.join("merged_table.csv"),
        MERGED_HEADER,
        &merged_rows,
    )?;
    write_csv(
        &output_dir.join("peak_mapping_summary.csv"),
        PEAK_SUMMARY_HEADER,
        &[integration.peak_summary],
    )?;
    write_csv(
        &output_dir.join("gene_accessibility_summary.csv"),
        GENE_SUMMARY_HEADER,
        &[integration.gene_summary],
    )?;

    // The faceted scatter, with its two degenerate paths.
    let scatter_path = output_dir.join("expression_vs_accessibility.svg");
    let scatter_title = "Mean expression vs aggregated accessibility";
    let points: Vec<(String, f64, f64)> = merged_rows
        .iter()
        .filter_map(|row| {
            row.accessibility
                .map(|a| (row.chrom.to_string(), row.mean_expression, a))
        })
        .collect();
    if integration.merged.is_empty() {
        report.add_issue("merged table is empty; scatter replaced by a placeholder".to_string());
        plot::placeholder(&scatter_path, scatter_title, "merged table is empty")?;
    } else if points.is_empty() {
        report.add_issue(
            "no genes with resolved accessibility; scatter replaced by a placeholder".to_string(),
        );
        plot::placeholder(
            &scatter_path,
            scatter_title,
            "no genes with resolved accessibility",
        )?;
    } else {
        plot::scatter_by_chrom(&scatter_path, scatter_title, &points)?;
    }

    // Diagnostic boxplots; empty data renders placeholders internally.
    if integration.unmapped_peak_totals.is_empty() {
        report.add_issue("no unmapped peaks to plot".to_string());
    }
    plot::boxplot_by_chrom(
        &output_dir.join("unmapped_peaks_by_chrom.svg"),
        "Unmapped peak intensity by chromosome",
        "total accessibility counts",
        &integration.unmapped_peak_totals,
    )?;
    if integration.silent_gene_expression.is_empty() {
        report.add_issue("no accessibility-less genes to plot".to_string());
    }
    plot::boxplot_by_chrom(
        &output_dir.join("genes_without_accessibility_by_chrom.svg"),
        "Expression of genes without accessibility by chromosome",
        "mean log2(CPM+1) expression",
        &integration.silent_gene_expression,
    )?;

    Ok(())
}
