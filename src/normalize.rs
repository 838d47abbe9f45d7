//! CPM-log normalization and the integration of the two modalities into
//! one per-gene table, with diagnostic summaries.

use indexmap::IndexMap;
use ndarray::{Array2, Axis};
use serde::Serialize;

use crate::matrix::CountMatrix;
use crate::overlap::OverlapMap;
use crate::ranges::{AttrValue, IntervalSet};

/// log2(CPM + 1) normalize a feature-by-cell matrix.
///
/// Each cell column is scaled to counts-per-million before the log
/// transform. A zero column sum is replaced with 1, so an all-zero cell
/// normalizes to all zeros rather than dividing by zero.
pub fn cpm_log2(counts: &Array2<f64>) -> Array2<f64> {
    let sums = counts.sum_axis(Axis(0));
    let mut normalized = counts.clone();
    for (column, mut values) in normalized.axis_iter_mut(Axis(1)).enumerate() {
        let total = if sums[column] == 0.0 { 1.0 } else { sums[column] };
        values.mapv_inplace(|v| (v / total * 1e6 + 1.0).log2());
    }
    normalized
}

/// CPM-log normalize a count matrix and return the per-feature mean
/// normalized value across cells, keyed by feature identifier.
///
/// A matrix with no cells yields a mean of 0 for every feature.
pub fn normalized_means(matrix: &CountMatrix) -> IndexMap<String, f64> {
    let normalized = cpm_log2(matrix.counts());
    let means = normalized
        .mean_axis(Axis(1))
        .unwrap_or_else(|| ndarray::Array1::zeros(matrix.num_features()));
    matrix
        .features()
        .iter()
        .zip(means.iter())
        .map(|(feature, mean)| (feature.clone(), *mean))
        .collect()
}

/// One row of the merged per-gene table. `accessibility` is `None` when no
/// overlapping accessibility interval survived mapping — missing, not zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergedRecord {
    pub gene_id: String,
    pub mean_expression: f64,
    pub accessibility: Option<f64>,
}

/// Counts of accessibility intervals by mapping outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PeakMappingSummary {
    #[serde(rename = "Total_Peaks")]
    pub total_peaks: usize,
    #[serde(rename = "Mapped_Peaks")]
    pub mapped_peaks: usize,
    #[serde(rename = "Unmapped_Peaks")]
    pub unmapped_peaks: usize,
}

/// Counts of protein-coding genes by resolved-accessibility outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GeneAccessibilitySummary {
    #[serde(rename = "Total_Genes")]
    pub total_genes: usize,
    #[serde(rename = "Genes_With_Accessibility")]
    pub genes_with_accessibility: usize,
    #[serde(rename = "Genes_Without_Accessibility")]
    pub genes_without_accessibility: usize,
}

/// Everything the integration step produces: the merged table, the two
/// diagnostic summaries, and the per-chromosome values behind the
/// diagnostic boxplots.
#[derive(Clone, Debug)]
pub struct IntegrationResult {
    pub merged: Vec<MergedRecord>,
    pub peak_summary: PeakMappingSummary,
    pub gene_summary: GeneAccessibilitySummary,
    /// `(chromosome, total accessibility)` of each unmapped peak.
    pub unmapped_peak_totals: Vec<(String, f64)>,
    /// `(chromosome, mean normalized expression)` of each gene without
    /// resolved accessibility.
    pub silent_gene_expression: Vec<(String, f64)>,
}

/// Normalize both modalities, aggregate accessibility onto genes, and merge.
///
/// The expression matrix is restricted to the protein-coding gene
/// identifiers *before* normalization, so CPM denominators reflect only the
/// retained rows. Per-gene accessibility is the **sum** of the normalized
/// means of all overlapping peaks — a gene with N overlapping peaks receives
/// all N contributions, deliberately not their average.
pub fn integrate(
    expression: &CountMatrix,
    accessibility: &CountMatrix,
    coding_genes: &IntervalSet,
    peaks: &IntervalSet,
    overlaps: &OverlapMap,
) -> IntegrationResult {
    // Restrict expression to the protein-coding gene ids, in gene order.
    let expression_positions: IndexMap<&str, usize> = expression
        .features()
        .iter()
        .enumerate()
        .map(|(position, id)| (id.as_str(), position))
        .collect();
    let coding_ids: Vec<&str> = coding_genes
        .iter()
        .filter_map(|gene| gene.attr("gene_id").and_then(AttrValue::as_str))
        .collect();
    let coding_rows: Vec<usize> = coding_ids
        .iter()
        .filter_map(|id| expression_positions.get(id).copied())
        .collect();
    let coding_expression = expression.subset_features(&coding_rows);
    let expression_means = normalized_means(&coding_expression);

    // Accessibility is normalized in full; means align with peak order.
    let accessibility_means: Vec<f64> =
        normalized_means(accessibility).into_values().collect();

    // Aggregate accessibility onto genes: sum over all mapped peaks.
    let mut aggregated: IndexMap<usize, f64> = IndexMap::new();
    for pair in &overlaps.pairs {
        *aggregated.entry(pair.gene).or_insert(0.0) += accessibility_means[pair.peak];
    }

    // Left-join expression onto aggregated accessibility, one row per gene.
    let merged: Vec<MergedRecord> = coding_ids
        .iter()
        .enumerate()
        .map(|(gene_index, gene_id)| MergedRecord {
            gene_id: gene_id.to_string(),
            mean_expression: expression_means.get(*gene_id).copied().unwrap_or(0.0),
            accessibility: aggregated.get(&gene_index).copied(),
        })
        .collect();

    // Diagnostics.
    let mapped = overlaps.mapped_peaks();
    let peak_summary = PeakMappingSummary {
        total_peaks: peaks.len(),
        mapped_peaks: mapped.len(),
        unmapped_peaks: peaks.len() - mapped.len(),
    };
    let unmapped_peak_totals: Vec<(String, f64)> = peaks
        .iter()
        .enumerate()
        .filter(|(index, _)| !mapped.contains(index))
        .map(|(_, peak)| {
            let total = peak
                .attr("total_accessibility")
                .and_then(AttrValue::as_f64)
                .unwrap_or(0.0);
            (peak.chrom.clone(), total)
        })
        .collect();

    let genes_with = merged
        .iter()
        .filter(|record| record.accessibility.is_some())
        .count();
    let gene_summary = GeneAccessibilitySummary {
        total_genes: merged.len(),
        genes_with_accessibility: genes_with,
        genes_without_accessibility: merged.len() - genes_with,
    };
    let silent_gene_expression: Vec<(String, f64)> = merged
        .iter()
        .zip(coding_genes.iter())
        .filter(|(record, _)| record.accessibility.is_none())
        .map(|(record, gene)| (gene.chrom.clone(), record.mean_expression))
        .collect();

    IntegrationResult {
        merged,
        peak_summary,
        gene_summary,
        unmapped_peak_totals,
        silent_gene_expression,
    }
}
