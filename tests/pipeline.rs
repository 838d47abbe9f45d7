//! End-to-end pipeline scenarios on small on-disk fixtures.

use std::fs;
use std::path::Path;

use multiome::commands::run_pipeline;
use multiome::prelude::{MultiomeError, PipelineConfig};
use multiome::ranges::AttrValue;
use multiome::test_utilities::{gtf_gene_line, write_mex_dir};

/// The reference scenario: two genes, two peaks, two cells. `ENSG1`
/// is an annotated protein-coding gene overlapping the first peak; `ENSG2`
/// has no annotation entry at all.
fn write_reference_fixture(dir: &Path) -> (PipelineConfig, tempfile::TempDir) {
    let counts_dir = dir.join("counts");
    fs::create_dir(&counts_dir).unwrap();
    write_mex_dir(
        &counts_dir,
        &["ENSG1", "ENSG2", "chr1:100-200", "chr1:300-400"],
        &["AAAC", "GGGT"],
        &[
            (0, 0, 10.0),
            (0, 1, 4.0),
            (1, 0, 2.0),
            (2, 0, 6.0),
            (2, 1, 1.0),
            (3, 1, 8.0),
        ],
    );

    let annotation = dir.join("genes.gtf");
    fs::write(
        &annotation,
        format!(
            "{}\n",
            gtf_gene_line("chr1", 150, 250, "ENSG1", "protein_coding", Some("ALPHA"))
        ),
    )
    .unwrap();

    let output = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(&counts_dir, &annotation, output.path());
    (config, output)
}

#[test]
fn reference_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (config, output) = write_reference_fixture(dir.path());

    let result = run_pipeline(&config).unwrap();
    let (pipeline, report) = result.into_parts();

    // ENSG2 has no annotation entry, so the protein-coding set holds ENSG1 only.
    assert_eq!(pipeline.coding_genes.len(), 1);
    let gene = &pipeline.coding_genes.records[0];
    assert_eq!(
        gene.attr("gene_id").and_then(AttrValue::as_str),
        Some("ENSG1")
    );
    // the finalizer renamed gene_name to gene_symbol
    assert_eq!(
        gene.attr("gene_symbol").and_then(AttrValue::as_str),
        Some("ALPHA")
    );
    assert!(gene.attr("gene_name").is_none());

    // exactly one overlap pair: chr1:100-200 against ENSG1
    let integration = &pipeline.integration;
    assert_eq!(integration.peak_summary.total_peaks, 2);
    assert_eq!(integration.peak_summary.mapped_peaks, 1);
    assert_eq!(integration.peak_summary.unmapped_peaks, 1);

    // one merged row, with resolved accessibility
    assert_eq!(integration.merged.len(), 1);
    assert_eq!(integration.merged[0].gene_id, "ENSG1");
    assert!(integration.merged[0].accessibility.is_some());
    // the only degenerate output: every gene has accessibility, so that
    // boxplot has nothing to show
    assert_eq!(
        report.issues(),
        ["no accessibility-less genes to plot".to_string()]
    );

    // the full output set exists
    for name in [
        "merged_table.csv",
        "peak_mapping_summary.csv",
        "gene_accessibility_summary.csv",
        "expression_vs_accessibility.svg",
        "unmapped_peaks_by_chrom.svg",
        "genes_without_accessibility_by_chrom.svg",
    ] {
        assert!(output.path().join(name).is_file(), "missing {}", name);
    }

    let peak_summary = fs::read_to_string(output.path().join("peak_mapping_summary.csv")).unwrap();
    assert_eq!(
        peak_summary,
        "Total_Peaks,Mapped_Peaks,Unmapped_Peaks\n2,1,1\n"
    );
    let gene_summary =
        fs::read_to_string(output.path().join("gene_accessibility_summary.csv")).unwrap();
    assert_eq!(
        gene_summary,
        "Total_Genes,Genes_With_Accessibility,Genes_Without_Accessibility\n1,1,0\n"
    );
}

#[test]
fn pipeline_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (config, output) = write_reference_fixture(dir.path());

    run_pipeline(&config).unwrap();
    let first: Vec<Vec<u8>> = [
        "merged_table.csv",
        "peak_mapping_summary.csv",
        "gene_accessibility_summary.csv",
    ]
    .iter()
    .map(|name| fs::read(output.path().join(name)).unwrap())
    .collect();

    run_pipeline(&config).unwrap();
    let second: Vec<Vec<u8>> = [
        "merged_table.csv",
        "peak_mapping_summary.csv",
        "gene_accessibility_summary.csv",
    ]
    .iter()
    .map(|name| fs::read(output.path().join(name)).unwrap())
    .collect();

    assert_eq!(first, second);
}

#[test]
fn degenerate_scenario_with_no_peaks() {
    let dir = tempfile::tempdir().unwrap();
    let counts_dir = dir.path().join("counts");
    fs::create_dir(&counts_dir).unwrap();
    write_mex_dir(
        &counts_dir,
        &["ENSG1", "ENSG2"],
        &["AAAC"],
        &[(0, 0, 5.0), (1, 0, 3.0)],
    );
    let annotation = dir.path().join("genes.gtf");
    fs::write(
        &annotation,
        format!(
            "{}\n{}\n",
            gtf_gene_line("chr1", 100, 200, "ENSG1", "protein_coding", None),
            gtf_gene_line("chr2", 100, 200, "ENSG2", "protein_coding", None),
        ),
    )
    .unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(&counts_dir, &annotation, output.path());

    let result = run_pipeline(&config).unwrap();
    let (pipeline, report) = result.into_parts();

    assert_eq!(pipeline.integration.peak_summary.total_peaks, 0);
    assert_eq!(pipeline.integration.peak_summary.mapped_peaks, 0);
    assert_eq!(pipeline.integration.peak_summary.unmapped_peaks, 0);
    // the run degrades but still surfaces the zero-overlap condition
    assert!(!report.is_empty());

    let peak_summary = fs::read_to_string(output.path().join("peak_mapping_summary.csv")).unwrap();
    assert_eq!(
        peak_summary,
        "Total_Peaks,Mapped_Peaks,Unmapped_Peaks\n0,0,0\n"
    );

    // every gene lacks accessibility, so the scatter is a placeholder
    let scatter =
        fs::read_to_string(output.path().join("expression_vs_accessibility.svg")).unwrap();
    assert!(scatter.contains("no genes with resolved accessibility"));
    // no unmapped peaks either, so that boxplot is a placeholder too
    let boxplot = fs::read_to_string(output.path().join("unmapped_peaks_by_chrom.svg")).unwrap();
    assert!(boxplot.contains("nothing to plot"));
}

#[test]
fn empty_merged_table_keeps_its_header_row() {
    let dir = tempfile::tempdir().unwrap();
    let counts_dir = dir.path().join("counts");
    fs::create_dir(&counts_dir).unwrap();
    write_mex_dir(
        &counts_dir,
        &["ENSG1", "chr1:100-200"],
        &["AAAC"],
        &[(0, 0, 5.0), (1, 0, 3.0)],
    );
    // the annotation names a different gene entirely, so no expressed gene
    // survives into the merged table
    let annotation = dir.path().join("genes.gtf");
    fs::write(
        &annotation,
        format!(
            "{}\n",
            gtf_gene_line("chr1", 100, 200, "ENSG9", "protein_coding", None)
        ),
    )
    .unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(&counts_dir, &annotation, output.path());

    let result = run_pipeline(&config).unwrap();
    assert!(result.value().integration.merged.is_empty());

    let merged = fs::read_to_string(output.path().join("merged_table.csv")).unwrap();
    assert_eq!(merged, "gene_id,chrom,mean_expression,accessibility\n");
    let gene_summary =
        fs::read_to_string(output.path().join("gene_accessibility_summary.csv")).unwrap();
    assert_eq!(
        gene_summary,
        "Total_Genes,Genes_With_Accessibility,Genes_Without_Accessibility\n0,0,0\n"
    );
    let scatter =
        fs::read_to_string(output.path().join("expression_vs_accessibility.svg")).unwrap();
    assert!(scatter.contains("merged table is empty"));
}

#[test]
fn missing_counts_directory_is_a_data_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let annotation = dir.path().join("genes.gtf");
    fs::write(
        &annotation,
        format!(
            "{}\n",
            gtf_gene_line("chr1", 100, 200, "ENSG1", "protein_coding", None)
        ),
    )
    .unwrap();
    let config = PipelineConfig::new(
        dir.path().join("does-not-exist"),
        &annotation,
        dir.path().join("out"),
    );
    assert!(matches!(
        run_pipeline(&config),
        Err(MultiomeError::DataLoad(_))
    ));
}

#[test]
fn unwritable_output_directory_is_an_output_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let (mut config, _output) = write_reference_fixture(dir.path());
    // a plain file where the output directory should go
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, "in the way").unwrap();
    config.output_dir = blocked;
    assert!(matches!(
        run_pipeline(&config),
        Err(MultiomeError::OutputWrite(_))
    ));
}

#[test]
fn malformed_annotation_is_an_annotation_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let counts_dir = dir.path().join("counts");
    fs::create_dir(&counts_dir).unwrap();
    write_mex_dir(&counts_dir, &["ENSG1"], &["AAAC"], &[(0, 0, 1.0)]);
    let annotation = dir.path().join("genes.gtf");
    fs::write(&annotation, "this is not a gtf\n").unwrap();
    let config = PipelineConfig::new(&counts_dir, &annotation, dir.path().join("out"));
    assert!(matches!(
        run_pipeline(&config),
        Err(MultiomeError::AnnotationParse(_))
    ));
}
