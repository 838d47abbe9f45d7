//! Test cases and test utility functions.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use rand::{thread_rng, Rng};

use crate::matrix::CountMatrix;

// Random count matrix defaults: enough mass that column sums are
// comfortably non-zero.
pub const MAX_COUNT: u32 = 50;

/// Write a plaintext 10x MEX triplet (`matrix.mtx`, `features.tsv`,
/// `barcodes.tsv`) into `dir`. Triplet indices are 0-based; the matrix file
/// is written 1-based as the format requires.
pub fn write_mex_dir(
    dir: &Path,
    features: &[&str],
    cells: &[&str],
    triplets: &[(usize, usize, f64)],
) {
    let feature_lines: Vec<String> = features
        .iter()
        .map(|id| format!("{}\t{}\tGene Expression", id, id))
        .collect();
    fs::write(dir.join("features.tsv"), feature_lines.join("\n") + "\n").unwrap();
    fs::write(dir.join("barcodes.tsv"), cells.join("\n") + "\n").unwrap();

    let mut matrix = String::from("%%MatrixMarket matrix coordinate integer general\n");
    matrix.push_str(&format!(
        "{} {} {}\n",
        features.len(),
        cells.len(),
        triplets.len()
    ));
    for (row, col, value) in triplets {
        matrix.push_str(&format!("{} {} {}\n", row + 1, col + 1, value));
    }
    fs::write(dir.join("matrix.mtx"), matrix).unwrap();
}

/// Format one GTF `gene` line.
pub fn gtf_gene_line(
    chrom: &str,
    start: u32,
    end: u32,
    gene_id: &str,
    biotype: &str,
    name: Option<&str>,
) -> String {
    let mut attributes = format!("gene_id \"{}\"; gene_biotype \"{}\";", gene_id, biotype);
    if let Some(name) = name {
        attributes.push_str(&format!(" gene_name \"{}\";", name));
    }
    format!(
        "{}\ttest\tgene\t{}\t{}\t.\t+\t.\t{}",
        chrom, start, end, attributes
    )
}

/// Build a random count matrix with features `F0..Fn` and cells `C0..Cm`.
pub fn random_counts(num_features: usize, num_cells: usize) -> CountMatrix {
    let mut rng = thread_rng();
    let counts = Array2::from_shape_fn((num_features, num_cells), |_| {
        rng.gen_range(0..=MAX_COUNT) as f64
    });
    CountMatrix::new(
        (0..num_features).map(|i| format!("F{}", i)).collect(),
        (0..num_cells).map(|i| format!("C{}", i)).collect(),
        counts,
    )
    .unwrap()
}
