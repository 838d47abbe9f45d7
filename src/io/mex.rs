//! Loading a 10x Market Exchange (MEX) directory into a dense
//! [`CountMatrix`].
//!
//! A MEX directory holds a sparse `matrix.mtx` in MatrixMarket coordinate
//! format plus `features.tsv` (feature identifiers, one per matrix row) and
//! `barcodes.tsv` (cell barcodes, one per matrix column). Each of the three
//! may be gzip-compressed. Any structural problem fails with
//! [`MultiomeError::DataLoad`].

use std::io::BufRead;
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::error::MultiomeError;
use crate::io::InputFile;
use crate::matrix::CountMatrix;

/// Locate `name` or `name.gz` inside `dir`.
fn locate(dir: &Path, name: &str) -> Result<PathBuf, MultiomeError> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Ok(plain);
    }
    let gzipped = dir.join(format!("{}.gz", name));
    if gzipped.is_file() {
        return Ok(gzipped);
    }
    Err(MultiomeError::DataLoad(format!(
        "missing '{}' (or '{}.gz') in {}",
        name,
        name,
        dir.display()
    )))
}

/// Read the first tab-separated column of each line.
fn read_first_column(path: &Path) -> Result<Vec<String>, MultiomeError> {
    let reader = InputFile::new(path).reader()?;
    let mut column = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let first = line.split('\t').next().unwrap_or("").to_string();
        column.push(first);
    }
    Ok(column)
}

/// Parse a MatrixMarket coordinate file into `(rows, cols, triplets)` with
/// 0-based indices.
fn read_matrix_market(
    path: &Path,
) -> Result<(usize, usize, Vec<(usize, usize, f64)>), MultiomeError> {
    let context = |message: String| {
        MultiomeError::DataLoad(format!("{}: {}", path.display(), message))
    };
    let reader = InputFile::new(path).reader()?;
    let mut lines = reader.lines();

    let banner = lines
        .next()
        .transpose()?
        .ok_or_else(|| context("empty file".to_string()))?;
    if !banner.starts_with("%%MatrixMarket") {
        return Err(context("missing %%MatrixMarket banner".to_string()));
    }
    if !banner.contains("coordinate") {
        return Err(context(
            "only the coordinate (sparse) format is supported".to_string(),
        ));
    }

    let mut dims: Option<(usize, usize, usize)> = None;
    let mut triplets = Vec::new();
    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(context(format!(
                "expected 3 whitespace-separated fields, found {} in '{}'",
                fields.len(),
                line
            )));
        }
        let index = |field: &str, what: &str| -> Result<usize, MultiomeError> {
            field
                .parse::<usize>()
                .map_err(|_| context(format!("invalid {} '{}'", what, field)))
        };

        match dims {
            None => {
                let rows = index(fields[0], "row count")?;
                let cols = index(fields[1], "column count")?;
                let entries = index(fields[2], "entry count")?;
                dims = Some((rows, cols, entries));
            }
            Some((rows, cols, _)) => {
                let row = index(fields[0], "row index")?;
                let col = index(fields[1], "column index")?;
                let value = fields[2]
                    .parse::<f64>()
                    .map_err(|_| context(format!("invalid value '{}'", fields[2])))?;
                if row == 0 || row > rows || col == 0 || col > cols {
                    return Err(context(format!(
                        "entry ({}, {}) outside the declared {}x{} shape",
                        row, col, rows, cols
                    )));
                }
                if value < 0.0 {
                    return Err(context(format!(
                        "negative count {} at entry ({}, {})",
                        value, row, col
                    )));
                }
                triplets.push((row - 1, col - 1, value));
            }
        }
    }

    let (rows, cols, entries) = dims.ok_or_else(|| context("missing dimensions line".to_string()))?;
    if triplets.len() != entries {
        return Err(context(format!(
            "expected {} entries, found {}",
            entries,
            triplets.len()
        )));
    }
    Ok((rows, cols, triplets))
}

/// Load and densify a MEX directory.
pub fn read_mex_dir(dir: impl AsRef<Path>) -> Result<CountMatrix, MultiomeError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MultiomeError::DataLoad(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    // 10x v2 called the feature file genes.tsv; accept both.
    let features_path = locate(dir, "features.tsv").or_else(|_| locate(dir, "genes.tsv"))?;
    let features = read_first_column(&features_path)?;
    let barcodes = read_first_column(&locate(dir, "barcodes.tsv")?)?;
    let (rows, cols, triplets) = read_matrix_market(&locate(dir, "matrix.mtx")?)?;

    if rows != features.len() || cols != barcodes.len() {
        return Err(MultiomeError::DataLoad(format!(
            "matrix shape {}x{} does not match {} features and {} barcodes in {}",
            rows,
            cols,
            features.len(),
            barcodes.len(),
            dir.display()
        )));
    }

    let mut counts = Array2::zeros((rows, cols));
    for (row, col, value) in triplets {
        counts[[row, col]] += value;
    }
    CountMatrix::new(features, barcodes, counts)
}

#[cfg(test)]
mod tests {
    use super::read_mex_dir;
    use crate::error::MultiomeError;
    use crate::test_utilities::write_mex_dir;
    use std::fs;

    #[test]
    fn loads_and_densifies_a_mex_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_mex_dir(
            dir.path(),
            &["ENSG1", "chr1:100-200"],
            &["AAAC", "GGGT"],
            &[(0, 0, 3.0), (1, 1, 7.0)],
        );
        let matrix = read_mex_dir(dir.path()).unwrap();
        assert_eq!(matrix.features(), &["ENSG1", "chr1:100-200"]);
        assert_eq!(matrix.cells(), &["AAAC", "GGGT"]);
        assert_eq!(matrix.counts()[[0, 0]], 3.0);
        assert_eq!(matrix.counts()[[0, 1]], 0.0);
        assert_eq!(matrix.counts()[[1, 1]], 7.0);
    }

    #[test]
    fn missing_directory_and_missing_files_fail_with_data_load() {
        assert!(matches!(
            read_mex_dir("/definitely/not/here"),
            Err(MultiomeError::DataLoad(_))
        ));

        // a directory without the matrix file
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("features.tsv"), "ENSG1\n").unwrap();
        fs::write(dir.path().join("barcodes.tsv"), "AAAC\n").unwrap();
        assert!(matches!(
            read_mex_dir(dir.path()),
            Err(MultiomeError::DataLoad(_))
        ));
    }

    #[test]
    fn shape_mismatch_fails_with_data_load() {
        let dir = tempfile::tempdir().unwrap();
        write_mex_dir(dir.path(), &["ENSG1"], &["AAAC"], &[(0, 0, 1.0)]);
        // one extra barcode not reflected in the matrix header
        fs::write(dir.path().join("barcodes.tsv"), "AAAC\nGGGT\n").unwrap();
        assert!(matches!(
            read_mex_dir(dir.path()),
            Err(MultiomeError::DataLoad(_))
        ));
    }

    #[test]
    fn malformed_matrix_banner_fails_with_data_load() {
        let dir = tempfile::tempdir().unwrap();
        write_mex_dir(dir.path(), &["ENSG1"], &["AAAC"], &[(0, 0, 1.0)]);
        fs::write(dir.path().join("matrix.mtx"), "not a matrix\n").unwrap();
        assert!(matches!(
            read_mex_dir(dir.path()),
            Err(MultiomeError::DataLoad(_))
        ));
    }
}
