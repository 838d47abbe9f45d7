//! Splitting a count table into its expression and accessibility modalities.
//!
//! The split is by identifier shape: gene identifiers start with a
//! configured prefix (Ensembl-style, e.g. `ENSG`), peak identifiers encode
//! genomic coordinates (`chr1:100-200`). A row can satisfy at most one
//! predicate; rows satisfying neither follow the configured
//! [`UnassignedPolicy`].

use log::warn;

use crate::config::UnassignedPolicy;
use crate::error::MultiomeError;
use crate::matrix::CountMatrix;
use crate::ranges::parse_peak_name;

/// The two modality subsets of a count table, plus the number of rows
/// assigned to neither.
#[derive(Clone, Debug)]
pub struct ModalitySplit {
    pub expression: CountMatrix,
    pub accessibility: CountMatrix,
    pub unassigned: usize,
}

/// Does this identifier look like a gene id: the configured prefix followed
/// by at least one ASCII digit?
pub fn is_gene_id(identifier: &str, gene_prefix: &str) -> bool {
    match identifier.strip_prefix(gene_prefix) {
        Some(rest) => rest.chars().any(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Does this identifier encode genomic coordinates, i.e. parse as a peak
/// name?
pub fn is_peak_id(identifier: &str) -> bool {
    parse_peak_name(identifier).is_ok()
}

/// Partition a count table into expression and accessibility subsets.
///
/// The gene predicate is checked first, so a pathological identifier
/// matching both shapes lands in the expression subset. Empty input yields
/// two empty subsets.
pub fn split_modalities(
    counts: &CountMatrix,
    gene_prefix: &str,
    policy: UnassignedPolicy,
) -> Result<ModalitySplit, MultiomeError> {
    let mut gene_rows = Vec::new();
    let mut peak_rows = Vec::new();
    let mut unassigned = 0usize;

    for (row, identifier) in counts.features().iter().enumerate() {
        if is_gene_id(identifier, gene_prefix) {
            gene_rows.push(row);
        } else if is_peak_id(identifier) {
            peak_rows.push(row);
        } else {
            unassigned += 1;
        }
    }

    match policy {
        UnassignedPolicy::Drop => {}
        UnassignedPolicy::Warn => {
            if unassigned > 0 {
                warn!(
                    target: "split_modalities",
                    "{} of {} rows matched neither the gene nor the peak predicate and were dropped",
                    unassigned,
                    counts.num_features()
                );
            }
        }
        UnassignedPolicy::Error => {
            if unassigned > 0 {
                return Err(MultiomeError::DataLoad(format!(
                    "{} rows matched neither the gene nor the peak identifier predicate",
                    unassigned
                )));
            }
        }
    }

    Ok(ModalitySplit {
        expression: counts.subset_features(&gene_rows),
        accessibility: counts.subset_features(&peak_rows),
        unassigned,
    })
}

#[cfg(test)]
mod tests {
    use super::{is_gene_id, split_modalities};
    use crate::config::UnassignedPolicy;
    use crate::error::MultiomeError;
    use crate::matrix::CountMatrix;
    use ndarray::Array2;

    fn table(ids: &[&str]) -> CountMatrix {
        CountMatrix::new(
            ids.iter().map(|s| s.to_string()).collect(),
            vec!["cell1".into()],
            Array2::ones((ids.len(), 1)),
        )
        .unwrap()
    }

    #[test]
    fn gene_id_predicate_requires_prefix_and_digit() {
        assert!(is_gene_id("ENSG00000141510", "ENSG"));
        assert!(is_gene_id("ENSG1", "ENSG"));
        assert!(!is_gene_id("ENSMUSG1", "ENSG")); // wrong prefix
        assert!(!is_gene_id("ENSG", "ENSG")); // no digits
        assert!(!is_gene_id("chr1:100-200", "ENSG"));
    }

    #[test]
    fn split_is_disjoint_and_counts_drops() {
        let counts = table(&["ENSG1", "chr1:100-200", "weird-row", "ENSG2"]);
        let split = split_modalities(&counts, "ENSG", UnassignedPolicy::Warn).unwrap();

        assert_eq!(
            split.expression.features(),
            &["ENSG1".to_string(), "ENSG2".to_string()]
        );
        assert_eq!(
            split.accessibility.features(),
            &["chr1:100-200".to_string()]
        );
        assert_eq!(split.unassigned, 1);
        // union of the outputs is a strict subset of the input
        assert_eq!(
            split.expression.num_features() + split.accessibility.num_features(),
            counts.num_features() - split.unassigned
        );
    }

    #[test]
    fn error_policy_fails_on_unassigned_rows() {
        let counts = table(&["ENSG1", "weird-row"]);
        let result = split_modalities(&counts, "ENSG", UnassignedPolicy::Error);
        assert!(matches!(result, Err(MultiomeError::DataLoad(_))));

        // same input passes when drops are allowed
        let split = split_modalities(&counts, "ENSG", UnassignedPolicy::Drop).unwrap();
        assert_eq!(split.unassigned, 1);
    }

    #[test]
    fn empty_input_yields_empty_outputs() {
        let counts = table(&[]);
        let split = split_modalities(&counts, "ENSG", UnassignedPolicy::Warn).unwrap();
        assert!(split.expression.is_empty());
        assert!(split.accessibility.is_empty());
        assert_eq!(split.unassigned, 0);
    }
}
