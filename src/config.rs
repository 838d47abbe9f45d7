//! Pipeline configuration: [`PipelineConfig`] and the explicit policy enums
//! for unassigned count-table rows and chromosome naming conventions.

use std::path::PathBuf;

use clap::ValueEnum;

/// What to do with count-table rows whose identifier matches neither the
/// gene-identifier predicate nor the peak-coordinate predicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UnassignedPolicy {
    /// Drop the rows silently.
    Drop,
    /// Drop the rows, but log how many were dropped.
    #[default]
    Warn,
    /// Fail the run if any row is unassigned.
    Error,
}

/// The two chromosome naming conventions found in the wild: `chr1` versus `1`.
///
/// Interval collections must share one convention before they can be
/// compared; [`ChromNaming::restyle`] is the two-way translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChromNaming {
    /// UCSC-style names with a `chr` prefix, e.g. `chr1`.
    Prefixed,
    /// Ensembl-style bare names, e.g. `1`.
    Bare,
}

impl ChromNaming {
    /// Detect the convention used by a set of chromosome names, by majority
    /// vote. An empty set (or a tie) detects as [`ChromNaming::Bare`].
    pub fn detect<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut prefixed = 0usize;
        let mut total = 0usize;
        for name in names {
            if name.as_ref().starts_with("chr") {
                prefixed += 1;
            }
            total += 1;
        }
        if 2 * prefixed > total {
            ChromNaming::Prefixed
        } else {
            ChromNaming::Bare
        }
    }

    /// Translate a chromosome name into this convention. Names already in
    /// the target convention pass through unchanged.
    pub fn restyle(&self, name: &str) -> String {
        match self {
            ChromNaming::Prefixed => {
                if name.starts_with("chr") {
                    name.to_string()
                } else {
                    format!("chr{}", name)
                }
            }
            ChromNaming::Bare => name.strip_prefix("chr").unwrap_or(name).to_string(),
        }
    }
}

/// All inputs and policies for one pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Directory holding the 10x MEX triplet (`matrix.mtx`, `features.tsv`,
    /// `barcodes.tsv`, optionally gzip-compressed).
    pub counts_dir: PathBuf,
    /// A GTF gene annotation, optionally gzip-compressed.
    pub annotation: PathBuf,
    /// Directory all outputs are written to.
    pub output_dir: PathBuf,
    /// Identifier prefix marking expression features (Ensembl gene ids).
    pub gene_prefix: String,
    /// Policy for rows assigned to neither modality.
    pub unassigned: UnassignedPolicy,
    /// Force a chromosome naming convention for the overlap step, rather
    /// than detecting it from the accessibility collection.
    pub chrom_naming: Option<ChromNaming>,
}

impl PipelineConfig {
    /// Create a configuration with default policies: `ENSG` gene prefix,
    /// warn-and-drop unassigned rows, auto-detected chromosome naming.
    pub fn new(
        counts_dir: impl Into<PathBuf>,
        annotation: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            counts_dir: counts_dir.into(),
            annotation: annotation.into(),
            output_dir: output_dir.into(),
            gene_prefix: "ENSG".to_string(),
            unassigned: UnassignedPolicy::default(),
            chrom_naming: None,
        }
    }
}
