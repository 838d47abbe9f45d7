//! Overlap mapping between accessibility peaks and protein-coding genes,
//! backed by a [`coitrees::BasicCOITree`] per chromosome.

use std::collections::HashSet;

use coitrees::{BasicCOITree, GenericInterval, IntervalTree};
use indexmap::IndexMap;

use crate::config::ChromNaming;
use crate::error::MultiomeError;
use crate::ranges::IntervalSet;
use crate::Position;

/// One peak/gene overlap, by record position in the respective
/// [`IntervalSet`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverlapPair {
    pub peak: usize,
    pub gene: usize,
}

/// Every accessibility interval that intersects every protein-coding gene
/// interval. A peak may map to zero, one, or many genes, and vice versa.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlapMap {
    pub pairs: Vec<OverlapPair>,
}

impl OverlapMap {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The distinct peak indices that map to at least one gene.
    pub fn mapped_peaks(&self) -> HashSet<usize> {
        self.pairs.iter().map(|pair| pair.peak).collect()
    }
}

/// An interval plus its record index, the node type fed to the tree.
/// Coordinates are closed on both ends, which is what [`coitrees`] expects.
#[derive(Clone, Debug)]
struct IndexedRange {
    first: i32,
    last: i32,
    index: usize,
}

impl GenericInterval<usize> for IndexedRange {
    fn first(&self) -> i32 {
        self.first
    }
    fn last(&self) -> i32 {
        self.last
    }
    fn metadata(&self) -> &usize {
        &self.index
    }
}

/// Convert a position into the tree's `i32` coordinate space, rejecting
/// coordinates it cannot represent.
fn tree_coord(position: Position) -> Result<i32, MultiomeError> {
    i32::try_from(position).map_err(|_| MultiomeError::CoordinateOverflow(position))
}

/// Compute the overlap mapping between accessibility peaks and
/// protein-coding genes.
///
/// The gene collection is first subset to `protein_coding` records, then
/// restyled to the peaks' chromosome naming convention (detected from the
/// peak collection unless `forced_naming` overrides it). Returns the
/// mapping, sorted by `(peak, gene)`, and the restyled protein-coding
/// collection that the mapping's gene indices refer to.
pub fn map_overlaps(
    genes: &IntervalSet,
    peaks: &IntervalSet,
    forced_naming: Option<ChromNaming>,
) -> Result<(OverlapMap, IntervalSet), MultiomeError> {
    let coding = genes.subset_by_attr("gene_biotype", "protein_coding");
    let naming = forced_naming.unwrap_or_else(|| ChromNaming::detect(peaks.chrom_names()));
    let coding = coding.restyled(naming);

    // One tree per chromosome; chromosome equality is enforced by lookup.
    let mut by_chrom: IndexMap<String, Vec<IndexedRange>> = IndexMap::new();
    for (index, gene) in coding.iter().enumerate() {
        by_chrom
            .entry(gene.chrom.clone())
            .or_default()
            .push(IndexedRange {
                first: tree_coord(gene.start)?,
                last: tree_coord(gene.end)?,
                index,
            });
    }
    let trees: IndexMap<String, BasicCOITree<usize, usize>> = by_chrom
        .into_iter()
        .map(|(chrom, ranges)| (chrom, BasicCOITree::new(&ranges)))
        .collect();

    let mut pairs = Vec::new();
    for (peak_index, peak) in peaks.iter().enumerate() {
        if let Some(tree) = trees.get(&peak.chrom) {
            tree.query(tree_coord(peak.start)?, tree_coord(peak.end)?, |node| {
                pairs.push(OverlapPair {
                    peak: peak_index,
                    gene: *node.metadata(),
                });
            });
        }
    }
    // tree visitation order is unspecified; sort for deterministic output
    pairs.sort_unstable();

    Ok((OverlapMap { pairs }, coding))
}
