//! Genomic interval records and collections.
//!
//! All coordinates are 1-based and closed (`[start, end]`, both endpoints
//! inclusive), matching GTF and 10x peak identifiers. Two intervals overlap
//! when their chromosomes are equal and their ranges share at least one
//! position.

use indexmap::IndexMap;

use crate::annotation::GeneRecord;
use crate::config::ChromNaming;
use crate::error::MultiomeError;
use crate::matrix::FeatureTotals;
use crate::Position;

/// Strand of a genomic interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unstranded,
}

impl Strand {
    /// Parse a GTF strand column; anything other than `+`/`-` is unstranded.
    pub fn from_gtf(field: &str) -> Self {
        match field {
            "+" => Strand::Forward,
            "-" => Strand::Reverse,
            _ => Strand::Unstranded,
        }
    }
}

/// An attribute value attached to an [`IntervalRecord`].
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Float(f64),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }
}

/// A single genomic interval with an open attribute set.
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalRecord {
    pub chrom: String,
    pub start: Position,
    pub end: Position,
    pub strand: Strand,
    pub attributes: IndexMap<String, AttrValue>,
}

impl IntervalRecord {
    /// Create a new 1-based closed interval record with no attributes.
    pub fn new(
        chrom: impl Into<String>,
        start: Position,
        end: Position,
        strand: Strand,
    ) -> Result<Self, MultiomeError> {
        if start > end {
            return Err(MultiomeError::InvalidGenomicRange(start, end));
        }
        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
            strand,
            attributes: IndexMap::new(),
        })
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: AttrValue) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    /// The closed-interval overlap predicate: equal chromosome and
    /// intersecting ranges. Touching endpoints (`self.end == other.start`)
    /// count as overlap; strictly adjacent ranges do not.
    pub fn overlaps(&self, other: &IntervalRecord) -> bool {
        self.chrom == other.chrom && self.start <= other.end && other.start <= self.end
    }
}

/// An ordered collection of [`IntervalRecord`]s.
///
/// Record order is the construction order; overlap mappings refer to records
/// by their position in this collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntervalSet {
    pub records: Vec<IntervalRecord>,
}

impl IntervalSet {
    pub fn new(records: Vec<IntervalRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IntervalRecord> {
        self.records.iter()
    }

    /// The distinct chromosome names, in first-seen order.
    pub fn chrom_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            if !names.contains(&record.chrom) {
                names.push(record.chrom.clone());
            }
        }
        names
    }

    /// Subset to records whose `key` attribute is the text `value`.
    pub fn subset_by_attr(&self, key: &str, value: &str) -> IntervalSet {
        let records = self
            .records
            .iter()
            .filter(|record| record.attr(key).and_then(AttrValue::as_str) == Some(value))
            .cloned()
            .collect();
        IntervalSet::new(records)
    }

    /// Return a copy with every chromosome name translated into `naming`.
    pub fn restyled(&self, naming: ChromNaming) -> IntervalSet {
        let records = self
            .records
            .iter()
            .map(|record| {
                let mut restyled = record.clone();
                restyled.chrom = naming.restyle(&record.chrom);
                restyled
            })
            .collect();
        IntervalSet::new(records)
    }

    /// Rename an attribute key on every record carrying it. Records without
    /// the attribute, and an empty collection, are left untouched.
    pub fn rename_attr(&mut self, from: &str, to: &str) {
        for record in &mut self.records {
            if let Some(value) = record.attributes.shift_remove(from) {
                record.attributes.insert(to.to_string(), value);
            }
        }
    }
}

/// Parse a 10x peak identifier like `chr1:100-200` into
/// `(chromosome, start, end)`, 1-based closed.
pub fn parse_peak_name(name: &str) -> Result<(String, Position, Position), MultiomeError> {
    let invalid = || MultiomeError::InvalidPeakName(name.to_string());
    let (chrom, range) = name.split_once(':').ok_or_else(invalid)?;
    let (start, end) = range.split_once('-').ok_or_else(invalid)?;
    if chrom.is_empty() {
        return Err(invalid());
    }
    let start: Position = start.parse().map_err(|_| invalid())?;
    let end: Position = end.parse().map_err(|_| invalid())?;
    if start > end {
        return Err(MultiomeError::InvalidGenomicRange(start, end));
    }
    Ok((chrom.to_string(), start, end))
}

/// Build the accessibility interval collection from peak totals. Peak
/// identifiers already encode their coordinates; each record carries the
/// identifier and its total accessibility as attributes.
pub fn peak_intervals(totals: &FeatureTotals) -> Result<IntervalSet, MultiomeError> {
    let mut records = Vec::with_capacity(totals.len());
    for (peak_id, total) in totals {
        let (chrom, start, end) = parse_peak_name(peak_id)?;
        let mut record = IntervalRecord::new(chrom, start, end, Strand::Unstranded)?;
        record.set_attr("peak_id", AttrValue::Text(peak_id.clone()));
        record.set_attr("total_accessibility", AttrValue::Float(*total));
        records.push(record);
    }
    Ok(IntervalSet::new(records))
}

/// Build the expression interval collection by intersecting the summarized
/// gene identifiers with the annotation. Genes absent from the annotation
/// are dropped; the caller decides whether to surface the drop count.
pub fn gene_intervals(
    totals: &FeatureTotals,
    annotation: &IndexMap<String, GeneRecord>,
) -> Result<(IntervalSet, usize), MultiomeError> {
    let mut records = Vec::new();
    let mut unannotated = 0usize;
    for (gene_id, total) in totals {
        let Some(gene) = annotation.get(gene_id) else {
            unannotated += 1;
            continue;
        };
        let mut record = IntervalRecord::new(gene.chrom.clone(), gene.start, gene.end, gene.strand)?;
        record.set_attr("gene_id", AttrValue::Text(gene_id.clone()));
        if let Some(biotype) = &gene.biotype {
            record.set_attr("gene_biotype", AttrValue::Text(biotype.clone()));
        }
        if let Some(name) = &gene.name {
            record.set_attr("gene_name", AttrValue::Text(name.clone()));
        }
        record.set_attr("total_expression", AttrValue::Float(*total));
        records.push(record);
    }
    Ok((IntervalSet::new(records), unannotated))
}
