//! GTF gene-annotation parsing.
//!
//! Only `gene` records are retained; each is reduced to the coordinates and
//! the handful of attributes the pipeline consumes (`gene_id`,
//! `gene_biotype`/`gene_type`, `gene_name`). GTF coordinates are 1-based
//! closed, which matches the crate-wide convention, so no conversion is
//! applied.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use std::io::BufRead;

use crate::error::MultiomeError;
use crate::io::InputFile;
use crate::ranges::Strand;
use crate::Position;

/// A `gene` record from a GTF annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneRecord {
    pub gene_id: String,
    pub chrom: String,
    /// 1-based closed start.
    pub start: Position,
    /// 1-based closed end.
    pub end: Position,
    pub strand: Strand,
    pub biotype: Option<String>,
    pub name: Option<String>,
}

/// Parse a (possibly gzip-compressed) GTF file, returning its `gene`
/// records keyed by `gene_id`, in file order.
///
/// The first record wins when a `gene_id` is duplicated. Any structural
/// problem — unreadable file, wrong column count, unparseable coordinates,
/// a `gene` record without a `gene_id` — fails with
/// [`MultiomeError::AnnotationParse`].
pub fn read_gtf_genes(
    path: impl AsRef<Path>,
) -> Result<IndexMap<String, GeneRecord>, MultiomeError> {
    let path = path.as_ref();
    let input = InputFile::new(path);
    let reader = input.reader().map_err(|e| {
        MultiomeError::AnnotationParse(format!("{}: {}", path.display(), e))
    })?;

    let mut genes: IndexMap<String, GeneRecord> = IndexMap::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            MultiomeError::AnnotationParse(format!(
                "{}: line {}: {}",
                path.display(),
                line_number + 1,
                e
            ))
        })?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(record) = parse_gene_line(&line).map_err(|message| {
            MultiomeError::AnnotationParse(format!(
                "{}: line {}: {}",
                path.display(),
                line_number + 1,
                message
            ))
        })?
        else {
            continue;
        };
        if genes.contains_key(&record.gene_id) {
            debug!(
                target: "build_intervals",
                "duplicate gene_id '{}' at line {}; keeping the first record",
                record.gene_id,
                line_number + 1
            );
            continue;
        }
        genes.insert(record.gene_id.clone(), record);
    }
    Ok(genes)
}

/// Parse one GTF body line; `Ok(None)` for non-`gene` records.
fn parse_gene_line(line: &str) -> Result<Option<GeneRecord>, String> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(format!("expected 9 tab-separated fields, found {}", fields.len()));
    }
    if fields[2] != "gene" {
        return Ok(None);
    }
    let start: Position = fields[3]
        .parse()
        .map_err(|_| format!("invalid start position '{}'", fields[3]))?;
    let end: Position = fields[4]
        .parse()
        .map_err(|_| format!("invalid end position '{}'", fields[4]))?;
    if start == 0 || start > end {
        return Err(format!("invalid gene range {}-{}", start, end));
    }
    let attributes = parse_attributes(fields[8]);
    let gene_id = attributes
        .get("gene_id")
        .ok_or_else(|| "gene record without a gene_id attribute".to_string())?
        .clone();
    // Ensembl writes gene_biotype; GENCODE writes gene_type.
    let biotype = attributes
        .get("gene_biotype")
        .or_else(|| attributes.get("gene_type"))
        .cloned();
    Ok(Some(GeneRecord {
        gene_id,
        chrom: fields[0].to_string(),
        start,
        end,
        strand: Strand::from_gtf(fields[6]),
        biotype,
        name: attributes.get("gene_name").cloned(),
    }))
}

/// Parse the GTF attribute column: `key "value"; key "value";`.
fn parse_attributes(column: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for entry in column.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some((key, value)) = entry.split_once(' ') {
            let value = value.trim().trim_matches('"');
            attributes.insert(key.to_string(), value.to_string());
        }
    }
    attributes
}
