//! Reattaching manifest paths to checker output
//!
//! The checker only sees `<HASH>.<ext>` references. Each processed row is
//! mapped back through its hash column to the first manifest path recorded
//! for that hash. Rows that do not name a staged reference pass through.

use tracing::warn;

use super::tsv::parse_tsv;
use crate::core::config::HashAlgorithm;
use crate::core::error::{BatchSigCheckError, Result};
use crate::scanner::duplicate_detector::FileTable;

/// A checker row for one staged file, with the manifest path in column 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub fields: Vec<String>,
    pub hash: String,
}

impl ReportRow {
    pub fn path(&self) -> &str {
        &self.fields[0]
    }
}

/// One output line, in checker order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Passthrough(Vec<String>),
    Processed(ReportRow),
}

impl Record {
    pub fn fields(&self) -> &[String] {
        match self {
            Record::Passthrough(fields) => fields,
            Record::Processed(row) => &row.fields,
        }
    }
}

/// Checker output with manifest paths substituted in
#[derive(Debug, Clone, Default)]
pub struct Reattached {
    pub has_header: bool,
    pub records: Vec<Record>,
}

impl Reattached {
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Processed(row) => Some(row),
            Record::Passthrough(_) => None,
        })
    }

    pub fn processed_count(&self) -> usize {
        self.rows().count()
    }
}

/// True when `first_column` names a staged reference file
pub fn is_staged_reference(first_column: &str, extension: &str) -> bool {
    let name = first_column
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(first_column);
    let suffix = format!(".{}", extension.to_lowercase());
    name.to_lowercase().ends_with(&suffix)
}

/// Parse checker output and substitute manifest paths for staged references.
///
/// The hash column is located by name when the output has a header row,
/// otherwise the algorithm's default position is used. A staged row without
/// that column, or whose hash was never staged, is an error.
pub fn reattach(
    output: &str,
    table: &FileTable,
    algorithm: HashAlgorithm,
    extension: &str,
) -> Result<Reattached> {
    let rows = parse_tsv(output);
    if rows.is_empty() {
        return Err(BatchSigCheckError::EmptyOutput);
    }

    let header = rows
        .first()
        .filter(|row| !is_staged_reference(&row[0], extension));
    let hash_column = match header {
        Some(header) => header
            .iter()
            .position(|name| name.trim().eq_ignore_ascii_case(algorithm.column_name()))
            .ok_or_else(|| {
                BatchSigCheckError::ColumnLayout(format!(
                    "header has no {} column",
                    algorithm.column_name()
                ))
            })?,
        None => algorithm.default_column(),
    };

    let mut reattached = Reattached {
        has_header: header.is_some(),
        records: Vec::with_capacity(rows.len()),
    };

    for (idx, mut fields) in rows.into_iter().enumerate() {
        if !is_staged_reference(&fields[0], extension) {
            if idx > 0 {
                warn!("Passing through unexpected row: {}", fields[0]);
            }
            reattached.records.push(Record::Passthrough(fields));
            continue;
        }

        let reference = fields[0].clone();
        let hash = fields
            .get(hash_column)
            .map(|h| h.trim().to_uppercase())
            .ok_or_else(|| {
                BatchSigCheckError::ColumnLayout(format!(
                    "{} has {} columns, expected {} at index {}",
                    reference,
                    fields.len(),
                    algorithm.column_name(),
                    hash_column
                ))
            })?;

        let unique = table
            .get(&hash)
            .ok_or_else(|| BatchSigCheckError::UnknownHash {
                hash: hash.clone(),
                reference: reference.clone(),
            })?;

        fields[0] = unique.canonical_path().to_string();
        reattached
            .records
            .push(Record::Processed(ReportRow { fields, hash }));
    }

    Ok(reattached)
}
