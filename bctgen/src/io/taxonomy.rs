//! BCT taxonomy loader.
//!
//! Reads the taxonomy table (CSV with a header row) and extracts the `No`,
//! `Label` and `Definition` columns. Definitions routinely contain commas and
//! line breaks, so quoted fields are handled per RFC 4180.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::types::TaxonomyEntry;

/// Load taxonomy entries from a CSV file, preserving file order.
pub fn load_taxonomy(path: &Path) -> Result<Vec<TaxonomyEntry>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read taxonomy {}", path.display()))?;
    let entries = parse_taxonomy(&contents)
        .with_context(|| format!("parse taxonomy {}", path.display()))?;
    debug!(entries = entries.len(), "taxonomy loaded");
    Ok(entries)
}

fn parse_taxonomy(contents: &str) -> Result<Vec<TaxonomyEntry>> {
    let mut records = parse_records(contents).into_iter();
    let header = records.next().ok_or_else(|| anyhow!("taxonomy is empty"))?;

    let col = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|field| field.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("taxonomy header is missing a '{name}' column"))
    };
    let no_col = col("No")?;
    let label_col = col("Label")?;
    let definition_col = col("Definition")?;

    let mut entries = Vec::new();
    for (index, record) in records.enumerate() {
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let field = |col: usize, name: &str| -> Result<String> {
            let value = record
                .get(col)
                .map(|field| field.trim().to_string())
                .unwrap_or_default();
            if value.is_empty() {
                return Err(anyhow!("row {}: empty '{name}' field", index + 2));
            }
            Ok(value)
        };
        entries.push(TaxonomyEntry {
            no: field(no_col, "No")?,
            label: field(label_col, "Label")?,
            definition: field(definition_col, "Definition")?,
        });
    }

    if entries.is_empty() {
        return Err(anyhow!("taxonomy has a header but no entries"));
    }
    Ok(entries)
}

/// Split CSV content into records of fields, honoring quoted fields that may
/// contain commas, doubled quotes, and embedded newlines.
fn parse_records(contents: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = contents.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                record.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                }
                record.clear();
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
