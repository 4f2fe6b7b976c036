//! File-backed annotation source
//!
//! Reads a tab-separated annotation table into memory at construction time
//! and answers lookups from the resulting index. One line per variant:
//!
//! ```text
//! #chrom  pos  ref  alt  annotations
//! chr1    100  A    G    significance=benign;review_status=criteria_provided
//! chr7    140453136  A  T  significance=pathogenic;frequency=0.0001
//! ```
//!
//! The annotations column is a `;`-separated list of `name=value` pairs.
//! Values that parse as numbers are stored numerically. Gzip-compressed
//! tables are detected by their `.gz` extension.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use async_trait::async_trait;

use crate::annotation::{AnnotationField, FieldValue, SourceResult};
use crate::error::AnnotateError;
use crate::variant::VariantKey;
use crate::vcf::open_reader;

use super::AnnotationSource;

/// Annotation source backed by an in-memory index of a local TSV
pub struct FileSource {
    id: String,
    records: HashMap<VariantKey, Vec<AnnotationField>>,
}

impl FileSource {
    /// Load an annotation table from a TSV file (plain or gzip-compressed)
    pub fn load(id: impl Into<String>, path: &Path) -> Result<Self, AnnotateError> {
        let id = id.into();
        let reader = open_reader(path)?;
        let records = Self::parse(&id, reader)?;
        Ok(Self { id, records })
    }

    /// Parse an annotation table from TSV content
    pub fn from_tsv(id: impl Into<String>, content: &str) -> Result<Self, AnnotateError> {
        let id = id.into();
        let records = Self::parse(&id, content.as_bytes())?;
        Ok(Self { id, records })
    }

    /// Build a source directly from key/field pairs
    pub fn from_records(
        id: impl Into<String>,
        records: Vec<(VariantKey, Vec<AnnotationField>)>,
    ) -> Self {
        Self {
            id: id.into(),
            records: records.into_iter().collect(),
        }
    }

    /// Number of indexed variants
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn parse<R: BufRead>(
        id: &str,
        reader: R,
    ) -> Result<HashMap<VariantKey, Vec<AnnotationField>>, AnnotateError> {
        let mut records = HashMap::new();

        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = line_idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split('\t').collect();
            if fields.len() < 5 {
                return Err(AnnotateError::parse(
                    line_num,
                    format!("expected 5 tab-separated fields, found {}", fields.len()),
                ));
            }

            let pos: u64 = fields[1].parse().map_err(|_| {
                AnnotateError::parse(line_num, format!("invalid position '{}'", fields[1]))
            })?;
            let key = VariantKey::new(fields[0], pos, fields[2], fields[3]);

            let mut annotations = Vec::new();
            for pair in fields[4].split(';').filter(|p| !p.is_empty()) {
                let (name, value) = pair.split_once('=').ok_or_else(|| {
                    AnnotateError::parse(
                        line_num,
                        format!("annotation '{}' is not a name=value pair", pair),
                    )
                })?;
                let value = match value.parse::<f64>() {
                    Ok(n) => FieldValue::Number(n),
                    Err(_) => FieldValue::Text(value.to_string()),
                };
                annotations.push(AnnotationField::new(id, name, value));
            }

            records.insert(key, annotations);
        }

        Ok(records)
    }
}

#[async_trait]
impl AnnotationSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn lookup(&self, key: &VariantKey) -> SourceResult {
        match self.records.get(key) {
            Some(fields) => SourceResult::found(fields.clone()),
            None => SourceResult::NotFound,
        }
    }
}
