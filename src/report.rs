//! Annotated output writers
//!
//! Two formats: JSON Lines (one serialized [`AnnotatedRecord`] per line,
//! lossless) and a flat TSV summary for spreadsheet work. TSV annotation
//! columns are sorted by field name so output is deterministic.

use std::io::Write;
use std::str::FromStr;

use crate::annotation::AnnotatedRecord;
use crate::error::AnnotateError;

/// Output format for annotated records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON object per line
    Jsonl,
    /// Tab-separated summary
    Tsv,
}

impl FromStr for OutputFormat {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(OutputFormat::Jsonl),
            "tsv" => Ok(OutputFormat::Tsv),
            other => Err(AnnotateError::config(format!(
                "unknown output format '{}' (expected 'jsonl' or 'tsv')",
                other
            ))),
        }
    }
}

/// Write records in the given format
pub fn write_records<W: Write>(
    writer: &mut W,
    records: &[AnnotatedRecord],
    format: OutputFormat,
) -> Result<(), AnnotateError> {
    match format {
        OutputFormat::Jsonl => write_jsonl(writer, records),
        OutputFormat::Tsv => write_tsv(writer, records),
    }
}

/// Write one JSON object per record
pub fn write_jsonl<W: Write>(
    writer: &mut W,
    records: &[AnnotatedRecord],
) -> Result<(), AnnotateError> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Write a flat TSV summary with one row per record
pub fn write_tsv<W: Write>(
    writer: &mut W,
    records: &[AnnotatedRecord],
) -> Result<(), AnnotateError> {
    writeln!(writer, "#chrom\tpos\tref\talt\tid\tannotations\tfailures")?;

    for record in records {
        let key = &record.record.key;

        let mut annotations: Vec<String> = record
            .fields
            .values()
            .map(|f| format!("{}={}", f.field, f.value))
            .collect();
        annotations.sort();
        let annotations = if annotations.is_empty() {
            ".".to_string()
        } else {
            annotations.join(";")
        };

        let failures: Vec<String> = record
            .failures
            .iter()
            .filter(|f| f.reason.is_error())
            .map(|f| format!("{}:{}", f.source, f.reason))
            .collect();
        let failures = if failures.is_empty() {
            ".".to_string()
        } else {
            failures.join(",")
        };

        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            key.chrom,
            key.pos,
            key.reference,
            key.alternate,
            record.record.id.as_deref().unwrap_or("."),
            annotations,
            failures
        )?;
    }

    Ok(())
}
