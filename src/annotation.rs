//! Annotation data model
//!
//! Types describing what a source lookup produced and what the merger
//! resolved: [`AnnotationField`] (one named value attributed to one source),
//! [`SourceResult`] (the typed outcome of one lookup, never mutated after
//! creation), and [`AnnotatedRecord`] (the merged, per-variant output).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::variant::VariantRecord;

/// Value of an annotation field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-text or enumerated category (e.g. "pathogenic")
    Text(String),
    /// Numeric value (e.g. population allele frequency)
    Number(f64),
}

impl FieldValue {
    /// Get the value as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Get the value as a number, if it is numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

/// A named annotation value attributed to one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationField {
    /// Identifier of the source that reported this field
    pub source: String,
    /// Field name (e.g. "significance", "frequency")
    pub field: String,
    /// Reported value
    pub value: FieldValue,
    /// Optional source-reported confidence. Carried for auditability only;
    /// it never affects merge resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AnnotationField {
    /// Create a field with no confidence
    pub fn new(
        source: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            source: source.into(),
            field: field.into(),
            value: value.into(),
            confidence: None,
        }
    }

    /// Attach a confidence value
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Why a source produced no usable annotation for a variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The source had no record for this variant. Not an error.
    NotFound,
    /// The lookup exceeded its configured timeout
    Timeout,
    /// The source was unreachable (connection refused, DNS, HTTP 5xx)
    Unreachable(String),
    /// The source responded but the payload could not be interpreted
    MalformedResponse(String),
}

impl FailureReason {
    /// Whether this reason represents an actual failure, as opposed to a
    /// clean not-found
    pub fn is_error(&self) -> bool {
        !matches!(self, FailureReason::NotFound)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::Timeout => write!(f, "timeout"),
            FailureReason::Unreachable(msg) => write!(f, "unreachable: {}", msg),
            FailureReason::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

/// Outcome of one source lookup for one variant key
///
/// Produced by a source adapter (or by the dispatcher on timeout) and never
/// mutated after creation. Cached as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SourceResult {
    /// The source reported one or more annotation fields
    Found { fields: Vec<AnnotationField> },
    /// The source had no record for this variant
    NotFound,
    /// The lookup failed
    Failed { reason: FailureReason },
}

impl SourceResult {
    /// Create a Found result
    pub fn found(fields: Vec<AnnotationField>) -> Self {
        SourceResult::Found { fields }
    }

    /// Create a Failed result
    pub fn failed(reason: FailureReason) -> Self {
        SourceResult::Failed { reason }
    }

    /// Whether this result is a failure
    pub fn is_failed(&self) -> bool {
        matches!(self, SourceResult::Failed { .. })
    }
}

/// One entry in an annotated record's failure list: a source that failed or
/// returned nothing for this variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Source identifier
    pub source: String,
    /// Why the source contributed nothing
    pub reason: FailureReason,
}

/// A variant record plus its merged annotations
///
/// Each field name resolves to exactly one [`AnnotationField`] (the
/// highest-priority source that reported it); sources that failed or
/// returned nothing are listed in `failures` for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    /// The input record, passed through unmodified
    pub record: VariantRecord,
    /// Resolved annotations, keyed by field name
    pub fields: HashMap<String, AnnotationField>,
    /// Sources that failed or returned nothing for this variant
    pub failures: Vec<SourceFailure>,
}

impl AnnotatedRecord {
    /// Get the resolved field with the given name
    pub fn field(&self, name: &str) -> Option<&AnnotationField> {
        self.fields.get(name)
    }

    /// Get the resolved value for a field name
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|f| &f.value)
    }

    /// Identifiers of sources that actually failed (not-found entries are
    /// excluded)
    pub fn failed_sources(&self) -> Vec<&str> {
        self.failures
            .iter()
            .filter(|f| f.reason.is_error())
            .map(|f| f.source.as_str())
            .collect()
    }

    /// Whether any source failed for this variant
    pub fn has_failures(&self) -> bool {
        self.failures.iter().any(|f| f.reason.is_error())
    }

    /// Whether no source contributed any field
    pub fn is_unannotated(&self) -> bool {
        self.fields.is_empty()
    }
}
