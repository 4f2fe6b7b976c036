//! Error types for ferro-annotate
//!
//! The engine distinguishes fatal errors (configuration problems, broken
//! adapter implementations) from per-source lookup failures. Only the former
//! surface as `AnnotateError`; lookup failures are data, carried as
//! [`SourceResult::Failed`](crate::annotation::SourceResult) and recorded on
//! the annotated record.

use thiserror::Error;

/// Main error type for ferro-annotate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotateError {
    /// Configuration error (no sources, duplicate identifiers, bad priority
    /// list). Aborts a call before any lookup is issued.
    #[error("Configuration error: {msg}")]
    Config { msg: String },

    /// An input record carries an unusable variant key (empty chromosome,
    /// reference, or alternate allele).
    #[error("Invalid variant record at batch index {index}: {msg}")]
    InvalidRecord { index: usize, msg: String },

    /// A source adapter panicked instead of returning a typed result. This
    /// indicates a broken adapter implementation and terminates the batch.
    /// The field is `source_id`, not `source`, to keep it a plain string
    /// rather than an error cause in the `std::error::Error` sense.
    #[error("Source adapter '{source_id}' violated the lookup contract: {msg}")]
    AdapterPanic { source_id: String, msg: String },

    /// Parse error reading input data (VCF lines, source files)
    #[error("Parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl AnnotateError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AnnotateError::Config { msg: msg.into() }
    }

    /// Create a parse error with a 1-based line number
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        AnnotateError::Parse {
            line,
            msg: msg.into(),
        }
    }

    /// Whether this error is a configuration-class error that aborts a call
    /// before any lookup
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            AnnotateError::Config { .. } | AnnotateError::InvalidRecord { .. }
        )
    }
}

impl From<std::io::Error> for AnnotateError {
    fn from(err: std::io::Error) -> Self {
        AnnotateError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AnnotateError {
    fn from(err: serde_json::Error) -> Self {
        AnnotateError::Json {
            msg: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = AnnotateError::config("no sources configured");
        assert!(err.to_string().contains("no sources configured"));
        assert!(err.is_config());
    }

    #[test]
    fn test_invalid_record_is_config_class() {
        let err = AnnotateError::InvalidRecord {
            index: 3,
            msg: "empty reference allele".to_string(),
        };
        assert!(err.is_config());
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn test_adapter_panic_is_not_config_class() {
        let err = AnnotateError::AdapterPanic {
            source_id: "clinvar".to_string(),
            msg: "task panicked".to_string(),
        };
        assert!(!err.is_config());
        assert!(err.to_string().contains("clinvar"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnnotateError = io_err.into();
        assert!(matches!(err, AnnotateError::Io { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_parse_error_line_number() {
        let err = AnnotateError::parse(42, "expected 5 fields");
        assert_eq!(
            err,
            AnnotateError::Parse {
                line: 42,
                msg: "expected 5 fields".to_string()
            }
        );
    }
}
