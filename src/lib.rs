// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-annotate: multi-source variant annotator
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Fans variant lookups out across configured annotation sources (local
//! tables, remote APIs), with per-source timeouts and concurrency caps,
//! result caching, and deterministic priority-based merging of the fields
//! each source reports.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ferro_annotate::{
//!     AnnotationEngine, AnnotationField, EngineConfig, MockSource, SourceConfig,
//!     SourceResult, VariantKey, VariantRecord,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! // A scripted source standing in for a real annotation database
//! let key = VariantKey::new("chr1", 100, "A", "G");
//! let clinvar = MockSource::new("clinvar").with_result(
//!     key.clone(),
//!     SourceResult::found(vec![AnnotationField::new("clinvar", "significance", "benign")]),
//! );
//!
//! let config = EngineConfig {
//!     sources: vec![SourceConfig::new("clinvar", 1)],
//!     ..Default::default()
//! };
//! let engine = AnnotationEngine::new(config, vec![Arc::new(clinvar)])?;
//!
//! let annotated = engine.annotate(vec![VariantRecord::new(key)]).await?;
//! assert_eq!(
//!     annotated[0].value("significance").and_then(|v| v.as_text()),
//!     Some("benign")
//! );
//! # Ok::<(), ferro_annotate::AnnotateError>(())
//! # }).unwrap();
//! ```

pub mod annotation;
pub mod cache;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
mod merge;
pub mod report;
pub mod source;
pub mod variant;
pub mod vcf;

// Re-export commonly used types
pub use annotation::{
    AnnotatedRecord, AnnotationField, FailureReason, FieldValue, SourceFailure, SourceResult,
};
pub use cache::{AnnotationCache, CacheStats};
pub use config::{AdapterSpec, CacheConfig, EngineConfig, SourceConfig};
pub use engine::AnnotationEngine;
pub use error::AnnotateError;
pub use report::OutputFormat;
pub use source::{AnnotationSource, FileSource, HttpSource, MockSource};
pub use variant::{VariantKey, VariantRecord};

/// Result type alias for ferro-annotate operations
pub type Result<T> = std::result::Result<T, AnnotateError>;
