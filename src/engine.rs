//! Annotation engine
//!
//! The [`AnnotationEngine`] ties the pieces together: it validates its
//! configuration at construction, fans each batch out through the dispatcher
//! (which handles caching, coalescing, timeouts, and concurrency limits),
//! and merges the per-source results in priority order. Output order always
//! matches input order.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ferro_annotate::config::{EngineConfig, SourceConfig};
//! use ferro_annotate::engine::AnnotationEngine;
//! use ferro_annotate::source::MockSource;
//! use ferro_annotate::variant::VariantRecord;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let config = EngineConfig {
//!     sources: vec![SourceConfig::new("mock", 1)],
//!     ..Default::default()
//! };
//! let engine = AnnotationEngine::new(config, vec![Arc::new(MockSource::new("mock"))])?;
//!
//! let records = vec![VariantRecord::snv("chr1", 100, 'A', 'G')];
//! let annotated = engine.annotate(records).await?;
//! assert_eq!(annotated.len(), 1);
//! # Ok::<(), ferro_annotate::error::AnnotateError>(())
//! # }).unwrap();
//! ```

use std::sync::Arc;

use tracing::info;

use crate::annotation::AnnotatedRecord;
use crate::cache::{AnnotationCache, CacheStats};
use crate::config::EngineConfig;
use crate::dispatch::{Dispatcher, SourceHandle};
use crate::error::AnnotateError;
use crate::merge::merge_results;
use crate::source::AnnotationSource;
use crate::variant::VariantRecord;

/// Concurrent multi-source variant annotation engine
pub struct AnnotationEngine {
    /// Source handles sorted by ascending priority rank
    sources: Vec<SourceHandle>,
    cache: Arc<AnnotationCache>,
    dispatcher: Dispatcher,
}

impl AnnotationEngine {
    /// Create an engine from a validated configuration and one adapter per
    /// configured source
    ///
    /// Fails with a configuration error if the configuration is invalid or
    /// if any configured source has no matching adapter (by identifier).
    pub fn new(
        config: EngineConfig,
        adapters: Vec<Arc<dyn AnnotationSource>>,
    ) -> Result<Self, AnnotateError> {
        config.validate()?;

        let mut sources = Vec::with_capacity(config.sources.len());
        for source_config in &config.sources {
            let adapter = adapters
                .iter()
                .find(|a| a.id() == source_config.id)
                .ok_or_else(|| {
                    AnnotateError::config(format!(
                        "no adapter provided for source '{}'",
                        source_config.id
                    ))
                })?;
            sources.push(SourceHandle::new(source_config, Arc::clone(adapter)));
        }
        sources.sort_by_key(|s| s.priority);

        let cache = Arc::new(AnnotationCache::new(config.cache.to_cache_config()));
        let dispatcher = Dispatcher::new(Arc::clone(&cache), config.max_concurrent_lookups);

        Ok(Self {
            sources,
            cache,
            dispatcher,
        })
    }

    /// Annotate a batch of variant records
    ///
    /// Returns one annotated record per input record, in input order. An
    /// empty batch returns an empty result without touching any source.
    /// Input records with unusable keys fail the whole call before any
    /// lookup is issued.
    pub async fn annotate(
        &self,
        records: Vec<VariantRecord>,
    ) -> Result<Vec<AnnotatedRecord>, AnnotateError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        for (index, record) in records.iter().enumerate() {
            if !record.key.is_well_formed() {
                return Err(AnnotateError::InvalidRecord {
                    index,
                    msg: format!("unusable variant key '{}'", record.key),
                });
            }
        }

        info!(
            records = records.len(),
            sources = self.sources.len(),
            "annotating batch"
        );

        let keys: Vec<_> = records.iter().map(|r| r.key.clone()).collect();
        let results = self.dispatcher.dispatch(&keys, &self.sources).await?;

        let annotated = records
            .into_iter()
            .map(|record| {
                let by_priority: Vec<_> = self
                    .sources
                    .iter()
                    .filter_map(|source| {
                        results
                            .get(&(record.key.clone(), source.id.clone()))
                            .map(|result| (source.id.as_str(), result))
                    })
                    .collect();
                merge_results(record, by_priority)
            })
            .collect();

        Ok(annotated)
    }

    /// Identifiers of the configured sources, in priority order
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id.as_str()).collect()
    }

    /// Cache usage statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop all cached lookup results
    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}
