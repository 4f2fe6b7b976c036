//! Scriptable in-memory annotation source
//!
//! Useful for exercising the dispatcher and engine without a real backend:
//! results are scripted per variant key, every lookup is counted, and an
//! optional artificial latency makes timeout behavior testable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::annotation::{FailureReason, SourceResult};
use crate::variant::VariantKey;

use super::AnnotationSource;

/// In-memory annotation source with scripted responses
pub struct MockSource {
    id: String,
    results: HashMap<VariantKey, SourceResult>,
    default_result: SourceResult,
    latency: Option<Duration>,
    panic_on_lookup: bool,
    calls: AtomicUsize,
    calls_by_key: Mutex<HashMap<VariantKey, usize>>,
}

impl MockSource {
    /// Create a source that answers `NotFound` for every key
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            results: HashMap::new(),
            default_result: SourceResult::NotFound,
            latency: None,
            panic_on_lookup: false,
            calls: AtomicUsize::new(0),
            calls_by_key: Mutex::new(HashMap::new()),
        }
    }

    /// Create a source that fails every lookup with the given reason
    pub fn failing(id: impl Into<String>, reason: FailureReason) -> Self {
        let mut source = Self::new(id);
        source.default_result = SourceResult::failed(reason);
        source
    }

    /// Create a source that panics on every lookup
    pub fn panicking(id: impl Into<String>) -> Self {
        let mut source = Self::new(id);
        source.panic_on_lookup = true;
        source
    }

    /// Script the result for one variant key
    pub fn with_result(mut self, key: VariantKey, result: SourceResult) -> Self {
        self.results.insert(key, result);
        self
    }

    /// Add an artificial delay before every response
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total number of lookups served
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of lookups served for one key
    pub fn call_count_for(&self, key: &VariantKey) -> usize {
        self.calls_by_key
            .lock()
            .map(|counts| counts.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl AnnotationSource for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn lookup(&self, key: &VariantKey) -> SourceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut counts) = self.calls_by_key.lock() {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }

        if self.panic_on_lookup {
            panic!("scripted panic in mock source '{}'", self.id);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.results
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationField;

    #[tokio::test]
    async fn test_scripted_and_default_results() {
        let key = VariantKey::new("chr1", 100, "A", "G");
        let source = MockSource::new("mock").with_result(
            key.clone(),
            SourceResult::found(vec![AnnotationField::new("mock", "f", "v")]),
        );

        assert!(matches!(
            source.lookup(&key).await,
            SourceResult::Found { .. }
        ));
        let other = VariantKey::new("chr2", 5, "C", "T");
        assert_eq!(source.lookup(&other).await, SourceResult::NotFound);
    }

    #[tokio::test]
    async fn test_call_counting() {
        let key = VariantKey::new("chr1", 100, "A", "G");
        let source = MockSource::new("mock");

        source.lookup(&key).await;
        source.lookup(&key).await;
        source.lookup(&VariantKey::new("chr2", 5, "C", "T")).await;

        assert_eq!(source.call_count(), 3);
        assert_eq!(source.call_count_for(&key), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = MockSource::failing("mock", FailureReason::Timeout);
        let key = VariantKey::new("chr1", 100, "A", "G");
        assert_eq!(
            source.lookup(&key).await,
            SourceResult::failed(FailureReason::Timeout)
        );
    }
}
