//! End-to-end annotation engine tests
//!
//! Exercises the full pipeline over scripted sources: priority-based merge
//! resolution, input-order preservation, cache behavior across batches,
//! coalescing of concurrent identical lookups, and isolation of per-source
//! failures.

use std::sync::Arc;
use std::time::Duration;

use ferro_annotate::{
    AnnotateError, AnnotationEngine, AnnotationField, AnnotationSource, EngineConfig,
    FailureReason, MockSource, SourceConfig, SourceResult, VariantKey, VariantRecord,
};

fn key(pos: u64) -> VariantKey {
    VariantKey::new("chr1", pos, "A", "G")
}

fn found(source: &str, fields: &[(&str, &str)]) -> SourceResult {
    SourceResult::found(
        fields
            .iter()
            .map(|(name, value)| AnnotationField::new(source, *name, *value))
            .collect(),
    )
}

fn engine(
    sources: Vec<SourceConfig>,
    adapters: Vec<Arc<dyn AnnotationSource>>,
) -> AnnotationEngine {
    let config = EngineConfig {
        sources,
        ..Default::default()
    };
    AnnotationEngine::new(config, adapters).unwrap()
}

/// Two sources report the same field for variant A; the higher-priority
/// source wins. Variant-specific fields from the lower-priority source
/// still come through.
#[tokio::test]
async fn test_priority_resolution_across_sources() {
    let clinvar = Arc::new(
        MockSource::new("clinvar").with_result(key(100), found("clinvar", &[("significance", "benign")])),
    );
    let internal = Arc::new(
        MockSource::new("internal")
            .with_result(
                key(100),
                SourceResult::found(vec![
                    AnnotationField::new("internal", "significance", "pathogenic")
                        .with_confidence(0.99),
                    AnnotationField::new("internal", "frequency", 0.01),
                ]),
            )
            .with_result(key(200), found("internal", &[("significance", "vus")])),
    );

    let engine = engine(
        vec![SourceConfig::new("clinvar", 1), SourceConfig::new("internal", 2)],
        vec![clinvar, internal],
    );

    let annotated = engine
        .annotate(vec![
            VariantRecord::new(key(100)),
            VariantRecord::new(key(200)),
        ])
        .await
        .unwrap();

    // Variant A: clinvar outranks internal on the shared field, even though
    // internal reported a confidence
    let a = &annotated[0];
    assert_eq!(
        a.value("significance").and_then(|v| v.as_text()),
        Some("benign")
    );
    assert_eq!(a.field("significance").unwrap().source, "clinvar");
    assert_eq!(a.value("frequency").and_then(|v| v.as_number()), Some(0.01));

    // Variant B: only internal had a record; clinvar's not-found is listed
    // but is not an error
    let b = &annotated[1];
    assert_eq!(
        b.value("significance").and_then(|v| v.as_text()),
        Some("vus")
    );
    assert!(!b.has_failures());
    assert_eq!(b.failures.len(), 1);
    assert_eq!(b.failures[0].source, "clinvar");
}

/// Lookup latency falls as position rises, so lookups complete in roughly
/// the reverse of input order.
struct StaggeredSource;

#[async_trait::async_trait]
impl AnnotationSource for StaggeredSource {
    fn id(&self) -> &str {
        "staggered"
    }

    async fn lookup(&self, key: &VariantKey) -> SourceResult {
        let delay = 60u64.saturating_sub(key.pos * 3);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        SourceResult::found(vec![AnnotationField::new(
            "staggered",
            "pos",
            key.pos as f64,
        )])
    }
}

#[tokio::test]
async fn test_output_order_survives_reversed_completion() {
    let engine = engine(
        vec![SourceConfig::new("staggered", 1)],
        vec![Arc::new(StaggeredSource)],
    );

    let records: Vec<VariantRecord> = (0..20).map(|p| VariantRecord::new(key(p))).collect();
    let expected: Vec<VariantKey> = records.iter().map(|r| r.key.clone()).collect();

    let annotated = engine.annotate(records).await.unwrap();
    let got: Vec<VariantKey> = annotated.iter().map(|a| a.record.key.clone()).collect();
    assert_eq!(got, expected);

    // Each record carries the fields looked up for its own key
    for record in &annotated {
        assert_eq!(
            record.value("pos").and_then(|v| v.as_number()),
            Some(record.record.key.pos as f64)
        );
    }
}

/// A warm cache answers a repeated batch without touching any adapter.
#[tokio::test]
async fn test_second_batch_served_from_cache() {
    let source = Arc::new(
        MockSource::new("s").with_result(key(1), found("s", &[("significance", "benign")])),
    );
    let engine = engine(vec![SourceConfig::new("s", 1)], vec![source.clone()]);

    let batch = vec![VariantRecord::new(key(1)), VariantRecord::new(key(2))];
    let first = engine.annotate(batch.clone()).await.unwrap();
    let second = engine.annotate(batch).await.unwrap();

    assert_eq!(first, second);
    // One lookup per key, all repeats served from cache
    assert_eq!(source.call_count(), 2);

    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.size, 2);
}

/// One source timing out must not suppress results from the others, and the
/// timeout must be reported on the affected records.
#[tokio::test]
async fn test_timeout_isolated_to_failing_source() {
    let slow = Arc::new(
        MockSource::new("slow")
            .with_latency(Duration::from_secs(5))
            .with_result(key(1), found("slow", &[("significance", "benign")])),
    );
    let fast = Arc::new(MockSource::new("fast").with_result(key(1), found("fast", &[("frequency", "0.5")])));

    let engine = engine(
        vec![
            SourceConfig::new("slow", 1).with_timeout(Duration::from_millis(20)),
            SourceConfig::new("fast", 2),
        ],
        vec![slow, fast],
    );

    let annotated = engine.annotate(vec![VariantRecord::new(key(1))]).await.unwrap();
    let record = &annotated[0];

    // The fast source's fields survive
    assert_eq!(
        record.value("frequency").and_then(|v| v.as_text()),
        Some("0.5")
    );
    // The slow source contributed nothing and is flagged as failed
    assert!(record.value("significance").is_none());
    assert_eq!(record.failed_sources(), vec!["slow"]);
    assert!(record
        .failures
        .iter()
        .any(|f| f.reason == FailureReason::Timeout));
}

#[tokio::test]
async fn test_unreachable_source_reported_not_fatal() {
    let down = Arc::new(MockSource::failing(
        "down",
        FailureReason::Unreachable("connection refused".to_string()),
    ));
    let up = Arc::new(MockSource::new("up").with_result(key(1), found("up", &[("gene", "BRAF")])));

    let engine = engine(
        vec![SourceConfig::new("down", 1), SourceConfig::new("up", 2)],
        vec![down, up],
    );

    let annotated = engine.annotate(vec![VariantRecord::new(key(1))]).await.unwrap();
    assert_eq!(
        annotated[0].value("gene").and_then(|v| v.as_text()),
        Some("BRAF")
    );
    assert_eq!(annotated[0].failed_sources(), vec!["down"]);
}

/// Concurrent batches asking for the same key share one underlying lookup.
#[tokio::test]
async fn test_concurrent_batches_share_lookups() {
    let source = Arc::new(
        MockSource::new("s")
            .with_latency(Duration::from_millis(50))
            .with_result(key(1), found("s", &[("significance", "benign")])),
    );
    let engine = Arc::new(engine(vec![SourceConfig::new("s", 1)], vec![source.clone()]));

    let e1 = Arc::clone(&engine);
    let e2 = Arc::clone(&engine);
    let (r1, r2) = tokio::join!(
        async move { e1.annotate(vec![VariantRecord::new(key(1))]).await },
        async move { e2.annotate(vec![VariantRecord::new(key(1))]).await },
    );

    assert_eq!(r1.unwrap(), r2.unwrap());
    assert_eq!(source.call_count_for(&key(1)), 1);
}

/// Duplicate keys within one batch produce one lookup but one output row
/// per input record.
#[tokio::test]
async fn test_duplicate_keys_in_batch() {
    let source = Arc::new(
        MockSource::new("s").with_result(key(1), found("s", &[("significance", "benign")])),
    );
    let engine = engine(vec![SourceConfig::new("s", 1)], vec![source.clone()]);

    let annotated = engine
        .annotate(vec![
            VariantRecord::new(key(1)),
            VariantRecord::new(key(1)),
            VariantRecord::new(key(1)),
        ])
        .await
        .unwrap();

    assert_eq!(annotated.len(), 3);
    assert!(annotated.iter().all(|a| !a.is_unannotated()));
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_panicking_adapter_is_fatal() {
    let broken = Arc::new(MockSource::panicking("broken"));
    let engine = engine(vec![SourceConfig::new("broken", 1)], vec![broken]);

    let err = engine
        .annotate(vec![VariantRecord::new(key(1))])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AnnotateError::AdapterPanic { ref source_id, .. } if source_id == "broken"
    ));
}

/// A failed result expires on its shorter TTL, so the source is retried on
/// a later batch while successful results stay cached.
#[tokio::test]
async fn test_failure_cache_expires_before_results() {
    let source = Arc::new(MockSource::failing("s", FailureReason::Timeout));
    let mut config = EngineConfig {
        sources: vec![SourceConfig::new("s", 1)],
        ..Default::default()
    };
    config.cache.failure_ttl_seconds = 0;

    let engine = AnnotationEngine::new(config, vec![source.clone()]).unwrap();

    engine.annotate(vec![VariantRecord::new(key(1))]).await.unwrap();
    engine.annotate(vec![VariantRecord::new(key(1))]).await.unwrap();

    // Zero failure TTL means the second batch retried the source
    assert_eq!(source.call_count(), 2);
}
