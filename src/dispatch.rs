//! Concurrent lookup dispatch
//!
//! The dispatcher fans a batch of variant keys out across all configured
//! sources, one task per (key, source) pair, and enforces the concurrency
//! contract: a batch-wide permit ceiling, a per-source in-flight cap, and a
//! per-source timeout around every adapter call.
//!
//! Identical (key, source) lookups are coalesced. Within one batch the pair
//! set is deduplicated up front; across concurrent batches an in-flight
//! table maps each pair to a broadcast channel, so late arrivals subscribe
//! to the result of the lookup already running instead of issuing their own.
//!
//! A task that completes with an error (the adapter panicked) aborts the
//! batch with [`AnnotateError::AdapterPanic`]; panics are contract
//! violations, not per-source failures.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, warn};

use crate::annotation::{FailureReason, SourceResult};
use crate::cache::AnnotationCache;
use crate::config::SourceConfig;
use crate::error::AnnotateError;
use crate::source::AnnotationSource;
use crate::variant::VariantKey;

/// A configured source ready for dispatch: the adapter plus its runtime
/// limits
#[derive(Clone)]
pub(crate) struct SourceHandle {
    pub id: String,
    pub priority: u32,
    pub timeout: Duration,
    pub limiter: Arc<Semaphore>,
    pub adapter: Arc<dyn AnnotationSource>,
}

impl SourceHandle {
    pub fn new(config: &SourceConfig, adapter: Arc<dyn AnnotationSource>) -> Self {
        Self {
            id: config.id.clone(),
            priority: config.priority,
            timeout: config.timeout(),
            limiter: Arc::new(Semaphore::new(config.max_in_flight)),
            adapter,
        }
    }
}

type PairKey = (VariantKey, String);
type InFlightTable = Mutex<HashMap<PairKey, broadcast::Sender<SourceResult>>>;

/// Fans lookups out across sources with caching and coalescing
pub(crate) struct Dispatcher {
    cache: Arc<AnnotationCache>,
    global_limit: Arc<Semaphore>,
    in_flight: Arc<InFlightTable>,
}

impl Dispatcher {
    pub fn new(cache: Arc<AnnotationCache>, max_concurrent_lookups: usize) -> Self {
        Self {
            cache,
            global_limit: Arc::new(Semaphore::new(max_concurrent_lookups)),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up every (key, source) pair, returning one result per pair
    ///
    /// Duplicate keys in the input collapse to a single lookup per source.
    pub async fn dispatch(
        &self,
        keys: &[VariantKey],
        sources: &[SourceHandle],
    ) -> Result<HashMap<PairKey, SourceResult>, AnnotateError> {
        let unique_keys: HashSet<&VariantKey> = keys.iter().collect();
        let mut tasks = Vec::with_capacity(unique_keys.len() * sources.len());

        for key in unique_keys {
            for source in sources {
                let task = LookupTask {
                    key: key.clone(),
                    source: source.clone(),
                    cache: Arc::clone(&self.cache),
                    global_limit: Arc::clone(&self.global_limit),
                    in_flight: Arc::clone(&self.in_flight),
                };
                let pair = (key.clone(), source.id.clone());
                tasks.push((pair, tokio::spawn(task.run())));
            }
        }

        let mut results = HashMap::with_capacity(tasks.len());
        for ((key, source_id), task) in tasks {
            match task.await {
                Ok(result) => {
                    results.insert((key, source_id), result);
                }
                Err(e) => {
                    return Err(AnnotateError::AdapterPanic {
                        source_id,
                        msg: e.to_string(),
                    });
                }
            }
        }

        Ok(results)
    }
}

/// One (key, source) lookup with all the machinery it needs
struct LookupTask {
    key: VariantKey,
    source: SourceHandle,
    cache: Arc<AnnotationCache>,
    global_limit: Arc<Semaphore>,
    in_flight: Arc<InFlightTable>,
}

impl LookupTask {
    async fn run(self) -> SourceResult {
        if let Some(cached) = self.cache.get(&self.key, &self.source.id) {
            debug!(key = %self.key, source = %self.source.id, "cache hit");
            return cached;
        }

        // Either become the leader for this pair or subscribe to the lookup
        // already in flight.
        let role = self.claim();
        match role {
            Role::Leader(guard) => {
                let result = self.perform_lookup().await;
                self.cache.put(&self.key, &self.source.id, result.clone());
                guard.complete(result.clone());
                result
            }
            Role::Follower(mut receiver) => {
                debug!(key = %self.key, source = %self.source.id, "coalesced with in-flight lookup");
                match receiver.recv().await {
                    Ok(result) => result,
                    // The leader went away without publishing (it panicked).
                    // Run the lookup ourselves rather than propagating a
                    // phantom failure.
                    Err(_) => {
                        if let Some(cached) = self.cache.get(&self.key, &self.source.id) {
                            return cached;
                        }
                        let result = self.perform_lookup().await;
                        self.cache.put(&self.key, &self.source.id, result.clone());
                        result
                    }
                }
            }
        }
    }

    fn claim(&self) -> Role {
        let mut table = match self.in_flight.lock() {
            Ok(guard) => guard,
            // Poisoned table: skip coalescing, do the lookup directly.
            Err(_) => return Role::Leader(InFlightGuard::detached()),
        };

        let pair = (self.key.clone(), self.source.id.clone());
        if let Some(sender) = table.get(&pair) {
            return Role::Follower(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(1);
        table.insert(pair.clone(), sender);
        Role::Leader(InFlightGuard {
            table: Some(Arc::clone(&self.in_flight)),
            pair,
        })
    }

    async fn perform_lookup(&self) -> SourceResult {
        // Acquire only fails if a semaphore is closed, which never happens
        // over a dispatcher's lifetime; treat it as an unreachable source.
        let _global = match self.global_limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return SourceResult::failed(FailureReason::Unreachable(
                    "lookup limiter closed".to_string(),
                ))
            }
        };
        let _slot = match self.source.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return SourceResult::failed(FailureReason::Unreachable(
                    "source limiter closed".to_string(),
                ))
            }
        };

        let result = match tokio::time::timeout(
            self.source.timeout,
            self.source.adapter.lookup(&self.key),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => SourceResult::failed(FailureReason::Timeout),
        };

        if let SourceResult::Failed { reason } = &result {
            warn!(key = %self.key, source = %self.source.id, %reason, "source lookup failed");
        }
        result
    }
}

enum Role {
    Leader(InFlightGuard),
    Follower(broadcast::Receiver<SourceResult>),
}

/// Removes the in-flight entry when the leader finishes, publishing the
/// result to any subscribers. If the leader unwinds instead, `Drop` removes
/// the entry so subscribers observe a closed channel rather than hanging.
struct InFlightGuard {
    table: Option<Arc<InFlightTable>>,
    pair: PairKey,
}

impl InFlightGuard {
    /// A guard with no table entry to clean up
    fn detached() -> Self {
        Self {
            table: None,
            pair: (VariantKey::new("", 0, "", ""), String::new()),
        }
    }

    fn complete(mut self, result: SourceResult) {
        let Some(table) = self.table.take() else {
            return;
        };
        let locked = table.lock();
        if let Ok(mut entries) = locked {
            if let Some(sender) = entries.remove(&self.pair) {
                // No subscribers is the common case
                let _ = sender.send(result);
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(table) = self.table.take() {
            if let Ok(mut table) = table.lock() {
                table.remove(&self.pair);
            }
        }
    }
}
