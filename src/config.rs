//! Engine configuration
//!
//! Configuration is loaded from a TOML file with one `[[sources]]` table per
//! annotation source and an optional `[cache]` section:
//!
//! ```toml
//! max_concurrent_lookups = 32
//!
//! [[sources]]
//! id = "clinvar"
//! priority = 1
//! timeout_seconds = 30
//! max_in_flight = 4
//! adapter = { type = "file", path = "clinvar.tsv" }
//!
//! [[sources]]
//! id = "gnomad"
//! priority = 2
//! adapter = { type = "http", endpoint = "https://api.example.org/gnomad" }
//!
//! [cache]
//! capacity = 10000
//! result_ttl_seconds = 3600
//! failure_ttl_seconds = 60
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AnnotateError;

/// Runtime cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: usize,
    /// Time-to-live for `Found` and `NotFound` results
    pub result_ttl: Duration,
    /// Shorter time-to-live for `Failed` results
    pub failure_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheSettings::default().to_cache_config()
    }
}

/// Cache section of the configuration file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    /// Maximum number of entries (default: 10000)
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// TTL for `Found`/`NotFound` results in seconds (default: 3600)
    #[serde(default = "default_result_ttl_seconds")]
    pub result_ttl_seconds: u64,
    /// TTL for `Failed` results in seconds (default: 60)
    #[serde(default = "default_failure_ttl_seconds")]
    pub failure_ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            result_ttl_seconds: default_result_ttl_seconds(),
            failure_ttl_seconds: default_failure_ttl_seconds(),
        }
    }
}

impl CacheSettings {
    /// Convert to the runtime cache configuration
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.capacity,
            result_ttl: Duration::from_secs(self.result_ttl_seconds),
            failure_ttl: Duration::from_secs(self.failure_ttl_seconds),
        }
    }
}

/// Adapter-specific connection parameters, opaque to the engine
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AdapterSpec {
    /// Local indexed TSV file
    File {
        /// Path to the annotation TSV
        path: PathBuf,
    },
    /// Remote JSON API
    Http {
        /// Base URL of the annotation endpoint
        endpoint: String,
        /// Optional API key sent as a bearer token
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

/// Configuration for one annotation source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Source identifier, unique within a configuration
    pub id: String,
    /// Priority rank; 1 is highest. Merge resolution consults sources in
    /// ascending rank order.
    pub priority: u32,
    /// Per-lookup timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Maximum concurrent in-flight lookups against this source (default: 4)
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Connection parameters for constructing the adapter. Optional because
    /// callers that construct adapters programmatically (tests) do not need
    /// it; the CLI requires it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<AdapterSpec>,
    /// Exact timeout set through [`SourceConfig::with_timeout`]; takes
    /// precedence over `timeout_seconds` when present. Not serialized.
    #[serde(skip)]
    timeout_override: Option<Duration>,
}

impl SourceConfig {
    /// Create a source configuration with default timeout and concurrency
    pub fn new(id: impl Into<String>, priority: u32) -> Self {
        Self {
            id: id.into(),
            priority,
            timeout_seconds: default_timeout_seconds(),
            max_in_flight: default_max_in_flight(),
            adapter: None,
            timeout_override: None,
        }
    }

    /// Set the per-lookup timeout, with sub-second resolution
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs().max(1);
        self.timeout_override = Some(timeout);
        self
    }

    /// The per-lookup timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        self.timeout_override
            .unwrap_or_else(|| Duration::from_secs(self.timeout_seconds))
    }

    /// Set the per-source concurrency cap
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Configured annotation sources, consulted in priority order
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheSettings,
    /// Batch-wide ceiling on concurrent lookups across all sources
    /// (default: 32)
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            cache: CacheSettings::default(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML content
    pub fn from_toml_str(content: &str) -> Result<Self, AnnotateError> {
        toml::from_str(content)
            .map_err(|e| AnnotateError::config(format!("invalid config file: {}", e)))
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, AnnotateError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    ///
    /// Checks the conditions the engine treats as fatal: at least one
    /// source, unique identifiers, unique priorities, and non-zero limits.
    pub fn validate(&self) -> Result<(), AnnotateError> {
        if self.sources.is_empty() {
            return Err(AnnotateError::config("no annotation sources configured"));
        }

        let mut ids = std::collections::HashSet::new();
        let mut priorities = std::collections::HashSet::new();
        for source in &self.sources {
            if source.id.is_empty() {
                return Err(AnnotateError::config("source with empty identifier"));
            }
            if !ids.insert(source.id.as_str()) {
                return Err(AnnotateError::config(format!(
                    "duplicate source identifier '{}'",
                    source.id
                )));
            }
            if !priorities.insert(source.priority) {
                return Err(AnnotateError::config(format!(
                    "duplicate priority {} (source '{}')",
                    source.priority, source.id
                )));
            }
            if source.max_in_flight == 0 {
                return Err(AnnotateError::config(format!(
                    "source '{}' has max_in_flight = 0",
                    source.id
                )));
            }
            if source.timeout().is_zero() {
                return Err(AnnotateError::config(format!(
                    "source '{}' has a zero timeout",
                    source.id
                )));
            }
        }

        if self.max_concurrent_lookups == 0 {
            return Err(AnnotateError::config("max_concurrent_lookups is 0"));
        }
        if self.cache.capacity == 0 {
            return Err(AnnotateError::config("cache capacity is 0"));
        }

        Ok(())
    }
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_result_ttl_seconds() -> u64 {
    3600
}

fn default_failure_ttl_seconds() -> u64 {
    60
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_in_flight() -> usize {
    4
}

fn default_max_concurrent_lookups() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let content = r#"
max_concurrent_lookups = 16

[[sources]]
id = "clinvar"
priority = 1
timeout_seconds = 10
max_in_flight = 2
adapter = { type = "file", path = "clinvar.tsv" }

[[sources]]
id = "gnomad"
priority = 2
adapter = { type = "http", endpoint = "https://api.example.org/gnomad" }

[cache]
capacity = 500
result_ttl_seconds = 120
failure_ttl_seconds = 5
"#;
        let config = EngineConfig::from_toml_str(content).unwrap();
        assert_eq!(config.max_concurrent_lookups, 16);
        assert_eq!(config.sources.len(), 2);

        let clinvar = &config.sources[0];
        assert_eq!(clinvar.id, "clinvar");
        assert_eq!(clinvar.priority, 1);
        assert_eq!(clinvar.timeout(), Duration::from_secs(10));
        assert_eq!(clinvar.max_in_flight, 2);
        assert_eq!(
            clinvar.adapter,
            Some(AdapterSpec::File {
                path: PathBuf::from("clinvar.tsv")
            })
        );

        let gnomad = &config.sources[1];
        assert_eq!(gnomad.timeout_seconds, 30); // default
        assert_eq!(gnomad.max_in_flight, 4); // default

        assert_eq!(config.cache.capacity, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_sources_invalid() {
        let config = EngineConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no annotation sources"));
    }

    #[test]
    fn test_duplicate_id_invalid() {
        let config = EngineConfig {
            sources: vec![SourceConfig::new("a", 1), SourceConfig::new("a", 2)],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate source identifier"));
    }

    #[test]
    fn test_duplicate_priority_invalid() {
        let config = EngineConfig {
            sources: vec![SourceConfig::new("a", 1), SourceConfig::new("b", 1)],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate priority"));
    }

    #[test]
    fn test_zero_max_in_flight_invalid() {
        let config = EngineConfig {
            sources: vec![SourceConfig::new("a", 1).with_max_in_flight(0)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_second_timeout_via_builder() {
        let source = SourceConfig::new("a", 1).with_timeout(Duration::from_millis(50));
        assert_eq!(source.timeout(), Duration::from_millis(50));
    }

    #[test]
    fn test_cache_settings_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        let cache = config.cache.to_cache_config();
        assert_eq!(cache.capacity, 10_000);
        assert_eq!(cache.result_ttl, Duration::from_secs(3600));
        assert_eq!(cache.failure_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("sources = 3").unwrap_err();
        assert!(err.is_config());
    }
}
