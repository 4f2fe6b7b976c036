//! HTTP-backed annotation source
//!
//! Queries a remote JSON annotation API with one GET request per variant:
//!
//! ```text
//! GET {endpoint}/variant/{chrom}-{pos}-{ref}-{alt}
//! ```
//!
//! The expected response body is `{"found": bool, "fields": [{"field": ...,
//! "value": ...}]}`. A 404 status is treated the same as `found: false`.
//! Transport errors, non-success statuses, and undecodable bodies all come
//! back as [`SourceResult::Failed`]; this adapter never panics on a bad
//! backend.

use async_trait::async_trait;
use serde::Deserialize;

use crate::annotation::{AnnotationField, FailureReason, FieldValue, SourceResult};
use crate::error::AnnotateError;
use crate::variant::VariantKey;

use super::AnnotationSource;

/// One annotation entry in an API response
#[derive(Debug, Deserialize)]
struct ApiField {
    field: String,
    value: serde_json::Value,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Response from the variant endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse {
    found: bool,
    #[serde(default)]
    fields: Vec<ApiField>,
}

/// Annotation source backed by a remote JSON API
pub struct HttpSource {
    id: String,
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSource {
    /// Create a source for the given endpoint
    ///
    /// No per-request timeout is set on the client; the dispatcher bounds
    /// every lookup with the configured source timeout.
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, AnnotateError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ferro-annotate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnnotateError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            id: id.into(),
            client,
            base_url: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url_for(&self, key: &VariantKey) -> String {
        format!(
            "{}/variant/{}-{}-{}-{}",
            self.base_url,
            urlencoding::encode(&key.chrom),
            key.pos,
            urlencoding::encode(&key.reference),
            urlencoding::encode(&key.alternate)
        )
    }

    fn convert(&self, response: ApiResponse) -> SourceResult {
        if !response.found {
            return SourceResult::NotFound;
        }

        let mut fields = Vec::with_capacity(response.fields.len());
        for entry in response.fields {
            let value = match entry.value {
                serde_json::Value::String(s) => FieldValue::Text(s),
                serde_json::Value::Number(n) => match n.as_f64() {
                    Some(f) => FieldValue::Number(f),
                    None => {
                        return SourceResult::failed(FailureReason::MalformedResponse(format!(
                            "field '{}' has a non-representable number",
                            entry.field
                        )))
                    }
                },
                other => {
                    return SourceResult::failed(FailureReason::MalformedResponse(format!(
                        "field '{}' has unsupported value type: {}",
                        entry.field, other
                    )))
                }
            };
            let mut field = AnnotationField::new(&self.id, entry.field, value);
            if let Some(confidence) = entry.confidence {
                field = field.with_confidence(confidence);
            }
            fields.push(field);
        }

        if fields.is_empty() {
            // A "found" record with no fields carries no information
            return SourceResult::NotFound;
        }
        SourceResult::found(fields)
    }
}

#[async_trait]
impl AnnotationSource for HttpSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn lookup(&self, key: &VariantKey) -> SourceResult {
        let mut request = self.client.get(self.url_for(key));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return SourceResult::failed(FailureReason::Unreachable(e.to_string())),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return SourceResult::NotFound;
        }
        if !status.is_success() {
            return SourceResult::failed(FailureReason::Unreachable(format!(
                "HTTP {} from {}",
                status, self.base_url
            )));
        }

        match response.json::<ApiResponse>().await {
            Ok(body) => self.convert(body),
            Err(e) => SourceResult::failed(FailureReason::MalformedResponse(e.to_string())),
        }
    }
}
