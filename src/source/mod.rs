//! Annotation source adapters
//!
//! An [`AnnotationSource`] answers one question: what does this source know
//! about this variant? Adapters translate that question into whatever their
//! backend speaks (a local TSV, a JSON API) and translate the answer back
//! into a [`SourceResult`]. All transport and protocol detail stays inside
//! the adapter.
//!
//! Adapters do not enforce timeouts, concurrency limits, or caching; the
//! dispatcher wraps every `lookup` call with those. An adapter reports its
//! own failures as [`SourceResult::Failed`] rather than panicking.

use async_trait::async_trait;

use crate::annotation::SourceResult;
use crate::variant::VariantKey;

mod file;
mod http;
mod mock;

pub use file::FileSource;
pub use http::HttpSource;
pub use mock::MockSource;

/// A queryable annotation source
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    /// Stable identifier of this source, matching its configuration entry
    fn id(&self) -> &str;

    /// Look up annotations for one variant
    ///
    /// Infallible by signature: transport and protocol problems come back as
    /// [`SourceResult::Failed`], a clean miss as [`SourceResult::NotFound`].
    async fn lookup(&self, key: &VariantKey) -> SourceResult;
}
