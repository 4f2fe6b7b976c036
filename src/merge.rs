//! Merge resolution across sources
//!
//! Combines per-source lookup results for one variant into a single
//! [`AnnotatedRecord`]. Resolution is by source priority alone: when two
//! sources report the same field name, the source with the lower priority
//! rank wins, regardless of any confidence values. Fields with distinct
//! names coexist.
//!
//! Sources that failed or returned nothing are recorded on the output so a
//! missing annotation is distinguishable from a clean not-found.

use std::collections::HashMap;

use crate::annotation::{AnnotatedRecord, FailureReason, SourceFailure, SourceResult};
use crate::variant::VariantRecord;

/// Merge one variant's per-source results, ordered by ascending priority
/// rank (highest priority first)
pub(crate) fn merge_results(
    record: VariantRecord,
    results_by_priority: Vec<(&str, &SourceResult)>,
) -> AnnotatedRecord {
    let mut fields = HashMap::new();
    let mut failures = Vec::new();

    for (source_id, result) in results_by_priority {
        match result {
            SourceResult::Found { fields: reported } => {
                for field in reported {
                    // First writer wins; earlier sources outrank later ones
                    fields
                        .entry(field.field.clone())
                        .or_insert_with(|| field.clone());
                }
            }
            SourceResult::NotFound => {
                failures.push(SourceFailure {
                    source: source_id.to_string(),
                    reason: FailureReason::NotFound,
                });
            }
            SourceResult::Failed { reason } => {
                failures.push(SourceFailure {
                    source: source_id.to_string(),
                    reason: reason.clone(),
                });
            }
        }
    }

    AnnotatedRecord {
        record,
        fields,
        failures,
    }
}
