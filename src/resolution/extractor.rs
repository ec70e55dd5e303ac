//! Candidate Extractor
//!
//! Maps a raw per-source document bundle into typed field candidates using
//! the static mapping tables in [`crate::resolution`]. Lookup failures are
//! not errors: a missing document or missing path simply produces no
//! candidate for that source.

use serde_json::Value;
use tracing::warn;

use super::{
    array_mappings, lookup_path, scalar_mappings, LookupOutcome,
    DEFAULT_EXTRACTION_CONFIDENCE,
};
use crate::types::{ArraySetField, Candidate, ScalarField, SourceBundle, SourceDocument, SourceKey};

/// Candidate Extractor
///
/// Stateless; candidates are derived on demand and never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateExtractor;

impl CandidateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all candidates for a scalar field, in mapping-table order
    ///
    /// Candidates from the manual-edits document are user overrides: they
    /// carry `user_override = true` and confidence 1.0 unless the document
    /// states its own confidence.
    pub fn extract(&self, field: ScalarField, bundle: &SourceBundle) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for mapping in scalar_mappings(field) {
            let Some(doc) = bundle.get(mapping.source) else {
                continue;
            };
            match lookup_path(&doc.data, mapping.path) {
                LookupOutcome::Found(value) => {
                    candidates.push(self.candidate_from(value, mapping.source, doc));
                }
                LookupOutcome::Absent => {}
                LookupOutcome::PathMismatch => {
                    warn!(
                        field = %field,
                        source = %mapping.source,
                        path = mapping.path,
                        "source document shape disagrees with mapping table"
                    );
                }
            }
        }

        candidates
    }

    /// Extract per-source value lists for an array-set field
    ///
    /// Returned in mapping-table order; the merger re-orders by effective
    /// priority. A plain string value is treated as a comma-separated list
    /// (embedded descriptors commonly store credits that way).
    pub fn extract_lists(
        &self,
        field: ArraySetField,
        bundle: &SourceBundle,
    ) -> Vec<(SourceKey, Vec<Value>)> {
        let mut lists = Vec::new();

        for mapping in array_mappings(field) {
            let Some(doc) = bundle.get(mapping.source) else {
                continue;
            };
            match lookup_path(&doc.data, mapping.path) {
                LookupOutcome::Found(Value::Array(values)) => {
                    let values: Vec<Value> =
                        values.into_iter().filter(|v| !v.is_null()).collect();
                    if !values.is_empty() {
                        lists.push((mapping.source, values));
                    }
                }
                LookupOutcome::Found(Value::String(s)) => {
                    let values: Vec<Value> = s
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(|v| Value::String(v.to_string()))
                        .collect();
                    if !values.is_empty() {
                        lists.push((mapping.source, values));
                    }
                }
                LookupOutcome::Found(_) => {
                    warn!(
                        field = %field,
                        source = %mapping.source,
                        path = mapping.path,
                        "expected list value for array-set field"
                    );
                }
                LookupOutcome::Absent => {}
                LookupOutcome::PathMismatch => {
                    warn!(
                        field = %field,
                        source = %mapping.source,
                        path = mapping.path,
                        "source document shape disagrees with mapping table"
                    );
                }
            }
        }

        lists
    }

    fn candidate_from(&self, value: Value, source: SourceKey, doc: &SourceDocument) -> Candidate {
        let is_manual = source == SourceKey::Manual;
        let default_confidence = if is_manual {
            1.0
        } else {
            DEFAULT_EXTRACTION_CONFIDENCE
        };
        Candidate {
            value,
            source,
            source_id: doc.source_id.clone(),
            confidence: doc.confidence.unwrap_or(default_confidence).clamp(0.0, 1.0),
            fetched_at: doc.fetched_at,
            url: doc.url.clone(),
            user_override: is_manual,
        }
    }
}
