//! Array Field Merger
//!
//! Merges set-valued fields (creators, characters, genres) across sources
//! in effective-priority order, de-duplicating as it goes. Text values
//! compare case-insensitively; composite values compare structurally.
//!
//! Attribution is field-level only: the merged list names its contributing
//! sources, not per-element provenance.

use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::extractor::CandidateExtractor;
use crate::error::Result;
use crate::types::{ArraySetField, MergedList, ResolutionPolicy, SourceBundle, SourceKey};

/// Array Field Merger
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayFieldMerger;

impl ArrayFieldMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge per-source value lists into one de-duplicated list
    ///
    /// Sources are visited in ascending effective priority; within a
    /// priority tie, input order holds. Disabled/unlisted sources sort
    /// last but still contribute values nobody else supplied.
    /// Returns `None` when nothing survives (field omitted, never empty).
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when the policy is invalid.
    pub fn merge(
        &self,
        field: ArraySetField,
        lists: &[(SourceKey, Vec<Value>)],
        policy: &ResolutionPolicy,
    ) -> Result<Option<MergedList>> {
        policy.validate()?;

        let mut ordered: Vec<&(SourceKey, Vec<Value>)> = lists.iter().collect();
        ordered.sort_by_key(|(source, _)| {
            policy.effective_priority(*source, None).unwrap_or(u32::MAX)
        });

        let mut values = Vec::new();
        let mut sources = Vec::new();
        let mut seen = HashSet::new();

        for (source, list) in ordered {
            let mut contributed = false;
            for value in list {
                if seen.insert(dedup_key(value)) {
                    values.push(value.clone());
                    contributed = true;
                }
            }
            if contributed {
                sources.push(*source);
            }
        }

        if values.is_empty() {
            return Ok(None);
        }

        debug!(
            field = %field,
            value_count = values.len(),
            source_count = sources.len(),
            "array field merged"
        );
        Ok(Some(MergedList { values, sources }))
    }

    /// Extract per-source lists through the mapping table, then merge
    pub fn merge_from_bundle(
        &self,
        field: ArraySetField,
        bundle: &SourceBundle,
        policy: &ResolutionPolicy,
    ) -> Result<Option<MergedList>> {
        let lists = CandidateExtractor::new().extract_lists(field, bundle);
        self.merge(field, &lists, policy)
    }
}

/// De-duplication key: case-insensitive for text, structural otherwise
fn dedup_key(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{}", s.trim().to_lowercase()),
        other => format!("j:{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionStrategy;
    use serde_json::json;

    fn policy() -> ResolutionPolicy {
        ResolutionPolicy {
            strategy: ResolutionStrategy::Priority,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_orders_by_priority_and_dedupes() {
        // embedded (priority 6) listed first, provider-a (priority 2) second;
        // output must start with provider-a's values
        let lists = vec![
            (
                SourceKey::EmbeddedFileInfo,
                vec![json!("Fiona Staples"), json!("brian k. vaughan")],
            ),
            (
                SourceKey::ProviderA,
                vec![json!("Brian K. Vaughan"), json!("Fiona Staples")],
            ),
        ];

        let merged = ArrayFieldMerger::new()
            .merge(ArraySetField::Creators, &lists, &policy())
            .unwrap()
            .unwrap();

        assert_eq!(
            merged.values,
            vec![json!("Brian K. Vaughan"), json!("Fiona Staples")]
        );
        // Embedded contributed nothing new, so it gets no attribution
        assert_eq!(merged.sources, vec![SourceKey::ProviderA]);
    }

    #[test]
    fn test_merge_case_insensitive_text_dedup_keeps_first_casing() {
        let lists = vec![
            (SourceKey::ProviderA, vec![json!("Science Fiction")]),
            (SourceKey::ProviderB, vec![json!("SCIENCE FICTION"), json!("Fantasy")]),
        ];
        let merged = ArrayFieldMerger::new()
            .merge(ArraySetField::Genres, &lists, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(merged.values, vec![json!("Science Fiction"), json!("Fantasy")]);
        assert_eq!(merged.sources, vec![SourceKey::ProviderA, SourceKey::ProviderB]);
    }

    #[test]
    fn test_merge_structural_dedup_for_composite_values() {
        let credit = json!({"name": "Fiona Staples", "role": "artist"});
        let lists = vec![
            (SourceKey::ProviderA, vec![credit.clone()]),
            (
                SourceKey::ProviderB,
                vec![credit.clone(), json!({"name": "Fiona Staples", "role": "cover"})],
            ),
        ];
        let merged = ArrayFieldMerger::new()
            .merge(ArraySetField::Creators, &lists, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(merged.values.len(), 2);
    }

    #[test]
    fn test_merge_empty_input_is_none() {
        let merged = ArrayFieldMerger::new()
            .merge(ArraySetField::Genres, &[], &policy())
            .unwrap();
        assert!(merged.is_none());
    }

    #[test]
    fn test_unlisted_source_sorts_last_but_contributes() {
        let mut p = policy();
        p.sources.retain(|sc| sc.key != SourceKey::ProviderC);

        let lists = vec![
            (SourceKey::ProviderC, vec![json!("Horror")]),
            (SourceKey::ProviderB, vec![json!("Fantasy")]),
        ];
        let merged = ArrayFieldMerger::new()
            .merge(ArraySetField::Genres, &lists, &p)
            .unwrap()
            .unwrap();
        assert_eq!(merged.values, vec![json!("Fantasy"), json!("Horror")]);
    }

    #[test]
    fn test_merge_from_bundle_uses_mapping_tables() {
        use crate::types::SourceDocument;
        use chrono::Utc;

        let mut bundle = SourceBundle::new();
        bundle.attach(
            SourceKey::ProviderA,
            SourceDocument::new(json!({"genres": ["Science Fiction"]}), Utc::now()),
        );
        bundle.attach(
            SourceKey::ProviderB,
            SourceDocument::new(json!({"tags": ["science fiction", "Drama"]}), Utc::now()),
        );

        let merged = ArrayFieldMerger::new()
            .merge_from_bundle(ArraySetField::Genres, &bundle, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(merged.values, vec![json!("Science Fiction"), json!("Drama")]);
    }
}
