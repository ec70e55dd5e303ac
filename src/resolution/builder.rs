//! Canonical Metadata Builder
//!
//! Orchestrates extraction and resolution across the fixed canonical field
//! set and assembles the output record. Fields with no winner are omitted,
//! never set to a null placeholder. User-overridden fields on an existing
//! record survive a rebuild unless explicitly named for recomputation.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{ArrayFieldMerger, CandidateExtractor, FieldResolver};
use crate::error::Result;
use crate::types::{
    ArraySetField, CanonicalRecord, FieldState, MetadataEvent, ResolutionPolicy, ScalarField,
    SourceBundle,
};

/// Canonical Metadata Builder
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalBuilder {
    extractor: CandidateExtractor,
    resolver: FieldResolver,
    merger: ArrayFieldMerger,
}

impl CanonicalBuilder {
    pub fn new() -> Self {
        Self {
            extractor: CandidateExtractor::new(),
            resolver: FieldResolver::new(),
            merger: ArrayFieldMerger::new(),
        }
    }

    /// Build a canonical record from scratch
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when the policy is invalid; a
    /// bundle with no usable data yields an empty record, not an error.
    pub fn build(
        &self,
        item_id: Uuid,
        bundle: &SourceBundle,
        policy: &ResolutionPolicy,
    ) -> Result<CanonicalRecord> {
        policy.validate()?;

        let mut record = CanonicalRecord::new(item_id);

        for field in ScalarField::ALL {
            let candidates = self.extractor.extract(field, bundle);
            if let Some(resolved) = self.resolver.resolve_valid(field, &candidates, policy) {
                record.fields.insert(field, resolved);
            }
        }

        for field in ArraySetField::ALL {
            if let Some(merged) = self.merger.merge_from_bundle(field, bundle, policy)? {
                record.arrays.insert(field, merged);
            }
        }

        record.refresh_derived();
        record.last_canonical_update = Utc::now();

        debug!(
            item_id = %item_id,
            completeness = record.completeness_score,
            user_modified = record.has_user_modifications,
            "canonical record built"
        );
        Ok(record)
    }

    /// Rebuild against fresh source data, preserving user-overridden fields
    ///
    /// A field in `recompute` is re-resolved even when currently pinned;
    /// everything else pinned on `existing` is carried over untouched.
    pub fn rebuild(
        &self,
        existing: &CanonicalRecord,
        bundle: &SourceBundle,
        policy: &ResolutionPolicy,
        recompute: &[ScalarField],
    ) -> Result<CanonicalRecord> {
        let mut record = self.build(existing.item_id, bundle, policy)?;

        for field in ScalarField::ALL {
            if existing.field_state(field) == FieldState::UserOverridden
                && !recompute.contains(&field)
            {
                if let Some(pinned) = existing.fields.get(&field) {
                    record.fields.insert(field, pinned.clone());
                }
            }
        }
        record.refresh_derived();

        Ok(record)
    }

    /// Run the builder for a trigger event, honoring auto-apply flags
    ///
    /// Returns `Ok(None)` when the policy does not auto-apply for this
    /// event; the caller then decides whether to build explicitly.
    pub fn apply_event(
        &self,
        item_id: Uuid,
        existing: Option<&CanonicalRecord>,
        bundle: &SourceBundle,
        policy: &ResolutionPolicy,
        event: MetadataEvent,
    ) -> Result<Option<CanonicalRecord>> {
        policy.validate()?;
        if !policy.should_auto_apply(event) {
            debug!(item_id = %item_id, ?event, "auto-apply disabled for event");
            return Ok(None);
        }
        let record = match existing {
            Some(existing) => self.rebuild(existing, bundle, policy, &[])?,
            None => self.build(item_id, bundle, policy)?,
        };
        Ok(Some(record))
    }
}
