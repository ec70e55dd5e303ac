//! Override Layer
//!
//! Permanent user pinning of field values. Setting an override installs a
//! manual, full-confidence value directly into the record, bypassing the
//! resolver; only an explicit clear releases it, never re-resolution.
//!
//! Per-field lifecycle: Unresolved → AutoResolved on first win;
//! AutoResolved → AutoResolved on re-resolution; any state →
//! UserOverridden on set; UserOverridden → AutoResolved (or Unresolved)
//! only on clear. Fields can cycle indefinitely.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::FieldResolver;
use crate::error::Result;
use crate::types::{
    CanonicalRecord, Candidate, FieldState, ResolutionPolicy, ResolvedField, ScalarField,
    SourceKey,
};

/// Override Layer
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideLayer {
    resolver: FieldResolver,
}

impl OverrideLayer {
    pub fn new() -> Self {
        Self {
            resolver: FieldResolver::new(),
        }
    }

    /// Pin a field to a user-supplied value
    ///
    /// Installs `source = manual, confidence = 1.0, user_override = true`
    /// directly into the record and returns the installed field.
    pub fn set(
        &self,
        record: &mut CanonicalRecord,
        field: ScalarField,
        value: Value,
    ) -> ResolvedField {
        let pinned = ResolvedField {
            value,
            source: SourceKey::Manual,
            source_id: None,
            confidence: 1.0,
            fetched_at: Utc::now(),
            url: None,
            user_override: true,
        };
        record.fields.insert(field, pinned.clone());
        record.refresh_derived();
        record.last_canonical_update = pinned.fetched_at;

        debug!(item_id = %record.item_id, field = %field, "field pinned by user");
        pinned
    }

    /// Clear a pinned field and re-resolve from the remaining candidates
    ///
    /// A field that is not currently pinned is left untouched (its current
    /// value, if any, is returned). `remaining` should be the field's
    /// non-override candidates; any override candidates in it are ignored
    /// so a stale manual document cannot re-pin the field.
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when the policy is invalid.
    pub fn clear(
        &self,
        record: &mut CanonicalRecord,
        field: ScalarField,
        remaining: &[Candidate],
        policy: &ResolutionPolicy,
    ) -> Result<Option<ResolvedField>> {
        policy.validate()?;

        if record.field_state(field) != FieldState::UserOverridden {
            return Ok(record.fields.get(&field).cloned());
        }

        record.fields.remove(&field);
        let remaining: Vec<Candidate> = remaining
            .iter()
            .filter(|c| !c.user_override)
            .cloned()
            .collect();

        let resolved = self.resolver.resolve_valid(field, &remaining, policy);
        if let Some(rf) = &resolved {
            record.fields.insert(field, rf.clone());
        }
        record.refresh_derived();
        record.last_canonical_update = Utc::now();

        debug!(
            item_id = %record.item_id,
            field = %field,
            re_resolved = resolved.is_some(),
            "override cleared"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolutionStrategy;
    use serde_json::json;
    use uuid::Uuid;

    fn policy() -> ResolutionPolicy {
        ResolutionPolicy {
            strategy: ResolutionStrategy::Priority,
            ..Default::default()
        }
    }

    fn provider_candidate(value: &str) -> Candidate {
        Candidate::new(json!(value), SourceKey::ProviderA, 0.9, Utc::now())
    }

    #[test]
    fn test_set_installs_manual_full_confidence_override() {
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        let pinned =
            OverrideLayer::new().set(&mut record, ScalarField::Title, json!("Custom Title"));

        assert_eq!(pinned.source, SourceKey::Manual);
        assert_eq!(pinned.confidence, 1.0);
        assert!(pinned.user_override);
        assert_eq!(
            record.field_state(ScalarField::Title),
            FieldState::UserOverridden
        );
        assert!(record.has_user_modifications);
    }

    #[test]
    fn test_clear_re_resolves_from_remaining_candidates() {
        let layer = OverrideLayer::new();
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        layer.set(&mut record, ScalarField::Title, json!("Custom Title"));

        let remaining = vec![provider_candidate("Provider Title")];
        let resolved = layer
            .clear(&mut record, ScalarField::Title, &remaining, &policy())
            .unwrap()
            .unwrap();

        assert_eq!(resolved.value, json!("Provider Title"));
        assert_eq!(
            record.field_state(ScalarField::Title),
            FieldState::AutoResolved
        );
        assert!(!record.has_user_modifications);
    }

    #[test]
    fn test_clear_with_no_remaining_candidates_unresolves() {
        let layer = OverrideLayer::new();
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        layer.set(&mut record, ScalarField::Title, json!("Custom Title"));

        let resolved = layer
            .clear(&mut record, ScalarField::Title, &[], &policy())
            .unwrap();
        assert!(resolved.is_none());
        assert_eq!(
            record.field_state(ScalarField::Title),
            FieldState::Unresolved
        );
        assert!(!record.fields.contains_key(&ScalarField::Title));
    }

    #[test]
    fn test_clear_ignores_override_candidates_in_remaining() {
        let layer = OverrideLayer::new();
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        layer.set(&mut record, ScalarField::Title, json!("Custom Title"));

        let mut stale_override = provider_candidate("Stale Pin");
        stale_override.user_override = true;
        let remaining = vec![stale_override, provider_candidate("Provider Title")];

        let resolved = layer
            .clear(&mut record, ScalarField::Title, &remaining, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, json!("Provider Title"));
        assert!(!resolved.user_override);
    }

    #[test]
    fn test_clear_on_unpinned_field_is_a_no_op() {
        let layer = OverrideLayer::new();
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        record.fields.insert(
            ScalarField::Title,
            ResolvedField::from(provider_candidate("Auto Title")),
        );
        record.refresh_derived();

        let result = layer
            .clear(
                &mut record,
                ScalarField::Title,
                &[provider_candidate("Other")],
                &policy(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(result.value, json!("Auto Title"));
        assert_eq!(
            record.fields.get(&ScalarField::Title).unwrap().value,
            json!("Auto Title")
        );
    }

    #[test]
    fn test_field_cycles_through_states_indefinitely() {
        let layer = OverrideLayer::new();
        let mut record = CanonicalRecord::new(Uuid::new_v4());
        let remaining = vec![provider_candidate("Provider Title")];

        for _ in 0..3 {
            layer.set(&mut record, ScalarField::Title, json!("pinned"));
            assert_eq!(
                record.field_state(ScalarField::Title),
                FieldState::UserOverridden
            );
            layer
                .clear(&mut record, ScalarField::Title, &remaining, &policy())
                .unwrap();
            assert_eq!(
                record.field_state(ScalarField::Title),
                FieldState::AutoResolved
            );
        }
    }
}
