//! Field Resolver
//!
//! Picks exactly one winner (or none) from a field's candidates under the
//! supplied policy. Resolution order:
//!
//! 1. Drop candidates with a null value or confidence below the policy
//!    threshold; no survivors means no winner.
//! 2. A user override among the survivors always wins. With several, the
//!    most recently fetched one wins; ties keep input order.
//! 3. A policy-forced source for the field wins when a matching candidate
//!    survives.
//! 4. Otherwise the configured strategy decides.
//!
//! Determinism is a hard contract: identical inputs always produce
//! identical output. The hybrid recency bonus is measured against the
//! newest `fetched_at` in the candidate set, never the wall clock.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;

use crate::error::Result;
use crate::types::{
    Candidate, ResolutionPolicy, ResolutionStrategy, ResolvedField, ScalarField,
};

/// Hybrid strategy: weight on normalized priority
const HYBRID_PRIORITY_WEIGHT: f32 = 0.6;
/// Hybrid strategy: weight on confidence
const HYBRID_CONFIDENCE_WEIGHT: f32 = 0.4;
/// Hybrid strategy: ceiling of the recency bonus
const HYBRID_RECENCY_BONUS: f32 = 0.1;
/// One year in seconds, the horizon of the recency bonus
const ONE_YEAR_SECS: f32 = 365.25 * 86_400.0;

/// Field Resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldResolver;

impl FieldResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one field from its candidates
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when the policy is invalid; an
    /// empty candidate set is `Ok(None)`, not an error.
    pub fn resolve(
        &self,
        field: ScalarField,
        candidates: &[Candidate],
        policy: &ResolutionPolicy,
    ) -> Result<Option<ResolvedField>> {
        policy.validate()?;
        Ok(self.resolve_valid(field, candidates, policy))
    }

    /// Candidates that survive the value/confidence filter
    pub fn valid_candidates<'a>(
        &self,
        candidates: &'a [Candidate],
        policy: &ResolutionPolicy,
    ) -> Vec<&'a Candidate> {
        candidates
            .iter()
            .filter(|c| !c.value.is_null() && c.confidence >= policy.min_confidence_threshold)
            .collect()
    }

    /// Resolution after policy validation (shared with builder/analyzer)
    pub(crate) fn resolve_valid(
        &self,
        field: ScalarField,
        candidates: &[Candidate],
        policy: &ResolutionPolicy,
    ) -> Option<ResolvedField> {
        let valid = self.valid_candidates(candidates, policy);
        if valid.is_empty() {
            return None;
        }

        // User overrides beat everything; latest-set override wins
        let mut override_winner: Option<&Candidate> = None;
        for &c in valid.iter().filter(|c| c.user_override) {
            match override_winner {
                Some(best) if c.fetched_at <= best.fetched_at => {}
                _ => override_winner = Some(c),
            }
        }
        if let Some(winner) = override_winner {
            debug!(field = %field, source = %winner.source, "user override wins");
            return Some(ResolvedField::from(winner.clone()));
        }

        // Forced source, when a matching candidate survives the filter
        if let Some(forced) = policy.forced_sources.get(&field) {
            if let Some(winner) = valid.iter().find(|c| c.source == *forced) {
                debug!(field = %field, source = %winner.source, "forced source wins");
                return Some(ResolvedField::from((*winner).clone()));
            }
        }

        let winner = match policy.strategy {
            ResolutionStrategy::Priority | ResolutionStrategy::Manual => {
                self.pick_by_priority(field, &valid, policy)
            }
            ResolutionStrategy::Confidence => self.pick_by_confidence(&valid, policy),
            ResolutionStrategy::Recency => self.pick_by_recency(&valid),
            ResolutionStrategy::Hybrid => self.pick_by_hybrid(field, &valid, policy),
        };

        debug!(
            field = %field,
            source = %winner.source,
            confidence = winner.confidence,
            strategy = %policy.strategy,
            "field resolved"
        );
        Some(ResolvedField::from(winner.clone()))
    }

    /// Lowest effective priority wins; ties keep input order
    fn pick_by_priority<'a>(
        &self,
        field: ScalarField,
        valid: &[&'a Candidate],
        policy: &ResolutionPolicy,
    ) -> &'a Candidate {
        let mut best = valid[0];
        let mut best_priority = self.priority_rank(field, best, policy);
        for &c in &valid[1..] {
            let rank = self.priority_rank(field, c, policy);
            if rank < best_priority {
                best = c;
                best_priority = rank;
            }
        }
        best
    }

    /// Highest confidence wins; equal confidence falls back to recency
    /// only when the policy prefers recent values, else input order
    fn pick_by_confidence<'a>(
        &self,
        valid: &[&'a Candidate],
        policy: &ResolutionPolicy,
    ) -> &'a Candidate {
        let mut best = valid[0];
        for &c in &valid[1..] {
            match c.confidence.partial_cmp(&best.confidence).unwrap_or(Ordering::Equal) {
                Ordering::Greater => best = c,
                Ordering::Equal if policy.prefer_recent && c.fetched_at > best.fetched_at => {
                    best = c
                }
                _ => {}
            }
        }
        best
    }

    /// Most recently fetched wins; ties keep input order
    fn pick_by_recency<'a>(&self, valid: &[&'a Candidate]) -> &'a Candidate {
        let mut best = valid[0];
        for &c in &valid[1..] {
            if c.fetched_at > best.fetched_at {
                best = c;
            }
        }
        best
    }

    /// Weighted blend of priority, confidence, and recency; ties keep
    /// input order
    fn pick_by_hybrid<'a>(
        &self,
        field: ScalarField,
        valid: &[&'a Candidate],
        policy: &ResolutionPolicy,
    ) -> &'a Candidate {
        // valid is never empty here; the newest candidate anchors the
        // recency bonus so the wall clock stays out of scoring
        let newest = valid
            .iter()
            .map(|c| c.fetched_at)
            .max()
            .unwrap_or(valid[0].fetched_at);

        let mut best = valid[0];
        let mut best_score = self.hybrid_score(field, best, policy, newest);
        for &c in &valid[1..] {
            let score = self.hybrid_score(field, c, policy, newest);
            if score > best_score {
                best = c;
                best_score = score;
            }
        }
        best
    }

    /// Effective priority as a sortable rank (disabled/unlisted = +∞)
    fn priority_rank(
        &self,
        field: ScalarField,
        candidate: &Candidate,
        policy: &ResolutionPolicy,
    ) -> u32 {
        policy
            .effective_priority(candidate.source, Some(field))
            .unwrap_or(u32::MAX)
    }

    /// Hybrid score: 0.6 * normalized priority + 0.4 * confidence
    /// + recency bonus (only when the policy prefers recent values)
    fn hybrid_score(
        &self,
        field: ScalarField,
        candidate: &Candidate,
        policy: &ResolutionPolicy,
        newest: DateTime<Utc>,
    ) -> f32 {
        let max_priority = policy.max_configured_priority() as f32;
        let normalized_priority = match policy.effective_priority(candidate.source, Some(field)) {
            Some(p) => (1.0 - (p - 1) as f32 / max_priority).clamp(0.0, 1.0),
            None => 0.0,
        };

        let recency_bonus = if policy.prefer_recent {
            let age_secs = (newest - candidate.fetched_at).num_seconds().max(0) as f32;
            (1.0 - age_secs / ONE_YEAR_SECS).max(0.0) * HYBRID_RECENCY_BONUS
        } else {
            0.0
        };

        HYBRID_PRIORITY_WEIGHT * normalized_priority
            + HYBRID_CONFIDENCE_WEIGHT * candidate.confidence
            + recency_bonus
    }

    /// Human-readable explanation of a resolution outcome, for review UIs
    pub fn resolution_reason(
        &self,
        field: ScalarField,
        resolved: Option<&ResolvedField>,
        policy: &ResolutionPolicy,
    ) -> String {
        let Some(winner) = resolved else {
            return "No candidate met the confidence threshold".to_string();
        };
        if winner.user_override {
            return "User override".to_string();
        }
        if policy.forced_sources.get(&field) == Some(&winner.source) {
            return format!(
                "{} selected (forced source, confidence {:.2})",
                winner.source, winner.confidence
            );
        }
        let priority = policy
            .effective_priority(winner.source, Some(field))
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unranked".to_string());
        format!(
            "{} selected (priority {}, confidence {:.2}, strategy {})",
            winner.source, priority, winner.confidence, policy.strategy
        )
    }
}
