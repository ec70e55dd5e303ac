//! Conflict Analyzer
//!
//! Read path for audit/curation: re-runs extraction and resolution per
//! field but returns *all* raw candidates alongside the winner and an
//! explanation. An entry is emitted only when more than one raw candidate
//! exists, regardless of how many survive the confidence filter.

use serde::Serialize;
use tracing::debug;

use super::{CandidateExtractor, FieldResolver};
use crate::error::Result;
use crate::types::{Candidate, ResolutionPolicy, ResolvedField, ScalarField, SourceBundle};

/// Conflict report for one field
#[derive(Debug, Clone, Serialize)]
pub struct FieldConflict {
    /// Field under analysis
    pub field: ScalarField,
    /// All raw candidates, pre-filter, in input order
    pub candidates: Vec<Candidate>,
    /// Winner under the supplied policy (None when nothing survives)
    pub resolved: Option<ResolvedField>,
    /// Human-readable explanation of the outcome
    pub resolution_reason: String,
    /// Lowest pairwise similarity among string candidates (0.0-1.0);
    /// None when fewer than two candidates are strings. Lets review UIs
    /// rank how badly sources disagree.
    pub min_similarity: Option<f64>,
}

/// Conflict Analyzer
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictAnalyzer {
    extractor: CandidateExtractor,
    resolver: FieldResolver,
}

impl ConflictAnalyzer {
    pub fn new() -> Self {
        Self {
            extractor: CandidateExtractor::new(),
            resolver: FieldResolver::new(),
        }
    }

    /// Analyze the requested fields for conflicts
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when the policy is invalid.
    pub fn analyze(
        &self,
        fields: &[ScalarField],
        bundle: &SourceBundle,
        policy: &ResolutionPolicy,
    ) -> Result<Vec<FieldConflict>> {
        policy.validate()?;

        let mut conflicts = Vec::new();
        for &field in fields {
            let candidates = self.extractor.extract(field, bundle);
            if candidates.len() < 2 {
                continue;
            }

            let resolved = self.resolver.resolve_valid(field, &candidates, policy);
            let resolution_reason =
                self.resolver
                    .resolution_reason(field, resolved.as_ref(), policy);
            let min_similarity = min_pairwise_similarity(&candidates);

            debug!(
                field = %field,
                candidate_count = candidates.len(),
                resolved = resolved.is_some(),
                "conflict entry"
            );
            conflicts.push(FieldConflict {
                field,
                candidates,
                resolved,
                resolution_reason,
                min_similarity,
            });
        }
        Ok(conflicts)
    }
}

/// Lowest normalized Levenshtein similarity among string candidate values
fn min_pairwise_similarity(candidates: &[Candidate]) -> Option<f64> {
    let texts: Vec<&str> = candidates
        .iter()
        .filter_map(|c| c.value.as_str())
        .collect();
    if texts.len() < 2 {
        return None;
    }

    let mut min = f64::MAX;
    for (i, a) in texts.iter().enumerate() {
        for b in &texts[i + 1..] {
            let similarity = strsim::normalized_levenshtein(a, b);
            if similarity < min {
                min = similarity;
            }
        }
    }
    Some(min)
}
