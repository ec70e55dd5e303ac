//! Resolution Engine
//!
//! Pure, synchronous pipeline from raw per-source documents to the
//! canonical metadata record:
//!
//! - [`extractor`] - maps source documents to typed field candidates
//! - [`resolver`] - picks one winner per field under the policy
//! - [`merger`] - merges array-set fields across sources
//! - [`builder`] - orchestrates the above into a [`crate::CanonicalRecord`]
//! - [`analyzer`] - full conflict visibility for review UIs
//! - [`overrides`] - permanent user pinning of field values
//!
//! No internal concurrency and no shared mutable state: safe to run for
//! different catalog items without coordination. The caller must serialize
//! per-item record writes (persistence collaborator's job).

pub mod analyzer;
pub mod builder;
pub mod extractor;
pub mod merger;
pub mod overrides;
pub mod resolver;

pub use analyzer::{ConflictAnalyzer, FieldConflict};
pub use builder::CanonicalBuilder;
pub use extractor::CandidateExtractor;
pub use merger::ArrayFieldMerger;
pub use overrides::OverrideLayer;
pub use resolver::FieldResolver;

use serde_json::Value;

use crate::types::{ArraySetField, ScalarField, SourceKey};

/// Confidence assigned to freshly extracted candidates when the source
/// document does not state its own
pub const DEFAULT_EXTRACTION_CONFIDENCE: f32 = 0.9;

// ============================================================================
// Field mapping tables
// ============================================================================

/// One (source, nested path) entry in a field mapping table
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub source: SourceKey,
    /// Dot-separated path into the source document
    pub path: &'static str,
}

const fn m(source: SourceKey, path: &'static str) -> FieldMapping {
    FieldMapping { source, path }
}

// Table order is candidate input order, which the resolver's stable
// tie-breaks depend on: embedded descriptor first, then providers, then
// manual edits.
use crate::types::SourceKey::*;

const TITLE_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "title"),
    m(ProviderA, "name"),
    m(ProviderB, "title"),
    m(ProviderC, "issue.title"),
    m(Manual, "title"),
];
const SERIES_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "series"),
    m(ProviderA, "volume.name"),
    m(ProviderB, "series.name"),
    m(ProviderC, "issue.series"),
    m(Manual, "series"),
];
const ISSUE_NUMBER_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "number"),
    m(ProviderA, "issue_number"),
    m(ProviderB, "number"),
    m(ProviderC, "issue.number"),
    m(Manual, "issue_number"),
];
const PUBLISHER_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "publisher"),
    m(ProviderA, "publisher.name"),
    m(ProviderB, "series.publisher"),
    m(ProviderC, "issue.publisher"),
    m(Manual, "publisher"),
];
const DESCRIPTION_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "summary"),
    m(ProviderA, "description"),
    m(ProviderB, "summary"),
    m(ProviderC, "issue.synopsis"),
    m(Manual, "description"),
];
const COVER_DATE_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "cover_date"),
    m(ProviderA, "cover_date"),
    m(ProviderB, "release_date"),
    m(ProviderC, "issue.on_sale_date"),
    m(Manual, "cover_date"),
];
const PAGE_COUNT_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "page_count"),
    m(ProviderA, "page_count"),
    m(ProviderB, "pages"),
    m(ProviderC, "issue.page_count"),
    m(Manual, "page_count"),
];
const CREATORS_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "writers"),
    m(ProviderA, "person_credits"),
    m(ProviderB, "credits"),
    m(ProviderC, "issue.creators"),
    m(Manual, "creators"),
];
const CHARACTERS_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "characters"),
    m(ProviderA, "character_credits"),
    m(ProviderB, "characters"),
    m(ProviderC, "issue.characters"),
    m(Manual, "characters"),
];
const GENRES_MAPPINGS: &[FieldMapping] = &[
    m(EmbeddedFileInfo, "genres"),
    m(ProviderA, "genres"),
    m(ProviderB, "tags"),
    m(ProviderC, "issue.genres"),
    m(Manual, "genres"),
];

/// Static mapping table for a scalar field
pub fn scalar_mappings(field: ScalarField) -> &'static [FieldMapping] {
    match field {
        ScalarField::Title => TITLE_MAPPINGS,
        ScalarField::Series => SERIES_MAPPINGS,
        ScalarField::IssueNumber => ISSUE_NUMBER_MAPPINGS,
        ScalarField::Publisher => PUBLISHER_MAPPINGS,
        ScalarField::Description => DESCRIPTION_MAPPINGS,
        ScalarField::CoverDate => COVER_DATE_MAPPINGS,
        ScalarField::PageCount => PAGE_COUNT_MAPPINGS,
    }
}

/// Static mapping table for an array-set field
pub fn array_mappings(field: ArraySetField) -> &'static [FieldMapping] {
    match field {
        ArraySetField::Creators => CREATORS_MAPPINGS,
        ArraySetField::Characters => CHARACTERS_MAPPINGS,
        ArraySetField::Genres => GENRES_MAPPINGS,
    }
}

// ============================================================================
// Nested path lookup
// ============================================================================

/// Outcome of a nested path lookup
///
/// `Absent` (missing key or explicit null) is an expected no-data condition.
/// `PathMismatch` means the document shape disagrees with the mapping table
/// (traversal hit a non-object); it is logged so schema drift is visible,
/// but still yields no candidate rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(Value),
    Absent,
    PathMismatch,
}

/// Look up a dot-separated path in a source document
pub fn lookup_path(doc: &Value, path: &str) -> LookupOutcome {
    let mut current = doc;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return LookupOutcome::Absent,
            },
            // Path expects to descend but the document has a leaf here
            _ => return LookupOutcome::PathMismatch,
        }
    }
    if current.is_null() {
        LookupOutcome::Absent
    } else {
        LookupOutcome::Found(current.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
