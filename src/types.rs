//! Core Types for the Canonical Metadata Resolution Engine
//!
//! Defines the data model shared by all resolution components:
//! - **Sources:** origin tags with configured priorities
//! - **Candidates:** confidence-scored, provenance-carrying field values
//! - **Policy:** the per-call resolution policy (never ambient/global)
//! - **Record:** the assembled canonical metadata record
//!
//! # Determinism
//! Resolution is a pure function of (candidates, policy). Nothing in this
//! module reads the clock; `fetched_at` timestamps are supplied by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{ResolutionError, Result};

// ============================================================================
// Sources
// ============================================================================

/// Fixed set of metadata origins for a catalog item
///
/// Priorities are not baked in here; they come from the
/// [`ResolutionPolicy`] supplied on every call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKey {
    /// Descriptor embedded in the archive itself (ComicInfo-style)
    EmbeddedFileInfo,
    /// External metadata provider A
    ProviderA,
    /// External metadata provider B
    ProviderB,
    /// External metadata provider C
    ProviderC,
    /// Manual user edits
    Manual,
}

impl SourceKey {
    /// All source keys, in bundle attachment order
    pub const ALL: [SourceKey; 5] = [
        SourceKey::EmbeddedFileInfo,
        SourceKey::ProviderA,
        SourceKey::ProviderB,
        SourceKey::ProviderC,
        SourceKey::Manual,
    ];

    /// Wire name (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKey::EmbeddedFileInfo => "embedded-file-info",
            SourceKey::ProviderA => "provider-a",
            SourceKey::ProviderB => "provider-b",
            SourceKey::ProviderC => "provider-c",
            SourceKey::Manual => "manual",
        }
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-source configuration within a resolution policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Which source this configures
    pub key: SourceKey,
    /// Priority rank (strictly positive, lower = stronger precedence)
    pub priority: u32,
    /// Disabled sources rank last (+∞) in resolution
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-field priority overrides (canonical field name → priority)
    #[serde(default)]
    pub field_priorities: BTreeMap<ScalarField, u32>,
}

fn default_true() -> bool {
    true
}

impl SourceConfig {
    pub fn new(key: SourceKey, priority: u32) -> Self {
        Self {
            key,
            priority,
            enabled: true,
            field_priorities: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Canonical fields
// ============================================================================

/// Scalar canonical fields (closed set)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    Title,
    Series,
    IssueNumber,
    Publisher,
    Description,
    CoverDate,
    PageCount,
}

impl ScalarField {
    /// All scalar fields, in record order
    pub const ALL: [ScalarField; 7] = [
        ScalarField::Title,
        ScalarField::Series,
        ScalarField::IssueNumber,
        ScalarField::Publisher,
        ScalarField::Description,
        ScalarField::CoverDate,
        ScalarField::PageCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarField::Title => "title",
            ScalarField::Series => "series",
            ScalarField::IssueNumber => "issue_number",
            ScalarField::Publisher => "publisher",
            ScalarField::Description => "description",
            ScalarField::CoverDate => "cover_date",
            ScalarField::PageCount => "page_count",
        }
    }
}

impl std::fmt::Display for ScalarField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Array-valued canonical fields (merged across sources, not resolved)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArraySetField {
    Creators,
    Characters,
    Genres,
}

impl ArraySetField {
    /// All array-set fields, in record order
    pub const ALL: [ArraySetField; 3] = [
        ArraySetField::Creators,
        ArraySetField::Characters,
        ArraySetField::Genres,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArraySetField::Creators => "creators",
            ArraySetField::Characters => "characters",
            ArraySetField::Genres => "genres",
        }
    }
}

impl std::fmt::Display for ArraySetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Total expected fields for the completeness score (scalar + array)
pub const EXPECTED_FIELD_COUNT: usize = ScalarField::ALL.len() + ArraySetField::ALL.len();

// ============================================================================
// Source bundle
// ============================================================================

/// One raw per-source document with attachment provenance
///
/// `data` is the arbitrary structured document as delivered by the fetch
/// collaborator; field values are reached through the static mapping tables
/// in [`crate::resolution`]. An explicit `confidence` on the document
/// overrides the default extraction confidence for candidates derived
/// from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Raw structured document
    pub data: Value,
    /// When this document was fetched/attached
    pub fetched_at: DateTime<Utc>,
    /// Source-side identifier for the item (e.g. provider issue id)
    #[serde(default)]
    pub source_id: Option<String>,
    /// Source-side URL for the item
    #[serde(default)]
    pub url: Option<String>,
    /// Document-stated confidence (0.0-1.0), if the source provides one
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl SourceDocument {
    pub fn new(data: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            data,
            fetched_at,
            source_id: None,
            url: None,
            confidence: None,
        }
    }
}

/// Per-item bundle of raw source documents
///
/// One optional document per source key. Documents are attached at import
/// time or on later metadata update; a missing document simply produces no
/// candidates for that source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceBundle {
    #[serde(default)]
    pub embedded_file_info: Option<SourceDocument>,
    #[serde(default)]
    pub provider_a: Option<SourceDocument>,
    #[serde(default)]
    pub provider_b: Option<SourceDocument>,
    #[serde(default)]
    pub provider_c: Option<SourceDocument>,
    #[serde(default)]
    pub manual: Option<SourceDocument>,
}

impl SourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document for a source key, if attached
    pub fn get(&self, key: SourceKey) -> Option<&SourceDocument> {
        match key {
            SourceKey::EmbeddedFileInfo => self.embedded_file_info.as_ref(),
            SourceKey::ProviderA => self.provider_a.as_ref(),
            SourceKey::ProviderB => self.provider_b.as_ref(),
            SourceKey::ProviderC => self.provider_c.as_ref(),
            SourceKey::Manual => self.manual.as_ref(),
        }
    }

    /// Attach (or replace) the document for a source key
    pub fn attach(&mut self, key: SourceKey, doc: SourceDocument) {
        let slot = match key {
            SourceKey::EmbeddedFileInfo => &mut self.embedded_file_info,
            SourceKey::ProviderA => &mut self.provider_a,
            SourceKey::ProviderB => &mut self.provider_b,
            SourceKey::ProviderC => &mut self.provider_c,
            SourceKey::Manual => &mut self.manual,
        };
        *slot = Some(doc);
    }
}

// ============================================================================
// Candidates and resolved fields
// ============================================================================

/// One proposed value for one field from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Proposed value
    pub value: Value,
    /// Source that provided this value
    pub source: SourceKey,
    /// Source-side identifier, if any
    #[serde(default)]
    pub source_id: Option<String>,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// When the backing document was fetched
    pub fetched_at: DateTime<Utc>,
    /// Source-side URL, if any
    #[serde(default)]
    pub url: Option<String>,
    /// True when this value was pinned by a user
    #[serde(default)]
    pub user_override: bool,
}

impl Candidate {
    /// Create a candidate with clamped confidence (0.0-1.0)
    pub fn new(
        value: Value,
        source: SourceKey,
        confidence: f32,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            value,
            source,
            source_id: None,
            confidence: confidence.clamp(0.0, 1.0),
            fetched_at,
            url: None,
            user_override: false,
        }
    }
}

/// A candidate promoted to canonical status
///
/// Same shape as [`Candidate`]; absence from the record means "no canonical
/// value yet", never a null placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub value: Value,
    pub source: SourceKey,
    #[serde(default)]
    pub source_id: Option<String>,
    pub confidence: f32,
    pub fetched_at: DateTime<Utc>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user_override: bool,
}

impl From<Candidate> for ResolvedField {
    fn from(c: Candidate) -> Self {
        Self {
            value: c.value,
            source: c.source,
            source_id: c.source_id,
            confidence: c.confidence,
            fetched_at: c.fetched_at,
            url: c.url,
            user_override: c.user_override,
        }
    }
}

/// Merged value list for an array-set field
///
/// Attribution is field-level: `sources` lists contributing sources in
/// priority order. Per-element provenance is deliberately not tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedList {
    /// De-duplicated values, priority order
    pub values: Vec<Value>,
    /// Sources that contributed at least one value
    pub sources: Vec<SourceKey>,
}

// ============================================================================
// Canonical record
// ============================================================================

/// Per-field resolution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    /// No canonical value yet
    Unresolved,
    /// Value chosen by automatic resolution; may change on re-resolution
    AutoResolved,
    /// Value pinned by a user; only an explicit clear releases it
    UserOverridden,
}

/// Canonical metadata record for one catalog item
///
/// Persisted by the storage collaborator; this engine only assembles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Catalog item this record describes
    pub item_id: Uuid,
    /// Resolved scalar fields; absent key = no canonical value
    pub fields: BTreeMap<ScalarField, ResolvedField>,
    /// Merged array-set fields; absent key = no values from any source
    pub arrays: BTreeMap<ArraySetField, MergedList>,
    /// Defined fields / total expected fields (0.0-1.0)
    pub completeness_score: f32,
    /// Last time this record was (re)built or edited
    pub last_canonical_update: DateTime<Utc>,
    /// True when any field carries a user override
    pub has_user_modifications: bool,
}

impl CanonicalRecord {
    /// Empty record for an item (all fields Unresolved)
    pub fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            fields: BTreeMap::new(),
            arrays: BTreeMap::new(),
            completeness_score: 0.0,
            last_canonical_update: Utc::now(),
            has_user_modifications: false,
        }
    }

    /// Resolution state of a scalar field, derived from the record
    pub fn field_state(&self, field: ScalarField) -> FieldState {
        match self.fields.get(&field) {
            None => FieldState::Unresolved,
            Some(rf) if rf.user_override => FieldState::UserOverridden,
            Some(_) => FieldState::AutoResolved,
        }
    }

    /// Recompute `completeness_score` and `has_user_modifications`
    /// from the current field maps
    pub fn refresh_derived(&mut self) {
        let defined = self.fields.len() + self.arrays.len();
        self.completeness_score = defined as f32 / EXPECTED_FIELD_COUNT as f32;
        self.has_user_modifications = self.fields.values().any(|rf| rf.user_override);
    }
}

// ============================================================================
// Resolution policy
// ============================================================================

/// Strategy used to pick a winner among conflicting candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Lowest effective priority wins
    Priority,
    /// Highest confidence wins
    Confidence,
    /// Most recently fetched wins
    Recency,
    /// Like `Priority` (user overrides are handled before any strategy)
    Manual,
    /// Weighted blend of priority, confidence, and recency
    Hybrid,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStrategy::Priority => "priority",
            ResolutionStrategy::Confidence => "confidence",
            ResolutionStrategy::Recency => "recency",
            ResolutionStrategy::Manual => "manual",
            ResolutionStrategy::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Auto-apply flags: when the builder runs without an explicit request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AutoApplyFlags {
    /// Master switch; false disables all auto-apply
    pub enabled: bool,
    /// Rebuild when an item is first imported
    pub on_import: bool,
    /// Rebuild when new sourced metadata is attached later
    pub on_update: bool,
}

impl Default for AutoApplyFlags {
    fn default() -> Self {
        // on_update stays off unless explicitly enabled
        Self {
            enabled: true,
            on_import: true,
            on_update: false,
        }
    }
}

/// Trigger events raised by the surrounding import pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataEvent {
    /// Item was just imported
    ItemImported,
    /// New sourced metadata was attached to an existing item
    SourcedMetadataAttached,
}

/// Resolution policy, supplied explicitly on every call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    /// Ordered source configurations
    pub sources: Vec<SourceConfig>,
    /// Winner-selection strategy
    pub strategy: ResolutionStrategy,
    /// Candidates below this confidence never win (0.0-1.0)
    pub min_confidence_threshold: f32,
    /// Break confidence ties by recency; feeds the hybrid recency bonus
    pub prefer_recent: bool,
    /// Per-field forced source (skips strategy when a match exists)
    pub forced_sources: BTreeMap<ScalarField, SourceKey>,
    /// Auto-apply behavior for trigger events
    pub auto_apply: AutoApplyFlags,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceConfig::new(SourceKey::Manual, 1),
                SourceConfig::new(SourceKey::ProviderA, 2),
                SourceConfig::new(SourceKey::ProviderB, 3),
                SourceConfig::new(SourceKey::ProviderC, 4),
                SourceConfig::new(SourceKey::EmbeddedFileInfo, 6),
            ],
            strategy: ResolutionStrategy::Hybrid,
            min_confidence_threshold: 0.0,
            prefer_recent: true,
            forced_sources: BTreeMap::new(),
            auto_apply: AutoApplyFlags::default(),
        }
    }
}

impl ResolutionPolicy {
    /// Validate policy invariants
    ///
    /// # Errors
    /// Returns `ResolutionError::Policy` when a priority is zero or the
    /// confidence threshold is outside 0.0-1.0.
    pub fn validate(&self) -> Result<()> {
        for sc in &self.sources {
            if sc.priority == 0 {
                return Err(ResolutionError::Policy(format!(
                    "source {} has priority 0 (must be >= 1)",
                    sc.key
                )));
            }
            if let Some((field, _)) = sc.field_priorities.iter().find(|(_, p)| **p == 0) {
                return Err(ResolutionError::Policy(format!(
                    "source {} has priority 0 for field {} (must be >= 1)",
                    sc.key, field
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence_threshold) {
            return Err(ResolutionError::Policy(format!(
                "min_confidence_threshold {} outside 0.0-1.0",
                self.min_confidence_threshold
            )));
        }
        Ok(())
    }

    /// Configuration entry for a source, if listed
    pub fn source_config(&self, key: SourceKey) -> Option<&SourceConfig> {
        self.sources.iter().find(|sc| sc.key == key)
    }

    /// Effective priority of a source for a field
    ///
    /// Field-specific override if present, else the source priority.
    /// `None` for disabled or unlisted sources (treated as +∞ by callers).
    pub fn effective_priority(
        &self,
        key: SourceKey,
        field: Option<ScalarField>,
    ) -> Option<u32> {
        let sc = self.source_config(key)?;
        if !sc.enabled {
            return None;
        }
        match field.and_then(|f| sc.field_priorities.get(&f)) {
            Some(p) => Some(*p),
            None => Some(sc.priority),
        }
    }

    /// Highest configured priority among enabled sources (>= 1)
    ///
    /// Normalization denominator for the hybrid strategy.
    pub fn max_configured_priority(&self) -> u32 {
        self.sources
            .iter()
            .filter(|sc| sc.enabled)
            .map(|sc| sc.priority)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Whether a trigger event should auto-invoke the builder
    pub fn should_auto_apply(&self, event: MetadataEvent) -> bool {
        if !self.auto_apply.enabled {
            return false;
        }
        match event {
            MetadataEvent::ItemImported => self.auto_apply.on_import,
            MetadataEvent::SourcedMetadataAttached => self.auto_apply.on_update,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
