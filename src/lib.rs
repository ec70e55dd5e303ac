//! # longbox-canon
//!
//! Canonical metadata resolution engine for the Longbox comic library.
//!
//! Given metadata for one catalog item harvested independently from
//! several sources (the embedded file descriptor, external providers,
//! manual edits), the engine deterministically selects one winning value
//! per field, records which source won and why, supports permanent user
//! pinning, and exposes full conflict visibility for audit and curation.
//!
//! Everything here is pure, synchronous, in-memory computation. Crawling,
//! archive extraction, job queueing, persistence, and the HTTP surface are
//! collaborators that call into this crate.
//!
//! ```rust
//! use longbox_canon::{
//!     CanonicalBuilder, ResolutionPolicy, ScalarField, SourceBundle, SourceDocument, SourceKey,
//! };
//! use chrono::Utc;
//! use serde_json::json;
//! use uuid::Uuid;
//!
//! let mut bundle = SourceBundle::new();
//! bundle.attach(
//!     SourceKey::ProviderA,
//!     SourceDocument::new(json!({"name": "Saga #1", "volume": {"name": "Saga"}}), Utc::now()),
//! );
//!
//! let record = CanonicalBuilder::new()
//!     .build(Uuid::new_v4(), &bundle, &ResolutionPolicy::default())
//!     .unwrap();
//! assert_eq!(record.fields[&ScalarField::Title].value, json!("Saga #1"));
//! ```

pub mod config;
pub mod error;
pub mod resolution;
pub mod types;

pub use crate::error::{ResolutionError, Result};
pub use crate::resolution::{
    ArrayFieldMerger, CandidateExtractor, CanonicalBuilder, ConflictAnalyzer, FieldConflict,
    FieldResolver, OverrideLayer, DEFAULT_EXTRACTION_CONFIDENCE,
};
pub use crate::types::{
    ArraySetField, AutoApplyFlags, CanonicalRecord, Candidate, FieldState, MergedList,
    MetadataEvent, ResolutionPolicy, ResolutionStrategy, ResolvedField, ScalarField, SourceBundle,
    SourceConfig, SourceDocument, SourceKey,
};
