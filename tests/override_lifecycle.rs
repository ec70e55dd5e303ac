// Override Lifecycle Tests
//
// Full pin/clear cycle against a realistic bundle: the per-field state
// machine (Unresolved → AutoResolved → UserOverridden → AutoResolved)
// driven through the public builder, extractor, and override surfaces.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use longbox_canon::{
    CandidateExtractor, CanonicalBuilder, FieldState, OverrideLayer, ResolutionPolicy,
    ResolutionStrategy, ScalarField, SourceBundle, SourceDocument, SourceKey,
};

mod common;

fn bundle() -> SourceBundle {
    let mut bundle = SourceBundle::new();
    bundle.attach(
        SourceKey::ProviderA,
        SourceDocument::new(
            json!({"name": "Saga #1", "volume": {"name": "Saga"}}),
            Utc::now(),
        ),
    );
    bundle
}

fn policy() -> ResolutionPolicy {
    ResolutionPolicy {
        strategy: ResolutionStrategy::Priority,
        ..Default::default()
    }
}

#[test]
fn full_pin_and_clear_cycle() {
    common::init_tracing();
    let builder = CanonicalBuilder::new();
    let layer = OverrideLayer::new();
    let bundle = bundle();
    let policy = policy();

    // Unresolved → AutoResolved on first build
    let mut record = builder.build(Uuid::new_v4(), &bundle, &policy).unwrap();
    assert_eq!(record.field_state(ScalarField::Title), FieldState::AutoResolved);
    assert!(!record.has_user_modifications);

    // AutoResolved → UserOverridden on explicit set
    layer.set(&mut record, ScalarField::Title, json!("My Title"));
    assert_eq!(record.field_state(ScalarField::Title), FieldState::UserOverridden);
    assert!(record.has_user_modifications);

    // Rebuild does NOT release the pin
    record = builder.rebuild(&record, &bundle, &policy, &[]).unwrap();
    assert_eq!(record.fields[&ScalarField::Title].value, json!("My Title"));

    // UserOverridden → AutoResolved only via explicit clear
    let remaining = CandidateExtractor::new().extract(ScalarField::Title, &bundle);
    let resolved = layer
        .clear(&mut record, ScalarField::Title, &remaining, &policy)
        .unwrap()
        .unwrap();
    assert_eq!(resolved.value, json!("Saga #1"));
    assert_eq!(record.field_state(ScalarField::Title), FieldState::AutoResolved);
    assert!(!record.has_user_modifications);
}

#[test]
fn pinning_an_unresolved_field_counts_toward_completeness() {
    let builder = CanonicalBuilder::new();
    let layer = OverrideLayer::new();
    let mut record = builder
        .build(Uuid::new_v4(), &bundle(), &policy())
        .unwrap();

    // No source supplies a description
    assert_eq!(
        record.field_state(ScalarField::Description),
        FieldState::Unresolved
    );
    let before = record.completeness_score;

    layer.set(&mut record, ScalarField::Description, json!("Hand-written blurb"));
    assert_eq!(
        record.field_state(ScalarField::Description),
        FieldState::UserOverridden
    );
    assert!(record.completeness_score > before);
}

#[test]
fn clear_with_empty_sources_returns_field_to_unresolved() {
    let layer = OverrideLayer::new();
    let mut record = CanonicalBuilder::new()
        .build(Uuid::new_v4(), &SourceBundle::new(), &policy())
        .unwrap();

    layer.set(&mut record, ScalarField::Publisher, json!("Image Comics"));
    let resolved = layer
        .clear(&mut record, ScalarField::Publisher, &[], &policy())
        .unwrap();

    assert!(resolved.is_none());
    assert_eq!(
        record.field_state(ScalarField::Publisher),
        FieldState::Unresolved
    );
    assert_eq!(record.completeness_score, 0.0);
}

#[test]
fn override_value_survives_record_serialization() {
    let layer = OverrideLayer::new();
    let mut record = CanonicalBuilder::new()
        .build(Uuid::new_v4(), &bundle(), &policy())
        .unwrap();
    layer.set(&mut record, ScalarField::Title, json!("My Title"));

    let json = serde_json::to_string(&record).unwrap();
    let roundtrip: longbox_canon::CanonicalRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(
        roundtrip.field_state(ScalarField::Title),
        FieldState::UserOverridden
    );
    assert_eq!(roundtrip.fields[&ScalarField::Title].value, json!("My Title"));
}
