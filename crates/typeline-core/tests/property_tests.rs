//! # Property-Based Tests
//!
//! Determinism, idempotence and totality invariants checked with proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use typeline_core::{
    ExtractionLine, LineCompiler, OwnsEdge, ReferenceNamer, SchemaSnapshot, TypeLabel, TypedValue,
    ValueTyper,
};

fn label() -> impl Strategy<Value = String> {
    "[a-z]{1,6}(:[a-z0-9]{1,6})?"
}

fn snapshot() -> impl Strategy<Value = SchemaSnapshot> {
    (
        vec("(meta-)?[a-z]{1,5}", 0..8),
        vec("(meta-)?[a-z]{1,5}", 0..8),
        vec(("(meta-)?[a-z]{1,5}", "(meta-)?[a-z]{1,5}"), 0..12),
    )
        .prop_map(|(entities, attributes, owns)| SchemaSnapshot {
            entities: entities.into_iter().map(TypeLabel::new).collect(),
            attributes: attributes.into_iter().map(TypeLabel::new).collect(),
            owns: owns
                .into_iter()
                .map(|(o, a)| OwnsEdge::new(o, a))
                .collect(),
            ..SchemaSnapshot::default()
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Compiling the same lines twice produces identical output.
    #[test]
    fn compilation_is_deterministic(labels in vec(label(), 1..30)) {
        let lines: Vec<ExtractionLine> = labels
            .into_iter()
            .map(|label| ExtractionLine::Entity { label })
            .collect();
        let a = LineCompiler::new().compile(&lines).expect("compile");
        let b = LineCompiler::new().compile(&lines).expect("compile");
        prop_assert_eq!(a, b);
    }

    /// Each distinct entity label yields exactly one definition.
    #[test]
    fn entity_declarations_are_idempotent(labels in vec(label(), 1..30)) {
        let lines: Vec<ExtractionLine> = labels
            .iter()
            .cloned()
            .map(|label| ExtractionLine::Entity { label })
            .collect();
        let out = LineCompiler::new().compile(&lines).expect("compile");
        let distinct: std::collections::BTreeSet<_> = labels.iter().collect();
        prop_assert_eq!(out.statements.len(), distinct.len());
        prop_assert_eq!(out.stats.duplicates, labels.len() - distinct.len());
    }

    /// Classification never fails and never loses a non-text value's spelling.
    #[test]
    fn classification_is_total(raw in "\\PC{0,20}") {
        match ValueTyper::classify(&raw) {
            TypedValue::Date(d) => {
                prop_assert_eq!(d, raw);
            }
            TypedValue::Numeric(n) => {
                prop_assert_eq!(n.as_str(), raw.trim());
            }
            TypedValue::Boolean(b) => {
                prop_assert_eq!(b.to_string(), raw.to_ascii_lowercase());
            }
            TypedValue::Text(t) => {
                prop_assert_eq!(t.as_str(), raw.trim_matches('"'));
            }
        }
    }

    /// Label references only contain variable-safe characters and are idempotent.
    #[test]
    fn label_references_are_safe(raw in "\\PC{1,20}") {
        let reference = ReferenceNamer::label(&raw);
        let name = reference.name();
        prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        prop_assert_eq!(ReferenceNamer::label(name), reference.clone());
    }

    /// Document references are never empty after the prefix.
    #[test]
    fn document_references_are_never_bare(title in "\\PC{1,20}") {
        let reference = ReferenceNamer::document(&title);
        prop_assert!(reference.name().len() > "doc-".len());
    }

    /// Reordering the snapshot never changes either rendering.
    #[test]
    fn rendering_ignores_input_order(snapshot in snapshot()) {
        let mut reversed = snapshot.clone();
        reversed.entities.reverse();
        reversed.attributes.reverse();
        reversed.owns.reverse();
        let a = snapshot.prune_reserved();
        let b = reversed.prune_reserved();
        prop_assert_eq!(a.canonical(), b.canonical());
        prop_assert_eq!(a.compact(), b.compact());
    }

    /// Nothing reserved survives pruning.
    #[test]
    fn pruning_removes_reserved(snapshot in snapshot()) {
        let schema = snapshot.prune_reserved();
        prop_assert!(!schema.canonical().contains("meta-"));
        prop_assert!(!schema.compact().contains("meta-"));
    }
}
