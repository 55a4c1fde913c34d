//! # Line Compiler
//!
//! Translates extraction directives into idempotent `put` statements.
//!
//! ## Session State
//!
//! All state lives in an explicit `CompilationSession`:
//! - `seen`: keys of elements already emitted in this call
//! - `current_source`: reference of the most recent `source` directive
//!
//! A session is created empty for every compile call and dropped after it.
//! Nothing is shared between calls, so independent inputs can be compiled
//! concurrently without coordination. The session never consults the store:
//! an element that already exists there is emitted again (statements are
//! `put`, so re-submitting is harmless).
//!
//! ## Output Order
//!
//! Statements follow declaration order. Each newly declared element yields
//! one contiguous block: definition, then embedding (if an embedder is
//! configured), then provenance link (if a source is active).

use crate::naming::ReferenceNamer;
use crate::parser::LineParser;
use crate::primitives::{
    ANONYMOUS_REF, DOCUMENT_TITLE, DOCUMENT_TYPE, EMBEDDING_ATTRIBUTE, ENTITY_NODE, KEY_SEPARATOR,
    KNOWLEDGE_ROLE, NODE_LABEL, OWNER_ROLE, PROPERTY_NODE, PROVENANCE_RELATION, RELATED_ROLE,
    RELATION_NODE, SOURCE_ROLE,
};
use crate::types::{Embedder, ExtractionLine, Reference, Statement, TypelineError};
use crate::value::{ValueTyper, quote};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// STATS
// =============================================================================

/// Counters describing one compile call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    pub documents: usize,
    pub entities: usize,
    pub properties: usize,
    pub relations: usize,
    /// Directives skipped because their key was already seen.
    pub duplicates: usize,
    pub embeddings: usize,
    pub provenance_links: usize,
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-call compiler state.
///
/// Like the rest of the core, a session is volatile and never persisted.
#[derive(Debug, Default)]
pub struct CompilationSession {
    seen: BTreeSet<String>,
    current_source: Option<Reference>,
    stats: CompileStats,
}

impl CompilationSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference of the active source document, if any.
    #[must_use]
    pub fn current_source(&self) -> Option<&Reference> {
        self.current_source.as_ref()
    }

    /// Whether an element with this dedup key was already emitted.
    #[must_use]
    pub fn has_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn stats(&self) -> CompileStats {
        self.stats
    }

    /// Record `key`; returns `false` (and counts a duplicate) if it was already there.
    fn claim(&mut self, key: String) -> bool {
        let fresh = self.seen.insert(key);
        if !fresh {
            self.stats.duplicates += 1;
        }
        fresh
    }
}

// =============================================================================
// COMPILATION RESULT
// =============================================================================

/// Ordered statements produced by one compile call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    pub statements: Vec<Statement>,
    pub stats: CompileStats,
}

impl Compilation {
    /// One statement per line.
    #[must_use]
    pub fn render(&self) -> String {
        render(&self.statements)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Join statements with newlines.
#[must_use]
pub fn render(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(Statement::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// COMPILER
// =============================================================================

/// Compiler from extraction directives to mutation statements.
///
/// The compiler itself is immutable; all state is in the session passed to
/// `compile_line`, or in the fresh session that `compile` creates.
#[derive(Default, Clone, Copy)]
pub struct LineCompiler<'a> {
    embedder: Option<&'a dyn Embedder>,
}

impl<'a> LineCompiler<'a> {
    /// A compiler that never emits embedding statements.
    #[must_use]
    pub fn new() -> Self {
        Self { embedder: None }
    }

    /// A compiler that embeds every newly declared element.
    #[must_use]
    pub fn with_embedder(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder: Some(embedder),
        }
    }

    /// Whether embedding statements will be emitted.
    #[must_use]
    pub fn embeds(&self) -> bool {
        self.embedder.is_some()
    }

    /// Parse and compile a whole document with a fresh session.
    pub fn compile_text(&self, text: &str) -> Result<Compilation, TypelineError> {
        let lines = LineParser::parse_document(text)?;
        self.compile(&lines)
    }

    /// Compile directives with a fresh session.
    pub fn compile(&self, lines: &[ExtractionLine]) -> Result<Compilation, TypelineError> {
        let mut session = CompilationSession::new();
        let mut statements = Vec::with_capacity(lines.len() * 2);
        for line in lines {
            statements.extend(self.compile_line(&mut session, line)?);
        }
        Ok(Compilation {
            statements,
            stats: session.stats(),
        })
    }

    /// Compile a single directive against `session`.
    ///
    /// Returns an empty vector for a duplicate element.
    pub fn compile_line(
        &self,
        session: &mut CompilationSession,
        line: &ExtractionLine,
    ) -> Result<Vec<Statement>, TypelineError> {
        let mut out = Vec::with_capacity(3);
        match line {
            ExtractionLine::Source { title } => {
                // Always emitted: re-declaring a source re-establishes context.
                let doc = ReferenceNamer::document(title);
                out.push(Statement(format!(
                    "put {doc} isa {DOCUMENT_TYPE}, has {DOCUMENT_TITLE} {};",
                    quote(title)
                )));
                session.current_source = Some(doc);
                session.stats.documents += 1;
            }
            ExtractionLine::Entity { label } => {
                if !session.claim(label.clone()) {
                    return Ok(out);
                }
                let node = ReferenceNamer::label(label);
                out.push(Statement(format!(
                    "put {node} isa {ENTITY_NODE}, has {NODE_LABEL} {};",
                    quote(label)
                )));
                session.stats.entities += 1;
                self.finish_block(session, &node, label, &mut out)?;
            }
            ExtractionLine::Property {
                entity,
                property,
                value,
            } => {
                let key = format!("{entity}{KEY_SEPARATOR}{property}");
                if !session.claim(key.clone()) {
                    return Ok(out);
                }
                let owner = ReferenceNamer::label(entity);
                let node = ReferenceNamer::label(&key);
                let typed = ValueTyper::classify(value);
                out.push(Statement(format!(
                    "put {node} isa {PROPERTY_NODE}, links ({OWNER_ROLE}: {owner}), has {NODE_LABEL} {}, has {} {};",
                    quote(&key),
                    typed.attribute(),
                    typed.literal()
                )));
                session.stats.properties += 1;
                self.finish_block(session, &node, &key, &mut out)?;
            }
            ExtractionLine::Relation { from, relation, to } => {
                // Bare label: relation labels are globally unique, so a
                // second pair reusing one is dropped.
                if !session.claim(relation.clone()) {
                    return Ok(out);
                }
                let a = ReferenceNamer::label(from);
                let b = ReferenceNamer::label(to);
                let node = ReferenceNamer::relation(relation);
                out.push(Statement(format!(
                    "put {node} isa {RELATION_NODE}, has {NODE_LABEL} {}, links ({RELATED_ROLE}: {a}, {RELATED_ROLE}: {b});",
                    quote(relation)
                )));
                session.stats.relations += 1;
                self.finish_block(session, &node, relation, &mut out)?;
            }
        }
        Ok(out)
    }

    /// Append the optional embedding and provenance statements of a block.
    fn finish_block(
        &self,
        session: &mut CompilationSession,
        node: &Reference,
        label: &str,
        out: &mut Vec<Statement>,
    ) -> Result<(), TypelineError> {
        if let Some(embedder) = self.embedder {
            let vector = embedder.embed(label)?;
            out.push(Statement(format!(
                "put {node} has {EMBEDDING_ATTRIBUTE} {};",
                quote(&vector)
            )));
            session.stats.embeddings += 1;
        }
        if let Some(source) = &session.current_source {
            out.push(Statement(format!(
                "put ${ANONYMOUS_REF} isa {PROVENANCE_RELATION}, links ({KNOWLEDGE_ROLE}: {node}, {SOURCE_ROLE}: {source});"
            )));
            session.stats.provenance_links += 1;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> Compilation {
        LineCompiler::new().compile_text(text).expect("compile")
    }

    fn mock_embed(label: &str) -> Result<String, TypelineError> {
        Ok(format!("EMBED_{label}"))
    }

    #[test]
    fn entity_statement() {
        let out = compile("entity person:xawery-zulawski");
        assert_eq!(
            out.render(),
            "put $person-xawery-zulawski isa entity-node, has node-label \"person:xawery-zulawski\";"
        );
    }

    #[test]
    fn property_statement_links_owner() {
        let out = compile(
            "entity person:xawery-zulawski\nproperty person:xawery-zulawski name:xawery-zulawski \"xawery zulawski\"",
        )
        .render();
        assert!(out.contains("has string-property \"xawery zulawski\""));
        assert!(out.contains("has node-label \"person:xawery-zulawski::name:xawery-zulawski\""));
        assert!(out.contains("links (owner: $person-xawery-zulawski)"));
    }

    #[test]
    fn property_kinds() {
        let out = compile(
            "entity person:x\nproperty person:x date-of-birth 1971-12-22\nproperty person:x height 180\nproperty person:x alive TRUE",
        )
        .render();
        assert!(out.contains("has date-property 1971-12-22"));
        assert!(out.contains("has numeric-property 180"));
        assert!(out.contains("has boolean-property true"));
    }

    #[test]
    fn relation_statement() {
        let out = compile("entity person:a\nentity person:b\nrelation person:a mother-of:a:b person:b")
            .render();
        assert!(out.contains(
            "put $r-mother-of-a-b isa relation-node, has node-label \"mother-of:a:b\", links (related: $person-a, related: $person-b);"
        ));
    }

    #[test]
    fn source_defines_document_and_links() {
        let out = compile("source Some Title\nentity person:x");
        assert_eq!(
            out.statements,
            vec![
                Statement("put $doc-some-title isa meta-document, has meta-page-title \"Some Title\";".to_string()),
                Statement("put $person-x isa entity-node, has node-label \"person:x\";".to_string()),
                Statement("put $_ isa meta-knowledge-source, links (knowledge: $person-x, source: $doc-some-title);".to_string()),
            ]
        );
    }

    #[test]
    fn repeated_source_is_always_emitted() {
        let out = compile("source A\nentity x\nsource A");
        assert_eq!(out.stats.documents, 2);
        assert_eq!(out.statements.len(), 4);
    }

    #[test]
    fn title_quotes_are_escaped() {
        let out = compile("source The \"Best\" Film");
        assert!(out.render().contains("has meta-page-title \"The \\\"Best\\\" Film\""));
    }

    #[test]
    fn duplicate_entity_is_silent() {
        let out = compile("entity a\nentity a");
        assert_eq!(out.statements.len(), 1);
        assert_eq!(out.stats.duplicates, 1);
    }

    #[test]
    fn embedding_follows_definition() {
        let compiler = LineCompiler::with_embedder(&mock_embed);
        let out = compiler
            .compile_text("source D\nentity person:x")
            .expect("compile");
        assert_eq!(out.statements[2].as_str(), "put $person-x has embedding \"EMBED_person:x\";");
        assert!(out.statements[3].as_str().contains("meta-knowledge-source"));
    }

    #[test]
    fn embedding_uses_compound_label_for_properties() {
        let compiler = LineCompiler::with_embedder(&mock_embed);
        let out = compiler
            .compile_text("entity person:x\nproperty person:x name:x \"x\"")
            .expect("compile");
        assert!(out.render().contains("has embedding \"EMBED_person:x::name:x\""));
    }

    #[test]
    fn embedding_failure_propagates() {
        let failing = |_: &str| -> Result<String, TypelineError> {
            Err(TypelineError::Upstream("embedding server down".to_string()))
        };
        let compiler = LineCompiler::with_embedder(&failing);
        let err = compiler.compile_text("entity a").expect_err("should fail");
        assert!(matches!(err, TypelineError::Upstream(_)));
    }

    #[test]
    fn session_tracks_current_source() {
        let compiler = LineCompiler::new();
        let mut session = CompilationSession::new();
        assert!(session.current_source().is_none());
        compiler
            .compile_line(&mut session, &ExtractionLine::Source { title: "Doc A".to_string() })
            .expect("compile");
        assert_eq!(session.current_source().map(Reference::name), Some("doc-doc-a"));
        compiler
            .compile_line(&mut session, &ExtractionLine::Entity { label: "x".to_string() })
            .expect("compile");
        assert!(session.has_seen("x"));
    }

    #[test]
    fn shared_seen_set_spans_directive_kinds() {
        // Entity and relation labels share one dedup namespace.
        let out = compile("entity knows\nentity a\nentity b\nrelation a knows b");
        assert_eq!(out.stats.relations, 0);
        assert_eq!(out.stats.duplicates, 1);
    }

    #[test]
    fn malformed_document_emits_nothing() {
        let err = LineCompiler::new()
            .compile_text("entity a\nfrobnicate b")
            .expect_err("should fail");
        assert_eq!(err, TypelineError::malformed(2, "unknown directive 'frobnicate'"));
    }
}
