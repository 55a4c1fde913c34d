//! # Core Type Definitions
//!
//! This module contains all core types shared by the Typeline compilers:
//! - Schema vocabulary (`TypeLabel`, `OwnsEdge`, `RelatesEdge`, `PlaysEdge`, `SchemaSnapshot`)
//! - Extraction input (`ExtractionLine`)
//! - Compiler output (`Reference`, `Statement`)
//! - Error types (`TypelineError`)
//! - Embedder trait
//!
//! ## Determinism Guarantees
//!
//! All label and edge types implement `Ord` so they can live in
//! `BTreeSet`/`BTreeMap` and render in a stable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// SCHEMA LABELS & EDGES
// =============================================================================

/// Label of an entity, attribute, relation or role type in the store schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeLabel(pub String);

impl TypeLabel {
    /// Create a new label from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label belongs to the reserved (bootstrap/internal) namespace.
    #[must_use]
    pub fn is_reserved(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `owner owns attribute`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnsEdge {
    pub owner: TypeLabel,
    pub attribute: TypeLabel,
}

impl OwnsEdge {
    #[must_use]
    pub fn new(owner: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            owner: TypeLabel::new(owner),
            attribute: TypeLabel::new(attribute),
        }
    }
}

/// `relation relates role`
///
/// The role is the unscoped role name (`parent`, not `parentage:parent`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelatesEdge {
    pub relation: TypeLabel,
    pub role: TypeLabel,
}

impl RelatesEdge {
    #[must_use]
    pub fn new(relation: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            relation: TypeLabel::new(relation),
            role: TypeLabel::new(role),
        }
    }
}

/// `player plays role`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlaysEdge {
    pub player: TypeLabel,
    pub role: TypeLabel,
}

impl PlaysEdge {
    #[must_use]
    pub fn new(player: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            player: TypeLabel::new(player),
            role: TypeLabel::new(role),
        }
    }
}

// =============================================================================
// SCHEMA SNAPSHOT
// =============================================================================

/// The introspected type graph of a store, as returned by schema queries.
///
/// The snapshot is an unordered bag: the serializer never depends on the
/// order in which the store returned its rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSnapshot {
    pub entities: Vec<TypeLabel>,
    pub attributes: Vec<TypeLabel>,
    pub relations: Vec<TypeLabel>,
    pub owns: Vec<OwnsEdge>,
    pub relates: Vec<RelatesEdge>,
    pub plays: Vec<PlaysEdge>,
}

// =============================================================================
// EXTRACTION LINES
// =============================================================================

/// One directive of the model-emitted extraction format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionLine {
    /// `source <title>`: switches the provenance context.
    Source { title: String },
    /// `entity <label>`
    Entity { label: String },
    /// `property <entity-label> <property-label> <value>`
    Property {
        entity: String,
        property: String,
        value: String,
    },
    /// `relation <entity-label-1> <relation-label> <entity-label-2>`
    Relation {
        from: String,
        relation: String,
        to: String,
    },
}

impl ExtractionLine {
    /// The directive keyword as written in the line format.
    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Entity { .. } => "entity",
            Self::Property { .. } => "property",
            Self::Relation { .. } => "relation",
        }
    }
}

// =============================================================================
// REFERENCES & STATEMENTS
// =============================================================================

/// A syntactically safe element reference, rendered as `$name`.
///
/// Only `crate::naming` constructs references, which is what keeps them safe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(pub(crate) String);

impl Reference {
    /// The bare name, without the leading `$`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// One emitted mutation command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statement(pub String);

impl Statement {
    /// Get the statement text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// EMBEDDER TRAIT
// =============================================================================

/// Capability that turns an element label into an encoded vector.
///
/// The compiler calls `embed` at most once per newly declared element and
/// places the returned string verbatim inside an `embedding` attribute.
/// Implementations live outside the core (HTTP backends, test doubles).
pub trait Embedder: Send + Sync {
    /// Encode `label` into the string form stored on the element.
    fn embed(&self, label: &str) -> Result<String, TypelineError>;
}

impl<F> Embedder for F
where
    F: Fn(&str) -> Result<String, TypelineError> + Send + Sync,
{
    fn embed(&self, label: &str) -> Result<String, TypelineError> {
        self(label)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Typeline system.
///
/// - No silent failures
/// - Use `Result<T, TypelineError>` for fallible operations
/// - The CORE should never panic; all errors must be recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypelineError {
    /// An extraction line could not be parsed. `line` is 1-based.
    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// The same label appears twice within one schema category.
    #[error("Duplicate {category} label: {label}")]
    DuplicateLabel {
        category: &'static str,
        label: String,
    },

    /// A collaborator (store, model, embedding backend) failed.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl TypelineError {
    /// Shorthand for a malformed-line error.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
