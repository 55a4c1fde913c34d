//! # Graph-Model Primitives
//!
//! Hardcoded vocabulary and limits for the Typeline CORE.
//!
//! The compilers emit statements against a fixed graph model: knowledge
//! lives in `entity-node`, `property-node` and `relation-node` elements,
//! provenance lives in the reserved `meta-` namespace. These names are
//! compiled into the binary and are immutable at runtime.

// =============================================================================
// RESERVED NAMESPACE
// =============================================================================

/// Prefix of bootstrap/internal schema types.
///
/// Labels starting with this prefix never reach a rendered schema.
pub const RESERVED_PREFIX: &str = "meta-";

// =============================================================================
// GRAPH MODEL TYPES
// =============================================================================

/// Node type for declared entities.
pub const ENTITY_NODE: &str = "entity-node";

/// Node type for declared properties.
pub const PROPERTY_NODE: &str = "property-node";

/// Node type for declared relations.
pub const RELATION_NODE: &str = "relation-node";

/// Document type that source lines define.
pub const DOCUMENT_TYPE: &str = "meta-document";

/// Title attribute of a document.
pub const DOCUMENT_TITLE: &str = "meta-page-title";

/// Body attribute of a document.
pub const DOCUMENT_TEXT: &str = "text-content";

/// Relation linking a knowledge element to its source document.
pub const PROVENANCE_RELATION: &str = "meta-knowledge-source";

/// Display attribute carried by every knowledge node.
pub const NODE_LABEL: &str = "node-label";

/// Attribute holding an encoded embedding vector.
pub const EMBEDDING_ATTRIBUTE: &str = "embedding";

/// Typed value attributes of a property-node, one per value kind.
pub const DATE_PROPERTY: &str = "date-property";
pub const BOOLEAN_PROPERTY: &str = "boolean-property";
pub const NUMERIC_PROPERTY: &str = "numeric-property";
pub const STRING_PROPERTY: &str = "string-property";

// =============================================================================
// ROLES
// =============================================================================

/// Role of the entity a property-node hangs off.
pub const OWNER_ROLE: &str = "owner";

/// Role shared by both participants of a relation-node.
pub const RELATED_ROLE: &str = "related";

/// Role of the knowledge element in a provenance link.
pub const KNOWLEDGE_ROLE: &str = "knowledge";

/// Role of the document in a provenance link.
pub const SOURCE_ROLE: &str = "source";

// =============================================================================
// KEYS & REFERENCE PREFIXES
// =============================================================================

/// Separator of the compound `entity::property` dedup key and node label.
pub const KEY_SEPARATOR: &str = "::";

/// Prefix that keeps relation references apart from entity references.
pub const RELATION_REF_PREFIX: &str = "r-";

/// Prefix of every document reference.
pub const DOCUMENT_REF_PREFIX: &str = "doc-";

/// Reference of the anonymous provenance relation.
pub const ANONYMOUS_REF: &str = "_";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of one extraction line in bytes (64 KiB).
///
/// A longer line is rejected as malformed even when it is otherwise
/// well-formed (e.g. a very long quoted property value).
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Maximum number of lines accepted by one compile call.
pub const MAX_LINES: usize = 100_000;
