//! # typeline-core
//!
//! The deterministic compilers of Typeline - THE LOGIC.
//!
//! Two text-to-text translators sit between a typed graph store and a
//! text-generation model:
//! - `schema`: renders an introspected type graph as canonical `define`
//!   text or as a compact, token-minimized projection
//! - `compiler`: turns model-emitted extraction lines into ordered,
//!   idempotent `put` statements
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is synchronous and pure: NO async, NO network, NO filesystem
//! - Holds no state between calls; each compile call owns a fresh session
//! - Produces byte-identical output for identical input
//! - Reaches an embedding backend only through the `Embedder` trait

// =============================================================================
// MODULES
// =============================================================================

pub mod compiler;
pub mod naming;
pub mod parser;
pub mod primitives;
pub mod schema;
pub mod tokenizer;
pub mod types;
pub mod value;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use compiler::{Compilation, CompilationSession, CompileStats, LineCompiler, render};
pub use naming::ReferenceNamer;
pub use parser::LineParser;
pub use schema::{PrunedSchema, SchemaForm};
pub use tokenizer::{TokenizeError, tokenize};
pub use types::{
    Embedder, ExtractionLine, OwnsEdge, PlaysEdge, Reference, RelatesEdge, SchemaSnapshot,
    Statement, TypeLabel, TypelineError,
};
pub use value::{TypedValue, ValueTyper, quote};
