//! # Typeline Application Library
//!
//! Everything the `typeline` binary runs, exposed for integration tests:
//!
//! - `api` - HTTP server over the compilers (axum)
//! - `cli` - Command definitions and implementations (clap)
//! - `config` - Layered TOML/env configuration
//! - `store`, `model`, `embedding` - Collaborator clients
//! - `documents`, `pipeline` - Dataset ingestion and knowledge construction
//! - `query` - Question to TypeQL translation

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod store;
