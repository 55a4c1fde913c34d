//! # Typeline CLI Module
//!
//! This module implements the CLI interface for Typeline.
//!
//! ## Available Commands
//!
//! - `schema` - Fetch (or read) a schema and render it for prompting
//! - `compile` - Compile an extraction-line file into statements
//! - `construct` - Run the document -> model -> store pipeline
//! - `documents` - Load a QA dataset's paragraphs into the store
//! - `sources` - Write a QA dataset's sources file for `construct`
//! - `query` - Translate a question into a TypeQL query
//! - `server` - Start the HTTP server

mod commands;

use crate::config::{BackendKind, Config};
use crate::query::DEFAULT_QUERY_TOKENS;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use typeline_core::TypelineError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Typeline - knowledge-graph construction over a typed graph store
///
/// Renders store schemas for prompting and compiles model extraction lines
/// into insert statements.
#[derive(Parser, Debug)]
#[command(name = "typeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./typeline.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store database name
    #[arg(short = 'D', long, global = true)]
    pub database: Option<String>,

    /// Store HTTP address
    #[arg(short = 'A', long, global = true)]
    pub store_address: Option<String>,

    /// Model backend: "local" (completion server) or "cli" (chat CLI)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<BackendKind>,

    /// Model name
    #[arg(short = 'M', long, global = true)]
    pub model: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a schema for prompting
    Schema {
        /// Read a JSON schema snapshot instead of querying the store
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Render the compact form
        #[arg(long)]
        compact: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile extraction lines into statements
    Compile {
        /// Extraction-line file
        #[arg(short, long)]
        file: PathBuf,

        /// Emit embedding statements (needs the embedding server)
        #[arg(long)]
        embed: bool,

        /// Write statements to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Construct knowledge from stored documents
    Construct {
        /// Sources file: one JSON array of document titles per line
        #[arg(short, long)]
        sources: PathBuf,

        /// Prompt template with {schema} and {paragraphs} placeholders
        #[arg(short, long)]
        prompt: PathBuf,

        /// Process at most this many units
        #[arg(short, long)]
        limit: Option<usize>,

        /// Append raw extraction lines to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print statements instead of writing them to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Store the paragraphs of a QA dataset as documents
    Documents {
        /// Dataset file (JSON array of examples)
        #[arg(short = 'f', long)]
        dataset: PathBuf,

        /// Use at most this many examples
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write the paragraph titles of each dataset example as a sources file
    Sources {
        /// Dataset file (JSON array of examples)
        #[arg(short = 'f', long)]
        dataset: PathBuf,

        /// Use at most this many examples
        #[arg(short, long)]
        limit: Option<usize>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Translate a question into a TypeQL query
    Query {
        /// The question to translate
        question: String,

        /// Prompt template with {schema} and {question} placeholders
        #[arg(short, long)]
        prompt: PathBuf,

        /// Read a JSON schema snapshot instead of querying the store
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Render the schema in compact form
        #[arg(long)]
        compact: bool,

        /// Maximum tokens to generate
        #[arg(long, default_value_t = DEFAULT_QUERY_TOKENS)]
        max_tokens: u32,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8090")]
        port: u16,
    },
}

impl Cli {
    /// Overlay the global flags on a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(database) = &self.database {
            config.store.database = database.clone();
        }
        if let Some(address) = &self.store_address {
            config.store.address = address.clone();
        }
        if let Some(backend) = self.backend {
            config.model.backend = backend;
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), TypelineError> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Schema {
            snapshot,
            compact,
            output,
        } => cmd_schema(&config, snapshot.as_deref(), compact, output.as_deref()).await,
        Commands::Compile {
            file,
            embed,
            output,
        } => cmd_compile(&config, json_mode, &file, embed, output.as_deref()).await,
        Commands::Construct {
            sources,
            prompt,
            limit,
            output,
            dry_run,
        } => {
            let options = ConstructOptions {
                sources,
                prompt,
                limit,
                output,
                dry_run,
            };
            cmd_construct(&config, json_mode, options).await
        }
        Commands::Documents { dataset, limit } => {
            cmd_documents(&config, json_mode, &dataset, limit).await
        }
        Commands::Sources {
            dataset,
            limit,
            output,
        } => cmd_sources(&dataset, limit, output.as_deref()),
        Commands::Query {
            question,
            prompt,
            snapshot,
            compact,
            max_tokens,
        } => {
            let options = QueryOptions {
                question,
                prompt,
                snapshot,
                compact,
                max_tokens,
            };
            cmd_query(&config, json_mode, options).await
        }
        Commands::Server { host, port } => cmd_server(&config, cli.quiet, &host, port).await,
    }
}
