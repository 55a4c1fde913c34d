//! # Typeline
//!
//! The main binary for Typeline knowledge-graph construction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    apps/typeline (THE BINARY)                │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────────┐ │
//! │  │   CLI    │   │ HTTP API │   │ Pipeline                  │ │
//! │  │  (clap)  │   │  (axum)  │   │ store / model / embedding │ │
//! │  └────┬─────┘   └────┬─────┘   └─────────────┬─────────────┘ │
//! │       └──────────────┼───────────────────────┘               │
//! │                      ▼                                       │
//! │              ┌───────────────┐                               │
//! │              │ typeline-core │                               │
//! │              │  (compilers)  │                               │
//! │              └───────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! typeline schema --compact
//! typeline compile -f lines.txt
//! typeline construct -s sources.jsonl -p prompt.txt --dry-run
//! typeline server --port 8090
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use typeline::cli;

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // TYPELINE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("TYPELINE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "typeline=debug,tower_http=debug"
    } else if cli.quiet {
        "typeline=warn,tower_http=warn"
    } else {
        "typeline=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
