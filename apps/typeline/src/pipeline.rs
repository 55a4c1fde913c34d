//! # Construct Pipeline
//!
//! Builds knowledge from stored documents, one unit at a time:
//!
//! ```text
//! titles -> fetch documents -> prompt -> model -> extraction lines
//!        -> LineCompiler (fresh session) -> write transaction
//! ```
//!
//! A failure in any step is logged and the next unit proceeds; only the
//! `PipelineReport` reflects it.

use crate::embedding::HttpEmbedder;
use crate::model::ModelBackend;
use crate::store::StoreClient;
use serde::Serialize;
use std::io::Write;
use typeline_core::{Compilation, LineCompiler, TypelineError};

/// Placeholder replaced by the formatted paragraphs.
pub const PARAGRAPHS_PLACEHOLDER: &str = "{paragraphs}";

/// Placeholder replaced by the rendered schema.
pub const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// Counters of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Units read from the sources file.
    pub units: usize,
    /// Units with no stored document.
    pub skipped: usize,
    /// Units that failed in any step.
    pub failed: usize,
    /// Statements compiled across successful units.
    pub statements: usize,
}

// =============================================================================
// TEXT HELPERS
// =============================================================================

/// Parse a sources file: one JSON array of titles per non-blank line.
pub fn read_sources(text: &str) -> Result<Vec<Vec<String>>, TypelineError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                TypelineError::SerializationError(format!("sources line {}: {e}", i + 1))
            })
        })
        .collect()
}

/// Render `(title, text)` pairs in the prompt's paragraph format.
pub fn format_paragraphs(documents: &[(String, String)]) -> String {
    documents
        .iter()
        .map(|(title, text)| format!("- Title: {title}\n  Sentences: {text}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill the prompt template's placeholders.
pub fn fill_prompt(template: &str, schema: &str, paragraphs: &str) -> String {
    template
        .replace(SCHEMA_PLACEHOLDER, schema)
        .replace(PARAGRAPHS_PLACEHOLDER, paragraphs)
}

/// Strip the backticks and spaces a model wraps its answer in.
pub fn extract_lines(response: &str) -> &str {
    response.trim_matches(|c: char| c == '`' || c.is_whitespace())
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Collaborators and settings of a construct run.
pub struct Pipeline {
    store: StoreClient,
    model: ModelBackend,
    embedder: Option<HttpEmbedder>,
    schema: String,
    template: String,
    max_tokens: u32,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(
        store: StoreClient,
        model: ModelBackend,
        schema: String,
        template: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            store,
            model,
            embedder: None,
            schema,
            template,
            max_tokens,
            dry_run: false,
        }
    }

    /// Emit an embedding statement for every new element.
    #[must_use]
    pub fn with_embedder(mut self, embedder: HttpEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Print statements to stdout instead of submitting them.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every unit. Never fails as a whole.
    ///
    /// Raw extraction lines of each unit are appended to `output` when given.
    pub async fn run(
        &self,
        sources: &[Vec<String>],
        mut output: Option<&mut (dyn Write + Send)>,
    ) -> PipelineReport {
        let mut report = PipelineReport {
            units: sources.len(),
            ..PipelineReport::default()
        };
        tracing::info!(units = sources.len(), model = %self.model.describe(), "Construct started");

        for (i, titles) in sources.iter().enumerate() {
            tracing::info!(
                progress = %format!("{}/{}", i + 1, sources.len()),
                titles = %titles.join(", "),
                "Processing unit"
            );
            match self.run_unit(titles, output.as_deref_mut()).await {
                Ok(Some(compilation)) => {
                    tracing::info!(
                        statements = compilation.statements.len(),
                        entities = compilation.stats.entities,
                        properties = compilation.stats.properties,
                        relations = compilation.stats.relations,
                        duplicates = compilation.stats.duplicates,
                        "Unit compiled"
                    );
                    report.statements += compilation.statements.len();
                }
                Ok(None) => {
                    tracing::warn!("No documents found, skipping unit");
                    report.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Unit failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            units = report.units,
            skipped = report.skipped,
            failed = report.failed,
            statements = report.statements,
            "Construct finished"
        );
        report
    }

    /// One unit. `Ok(None)` means there was nothing to work on.
    async fn run_unit(
        &self,
        titles: &[String],
        output: Option<&mut (dyn Write + Send + '_)>,
    ) -> Result<Option<Compilation>, TypelineError> {
        let mut documents = Vec::with_capacity(titles.len());
        for title in titles {
            match self.store.fetch_document(title).await? {
                Some(text) => documents.push((title.clone(), text)),
                None => tracing::warn!(title = %title, "No document found"),
            }
        }
        if documents.is_empty() {
            return Ok(None);
        }

        let prompt = fill_prompt(&self.template, &self.schema, &format_paragraphs(&documents));
        let response = self.model.generate(&prompt, self.max_tokens).await?;
        let lines = extract_lines(&response).to_string();

        if let Some(out) = output {
            write_unit(out, titles, &lines)?;
        }

        let compilation = self.compile(lines).await?;
        if self.dry_run {
            println!("{}", compilation.render());
        } else {
            self.store.submit(&compilation.statements).await?;
        }
        Ok(Some(compilation))
    }

    /// Compile with a fresh session, off the async workers when embedding.
    async fn compile(&self, lines: String) -> Result<Compilation, TypelineError> {
        match self.embedder.clone() {
            None => LineCompiler::new().compile_text(&lines),
            Some(embedder) => tokio::task::spawn_blocking(move || {
                LineCompiler::with_embedder(&embedder).compile_text(&lines)
            })
            .await
            .map_err(|e| TypelineError::Upstream(format!("compile task failed: {e}")))?,
        }
    }
}

/// Append one unit's raw lines, headed by a comment naming its sources.
fn write_unit(out: &mut dyn Write, titles: &[String], lines: &str) -> Result<(), TypelineError> {
    let header = serde_json::to_string(titles)
        .map_err(|e| TypelineError::SerializationError(e.to_string()))?;
    writeln!(out, "# Sources: {header}\n{lines}\n")
        .map_err(|e| TypelineError::IoError(format!("Cannot write output: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
