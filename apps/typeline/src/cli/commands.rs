//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::documents;
use crate::embedding::HttpEmbedder;
use crate::model::ModelBackend;
use crate::pipeline::{Pipeline, read_sources};
use crate::query::generate_query;
use crate::store::StoreClient;
use std::io::Write;
use std::path::{Path, PathBuf};
use typeline_core::{Compilation, LineCompiler, SchemaForm, SchemaSnapshot, TypelineError};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of extraction-line, sources, prompt and snapshot files (16 MB).
const MAX_INPUT_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum dataset file size (500 MB).
///
/// QA datasets ship as one JSON array and are far larger than other inputs.
const MAX_DATASET_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), TypelineError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| TypelineError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(TypelineError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, TypelineError> {
    let canonical = path.canonicalize().map_err(|e| {
        TypelineError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(TypelineError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path whose parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, TypelineError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        TypelineError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(TypelineError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| TypelineError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Validate and read a text input file.
fn read_input(path: &Path, max_size: u64) -> Result<String, TypelineError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, max_size)?;
    std::fs::read_to_string(&canonical).map_err(|e| {
        TypelineError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })
}

/// Write `text` to `path`, or print it when no path is given.
fn emit(text: &str, path: Option<&Path>) -> Result<(), TypelineError> {
    match path {
        Some(path) => {
            let target = validate_output_path(path)?;
            std::fs::write(&target, format!("{text}\n")).map_err(|e| {
                TypelineError::IoError(format!("Cannot write '{}': {}", path.display(), e))
            })
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SCHEMA COMMAND
// =============================================================================

/// Read a snapshot file, or introspect the store when none is given.
async fn load_snapshot(
    config: &Config,
    snapshot: Option<&Path>,
) -> Result<SchemaSnapshot, TypelineError> {
    let snapshot = match snapshot {
        Some(path) => {
            let text = read_input(path, MAX_INPUT_FILE_SIZE)?;
            serde_json::from_str::<SchemaSnapshot>(&text).map_err(|e| {
                TypelineError::SerializationError(format!("Invalid schema snapshot: {e}"))
            })?
        }
        None => StoreClient::connect(&config.store).await?.fetch_schema().await?,
    };
    snapshot.validate()?;
    Ok(snapshot)
}

/// Render the store's schema (or a snapshot file) without reserved labels.
pub async fn cmd_schema(
    config: &Config,
    snapshot: Option<&Path>,
    compact: bool,
    output: Option<&Path>,
) -> Result<(), TypelineError> {
    let snapshot = load_snapshot(config, snapshot).await?;
    let form = if compact || config.schema.compact {
        SchemaForm::Compact
    } else {
        SchemaForm::Canonical
    };
    let schema = snapshot.prune(&config.schema.reserved_prefix);
    tracing::info!(types = schema.type_count(), form = ?form, "Schema rendered");

    emit(&schema.render(form), output)
}

// =============================================================================
// COMPILE COMMAND
// =============================================================================

/// Compile an extraction-line file with one fresh session.
pub async fn cmd_compile(
    config: &Config,
    json_mode: bool,
    file: &Path,
    embed: bool,
    output: Option<&Path>,
) -> Result<(), TypelineError> {
    let text = read_input(file, MAX_INPUT_FILE_SIZE)?;

    let compilation: Compilation = if embed {
        let embedder = HttpEmbedder::new(&config.embedding)?;
        tokio::task::spawn_blocking(move || {
            LineCompiler::with_embedder(&embedder).compile_text(&text)
        })
        .await
        .map_err(|e| TypelineError::Upstream(format!("compile task failed: {e}")))??
    } else {
        LineCompiler::new().compile_text(&text)?
    };

    let stats = compilation.stats;
    tracing::info!(
        statements = compilation.statements.len(),
        entities = stats.entities,
        properties = stats.properties,
        relations = stats.relations,
        duplicates = stats.duplicates,
        "Compiled"
    );

    if json_mode && output.is_none() {
        let statements: Vec<&str> = compilation.statements.iter().map(|s| s.as_str()).collect();
        print_json(&serde_json::json!({
            "statements": statements,
            "stats": stats,
        }));
        return Ok(());
    }
    emit(&compilation.render(), output)
}

// =============================================================================
// CONSTRUCT COMMAND
// =============================================================================

/// Arguments of `construct`.
#[derive(Debug, Clone)]
pub struct ConstructOptions {
    pub sources: PathBuf,
    pub prompt: PathBuf,
    pub limit: Option<usize>,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

/// Run the construct pipeline over a sources file.
pub async fn cmd_construct(
    config: &Config,
    json_mode: bool,
    options: ConstructOptions,
) -> Result<(), TypelineError> {
    let mut sources = read_sources(&read_input(&options.sources, MAX_INPUT_FILE_SIZE)?)?;
    if let Some(limit) = options.limit {
        sources.truncate(limit);
    }
    let template = read_input(&options.prompt, MAX_INPUT_FILE_SIZE)?;

    let store = StoreClient::connect(&config.store).await?;
    let snapshot = store.fetch_schema().await?;
    let form = if config.schema.compact {
        SchemaForm::Compact
    } else {
        SchemaForm::Canonical
    };
    let schema = snapshot.prune(&config.schema.reserved_prefix).render(form);

    let model = ModelBackend::from_config(&config.model);
    let mut pipeline = Pipeline::new(store, model, schema, template, config.model.max_tokens)
        .dry_run(options.dry_run);
    if config.embedding.enabled {
        pipeline = pipeline.with_embedder(HttpEmbedder::new(&config.embedding)?);
    }

    let mut output_file = match &options.output {
        Some(path) => {
            let target = validate_output_path(path)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&target)
                .map_err(|e| {
                    TypelineError::IoError(format!("Cannot open '{}': {}", path.display(), e))
                })?;
            Some(file)
        }
        None => None,
    };
    let output = output_file
        .as_mut()
        .map(|file| file as &mut (dyn Write + Send));

    let report = pipeline.run(&sources, output).await;

    if json_mode {
        print_json(&serde_json::json!(report));
        return Ok(());
    }
    println!("Construct finished");
    println!("==================");
    println!("Units:      {}", report.units);
    println!("Skipped:    {}", report.skipped);
    println!("Failed:     {}", report.failed);
    println!("Statements: {}", report.statements);
    Ok(())
}

// =============================================================================
// DOCUMENTS COMMAND
// =============================================================================

/// Store the paragraphs of a dataset as documents.
pub async fn cmd_documents(
    config: &Config,
    json_mode: bool,
    dataset: &Path,
    limit: Option<usize>,
) -> Result<(), TypelineError> {
    let text = read_input(dataset, MAX_DATASET_FILE_SIZE)?;
    let examples = documents::load_dataset(&text, limit)?;
    let docs = documents::collect_documents(&examples);
    tracing::info!(
        examples = examples.len(),
        documents = docs.len(),
        "Dataset loaded"
    );

    let store = StoreClient::connect(&config.store).await?;
    let report = documents::ingest(&store, &docs).await;

    if json_mode {
        print_json(&serde_json::json!(report));
    } else {
        println!("Inserted: {}", report.inserted);
        println!("Failed:   {}", report.failed);
    }
    Ok(())
}

// =============================================================================
// SOURCES COMMAND
// =============================================================================

/// Write each example's paragraph titles as one sources line.
pub fn cmd_sources(
    dataset: &Path,
    limit: Option<usize>,
    output: Option<&Path>,
) -> Result<(), TypelineError> {
    let text = read_input(dataset, MAX_DATASET_FILE_SIZE)?;
    let examples = documents::load_dataset(&text, limit)?;
    let units = documents::unit_titles(&examples);
    tracing::info!(examples = examples.len(), "Extracted sources");

    emit(&documents::format_sources(&units)?, output)
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Arguments of `query`.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub question: String,
    pub prompt: PathBuf,
    pub snapshot: Option<PathBuf>,
    pub compact: bool,
    pub max_tokens: u32,
}

/// Translate one question into a TypeQL query.
pub async fn cmd_query(
    config: &Config,
    json_mode: bool,
    options: QueryOptions,
) -> Result<(), TypelineError> {
    let template = read_input(&options.prompt, MAX_INPUT_FILE_SIZE)?;
    let snapshot = load_snapshot(config, options.snapshot.as_deref()).await?;
    let form = if options.compact || config.schema.compact {
        SchemaForm::Compact
    } else {
        SchemaForm::Canonical
    };
    let schema = snapshot.prune(&config.schema.reserved_prefix).render(form);

    let model = ModelBackend::from_config(&config.model);
    tracing::info!(question = %options.question, model = %model.describe(), "Generating query");
    let query = generate_query(
        &model,
        &schema,
        &template,
        &options.question,
        options.max_tokens,
    )
    .await?;

    if json_mode {
        print_json(&serde_json::json!({
            "question": options.question,
            "query": query,
        }));
    } else {
        println!("{query}");
    }
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &Config,
    quiet: bool,
    host: &str,
    port: u16,
) -> Result<(), TypelineError> {
    if !quiet {
        println!("Typeline Server Starting...");
        println!();
        println!("Configuration:");
        println!("  Host:            {}", host);
        println!("  Port:            {}", port);
        println!("  Reserved prefix: {}", config.schema.reserved_prefix);
        println!();
        println!("Endpoints:");
        println!("  GET  /health        - Health check");
        println!("  POST /schema/render - Render a schema snapshot");
        println!("  POST /compile       - Compile extraction lines");
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, AppState::new(&config.schema.reserved_prefix)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_input_rejects_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_input(dir.path(), MAX_INPUT_FILE_SIZE).expect_err("directory");
        assert!(matches!(err, TypelineError::IoError(_)));
    }

    #[test]
    fn read_input_enforces_size_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lines.txt");
        std::fs::write(&path, "entity person:ada").expect("write");

        assert!(read_input(&path, 4).is_err());
        assert_eq!(
            read_input(&path, MAX_INPUT_FILE_SIZE).expect("read"),
            "entity person:ada"
        );
    }

    #[test]
    fn output_path_needs_existing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(validate_output_path(&dir.path().join("out.tql")).is_ok());
        assert!(validate_output_path(&dir.path().join("missing/out.tql")).is_err());
        assert!(validate_output_path(Path::new("out.tql")).is_ok());
    }

    #[tokio::test]
    async fn compile_writes_statements_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("lines.txt");
        let output = dir.path().join("out.tql");
        std::fs::write(&input, "entity person:ada-lovelace\n").expect("write");

        cmd_compile(&Config::default(), false, &input, false, Some(output.as_path()))
            .await
            .expect("compile");

        let written = std::fs::read_to_string(&output).expect("read");
        assert_eq!(
            written,
            "put $person-ada-lovelace isa entity-node, has node-label \"person:ada-lovelace\";\n"
        );
    }

    #[test]
    fn sources_file_lists_titles_per_example() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dataset = dir.path().join("dev.json");
        let output = dir.path().join("sources.jsonl");
        std::fs::write(
            &dataset,
            r#"[{"context":[["Nocturne",["A film."]],["Łódź",["A city."]]]},{"context":[["Warsaw",["Capital."]]]}]"#,
        )
        .expect("write");

        cmd_sources(&dataset, Some(1), Some(output.as_path())).expect("sources");

        let written = std::fs::read_to_string(&output).expect("read");
        assert_eq!(written, "[\"Nocturne\",\"Łódź\"]\n");
        assert_eq!(
            read_sources(&written).expect("parse"),
            vec![vec!["Nocturne".to_string(), "Łódź".to_string()]]
        );
    }

    #[tokio::test]
    async fn schema_renders_snapshot_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("schema.json");
        let output = dir.path().join("schema.tql");
        std::fs::write(
            &input,
            r#"{"entities":["person","meta-node"],"attributes":["name"],"owns":[{"owner":"person","attribute":"name"}]}"#,
        )
        .expect("write");

        cmd_schema(&Config::default(), Some(input.as_path()), false, Some(output.as_path()))
            .await
            .expect("schema");

        let written = std::fs::read_to_string(&output).expect("read");
        assert!(written.starts_with("define"));
        assert!(written.contains("person"));
        assert!(!written.contains("meta-node"));
    }
}
