//! # Document Ingestion
//!
//! Loads a multi-hop QA dataset and stores its paragraphs as documents.
//!
//! Dataset shape (a JSON array):
//!
//! ```json
//! [{ "_id": "q1", "context": [["Title", ["Sentence one.", "Sentence two."]]] }]
//! ```
//!
//! The same title in several examples is the same page, so paragraphs are
//! deduplicated by title before anything is written.

use crate::store::StoreClient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use typeline_core::TypelineError;

/// One dataset example. Only the paragraphs are used.
#[derive(Debug, Clone, Deserialize)]
pub struct Example {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub context: Vec<(String, Vec<String>)>,
}

/// A titled paragraph ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    pub text: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub failed: usize,
}

/// Parse a dataset, keeping at most `limit` examples.
pub fn load_dataset(text: &str, limit: Option<usize>) -> Result<Vec<Example>, TypelineError> {
    let mut examples: Vec<Example> = serde_json::from_str(text)
        .map_err(|e| TypelineError::SerializationError(format!("Invalid dataset: {e}")))?;
    if let Some(limit) = limit {
        examples.truncate(limit);
    }
    Ok(examples)
}

/// Flatten examples into documents, first occurrence of each title wins.
pub fn collect_documents(examples: &[Example]) -> Vec<Document> {
    let mut seen = BTreeSet::new();
    examples
        .iter()
        .flat_map(|example| &example.context)
        .filter(|(title, _)| seen.insert(title.as_str()))
        .map(|(title, sentences)| Document {
            title: title.clone(),
            text: sentences.join(" "),
        })
        .collect()
}

/// Paragraph titles of each example, in dataset order.
pub fn unit_titles(examples: &[Example]) -> Vec<Vec<String>> {
    examples
        .iter()
        .map(|example| example.context.iter().map(|(title, _)| title.clone()).collect())
        .collect()
}

/// Sources-file text: one JSON array of titles per line.
pub fn format_sources(units: &[Vec<String>]) -> Result<String, TypelineError> {
    units
        .iter()
        .map(|titles| {
            serde_json::to_string(titles)
                .map_err(|e| TypelineError::SerializationError(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|lines| lines.join("\n"))
}

/// Insert every document, one write transaction each.
///
/// A failed insert is logged and the run continues.
pub async fn ingest(store: &StoreClient, documents: &[Document]) -> IngestReport {
    let mut report = IngestReport::default();
    let total = documents.len();
    for (i, doc) in documents.iter().enumerate() {
        tracing::info!(progress = %format!("{}/{}", i + 1, total), title = %doc.title, "Inserting document");
        match store.insert_document(&doc.title, &doc.text).await {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                tracing::error!(title = %doc.title, error = %e, "Document insert failed");
                report.failed += 1;
            }
        }
    }
    report
}
