//! # Query Generation
//!
//! Translates a natural-language question into a TypeQL `match` query:
//!
//! ```text
//! question -> prompt ({schema}, {question}) -> model -> extract_typeql
//! ```
//!
//! Prompts end on an open `match` clause, so the model usually continues
//! the query body and stops at a closing fence.

use crate::model::ModelBackend;
use crate::pipeline::SCHEMA_PLACEHOLDER;
use typeline_core::TypelineError;

/// Placeholder replaced by the question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Default completion budget of a query.
pub const DEFAULT_QUERY_TOKENS: u32 = 256;

const FENCE: &str = "```";
const TYPEQL_FENCE: &str = "```typeql";

/// Fill a question prompt template.
pub fn fill_question_prompt(template: &str, schema: &str, question: &str) -> String {
    template
        .replace(SCHEMA_PLACEHOLDER, schema)
        .replace(QUESTION_PLACEHOLDER, question)
}

/// Pull the query out of a model response.
///
/// Text after the last ```` ```typeql ```` fence is preferred, and anything
/// from the next fence on is dropped. The result always starts with `match`.
pub fn extract_typeql(response: &str) -> String {
    let mut text = response.trim();
    if let Some(start) = text.rfind(TYPEQL_FENCE) {
        text = &text[start + TYPEQL_FENCE.len()..];
    }
    if let Some(end) = text.find(FENCE) {
        text = &text[..end];
    }
    let body = text.trim();
    if body.starts_with("match") {
        body.to_string()
    } else {
        format!("match\n{body}")
    }
}

/// Ask the model for a query answering `question`.
pub async fn generate_query(
    model: &ModelBackend,
    schema: &str,
    template: &str,
    question: &str,
    max_tokens: u32,
) -> Result<String, TypelineError> {
    let prompt = fill_question_prompt(template, schema, question);
    tracing::debug!(chars = prompt.len(), model = %model.describe(), "Generating query");
    let response = model.generate(&prompt, max_tokens).await?;
    Ok(extract_typeql(&response))
}
