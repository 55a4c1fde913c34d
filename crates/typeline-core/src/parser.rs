//! # Line Parser
//!
//! Turns extraction-line text into `ExtractionLine` directives.
//!
//! - Blank lines and `#` comments are skipped
//! - Every other line must be a known directive with the right field count
//! - Malformed lines are rejected with their 1-based line number, never skipped

use crate::primitives::{MAX_LINE_LENGTH, MAX_LINES};
use crate::tokenizer::tokenize;
use crate::types::{ExtractionLine, TypelineError};

/// Parser for the extraction-line format.
///
/// ```text
/// source <title>
/// entity <label>
/// property <entity-label> <property-label> <value>
/// relation <entity-label-1> <relation-label> <entity-label-2>
/// ```
pub struct LineParser;

impl LineParser {
    /// Parse one line. Returns `Ok(None)` for blank and comment lines.
    ///
    /// `source` takes the rest of the line verbatim as its title (so titles
    /// may contain apostrophes); the other directives are tokenized with
    /// shell-style quoting.
    pub fn parse_line(
        line_no: usize,
        text: &str,
    ) -> Result<Option<ExtractionLine>, TypelineError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        if trimmed.len() > MAX_LINE_LENGTH {
            return Err(TypelineError::malformed(
                line_no,
                format!("line exceeds {MAX_LINE_LENGTH} bytes"),
            ));
        }

        let (head, rest) = trimmed
            .split_once(char::is_whitespace)
            .unwrap_or((trimmed, ""));
        if head == "source" {
            let title = rest.trim().trim_matches('"').trim();
            if title.is_empty() {
                return Err(TypelineError::malformed(line_no, "source expects a title"));
            }
            return Ok(Some(ExtractionLine::Source {
                title: title.to_string(),
            }));
        }

        let mut tokens = tokenize(trimmed)
            .map_err(|e| TypelineError::malformed(line_no, e.to_string()))?
            .into_iter();
        let keyword = tokens.next().unwrap_or_default();
        let fields: Vec<String> = tokens.collect();

        let line = match keyword.as_str() {
            "entity" => {
                let [label] = exact_fields(line_no, "entity", fields)?;
                if label.is_empty() {
                    return Err(TypelineError::malformed(
                        line_no,
                        "entity label must be non-empty",
                    ));
                }
                ExtractionLine::Entity { label }
            }
            "property" => {
                let [entity, property, value] = exact_fields(line_no, "property", fields)?;
                if entity.is_empty() || property.is_empty() {
                    return Err(TypelineError::malformed(
                        line_no,
                        "property labels must be non-empty",
                    ));
                }
                ExtractionLine::Property {
                    entity,
                    property,
                    value,
                }
            }
            "relation" => {
                let [from, relation, to] = exact_fields(line_no, "relation", fields)?;
                if from.is_empty() || relation.is_empty() || to.is_empty() {
                    return Err(TypelineError::malformed(
                        line_no,
                        "relation labels must be non-empty",
                    ));
                }
                ExtractionLine::Relation { from, relation, to }
            }
            other => {
                return Err(TypelineError::malformed(
                    line_no,
                    format!("unknown directive '{other}'"),
                ));
            }
        };
        Ok(Some(line))
    }

    /// Parse a whole document, failing on the first malformed line.
    ///
    /// Nothing is returned for a document with any malformed line, so a
    /// caller never compiles half of an input unit.
    pub fn parse_document(text: &str) -> Result<Vec<ExtractionLine>, TypelineError> {
        let mut lines = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line_no > MAX_LINES {
                return Err(TypelineError::malformed(
                    line_no,
                    format!("document exceeds {MAX_LINES} lines"),
                ));
            }
            if let Some(line) = Self::parse_line(line_no, raw)? {
                lines.push(line);
            }
        }
        Ok(lines)
    }
}

fn exact_fields<const N: usize>(
    line_no: usize,
    keyword: &str,
    fields: Vec<String>,
) -> Result<[String; N], TypelineError> {
    let got = fields.len();
    <[String; N]>::try_from(fields).map_err(|_| {
        TypelineError::malformed(
            line_no,
            format!("{keyword} expects {N} field(s), got {got}"),
        )
    })
}

// =============================================================================
// TESTS
// =============================================================================
