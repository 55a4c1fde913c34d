//! # Store Client
//!
//! Graph-store collaborator over the TypeDB HTTP API.
//!
//! ## Contract
//!
//! - `read(query)`: run in a read transaction, return concept rows
//! - `write(query)`: run in a write transaction and commit, as one batch
//!
//! Everything else (schema introspection, document fetch and ingestion,
//! submitting compiled statements) is built on those two calls.

use crate::client::{ClientError, HttpClient};
use crate::config::StoreConfig;
use serde_json::{Map, Value, json};
use typeline_core::primitives::{DOCUMENT_TEXT, DOCUMENT_TITLE, DOCUMENT_TYPE};
use typeline_core::{
    OwnsEdge, PlaysEdge, RelatesEdge, SchemaSnapshot, Statement, TypeLabel, quote, render,
};

/// One answer row: variable name to concept.
pub type Row = Map<String, Value>;

// =============================================================================
// INTROSPECTION QUERIES
// =============================================================================

const ENTITY_QUERY: &str = "match entity $x;";
const ATTRIBUTE_QUERY: &str = "match attribute $x;";
const RELATION_QUERY: &str = "match relation $x;";
const OWNS_QUERY: &str = "match $x owns $y; not { $x sub! $z; $z owns $y; };";
const RELATES_QUERY: &str = "match $x relates $y; not { $x sub! $z; $z relates $y; };";
const PLAYS_QUERY: &str = "match $x plays $y; not { $x sub! $z; $z plays $y; };";

#[derive(Clone, Copy)]
enum TransactionType {
    Read,
    Write,
}

impl TransactionType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Authenticated client bound to one database.
#[derive(Clone)]
pub struct StoreClient {
    http: HttpClient,
    database: String,
}

impl StoreClient {
    /// Sign in and return a client ready for queries.
    pub async fn connect(config: &StoreConfig) -> Result<Self, ClientError> {
        let mut http = HttpClient::new(&config.address);
        let reply = http
            .post_json(
                "/v1/signin",
                &json!({ "username": config.username, "password": config.password }),
            )
            .await?;
        let token = reply
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::ParseError("signin reply has no token".to_string()))?;
        http.set_bearer(token.to_string());

        tracing::debug!(address = %http.base_url(), database = %config.database, "Store session opened");
        Ok(Self {
            http,
            database: config.database.clone(),
        })
    }

    /// Run `query` in a read transaction.
    pub async fn read(&self, query: &str) -> Result<Vec<Row>, ClientError> {
        let reply = self.query(TransactionType::Read, query).await?;
        rows_from_reply(&reply)
    }

    /// Run `query` in a write transaction and commit it.
    pub async fn write(&self, query: &str) -> Result<(), ClientError> {
        self.query(TransactionType::Write, query).await.map(drop)
    }

    async fn query(&self, tx: TransactionType, query: &str) -> Result<Value, ClientError> {
        let body = json!({
            "databaseName": self.database,
            "transactionType": tx.as_str(),
            "query": query,
            "commit": matches!(tx, TransactionType::Write),
        });
        self.http.post_json("/v1/query", &body).await
    }

    /// Introspect the six schema relations.
    pub async fn fetch_schema(&self) -> Result<SchemaSnapshot, ClientError> {
        let labels = |rows: Vec<Row>| -> Result<Vec<TypeLabel>, ClientError> {
            rows.iter()
                .map(|r| label_of(r, "x").map(TypeLabel::new))
                .collect()
        };
        let pairs = |rows: Vec<Row>| -> Result<Vec<(String, String)>, ClientError> {
            rows.iter()
                .map(|r| Ok((label_of(r, "x")?, role_name(&label_of(r, "y")?).to_string())))
                .collect()
        };

        let entities = labels(self.read(ENTITY_QUERY).await?)?;
        let attributes = labels(self.read(ATTRIBUTE_QUERY).await?)?;
        let relations = labels(self.read(RELATION_QUERY).await?)?;
        let owns = pairs(self.read(OWNS_QUERY).await?)?
            .into_iter()
            .map(|(owner, attribute)| OwnsEdge::new(owner, attribute))
            .collect();
        let relates = pairs(self.read(RELATES_QUERY).await?)?
            .into_iter()
            .map(|(relation, role)| RelatesEdge::new(relation, role))
            .collect();
        let plays = pairs(self.read(PLAYS_QUERY).await?)?
            .into_iter()
            .map(|(player, role)| PlaysEdge::new(player, role))
            .collect();

        Ok(SchemaSnapshot {
            entities,
            attributes,
            relations,
            owns,
            relates,
            plays,
        })
    }

    /// Body text of the document titled `title`, if stored.
    pub async fn fetch_document(&self, title: &str) -> Result<Option<String>, ClientError> {
        let rows = self.read(&document_query(title)).await?;
        rows.first().map(|r| value_of(r, "text")).transpose()
    }

    /// Insert one document.
    pub async fn insert_document(&self, title: &str, text: &str) -> Result<(), ClientError> {
        self.write(&document_insert(title, text)).await
    }

    /// Submit compiled statements as one write transaction.
    pub async fn submit(&self, statements: &[Statement]) -> Result<(), ClientError> {
        if statements.is_empty() {
            return Ok(());
        }
        self.write(&render(statements)).await
    }
}

// =============================================================================
// QUERY TEXT & ROW DECODING
// =============================================================================

fn document_query(title: &str) -> String {
    format!(
        "match $doc isa {DOCUMENT_TYPE}, has {DOCUMENT_TITLE} {}, has {DOCUMENT_TEXT} $text;",
        quote(title)
    )
}

fn document_insert(title: &str, text: &str) -> String {
    format!(
        "insert $doc isa {DOCUMENT_TYPE}, has {DOCUMENT_TITLE} {}, has {DOCUMENT_TEXT} {};",
        quote(title),
        quote(text)
    )
}

/// Concept rows of a query reply. Replies without rows yield none.
fn rows_from_reply(reply: &Value) -> Result<Vec<Row>, ClientError> {
    let Some(answers) = reply.get("answers") else {
        return Ok(Vec::new());
    };
    let answers = answers
        .as_array()
        .ok_or_else(|| ClientError::ParseError("answers is not an array".to_string()))?;
    answers
        .iter()
        .map(|answer| {
            answer
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| ClientError::ParseError("answer row has no data".to_string()))
        })
        .collect()
}

/// Label of the type bound to `var`.
fn label_of(row: &Row, var: &str) -> Result<String, ClientError> {
    row.get(var)
        .and_then(|c| c.get("label"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError(format!("${var} is not a labelled type")))
}

/// String value of the attribute bound to `var`.
fn value_of(row: &Row, var: &str) -> Result<String, ClientError> {
    row.get(var)
        .and_then(|c| c.get("value"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClientError::ParseError(format!("${var} is not a string attribute")))
}

/// `parentage:parent` -> `parent`.
fn role_name(scoped: &str) -> &str {
    scoped.rsplit(':').next().unwrap_or(scoped)
}

// =============================================================================
// TESTS
// =============================================================================
