//! Graph store for query analytics (Neo4j over its HTTP transaction API).
//!
//! Writes are best-effort: `QueryLogger` fires them off in the background and
//! only logs failures.

use crate::config::GraphConfig;
use crate::models::place::{StoreSuggestion, Weather};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const LOG_QUERY_STATEMENT: &str = "MERGE (c:City {name: $city}) \
     CREATE (q:Query {budget: $budget, interests: $interests, createdAt: datetime($createdAt)}) \
     MERGE (q)-[:FOR_CITY]->(c)";

const STORE_SUGGESTIONS_STATEMENT: &str = "MATCH (s:Store)-[:SELLS]->(p:Product) \
     WHERE s.city = $city AND p.category IN $categories \
     RETURN s.name AS store, p.name AS product, p.category AS category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLogEntry {
    pub city: String,
    pub budget: String,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QueryLogEntry {
    pub fn new(city: &str, budget: &str, interests: &[String]) -> Self {
        Self {
            city: city.trim().to_string(),
            budget: budget.trim().to_string(),
            interests: interests.to_vec(),
            created_at: Utc::now(),
        }
    }

    fn parameters(&self) -> Value {
        json!({
            "city": self.city,
            "budget": self.budget,
            "interests": self.interests.join(", "),
            "createdAt": self.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn log_query(&self, entry: &QueryLogEntry) -> Result<(), GraphStoreError>;

    async fn store_suggestions(
        &self,
        city: &str,
        weather: &Weather,
    ) -> Result<Vec<StoreSuggestion>, GraphStoreError>;

    async fn ping(&self) -> Result<(), GraphStoreError>;
}

#[derive(Debug)]
pub enum GraphStoreError {
    HttpError(reqwest::Error),
    ResponseError(String),
    QueryError { code: String, message: String },
}

impl fmt::Display for GraphStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphStoreError::HttpError(err) => write!(f, "Graph store request failed: {}", err),
            GraphStoreError::ResponseError(msg) => write!(f, "Graph store response error: {}", msg),
            GraphStoreError::QueryError { code, message } => {
                write!(f, "Graph store query failed ({}): {}", code, message)
            }
        }
    }
}

impl std::error::Error for GraphStoreError {}

impl From<reqwest::Error> for GraphStoreError {
    fn from(err: reqwest::Error) -> Self {
        GraphStoreError::HttpError(err)
    }
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct TransactionRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<TransactionError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<ResultRow>,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TransactionError {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct Neo4jHttpStore {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

impl Neo4jHttpStore {
    pub fn new(config: &GraphConfig) -> Result<Self, GraphStoreError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    async fn run(&self, statement: &str, parameters: Value) -> Result<Vec<Vec<Value>>, GraphStoreError> {
        let request = TransactionRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GraphStoreError::ResponseError(format!(
                "Transaction failed with status {}: {}",
                status, body
            )));
        }

        let body: TransactionResponse = response
            .json()
            .await
            .map_err(|e| GraphStoreError::ResponseError(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = body.errors.into_iter().next() {
            return Err(GraphStoreError::QueryError {
                code: err.code,
                message: err.message,
            });
        }

        Ok(body
            .results
            .into_iter()
            .next()
            .map(|result| result.data.into_iter().map(|data| data.row).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn log_query(&self, entry: &QueryLogEntry) -> Result<(), GraphStoreError> {
        self.run(LOG_QUERY_STATEMENT, entry.parameters()).await?;
        Ok(())
    }

    async fn store_suggestions(
        &self,
        city: &str,
        weather: &Weather,
    ) -> Result<Vec<StoreSuggestion>, GraphStoreError> {
        let categories = weather.categories();
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .run(
                STORE_SUGGESTIONS_STATEMENT,
                json!({ "city": city, "categories": categories }),
            )
            .await?;

        Ok(rows.iter().map(|row| suggestion_from_row(row)).collect())
    }

    async fn ping(&self) -> Result<(), GraphStoreError> {
        self.run("RETURN 1", json!({})).await?;
        Ok(())
    }
}

fn suggestion_from_row(row: &[Value]) -> StoreSuggestion {
    let column = |index: usize| {
        row.get(index)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    StoreSuggestion {
        store: column(0),
        product: column(1),
        category: column(2),
    }
}

/// One-way notifications to the graph store. The response never waits on
/// the write and never sees its outcome.
#[derive(Clone, Default)]
pub struct QueryLogger {
    store: Option<Arc<dyn GraphStore>>,
}

impl QueryLogger {
    pub fn new(store: Option<Arc<dyn GraphStore>>) -> Self {
        Self { store }
    }

    pub fn record(&self, entry: QueryLogEntry) {
        let Some(store) = self.store.clone() else {
            debug!("No graph store configured, skipping query log for {}", entry.city);
            return;
        };

        actix_web::rt::spawn(async move {
            match store.log_query(&entry).await {
                Ok(()) => info!("Logged query for {} to graph store", entry.city),
                Err(e) => error!("Graph store log error: {}", e),
            }
        });
    }
}
