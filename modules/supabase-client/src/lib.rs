pub mod error;

pub use error::{Result, SupabaseError};

use serde::Serialize;
use serde_json::Value;

const REST_PATH: &str = "rest/v1";

/// Thin client over the PostgREST endpoints Supabase exposes under `/rest/v1`.
///
/// The underlying `reqwest::Client` pools connections and is safe to share
/// across tasks; clone the client rather than wrapping it in a lock.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH, table)
    }

    /// Insert one row. Returns the rows PostgREST echoes back; an empty
    /// vector means the write was not acknowledged.
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<Vec<Value>> {
        let resp = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let rows = read_rows(table, resp).await?;
        tracing::debug!(table, rows = rows.len(), "Supabase insert acknowledged");
        Ok(rows)
    }

    /// `SELECT <columns> FROM <table> LIMIT <limit>`.
    pub async fn select(&self, table: &str, columns: &str, limit: usize) -> Result<Vec<Value>> {
        let resp = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("select", columns.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        read_rows(table, resp).await
    }
}

async fn read_rows(table: &str, resp: reqwest::Response) -> Result<Vec<Value>> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(status_error(table, status, message));
    }

    let body = resp.text().await?;
    parse_rows(&body)
}

fn status_error(table: &str, status: reqwest::StatusCode, message: String) -> SupabaseError {
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            SupabaseError::Unauthorized {
                table: table.to_string(),
                status: status.as_u16(),
            }
        }
        _ => SupabaseError::Api {
            table: table.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}
