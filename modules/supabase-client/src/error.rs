use thiserror::Error;

pub type Result<T> = std::result::Result<T, SupabaseError>;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Network error: {0}")]
    Network(String),

    /// 401/403 from PostgREST: bad key or a row-level security denial.
    #[error("Unauthorized on table {table} (status {status})")]
    Unauthorized { table: String, status: u16 },

    #[error("API error on table {table} (status {status}): {message}")]
    Api {
        table: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SupabaseError {
    fn from(err: reqwest::Error) -> Self {
        SupabaseError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SupabaseError {
    fn from(err: serde_json::Error) -> Self {
        SupabaseError::Parse(err.to_string())
    }
}
