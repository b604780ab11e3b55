//! Persistence gateway: the only surface the engine uses to reach the
//! external record store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use supabase_client::SupabaseClient;

/// Insert/select access to a table-oriented record store.
///
/// `insert` returns the acknowledged rows. An `Err` and an empty `Ok` both
/// mean the write did not land; callers treat them identically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>>;

    async fn select(&self, table: &str, columns: &str, limit: usize) -> Result<Vec<Value>>;
}

// ---------------------------------------------------------------------------
// Supabase adapter (production)
// ---------------------------------------------------------------------------

#[async_trait]
impl RecordStore for SupabaseClient {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        Ok(SupabaseClient::insert(self, table, &row).await?)
    }

    async fn select(&self, table: &str, columns: &str, limit: usize) -> Result<Vec<Value>> {
        Ok(SupabaseClient::select(self, table, columns, limit).await?)
    }
}

// ---------------------------------------------------------------------------
// TimeoutStore: bounds every call on the wrapped store
// ---------------------------------------------------------------------------

pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for TimeoutStore<S> {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        match tokio::time::timeout(self.timeout, self.inner.insert(table, row)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("insert into {table} timed out after {:?}", self.timeout),
        }
    }

    async fn select(&self, table: &str, columns: &str, limit: usize) -> Result<Vec<Value>> {
        match tokio::time::timeout(self.timeout, self.inner.select(table, columns, limit)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("select from {table} timed out after {:?}", self.timeout),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore (tests, local runs without a database)
// ---------------------------------------------------------------------------

/// In-memory table store. Every insert is acknowledged with the row itself.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows written to `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(vec![row])
    }

    async fn select(&self, table: &str, _columns: &str, limit: usize) -> Result<Vec<Value>> {
        Ok(self.rows(table).into_iter().take(limit).collect())
    }
}

// ---------------------------------------------------------------------------
// Arc<S> blanket: lets tests keep a handle to the store for assertions
// ---------------------------------------------------------------------------

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        (**self).insert(table, row).await
    }

    async fn select(&self, table: &str, columns: &str, limit: usize) -> Result<Vec<Value>> {
        (**self).select(table, columns, limit).await
    }
}
