//! Scripted record stores for engine tests. No database required.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use ironvault_common::RawLoan;
use ironvault_engine::{RecordStore, RetryPolicy};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ack,
    Empty,
    Fail,
}

type Script = Box<dyn Fn(&str, &Value, usize) -> Outcome + Send + Sync>;

/// Store whose answer to each insert is decided by a script.
///
/// The script sees the table, the row, and how many times a row with the
/// same `event` (logs) or the same table (everything else) has been tried,
/// counting the current call.
pub struct ScriptedStore {
    script: Script,
    attempts: Mutex<Vec<(String, Value)>>,
    stored: Mutex<Vec<(String, Value)>>,
    select_fails: bool,
}

impl ScriptedStore {
    pub fn new(script: impl Fn(&str, &Value, usize) -> Outcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            attempts: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
            select_fails: false,
        })
    }

    pub fn always(outcome: Outcome) -> Arc<Self> {
        Self::new(move |_, _, _| outcome)
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(|_, _, _| Outcome::Fail),
            attempts: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
            select_fails: true,
        })
    }

    /// Insert attempts on a table, acknowledged or not.
    pub fn attempts(&self, table: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .count()
    }

    /// Insert attempts on the logs table for a given event name.
    pub fn log_attempts(&self, event: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(table, row)| table == "logs" && row["event"] == event)
            .count()
    }

    /// Events that were acknowledged, in write order.
    pub fn stored_events(&self) -> Vec<String> {
        self.stored_rows("logs")
            .iter()
            .map(|row| row["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn stored_logs(&self) -> Vec<Value> {
        self.stored_rows("logs")
    }

    pub fn stored_rows(&self, table: &str) -> Vec<Value> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>> {
        let nth = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push((table.to_string(), row.clone()));
            attempts
                .iter()
                .filter(|(t, r)| {
                    t == table && (table != "logs" || r["event"] == row["event"])
                })
                .count()
        };

        match (self.script)(table, &row, nth) {
            Outcome::Ack => {
                self.stored
                    .lock()
                    .unwrap()
                    .push((table.to_string(), row.clone()));
                Ok(vec![row])
            }
            Outcome::Empty => Ok(vec![]),
            Outcome::Fail => anyhow::bail!("connection refused"),
        }
    }

    async fn select(&self, table: &str, _columns: &str, limit: usize) -> Result<Vec<Value>> {
        if self.select_fails {
            anyhow::bail!("connection refused");
        }
        Ok(self.stored_rows(table).into_iter().take(limit).collect())
    }
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        retry_delay: Duration::ZERO,
        escalation_cap: 3,
        fallback_capacity: 64,
    }
}

pub fn valid_loan() -> RawLoan {
    match json!({
        "age": 30,
        "income": 50000,
        "loan_amount": 10000,
        "credit_score": 700,
        "debt_to_income_ratio": 0.2,
        "employment_years": 5,
        "savings_balance": 20000,
        "existing_loans": 1
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub fn loan_with(field: &str, value: Value) -> RawLoan {
    let mut raw = valid_loan();
    raw.insert(field.to_string(), value);
    raw
}
