//! Durable event log with bounded retries.
//!
//! Every event is appended to the logs table with up to `max_attempts` tries.
//! Failed tries emit a `supabase_write_retry` event and exhausting all tries
//! emits `supabase_write_failed`. Those secondary events get exactly one
//! write attempt and never escalate further: if they fail they land in the
//! local fallback buffer. Once `escalation_cap` events in a row have exhausted
//! their retries the logger stops emitting secondary events altogether until
//! a primary write succeeds again.
//!
//! `log` never returns an error. Observability must not block the caller.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ironvault_common::LogEntry;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::store::RecordStore;

pub const RETRY_EVENT: &str = "supabase_write_retry";
pub const FAILED_EVENT: &str = "supabase_write_failed";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub escalation_cap: u32,
    pub fallback_capacity: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
            escalation_cap: 3,
            fallback_capacity: 256,
        }
    }
}

pub struct EventLogger {
    store: Arc<dyn RecordStore>,
    table: String,
    policy: RetryPolicy,
    consecutive_exhausted: AtomicU32,
    fallback: Mutex<VecDeque<LogEntry>>,
}

impl EventLogger {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            policy: RetryPolicy::default(),
            consecutive_exhausted: AtomicU32::new(0),
            fallback: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn log(&self, event: &str, status: &str, details: Value) {
        let entry = LogEntry::new(event, status, details);
        debug!(event, status, details = %entry.details, "event");

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.append(&entry).await {
                Ok(()) => {
                    self.consecutive_exhausted.store(0, Ordering::SeqCst);
                    return;
                }
                Err(reason) => {
                    warn!(event, attempt, error = %reason, "Event log write failed");
                    if !self.is_degraded() {
                        let retry = LogEntry::new(
                            RETRY_EVENT,
                            "failed",
                            json!({ "attempt": attempt, "event": event, "error": reason }),
                        );
                        self.append_once(retry).await;
                    }
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
            }
        }

        let previously = self.consecutive_exhausted.fetch_add(1, Ordering::SeqCst);
        if previously < self.policy.escalation_cap {
            let failed = LogEntry::new(
                FAILED_EVENT,
                "error",
                json!({
                    "message": format!("Failed to write log after {max_attempts} attempts"),
                    "event": event,
                }),
            );
            self.append_once(failed).await;
        }
        self.keep_locally(entry, "retries exhausted");
    }

    /// True while secondary events are suppressed.
    pub fn is_degraded(&self) -> bool {
        self.consecutive_exhausted.load(Ordering::SeqCst) >= self.policy.escalation_cap
    }

    /// Entries that never reached the store, oldest first.
    pub fn fallback_entries(&self) -> Vec<LogEntry> {
        match self.fallback.lock() {
            Ok(buffer) => buffer.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    async fn append(&self, entry: &LogEntry) -> Result<(), String> {
        let row = serde_json::to_value(entry).map_err(|e| e.to_string())?;
        match self.store.insert(&self.table, row).await {
            Ok(ack) if !ack.is_empty() => Ok(()),
            Ok(_) => Err("No data returned".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Single attempt, no retries, no further events.
    async fn append_once(&self, entry: LogEntry) {
        if let Err(reason) = self.append(&entry).await {
            self.keep_locally(entry, &reason);
        }
    }

    fn keep_locally(&self, entry: LogEntry, reason: &str) {
        error!(
            event = %entry.event,
            status = %entry.status,
            id = %entry.id,
            error = reason,
            "Event not persisted, kept in local fallback"
        );
        let mut buffer = match self.fallback.lock() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.policy.fallback_capacity == 0 {
            return;
        }
        while buffer.len() >= self.policy.fallback_capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }
}
