//! Event logger retry and fallback behaviour.
//!
//! Run with: cargo test -p ironvault-engine --test logger_test

mod harness;

use std::time::{Duration, Instant};

use harness::{fast_policy, Outcome, ScriptedStore};
use ironvault_engine::logger::{FAILED_EVENT, RETRY_EVENT};
use ironvault_engine::{EventLogger, RetryPolicy};
use serde_json::json;

#[tokio::test]
async fn healthy_store_writes_once() {
    let store = ScriptedStore::always(Outcome::Ack);
    let logger = EventLogger::new(store.clone(), "logs").with_policy(fast_policy());

    logger.log("loan_request", "received", json!({"age": 30})).await;

    assert_eq!(store.log_attempts("loan_request"), 1);
    assert_eq!(store.stored_events(), vec!["loan_request"]);

    let row = &store.stored_logs()[0];
    assert_eq!(row["status"], "received");
    assert_eq!(row["details"]["age"], 30);
    assert!(row["id"].as_str().is_some());
    assert!(row["timestamp"].as_str().is_some());
    assert!(logger.fallback_entries().is_empty());
}

#[tokio::test]
async fn succeeds_on_third_attempt() {
    let store = ScriptedStore::new(|_, row, nth| {
        if row["event"] == "loan_request" && nth <= 2 {
            Outcome::Fail
        } else {
            Outcome::Ack
        }
    });
    let logger = EventLogger::new(store.clone(), "logs").with_policy(fast_policy());

    logger.log("loan_request", "received", json!({})).await;

    assert_eq!(store.log_attempts("loan_request"), 3);
    assert_eq!(store.log_attempts(RETRY_EVENT), 2);
    assert_eq!(store.log_attempts(FAILED_EVENT), 0);
    assert_eq!(
        store.stored_events(),
        vec![RETRY_EVENT, RETRY_EVENT, "loan_request"]
    );

    let retries = store.stored_logs();
    assert_eq!(retries[0]["details"]["attempt"], 1);
    assert_eq!(retries[1]["details"]["attempt"], 2);
    assert_eq!(retries[0]["status"], "failed");
    assert!(!logger.is_degraded());
}

#[tokio::test]
async fn empty_acknowledgment_is_a_failure() {
    let store = ScriptedStore::new(|_, row, nth| {
        if row["event"] == "model_call" && nth == 1 {
            Outcome::Empty
        } else {
            Outcome::Ack
        }
    });
    let logger = EventLogger::new(store.clone(), "logs").with_policy(fast_policy());

    logger.log("model_call", "success", json!({})).await;

    assert_eq!(store.log_attempts("model_call"), 2);
    let retry = &store.stored_logs()[0];
    assert_eq!(retry["event"], RETRY_EVENT);
    assert_eq!(retry["details"]["error"], "No data returned");
}

#[tokio::test]
async fn exhaustion_emits_one_terminal_event() {
    let store = ScriptedStore::new(|_, row, _| {
        if row["event"] == "supabase_write" {
            Outcome::Fail
        } else {
            Outcome::Ack
        }
    });
    let logger = EventLogger::new(store.clone(), "logs").with_policy(fast_policy());

    logger.log("supabase_write", "success", json!({"loan_id": "x"})).await;

    assert_eq!(store.log_attempts("supabase_write"), 3);
    assert_eq!(store.log_attempts(RETRY_EVENT), 3);
    assert_eq!(store.log_attempts(FAILED_EVENT), 1);

    let terminal = store.stored_logs().pop().unwrap();
    assert_eq!(terminal["event"], FAILED_EVENT);
    assert_eq!(terminal["status"], "error");
    assert_eq!(
        terminal["details"]["message"],
        "Failed to write log after 3 attempts"
    );

    let fallback = logger.fallback_entries();
    assert_eq!(fallback.len(), 1);
    assert_eq!(fallback[0].event, "supabase_write");
}

#[tokio::test]
async fn secondary_events_are_never_retried() {
    let store = ScriptedStore::always(Outcome::Fail);
    let logger = EventLogger::new(store.clone(), "logs").with_policy(fast_policy());

    logger.log("csv_parse", "success", json!({"rows": 4})).await;

    // Three primary tries, one try per retry event, one try for the terminal event.
    assert_eq!(store.log_attempts("csv_parse"), 3);
    assert_eq!(store.log_attempts(RETRY_EVENT), 3);
    assert_eq!(store.log_attempts(FAILED_EVENT), 1);

    let events: Vec<String> = logger
        .fallback_entries()
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(
        events,
        vec![RETRY_EVENT, RETRY_EVENT, RETRY_EVENT, FAILED_EVENT, "csv_parse"]
    );
}

#[tokio::test]
async fn sustained_outage_stops_secondary_events() {
    let store = ScriptedStore::always(Outcome::Fail);
    let logger = EventLogger::new(store.clone(), "logs").with_policy(RetryPolicy {
        escalation_cap: 1,
        ..fast_policy()
    });

    logger.log("first", "received", json!({})).await;
    assert!(logger.is_degraded());
    assert_eq!(store.log_attempts(RETRY_EVENT), 3);
    assert_eq!(store.log_attempts(FAILED_EVENT), 1);

    logger.log("second", "received", json!({})).await;
    assert_eq!(store.log_attempts("second"), 3);
    assert_eq!(store.log_attempts(RETRY_EVENT), 3);
    assert_eq!(store.log_attempts(FAILED_EVENT), 1);
}

#[tokio::test]
async fn recovery_clears_degraded_mode() {
    let store = ScriptedStore::new(|_, row, _| {
        if row["event"] == "down" {
            Outcome::Fail
        } else {
            Outcome::Ack
        }
    });
    let logger = EventLogger::new(store.clone(), "logs").with_policy(RetryPolicy {
        escalation_cap: 1,
        ..fast_policy()
    });

    logger.log("down", "received", json!({})).await;
    assert!(logger.is_degraded());

    logger.log("up", "received", json!({})).await;
    assert!(!logger.is_degraded());
}

#[tokio::test]
async fn fallback_buffer_is_bounded() {
    let store = ScriptedStore::always(Outcome::Fail);
    let logger = EventLogger::new(store.clone(), "logs").with_policy(RetryPolicy {
        escalation_cap: 0,
        fallback_capacity: 2,
        ..fast_policy()
    });

    for name in ["a", "b", "c"] {
        logger.log(name, "received", json!({})).await;
    }

    let events: Vec<String> = logger
        .fallback_entries()
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert_eq!(events, vec!["b", "c"]);
}

#[tokio::test]
async fn waits_between_attempts_only() {
    let store = ScriptedStore::always(Outcome::Fail);
    let logger = EventLogger::new(store.clone(), "logs").with_policy(RetryPolicy {
        retry_delay: Duration::from_millis(40),
        ..fast_policy()
    });

    let started = Instant::now();
    logger.log("slow", "received", json!({})).await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(80), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(120 + 500), "{elapsed:?}");
}
