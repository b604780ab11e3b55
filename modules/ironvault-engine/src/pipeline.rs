//! Validate → score → persist, for one application or a whole batch.
//!
//! Every stage is bracketed by an event-log call. Batch rows are isolated
//! from each other: a failed row is logged and skipped, never aborting the
//! rest of the batch.

use std::sync::Arc;

use futures::StreamExt;
use ironvault_common::{validate, LoanEntry, LoanRecord, LoanSummary, RawLoan, RiskModel};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::csv_input;
use crate::error::{InputFormatError, LoanError};
use crate::logger::EventLogger;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Scoring,
    Persistence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// Zero-based position of the row in the input.
    pub row: usize,
    pub stage: Stage,
    pub reason: String,
}

/// Outcome of a batch. `results` keeps the input order of surviving rows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<LoanSummary>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub db: &'static str,
    pub model: &'static str,
}

pub struct LoanPipeline {
    store: Arc<dyn RecordStore>,
    model: Arc<dyn RiskModel>,
    logger: Arc<EventLogger>,
    loans_table: String,
    concurrency: usize,
}

impl LoanPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        model: Arc<dyn RiskModel>,
        logger: Arc<EventLogger>,
        loans_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            model,
            logger,
            loans_table: loans_table.into(),
            concurrency: 1,
        }
    }

    /// Rows processed concurrently by [`Self::process_batch`]. Output order is
    /// unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn logger(&self) -> &EventLogger {
        &self.logger
    }

    /// Process one application end to end.
    pub async fn process_loan(&self, raw: RawLoan) -> Result<LoanSummary, LoanError> {
        self.logger
            .log("loan_request", "received", Value::Object(raw.clone()))
            .await;

        let record = match validate(&raw) {
            Ok(record) => record,
            Err(e) => {
                self.logger
                    .log("validation_failed", "error", json!({ "error": e.to_string() }))
                    .await;
                return Err(e.into());
            }
        };

        self.score_and_store(record).await
    }

    /// Validate, decode and process an uploaded CSV file. Input-format
    /// problems abort before any row is touched.
    pub async fn process_upload(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<BatchReport, InputFormatError> {
        self.logger
            .log("batch_request", "received", json!({ "filename": filename }))
            .await;

        if !filename.ends_with(".csv") {
            let err = InputFormatError::NotCsv;
            self.logger
                .log("batch_validation_failed", "error", json!({ "error": err.to_string() }))
                .await;
            return Err(err);
        }

        let batch = match csv_input::parse_csv(content) {
            Ok(batch) => batch,
            Err(err) => {
                let detail = match &err {
                    InputFormatError::Unparsable(detail) => detail.clone(),
                    other => other.to_string(),
                };
                self.logger
                    .log("csv_parse", "failed", json!({ "error": detail }))
                    .await;
                return Err(err);
            }
        };
        self.logger
            .log("csv_parse", "success", json!({ "rows": batch.rows.len() }))
            .await;

        let missing = batch.missing_columns();
        if !missing.is_empty() {
            self.logger
                .log(
                    "csv_validation_failed",
                    "error",
                    json!({ "missing_columns": missing }),
                )
                .await;
            return Err(InputFormatError::MissingColumns(missing));
        }

        Ok(self.process_batch(batch.rows).await)
    }

    /// Process rows independently. Failed rows are logged and reported in
    /// `rejected`; they never stop later rows.
    pub async fn process_batch(&self, rows: Vec<RawLoan>) -> BatchReport {
        let total = rows.len();
        let outcomes: Vec<(usize, Result<LoanSummary, LoanError>)> =
            futures::stream::iter(rows.into_iter().enumerate())
                .map(|(index, raw)| async move { (index, self.process_row(raw).await) })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut report = BatchReport::default();
        for (row, outcome) in outcomes {
            match outcome {
                Ok(summary) => report.results.push(summary),
                Err(e) => report.rejected.push(RejectedRow {
                    row,
                    stage: e.stage(),
                    reason: e.to_string(),
                }),
            }
        }

        info!(
            rows = total,
            stored = report.results.len(),
            skipped = report.rejected.len(),
            "Batch processed"
        );
        self.logger
            .log(
                "batch_processed",
                "completed",
                json!({
                    "rows": total,
                    "stored": report.results.len(),
                    "skipped": report.rejected.len(),
                }),
            )
            .await;

        report
    }

    /// Probe the store with a one-row select and report model availability.
    pub async fn check_health(&self) -> HealthReport {
        let db = match self.store.select(&self.loans_table, "id", 1).await {
            Ok(_) => "connected",
            Err(e) => {
                self.logger
                    .log("health_check_db", "failed", json!({ "error": e.to_string() }))
                    .await;
                "disconnected"
            }
        };
        let model = if self.model.is_available() {
            "available"
        } else {
            "unavailable"
        };
        let status = if db == "connected" && model == "available" {
            "ok"
        } else {
            "error"
        };

        self.logger
            .log(
                "health_check",
                "completed",
                json!({ "status": status, "db": db, "model": model }),
            )
            .await;

        HealthReport { status, db, model }
    }

    async fn process_row(&self, raw: RawLoan) -> Result<LoanSummary, LoanError> {
        let record = match validate(&raw) {
            Ok(record) => record,
            Err(e) => {
                self.logger
                    .log(
                        "row_validation_failed",
                        "error",
                        json!({ "error": e.to_string(), "row": raw }),
                    )
                    .await;
                return Err(e.into());
            }
        };

        self.score_and_store(record).await
    }

    async fn score_and_store(&self, record: LoanRecord) -> Result<LoanSummary, LoanError> {
        let assessment = match self.model.score(&record) {
            Ok(assessment) => {
                debug!(
                    model = self.model.name(),
                    risk_score = assessment.risk_score,
                    decision = %assessment.approval_status,
                    "Loan scored"
                );
                self.logger
                    .log(
                        "model_call",
                        "success",
                        json!({
                            "model": self.model.name(),
                            "risk_score": assessment.risk_score,
                            "approval_status": assessment.approval_status,
                        }),
                    )
                    .await;
                assessment
            }
            Err(e) => {
                self.logger
                    .log(
                        "model_call",
                        "failed",
                        json!({ "model": self.model.name(), "error": e.to_string() }),
                    )
                    .await;
                return Err(e.into());
            }
        };

        let entry = LoanEntry::new(record, assessment);
        if let Err(reason) = self.persist(&entry).await {
            self.logger
                .log("supabase_write", "failed", json!({ "error": reason }))
                .await;
            return Err(LoanError::Persistence(reason));
        }
        self.logger
            .log("supabase_write", "success", json!({ "loan_id": entry.id }))
            .await;

        Ok(LoanSummary::from(&entry))
    }

    /// One attempt. A thrown error and an empty acknowledgment are the same
    /// failure.
    async fn persist(&self, entry: &LoanEntry) -> Result<(), String> {
        let row = serde_json::to_value(entry).map_err(|e| e.to_string())?;
        match self.store.insert(&self.loans_table, row).await {
            Ok(ack) if !ack.is_empty() => Ok(()),
            Ok(_) => Err("No data returned from Supabase".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}
