//! Loan ingestion engine: record-store gateway, retrying event logger,
//! CSV batch input and the validate → score → persist pipeline.

pub mod csv_input;
pub mod error;
pub mod logger;
pub mod pipeline;
pub mod store;

pub use error::{InputFormatError, LoanError};
pub use logger::{EventLogger, RetryPolicy};
pub use pipeline::{BatchReport, HealthReport, LoanPipeline, RejectedRow, Stage};
pub use store::{MemoryStore, RecordStore, TimeoutStore};
