use ironvault_common::{ScoringError, ValidationError};
use thiserror::Error;

use crate::pipeline::Stage;

/// Why a single loan application did not make it into the store.
#[derive(Error, Debug)]
pub enum LoanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Model prediction failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Failed to store loan data: {0}")]
    Persistence(String),
}

impl LoanError {
    pub fn stage(&self) -> Stage {
        match self {
            LoanError::Validation(_) => Stage::Validation,
            LoanError::Scoring(_) => Stage::Scoring,
            LoanError::Persistence(_) => Stage::Persistence,
        }
    }
}

/// Batch-level input problems. Any of these aborts the upload before a
/// single row is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputFormatError {
    #[error("Missing file field")]
    MissingFile,

    #[error("File must be a CSV")]
    NotCsv,

    #[error("Failed to parse CSV")]
    Unparsable(String),

    #[error("Missing columns: {}", column_list(.0))]
    MissingColumns(Vec<String>),
}

/// Renders `['age', 'income']`.
fn column_list(columns: &[String]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_names() {
        let err = InputFormatError::MissingColumns(vec!["age".into(), "income".into()]);
        assert_eq!(err.to_string(), "Missing columns: ['age', 'income']");
    }

    #[test]
    fn validation_error_message_is_passed_through() {
        let err = LoanError::from(ValidationError::MissingField("age"));
        assert_eq!(err.to_string(), "Missing required field: age");
        assert_eq!(err.stage(), Stage::Validation);
    }
}
