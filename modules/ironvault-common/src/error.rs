use thiserror::Error;

/// Why a loan record was rejected before scoring. The `Display` output is the
/// reason string returned to API callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {0} must be numeric")]
    NotNumeric(&'static str),

    #[error("Credit score must be between 300 and 850")]
    CreditScoreOutOfRange,

    #[error("Debt-to-income ratio must be between 0 and 1")]
    DebtToIncomeOutOfRange,

    #[error("Age must be between 18 and 100")]
    AgeOutOfRange,

    #[error("Existing loans must be between 0 and 10")]
    ExistingLoansOutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Model produced a non-finite score: {0}")]
    NonFinite(f64),

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}
