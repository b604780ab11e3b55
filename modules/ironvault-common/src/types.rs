use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Untyped loan payload as received from a request body or a CSV row.
pub type RawLoan = serde_json::Map<String, Value>;

/// Required loan fields, in the order presence is checked.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "age",
    "income",
    "loan_amount",
    "credit_score",
    "debt_to_income_ratio",
    "employment_years",
    "savings_balance",
    "existing_loans",
];

/// Serialize whole-valued floats as JSON integers so integer columns accept them.
pub fn compact_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

// --- Loan record ---

/// A loan application that passed validation. Build one with [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(serialize_with = "compact_number")]
    pub age: f64,
    #[serde(serialize_with = "compact_number")]
    pub income: f64,
    #[serde(serialize_with = "compact_number")]
    pub loan_amount: f64,
    #[serde(serialize_with = "compact_number")]
    pub credit_score: f64,
    #[serde(serialize_with = "compact_number")]
    pub debt_to_income_ratio: f64,
    #[serde(serialize_with = "compact_number")]
    pub employment_years: f64,
    #[serde(serialize_with = "compact_number")]
    pub savings_balance: f64,
    #[serde(serialize_with = "compact_number")]
    pub existing_loans: f64,
}

#[cfg(test)]
impl LoanRecord {
    pub fn to_raw(&self) -> RawLoan {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawLoan::new(),
        }
    }
}

// --- Risk assessment ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Approved,
    Denied,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Approved => write!(f, "Approved"),
            ApprovalStatus::Denied => write!(f, "Denied"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub approval_status: ApprovalStatus,
}

// --- Persisted loan ---

/// Row written to the loans table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: LoanRecord,
    pub risk_score: f64,
    pub approval_status: ApprovalStatus,
}

impl LoanEntry {
    pub fn new(record: LoanRecord, assessment: RiskAssessment) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            risk_score: assessment.risk_score,
            approval_status: assessment.approval_status,
        }
    }
}

/// What `/loan` and `/batch` return for each stored application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanSummary {
    pub id: Uuid,
    #[serde(serialize_with = "compact_number")]
    pub loan_amount: f64,
    #[serde(serialize_with = "compact_number")]
    pub credit_score: f64,
    #[serde(serialize_with = "compact_number")]
    pub income: f64,
    pub risk_score: f64,
    pub approval_status: ApprovalStatus,
}

impl From<&LoanEntry> for LoanSummary {
    fn from(entry: &LoanEntry) -> Self {
        Self {
            id: entry.id,
            loan_amount: entry.record.loan_amount,
            credit_score: entry.record.credit_score,
            income: entry.record.income,
            risk_score: entry.risk_score,
            approval_status: entry.approval_status,
        }
    }
}

// --- Event log ---

/// Row written to the logs table. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub status: String,
    pub details: Value,
}

impl LogEntry {
    pub fn new(event: impl Into<String>, status: impl Into<String>, details: Value) -> Self {
        let details = match details {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event: event.into(),
            status: status.into(),
            details,
        }
    }
}
