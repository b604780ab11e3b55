use crate::error::ScoringError;
use crate::types::{ApprovalStatus, LoanRecord, RiskAssessment};

/// Scores strictly above this are approved.
pub const APPROVAL_THRESHOLD: f64 = 50.0;

/// A risk model maps a validated record to a score and decision.
///
/// Implementations must be deterministic for a given record. Callers hold a
/// `dyn RiskModel`, so an alternative model can replace [`RuleBasedModel`]
/// without touching the pipeline.
pub trait RiskModel: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, record: &LoanRecord) -> Result<RiskAssessment, ScoringError>;

    /// Reported by `/health`.
    fn is_available(&self) -> bool {
        true
    }
}

impl RiskAssessment {
    /// Clamp a raw score into [0, 100] and derive the decision.
    pub fn from_raw_score(raw: f64) -> Result<Self, ScoringError> {
        if !raw.is_finite() {
            return Err(ScoringError::NonFinite(raw));
        }
        let risk_score = raw.clamp(0.0, 100.0);
        let approval_status = if risk_score > APPROVAL_THRESHOLD {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Denied
        };
        Ok(Self {
            risk_score,
            approval_status,
        })
    }
}

/// Fixed linear rule: higher credit score, debt ratio, loan count, loan size and
/// age pull the score down; income, savings and tenure push it up.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedModel;

impl RuleBasedModel {
    pub fn raw_score(record: &LoanRecord) -> f64 {
        100.0 - record.credit_score / 10.0 + record.income / 10_000.0
            - record.loan_amount / 20_000.0
            - record.debt_to_income_ratio * 20.0
            + record.savings_balance / 5_000.0
            - record.existing_loans * 5.0
            + record.employment_years * 2.0
            - record.age / 5.0
    }
}

impl RiskModel for RuleBasedModel {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn score(&self, record: &LoanRecord) -> Result<RiskAssessment, ScoringError> {
        RiskAssessment::from_raw_score(Self::raw_score(record))
    }
}
