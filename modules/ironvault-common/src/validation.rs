//! Presence, numeric coercion and range checks for loan payloads.
//!
//! Checks run in a fixed order: every required field must be present, then
//! every field must be numeric, then ranges are checked for credit score,
//! debt-to-income ratio, age and existing loans. The first failure wins.

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{LoanRecord, RawLoan, REQUIRED_FIELDS};

/// Validate a raw payload. `Ok` carries the typed record; `Err` carries the
/// first violated rule. Extra keys are ignored.
pub fn validate(raw: &RawLoan) -> Result<LoanRecord, ValidationError> {
    for field in REQUIRED_FIELDS {
        if is_missing(raw.get(field)) {
            return Err(ValidationError::MissingField(field));
        }
    }

    let mut values = [0.0_f64; REQUIRED_FIELDS.len()];
    for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
        *slot = raw
            .get(field)
            .and_then(coerce_number)
            .ok_or(ValidationError::NotNumeric(field))?;
    }

    let [age, income, loan_amount, credit_score, debt_to_income_ratio, employment_years, savings_balance, existing_loans] =
        values;
    let record = LoanRecord {
        age,
        income,
        loan_amount,
        credit_score,
        debt_to_income_ratio,
        employment_years,
        savings_balance,
        existing_loans,
    };

    check_ranges(&record)?;
    Ok(record)
}

fn check_ranges(record: &LoanRecord) -> Result<(), ValidationError> {
    if !(300.0..=850.0).contains(&record.credit_score) {
        return Err(ValidationError::CreditScoreOutOfRange);
    }
    if !(0.0..=1.0).contains(&record.debt_to_income_ratio) {
        return Err(ValidationError::DebtToIncomeOutOfRange);
    }
    if !(18.0..=100.0).contains(&record.age) {
        return Err(ValidationError::AgeOutOfRange);
    }
    if !(0.0..=10.0).contains(&record.existing_loans) {
        return Err(ValidationError::ExistingLoansOutOfRange);
    }
    Ok(())
}

/// Absent, null and blank cells all count as missing.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// JSON numbers pass through; strings (CSV cells) are trimmed and parsed.
/// Non-finite values are rejected.
fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
