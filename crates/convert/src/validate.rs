//! Structural gate between a converter's output and the rest of the system.
//!
//! A conversion result is accepted or rejected wholesale: one malformed
//! record would poison downstream deduplication, so partial acceptance is
//! not an option. Calendar-date validity and the income/expense tag are
//! already unrepresentable-invalid (`NaiveDate`, `TransactionType`); the
//! value-level checks live here.

use thiserror::Error;

use crate::types::ConversionResult;

#[derive(Debug, Error)]
#[error("conversion result failed validation: {}", .violations.join("; "))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

/// Check a conversion result against the shared schema. Returns every
/// violation at once, not just the first.
pub fn validate(result: &ConversionResult) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if result.source.trim().is_empty() {
        violations.push("source must not be empty".to_string());
    }

    for (i, tx) in result.transactions.iter().enumerate() {
        if tx.amount <= 0 {
            violations.push(format!(
                "transactions[{i}]: amount must be positive, got {}",
                tx.amount
            ));
        }
        if tx.description.trim().is_empty() {
            violations.push(format!("transactions[{i}]: description must not be empty"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}
