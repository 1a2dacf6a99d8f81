use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::Month;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

/// Institution-agnostic output of a statement converter. Ephemeral: consumed
/// by validation and the ingest pipeline, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    /// Minor currency units (agorot), strictly positive once validated.
    pub amount: i64,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Persisted ledger entry. `id` is a content hash and immutable once
/// assigned; `category_id` may only be changed by the classifier while
/// `category_manual` is false, or by an explicit user edit which sets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: i64,
    pub description: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category_id: Option<String>,
    pub category_manual: bool,
}

impl Transaction {
    /// The month partition this transaction belongs to.
    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
}

/// User-managed category. `rules` order is significant: the classifier
/// takes the first matching keyword in category order, then rule order.
/// `icon` and `color` are opaque strings carried for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub rules: Vec<CategoryRule>,
}

/// Per-month spending limits. Persisted alongside the ledger but not acted
/// on by this crate; limit tracking lives with the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub month: Month,
    pub global_limit: Option<i64>,
    pub category_limits: BTreeMap<String, i64>,
}
