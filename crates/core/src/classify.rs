use crate::transaction::{Category, Transaction};

/// Category assigned when no keyword rule matches. Every unlocked
/// transaction ends up categorized; `None` only survives a category
/// deletion until the next classifier run.
pub const FALLBACK_CATEGORY_ID: &str = "other";

/// Find the category for a description: first keyword that occurs as a
/// case-insensitive substring wins, scanning categories in declared order
/// and each category's rules in declared order. Callers own the ordering;
/// a catch-all category must sort after the specific ones.
pub fn match_category<'a>(description: &str, categories: &'a [Category]) -> &'a str {
    let desc = description.to_lowercase();
    for category in categories {
        for rule in &category.rules {
            if desc.contains(&rule.keyword.to_lowercase()) {
                return &category.id;
            }
        }
    }
    FALLBACK_CATEGORY_ID
}

/// Assign categories to every transaction not locked by a manual edit.
/// Returns how many assignments changed. Idempotent: a second pass with the
/// same categories changes nothing.
pub fn auto_categorize(transactions: &mut [Transaction], categories: &[Category]) -> usize {
    let mut changed = 0;
    for tx in transactions.iter_mut() {
        if tx.category_manual {
            continue;
        }
        let assigned = match_category(&tx.description, categories);
        if tx.category_id.as_deref() != Some(assigned) {
            tx.category_id = Some(assigned.to_string());
            changed += 1;
        }
    }
    changed
}
