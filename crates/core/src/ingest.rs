use std::collections::{BTreeMap, HashSet};

use crate::classify::{auto_categorize, match_category};
use crate::hash::transaction_id;
use crate::month::Month;
use crate::store::PartitionStore;
use crate::transaction::{Category, ParsedTransaction, Transaction};

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub added: usize,
    /// Incoming transactions whose identity already existed in their
    /// partition. Re-uploading a statement is a safe no-op for these.
    pub skipped: usize,
}

/// Merge parsed transactions into the ledger.
///
/// Partitions are grouped and loaded once up front, so validation-adjacent
/// failures surface before anything is written. For each incoming
/// transaction: compute its content id, skip it if the partition already
/// holds that id, otherwise classify it (manual lock starts unlocked) and
/// append. Every loaded partition is then persisted, sorted date-descending.
///
/// This is the only code path that creates transaction identities; existing
/// transactions are never touched.
pub fn ingest<S: PartitionStore>(
    store: &S,
    source: &str,
    incoming: &[ParsedTransaction],
    categories: &[Category],
) -> Result<IngestReport, S::Error> {
    let mut partitions: BTreeMap<Month, LoadedPartition> = BTreeMap::new();
    for tx in incoming {
        let month = Month::of(tx.date);
        if !partitions.contains_key(&month) {
            partitions.insert(month, LoadedPartition::read(store, month)?);
        }
    }

    let mut report = IngestReport::default();

    for tx in incoming {
        let Some(partition) = partitions.get_mut(&Month::of(tx.date)) else {
            continue;
        };
        let id = transaction_id(tx.date, tx.amount, &tx.description, source);
        if partition.ids.contains(&id) {
            report.skipped += 1;
            continue;
        }

        let category_id = match_category(&tx.description, categories).to_string();
        partition.ids.insert(id.clone());
        partition.transactions.push(Transaction {
            id,
            date: tx.date,
            amount: tx.amount,
            description: tx.description.clone(),
            source: source.to_string(),
            kind: tx.kind,
            category_id: Some(category_id),
            category_manual: false,
        });
        report.added += 1;
    }

    for (month, partition) in partitions {
        let mut txs = partition.transactions;
        txs.sort_by(|a, b| b.date.cmp(&a.date));
        store.write_partition(month, &txs)?;
    }

    tracing::info!(added = report.added, skipped = report.skipped, source, "ingest complete");
    Ok(report)
}

/// A month partition held in memory for the duration of one ingestion,
/// with its identity set alongside for O(1) duplicate checks.
struct LoadedPartition {
    transactions: Vec<Transaction>,
    ids: HashSet<String>,
}

impl LoadedPartition {
    fn read<S: PartitionStore>(store: &S, month: Month) -> Result<Self, S::Error> {
        let transactions = store.read_partition(month)?;
        let ids = transactions.iter().map(|t| t.id.clone()).collect();
        Ok(LoadedPartition { transactions, ids })
    }
}

/// Re-run the classifier over the whole ledger, e.g. after rule edits.
/// Manual locks are honored; only partitions with changes are rewritten.
/// Returns the number of transactions whose category changed.
pub fn recategorize_all<S: PartitionStore>(
    store: &S,
    categories: &[Category],
) -> Result<usize, S::Error> {
    let mut changed = 0;
    for month in store.list_partitions()? {
        let mut txs = store.read_partition(month)?;
        let month_changed = auto_categorize(&mut txs, categories);
        if month_changed > 0 {
            store.write_partition(month, &txs)?;
            changed += month_changed;
        }
    }
    Ok(changed)
}

/// Outcome of a category-deletion cascade.
#[derive(Debug, Default)]
pub struct CascadeOutcome {
    /// Transactions reverted to uncategorized/unlocked.
    pub cleared: usize,
    /// Partitions that could not be updated, with the error rendered.
    pub failures: Vec<(Month, String)>,
}

/// Category-deletion cascade: revert every transaction referencing
/// `category_id` to `category_id = None, category_manual = false`.
/// Each partition's cascade is independent: a failing partition is
/// recorded and the remaining partitions still proceed.
pub fn clear_category<S: PartitionStore>(
    store: &S,
    category_id: &str,
) -> Result<CascadeOutcome, S::Error> {
    let mut outcome = CascadeOutcome::default();
    for month in store.list_partitions()? {
        match clear_category_in_partition(store, month, category_id) {
            Ok(cleared) => outcome.cleared += cleared,
            Err(e) => {
                tracing::warn!(%month, error = %e, "category cascade failed for partition");
                outcome.failures.push((month, e.to_string()));
            }
        }
    }
    Ok(outcome)
}

fn clear_category_in_partition<S: PartitionStore>(
    store: &S,
    month: Month,
    category_id: &str,
) -> Result<usize, S::Error> {
    let mut txs = store.read_partition(month)?;
    let mut cleared = 0;
    for tx in txs.iter_mut() {
        if tx.category_id.as_deref() == Some(category_id) {
            tx.category_id = None;
            tx.category_manual = false;
            cleared += 1;
        }
    }
    if cleared > 0 {
        store.write_partition(month, &txs)?;
    }
    Ok(cleared)
}

/// Explicit user edit: assign a category to one transaction and lock it
/// against the classifier. Returns `false` when no partition holds the id.
pub fn set_category<S: PartitionStore>(
    store: &S,
    transaction_id: &str,
    category_id: Option<String>,
) -> Result<bool, S::Error> {
    for month in store.list_partitions()? {
        let mut txs = store.read_partition(month)?;
        if let Some(tx) = txs.iter_mut().find(|t| t.id == transaction_id) {
            tx.category_id = category_id;
            tx.category_manual = true;
            store.write_partition(month, &txs)?;
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{CategoryRule, TransactionType};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory stand-in for the persistence collaborator, with optional
    /// per-month write failures to exercise cascade independence.
    #[derive(Default)]
    struct MemoryStore {
        partitions: RefCell<HashMap<Month, Vec<Transaction>>>,
        fail_writes_for: Option<Month>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("injected write failure for {0}")]
    struct InjectedFailure(Month);

    impl PartitionStore for MemoryStore {
        type Error = InjectedFailure;

        fn read_partition(&self, month: Month) -> Result<Vec<Transaction>, Self::Error> {
            Ok(self.partitions.borrow().get(&month).cloned().unwrap_or_default())
        }

        fn write_partition(
            &self,
            month: Month,
            transactions: &[Transaction],
        ) -> Result<(), Self::Error> {
            if self.fail_writes_for == Some(month) {
                return Err(InjectedFailure(month));
            }
            self.partitions.borrow_mut().insert(month, transactions.to_vec());
            Ok(())
        }

        fn list_partitions(&self) -> Result<Vec<Month>, Self::Error> {
            let mut months: Vec<Month> = self.partitions.borrow().keys().copied().collect();
            months.sort();
            Ok(months)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parsed(d: NaiveDate, amount: i64, description: &str) -> ParsedTransaction {
        ParsedTransaction {
            date: d,
            amount,
            description: description.to_string(),
            kind: TransactionType::Expense,
        }
    }

    fn groceries_category() -> Vec<Category> {
        vec![Category {
            id: "groceries".to_string(),
            name: "Groceries".to_string(),
            icon: "cart".to_string(),
            color: "#00aa00".to_string(),
            rules: vec![CategoryRule { keyword: "supermarket".to_string() }],
        }]
    }

    #[test]
    fn ingest_adds_classifies_and_sorts_descending() {
        let store = MemoryStore::default();
        let incoming = vec![
            parsed(date(2024, 3, 1), 1000, "SUPERMARKET X"),
            parsed(date(2024, 3, 15), 2000, "PHARMACY"),
        ];

        let report = ingest(&store, "bankX", &incoming, &groceries_category()).unwrap();
        assert_eq!(report, IngestReport { added: 2, skipped: 0 });

        let month: Month = "2024-03".parse().unwrap();
        let stored = store.read_partition(month).unwrap();
        assert_eq!(stored.len(), 2);
        // Newest first.
        assert_eq!(stored[0].date, date(2024, 3, 15));
        assert_eq!(stored[0].category_id.as_deref(), Some("other"));
        assert_eq!(stored[1].category_id.as_deref(), Some("groceries"));
        assert!(stored.iter().all(|t| !t.category_manual));
        assert!(stored.iter().all(|t| t.source == "bankX"));
    }

    #[test]
    fn reingesting_the_same_batch_is_a_no_op() {
        let store = MemoryStore::default();
        let incoming = vec![
            parsed(date(2024, 3, 1), 1000, "SUPERMARKET X"),
            parsed(date(2024, 3, 2), 2000, "PHARMACY"),
        ];
        let categories = groceries_category();

        let first = ingest(&store, "bankX", &incoming, &categories).unwrap();
        assert_eq!(first, IngestReport { added: 2, skipped: 0 });
        let month: Month = "2024-03".parse().unwrap();
        let after_first = store.read_partition(month).unwrap();

        let second = ingest(&store, "bankX", &incoming, &categories).unwrap();
        assert_eq!(second, IngestReport { added: 0, skipped: 2 });
        assert_eq!(store.read_partition(month).unwrap(), after_first);
    }

    #[test]
    fn identical_content_from_another_source_is_not_a_duplicate() {
        let store = MemoryStore::default();
        let incoming = vec![parsed(date(2024, 3, 1), 1000, "SUPERMARKET X")];
        let categories = groceries_category();

        ingest(&store, "isracard-5702", &incoming, &categories).unwrap();
        let report = ingest(&store, "isracard-1234", &incoming, &categories).unwrap();
        assert_eq!(report, IngestReport { added: 1, skipped: 0 });
    }

    #[test]
    fn ingest_spans_multiple_month_partitions() {
        let store = MemoryStore::default();
        let incoming = vec![
            parsed(date(2024, 2, 28), 500, "FEBRUARY THING"),
            parsed(date(2024, 3, 1), 600, "MARCH THING"),
        ];
        ingest(&store, "bankX", &incoming, &[]).unwrap();

        let feb = store.read_partition("2024-02".parse().unwrap()).unwrap();
        let mar = store.read_partition("2024-03".parse().unwrap()).unwrap();
        assert_eq!(feb.len(), 1);
        assert_eq!(mar.len(), 1);
    }

    #[test]
    fn ingest_never_touches_existing_transactions() {
        let store = MemoryStore::default();
        let categories = groceries_category();
        ingest(&store, "bankX", &[parsed(date(2024, 3, 1), 1000, "SUPERMARKET X")], &categories)
            .unwrap();

        let month: Month = "2024-03".parse().unwrap();
        // User locks the existing transaction to a different category.
        let mut txs = store.read_partition(month).unwrap();
        txs[0].category_id = Some("dining".to_string());
        txs[0].category_manual = true;
        store.write_partition(month, &txs).unwrap();

        ingest(&store, "bankX", &[parsed(date(2024, 3, 2), 700, "SUPERMARKET Y")], &categories)
            .unwrap();

        let after = store.read_partition(month).unwrap();
        let locked = after.iter().find(|t| t.description == "SUPERMARKET X").unwrap();
        assert_eq!(locked.category_id.as_deref(), Some("dining"));
        assert!(locked.category_manual);
    }

    #[test]
    fn recategorize_all_honors_locks_and_reports_changes() {
        let store = MemoryStore::default();
        ingest(&store, "bankX", &[parsed(date(2024, 3, 1), 1000, "SUPERMARKET X")], &[]).unwrap();

        // Everything landed on the fallback; now rules exist.
        let changed = recategorize_all(&store, &groceries_category()).unwrap();
        assert_eq!(changed, 1);

        let month: Month = "2024-03".parse().unwrap();
        let txs = store.read_partition(month).unwrap();
        assert_eq!(txs[0].category_id.as_deref(), Some("groceries"));

        // Second run is a no-op.
        assert_eq!(recategorize_all(&store, &groceries_category()).unwrap(), 0);
    }

    #[test]
    fn clear_category_reverts_across_partitions() {
        let store = MemoryStore::default();
        let categories = groceries_category();
        let incoming = vec![
            parsed(date(2024, 2, 10), 500, "SUPERMARKET A"),
            parsed(date(2024, 3, 10), 600, "SUPERMARKET B"),
            parsed(date(2024, 3, 11), 700, "PHARMACY"),
        ];
        ingest(&store, "bankX", &incoming, &categories).unwrap();

        let outcome = clear_category(&store, "groceries").unwrap();
        assert_eq!(outcome.cleared, 2);
        assert!(outcome.failures.is_empty());

        for key in ["2024-02", "2024-03"] {
            let txs = store.read_partition(key.parse().unwrap()).unwrap();
            for tx in txs {
                if tx.description.starts_with("SUPERMARKET") {
                    assert_eq!(tx.category_id, None);
                    assert!(!tx.category_manual);
                } else {
                    // Other categories untouched.
                    assert_eq!(tx.category_id.as_deref(), Some("other"));
                }
            }
        }
    }

    #[test]
    fn cascade_failure_on_one_partition_does_not_abort_the_rest() {
        let mut store = MemoryStore::default();
        let categories = groceries_category();
        ingest(
            &store,
            "bankX",
            &[
                parsed(date(2024, 2, 10), 500, "SUPERMARKET A"),
                parsed(date(2024, 3, 10), 600, "SUPERMARKET B"),
            ],
            &categories,
        )
        .unwrap();

        let feb: Month = "2024-02".parse().unwrap();
        store.fail_writes_for = Some(feb);

        let outcome = clear_category(&store, "groceries").unwrap();
        assert_eq!(outcome.cleared, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, feb);

        // March was still cleared.
        let mar = store.read_partition("2024-03".parse().unwrap()).unwrap();
        assert_eq!(mar[0].category_id, None);
    }

    #[test]
    fn set_category_assigns_and_locks() {
        let store = MemoryStore::default();
        ingest(&store, "bankX", &[parsed(date(2024, 3, 1), 1000, "SUPERMARKET X")], &[]).unwrap();

        let month: Month = "2024-03".parse().unwrap();
        let id = store.read_partition(month).unwrap()[0].id.clone();

        let found = set_category(&store, &id, Some("dining".to_string())).unwrap();
        assert!(found);

        let tx = store.read_partition(month).unwrap().remove(0);
        assert_eq!(tx.category_id.as_deref(), Some("dining"));
        assert!(tx.category_manual);

        // The lock now shields it from the classifier.
        let changed = recategorize_all(&store, &groceries_category()).unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn set_category_returns_false_for_unknown_id() {
        let store = MemoryStore::default();
        assert!(!set_category(&store, "ffffffffffffffff", None).unwrap());
    }
}
