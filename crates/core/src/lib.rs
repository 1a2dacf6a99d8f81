pub mod classify;
pub mod hash;
pub mod ingest;
pub mod month;
pub mod store;
pub mod transaction;

pub use classify::{auto_categorize, match_category, FALLBACK_CATEGORY_ID};
pub use hash::transaction_id;
pub use ingest::{clear_category, ingest, recategorize_all, set_category, CascadeOutcome, IngestReport};
pub use month::Month;
pub use store::PartitionStore;
pub use transaction::{Budget, Category, CategoryRule, ParsedTransaction, Transaction, TransactionType};
