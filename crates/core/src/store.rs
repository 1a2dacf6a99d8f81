use crate::month::Month;
use crate::transaction::Transaction;

/// Persistence collaborator contract. The ledger is partitioned by calendar
/// month; each partition is read and written as a unit. Implementations own
/// the encoding; this crate only requires that a written partition reads
/// back identically.
///
/// The ingest pipeline assumes a single writer per partition at a time.
/// Serializing concurrent ingestion requests (locking, a single-writer
/// queue) is the implementation's concern.
pub trait PartitionStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a month partition. An absent partition is an empty list, not an
    /// error.
    fn read_partition(&self, month: Month) -> Result<Vec<Transaction>, Self::Error>;

    /// Replace a month partition wholesale.
    fn write_partition(&self, month: Month, transactions: &[Transaction])
        -> Result<(), Self::Error>;

    /// Every month that currently has a partition, in ascending order.
    fn list_partitions(&self) -> Result<Vec<Month>, Self::Error>;
}
