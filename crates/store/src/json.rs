//! JSON-file ledger persistence.
//!
//! Layout inside the data directory:
//!
//! ```text
//! data/
//!   transactions-2024-03.json   one array per month partition, newest first
//!   categories.json             ordered category list
//!   budgets.json                budget list
//! ```
//!
//! Writes replace a file wholesale via a temp file + rename in the same
//! directory. A missing partition reads as empty; corrupt JSON is an error,
//! never an empty list. The pipeline rewrites partitions it loads, and a
//! silently-empty read would erase the month on the next write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use agora_core::{Budget, Category, Month, PartitionStore, Transaction};
use thiserror::Error;

const PARTITION_PREFIX: &str = "transactions-";
const CATEGORIES_FILE: &str = "categories.json";
const BUDGETS_FILE: &str = "budgets.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed ledger file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed ledger store. Assumes a single ingestion writer at a time
/// per partition; concurrent uploads racing on one month must be serialized
/// by the caller.
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn read_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read_list(&self.data_dir.join(CATEGORIES_FILE))
    }

    pub fn write_categories(&self, categories: &[Category]) -> Result<(), StoreError> {
        self.write_list(&self.data_dir.join(CATEGORIES_FILE), categories)
    }

    pub fn read_budgets(&self) -> Result<Vec<Budget>, StoreError> {
        self.read_list(&self.data_dir.join(BUDGETS_FILE))
    }

    pub fn write_budgets(&self, budgets: &[Budget]) -> Result<(), StoreError> {
        self.write_list(&self.data_dir.join(BUDGETS_FILE), budgets)
    }

    fn partition_path(&self, month: Month) -> PathBuf {
        self.data_dir.join(format!("{PARTITION_PREFIX}{month}.json"))
    }

    fn read_list<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_list<T: serde::Serialize>(&self, path: &Path, items: &[T]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(items).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        // Same-directory temp file so the rename stays on one filesystem.
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl PartitionStore for JsonStore {
    type Error = StoreError;

    fn read_partition(&self, month: Month) -> Result<Vec<Transaction>, StoreError> {
        self.read_list(&self.partition_path(month))
    }

    fn write_partition(&self, month: Month, transactions: &[Transaction]) -> Result<(), StoreError> {
        tracing::debug!(%month, count = transactions.len(), "writing partition");
        self.write_list(&self.partition_path(month), transactions)
    }

    fn list_partitions(&self) -> Result<Vec<Month>, StoreError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let mut months = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(key) = name
                .strip_prefix(PARTITION_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
            else {
                continue;
            };
            if let Ok(month) = key.parse::<Month>() {
                months.push(month);
            }
        }
        months.sort();
        Ok(months)
    }
}
