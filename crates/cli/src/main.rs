//! Operator CLI for the ledger: upload statements, manage categories,
//! re-run classification, inspect partitions.
//!
//! Statements arrive as extracted text (e.g. `pdftotext statement.pdf
//! statement.pdf.txt`); format detection runs on the original statement
//! filename, so a trailing `.txt` is ignored.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use agora_convert::{
    reverse_hebrew_runs, validate, ExtractError, FormatRegistry, PlainTextExtractor,
    TextExtractor,
};
use agora_core::{
    clear_category, ingest, recategorize_all, set_category, Category, CategoryRule, Month,
    PartitionStore, Transaction,
};
use agora_store::JsonStore;

#[derive(Parser)]
#[command(name = "agora", about = "Bank statement ledger", version)]
struct Cli {
    /// Ledger data directory.
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a statement file and merge it into the ledger.
    Ingest {
        /// Extracted statement text, named after the original document.
        file: PathBuf,
        /// Repair reversed Hebrew runs emitted by some extractors.
        #[arg(long)]
        fix_rtl: bool,
    },
    /// Re-run auto-categorization over the whole ledger.
    Recategorize,
    /// Manually assign a category to one transaction (locks it).
    SetCategory {
        transaction_id: String,
        /// Category id, or "none" to mark uncategorized.
        category: String,
    },
    /// Manage the category list.
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Print transactions, newest first.
    List {
        /// Restrict to one month partition (YYYY-MM).
        #[arg(long)]
        month: Option<Month>,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    List,
    Add {
        id: String,
        name: String,
        #[arg(long, default_value = "tag")]
        icon: String,
        #[arg(long, default_value = "#8884d8")]
        color: String,
        /// Comma-separated keywords, matched in order.
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
    },
    /// Delete a category; referencing transactions revert to uncategorized.
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let store = JsonStore::new(&cli.data_dir);

    match cli.command {
        Command::Ingest { file, fix_rtl } => ingest_file(&store, &file, fix_rtl),
        Command::Recategorize => recategorize(&store),
        Command::SetCategory { transaction_id, category } => {
            assign_category(&store, &transaction_id, &category)
        }
        Command::Categories { action } => match action {
            CategoryAction::List => list_categories(&store),
            CategoryAction::Add { id, name, icon, color, keywords } => {
                add_category(&store, id, name, icon, color, keywords)
            }
            CategoryAction::Delete { id } => delete_category(&store, &id),
        },
        Command::List { month } => list_transactions(&store, month),
    }
}

/// Extractor wrapper applying the RTL repair to every page.
struct RtlRepairedExtractor;

impl TextExtractor for RtlRepairedExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, ExtractError> {
        let pages = PlainTextExtractor.extract_pages(data)?;
        Ok(pages.iter().map(|p| reverse_hebrew_runs(p)).collect())
    }
}

/// Filename used for format detection: the extracted-text suffix does not
/// change what the document is.
fn detection_name(path: &Path) -> anyhow::Result<&str> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("bad file name: {}", path.display()))?;
    Ok(name.strip_suffix(".txt").unwrap_or(name))
}

fn ingest_file(store: &JsonStore, file: &Path, fix_rtl: bool) -> anyhow::Result<()> {
    let filename = detection_name(file)?;
    let registry = FormatRegistry::builtin();
    let Some(converter) = registry.detect(filename) else {
        bail!("unrecognized statement format: {filename}");
    };
    tracing::info!(format = converter.name(), filename, "statement format detected");

    let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let result = if fix_rtl {
        converter.convert(&RtlRepairedExtractor, &data, filename)?
    } else {
        converter.convert(&PlainTextExtractor, &data, filename)?
    };
    validate(&result)?;

    let categories = store.read_categories()?;
    let report = ingest(store, &result.source, &result.transactions, &categories)?;

    println!(
        "{}: {} added, {} skipped ({} parsed)",
        result.source,
        report.added,
        report.skipped,
        result.transactions.len()
    );
    for warning in &result.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

fn recategorize(store: &JsonStore) -> anyhow::Result<()> {
    let categories = store.read_categories()?;
    let changed = recategorize_all(store, &categories)?;
    println!("{changed} transactions recategorized");
    Ok(())
}

fn assign_category(store: &JsonStore, transaction_id: &str, category: &str) -> anyhow::Result<()> {
    let category_id = match category {
        "none" => None,
        id => {
            let known = store.read_categories()?;
            if !known.iter().any(|c| c.id == id) {
                bail!("unknown category: {id}");
            }
            Some(id.to_string())
        }
    };
    if !set_category(store, transaction_id, category_id)? {
        bail!("transaction not found: {transaction_id}");
    }
    println!("category set");
    Ok(())
}

fn list_categories(store: &JsonStore) -> anyhow::Result<()> {
    for category in store.read_categories()? {
        let keywords: Vec<&str> = category.rules.iter().map(|r| r.keyword.as_str()).collect();
        println!("{}  {}  [{}]", category.id, category.name, keywords.join(", "));
    }
    Ok(())
}

fn add_category(
    store: &JsonStore,
    id: String,
    name: String,
    icon: String,
    color: String,
    keywords: Vec<String>,
) -> anyhow::Result<()> {
    let mut categories = store.read_categories()?;
    if categories.iter().any(|c| c.id == id) {
        bail!("category already exists: {id}");
    }
    categories.push(Category {
        id,
        name,
        icon,
        color,
        rules: keywords.into_iter().map(|keyword| CategoryRule { keyword }).collect(),
    });
    store.write_categories(&categories)?;
    Ok(())
}

fn delete_category(store: &JsonStore, id: &str) -> anyhow::Result<()> {
    let mut categories = store.read_categories()?;
    let before = categories.len();
    categories.retain(|c| c.id != id);
    if categories.len() == before {
        bail!("category not found: {id}");
    }
    store.write_categories(&categories)?;

    let outcome = clear_category(store, id)?;
    println!("deleted {id}: {} transactions reverted to uncategorized", outcome.cleared);
    for (month, error) in &outcome.failures {
        eprintln!("warning: cascade failed for {month}: {error}");
    }
    Ok(())
}

fn list_transactions(store: &JsonStore, month: Option<Month>) -> anyhow::Result<()> {
    let months = match month {
        Some(m) => vec![m],
        None => store.list_partitions()?,
    };
    let mut transactions: Vec<Transaction> = Vec::new();
    for m in months {
        transactions.extend(store.read_partition(m)?);
    }
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    for tx in &transactions {
        let sign = match tx.kind {
            agora_core::TransactionType::Income => '+',
            agora_core::TransactionType::Expense => '-',
        };
        println!(
            "{}  {}{}  {:<12}  {}  [{}]",
            tx.date,
            sign,
            format_agorot(tx.amount),
            tx.category_id.as_deref().unwrap_or("-"),
            tx.description,
            tx.id
        );
    }
    Ok(())
}

fn format_agorot(amount: i64) -> String {
    format!("₪{}.{:02}", amount / 100, amount % 100)
}
