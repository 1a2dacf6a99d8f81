use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Content-addressed transaction identity: the first 16 hex characters of
/// SHA-256 over `date|amount|description|source`, with the description
/// trimmed and lowercased so cosmetic whitespace/casing differences do not
/// split identities. 64 bits is plenty for a per-user ledger; this is not a
/// global cryptographic identifier.
pub fn transaction_id(date: NaiveDate, amount: i64, description: &str, source: &str) -> String {
    let input = format!(
        "{}|{}|{}|{}",
        date.format("%Y-%m-%d"),
        amount,
        description.trim().to_lowercase(),
        source
    );
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..8])
}
