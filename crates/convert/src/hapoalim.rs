//! Hapoalim-style checking-account statements: wide layout, one record per
//! primary line plus a bare type indicator on a following line.
//!
//! A primary line reads `DD/MM/YYYY <description> <amount> ₪<balance> ##`.
//! The indicator line holds `1` (credit) or `2` (debit) and may be pushed
//! one line down by the extractor, so the scan looks up to two lines ahead.

use agora_core::{ParsedTransaction, TransactionType};
use chrono::NaiveDate;

use crate::text::extract_normalized_lines;
use crate::types::{ConversionResult, ConvertError, StatementConverter, TextExtractor};
use crate::util::{excerpt, parse_amount};

re!(re_date, r"^(\d{2})/(\d{2})/(\d{4})");
re!(re_header, r"תאריך\s+פעולה|תנועות בחשבון|תקופה|חשבון\s+סניף|שם חשבון");
re!(re_balance, r"₪([\d,]+\.\d{2})\s*$");
re!(re_trailing_amount, r"([\d,]+\.\d{2})\s*$");
re!(re_filename, r"^current_account_operations");

/// How many lines below the primary line may hold the type indicator.
const TYPE_SCAN_AHEAD: usize = 2;

/// Marker separating the transaction columns from trailing layout noise.
const COLUMN_MARKER: &str = "##";

pub struct Hapoalim;

impl StatementConverter for Hapoalim {
    fn name(&self) -> &'static str {
        "Bank Hapoalim"
    }

    fn matches_filename(&self, filename: &str) -> bool {
        re_filename().is_match(filename)
    }

    fn convert(
        &self,
        extractor: &dyn TextExtractor,
        data: &[u8],
        _filename: &str,
    ) -> Result<ConversionResult, ConvertError> {
        // Single-account statements; one fixed identity namespace.
        let source = "hapoalim".to_string();
        let lines = extract_normalized_lines(extractor, data)?;
        let mut warnings = Vec::new();
        let mut transactions = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let Some(caps) = re_date().captures(line) else {
                continue;
            };
            if re_header().is_match(line) {
                continue;
            }

            let Some(kind) = find_type_indicator(&lines, i) else {
                warnings.push(format!("Skipped (no type indicator): {}", excerpt(line, 80)));
                continue;
            };

            let Some(date) = parse_full_date(&caps[1], &caps[2], &caps[3]) else {
                warnings.push(format!("Skipped (invalid date): {}", excerpt(line, 80)));
                continue;
            };

            // The date regex is anchored at the line start.
            let after_date = line[caps[0].len()..].trim();
            let tx_part = match after_date.find(COLUMN_MARKER) {
                Some(idx) => after_date[..idx].trim(),
                None => after_date,
            };

            // Rightmost amount is the running balance; the charge is the
            // amount-shaped token immediately before it.
            let Some(balance) = re_balance().find(tx_part) else {
                warnings.push(format!("Skipped (no balance): {}", excerpt(line, 80)));
                continue;
            };
            let before_balance = tx_part[..balance.start()].trim_end();

            let Some(amount_token) = re_trailing_amount()
                .captures(before_balance)
                .and_then(|c| c.get(1))
            else {
                warnings.push(format!("Skipped (no amount): {}", excerpt(line, 80)));
                continue;
            };
            let Some(amount) = parse_amount(amount_token.as_str()) else {
                warnings.push(format!("Skipped (no amount): {}", excerpt(line, 80)));
                continue;
            };
            if amount <= 0 {
                continue;
            }

            let description = before_balance[..amount_token.start()].trim().to_string();
            if description.is_empty() {
                warnings.push(format!("Skipped (no description): {}", excerpt(line, 80)));
                continue;
            }

            transactions.push(ParsedTransaction { date, amount, description, kind });
        }

        if transactions.is_empty() {
            warnings.push("No transactions found in statement".to_string());
        }

        Ok(ConversionResult { source, transactions, warnings })
    }
}

/// Scan the lines below the primary line for a bare `1` or `2`.
fn find_type_indicator(lines: &[String], primary: usize) -> Option<TransactionType> {
    for line in lines.iter().skip(primary + 1).take(TYPE_SCAN_AHEAD) {
        match line.trim() {
            "1" => return Some(TransactionType::Income),
            "2" => return Some(TransactionType::Expense),
            _ => {}
        }
    }
    None
}

fn parse_full_date(dd: &str, mm: &str, yyyy: &str) -> Option<NaiveDate> {
    let day: u32 = dd.parse().ok()?;
    let month: u32 = mm.parse().ok()?;
    let year: i32 = yyyy.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
