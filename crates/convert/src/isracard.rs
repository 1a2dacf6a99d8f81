//! Isracard-style credit-card statements: narrow layout, records keyed by a
//! leading DD/MM/YY token, long records folded across continuation lines.
//!
//! A statement holds up to two sections. Foreign purchases list the original
//! amount, a conversion fee, then the NIS total, so the charge is the *last*
//! amount on the record. Domestic charges list the original amount then the
//! billed amount, so the charge is the *second* amount (or the only one).

use agora_core::{ParsedTransaction, TransactionType};
use chrono::NaiveDate;

use crate::text::extract_normalized_lines;
use crate::types::{ConversionResult, ConvertError, StatementConverter, TextExtractor};
use crate::util::{excerpt, parse_amount};

re!(re_date, r"^(\d{2})/(\d{2})/(\d{2})");
re!(re_amount, r"\d[\d,]*\.\d{2}");
re!(re_foreign_header, r#"רכישות\s*בחו"ל"#);
re!(re_domestic_header, r"עסקות\s*שחויבו");
re!(re_total, r#"סה"כ"#);
re!(re_page_footer, r"עמוד\s+\d+\s+מתוך");
re!(re_credit, r"זיכוי");
re!(re_fee_line, r"^\*\*");
re!(re_filename, r"^(\d{4})_\d{8}\.pdf$");

/// Payment-method prefixes stripped from the front of descriptions.
const CARD_PREFIXES: [&str; 3] = ["תש . נייד", "לא הוצג", "ה. קבע"];

/// Continuation lines longer than this with no amount-shaped token are
/// treated as promotional text and end the record. Heuristic, tuned against
/// sample statements.
pub const AD_TEXT_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Foreign,
    Domestic,
}

pub struct Isracard;

impl StatementConverter for Isracard {
    fn name(&self) -> &'static str {
        "Isracard"
    }

    fn matches_filename(&self, filename: &str) -> bool {
        re_filename().is_match(filename)
    }

    fn convert(
        &self,
        extractor: &dyn TextExtractor,
        data: &[u8],
        filename: &str,
    ) -> Result<ConversionResult, ConvertError> {
        let source = source_from_filename(filename);
        let lines = extract_normalized_lines(extractor, data)?;
        let mut warnings = Vec::new();
        let mut transactions = Vec::new();

        let foreign_start = lines.iter().position(|l| re_foreign_header().is_match(l));
        let domestic_start = lines.iter().position(|l| re_domestic_header().is_match(l));

        if let Some(start) = foreign_start {
            let end = domestic_start.unwrap_or(lines.len()).max(start + 1);
            transactions.extend(scan_section(
                &lines[start + 1..end],
                Section::Foreign,
                &mut warnings,
            ));
        }

        // The domestic section runs to the end of the document; it may span
        // pages, with footers skipped line by line.
        if let Some(start) = domestic_start {
            transactions.extend(scan_section(
                &lines[start + 1..],
                Section::Domestic,
                &mut warnings,
            ));
        }

        if transactions.is_empty() {
            warnings.push("No transactions found in statement".to_string());
        }

        Ok(ConversionResult { source, transactions, warnings })
    }
}

fn source_from_filename(filename: &str) -> String {
    let suffix = re_filename()
        .captures(filename)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("unknown");
    format!("isracard-{suffix}")
}

/// Walk a section's lines, folding each date-led record together with its
/// continuation lines, and convert every complete record.
fn scan_section(
    lines: &[String],
    section: Section,
    warnings: &mut Vec<String>,
) -> Vec<ParsedTransaction> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        i += 1;

        if !re_date().is_match(line) {
            continue;
        }
        if re_total().is_match(line) || re_page_footer().is_match(line) {
            continue;
        }

        let mut record = line.clone();
        while i < lines.len() && folds_into_record(&lines[i]) {
            record.push(' ');
            record.push_str(&lines[i]);
            i += 1;
        }

        match record_to_transaction(&record, section) {
            Ok(Some(tx)) => out.push(tx),
            Ok(None) => {} // non-positive charge, dropped
            Err(reason) => warnings.push(format!("Skipped line ({reason}): {}", excerpt(&record, 80))),
        }
    }

    out
}

/// A line continues the current record unless it starts a new one or marks
/// a structural boundary.
fn folds_into_record(next: &str) -> bool {
    if next.is_empty()
        || re_date().is_match(next)
        || re_total().is_match(next)
        || re_page_footer().is_match(next)
        || re_fee_line().is_match(next)
    {
        return false;
    }
    // Promotional paragraphs: long and amount-free.
    !(next.chars().count() > AD_TEXT_MAX_CHARS && !re_amount().is_match(next))
}

fn record_to_transaction(
    record: &str,
    section: Section,
) -> Result<Option<ParsedTransaction>, &'static str> {
    let caps = re_date().captures(record).ok_or("no date")?;
    let date = parse_short_date(&caps[1], &caps[2], &caps[3]).ok_or("invalid date")?;

    let amounts: Vec<regex::Match<'_>> = re_amount().find_iter(record).collect();
    let Some(first_amount) = amounts.first() else {
        return Err("no amounts");
    };

    // Foreign: original amount, conversion fee, NIS total; charge last.
    // Domestic: original amount, billed charge; charge second when present.
    let charge_token = match section {
        Section::Foreign => amounts[amounts.len() - 1],
        Section::Domestic => *amounts.get(1).unwrap_or(first_amount),
    };
    let amount = parse_amount(charge_token.as_str()).ok_or("no amounts")?;
    if amount <= 0 {
        return Ok(None);
    }

    // The date regex is anchored at the record start.
    let description = clean_description(&record[caps[0].len()..first_amount.start()]);
    if description.is_empty() {
        return Err("no description");
    }

    let kind = if re_credit().is_match(record) {
        TransactionType::Income
    } else {
        TransactionType::Expense
    };

    Ok(Some(ParsedTransaction { date, amount, description, kind }))
}

/// DD/MM/YY with the two-digit year pivoting at 50.
fn parse_short_date(dd: &str, mm: &str, yy: &str) -> Option<NaiveDate> {
    let day: u32 = dd.parse().ok()?;
    let month: u32 = mm.parse().ok()?;
    let short: i32 = yy.parse().ok()?;
    let year = if short >= 50 { 1900 + short } else { 2000 + short };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn clean_description(raw: &str) -> String {
    let mut desc = raw.trim();
    for prefix in CARD_PREFIXES {
        if let Some(rest) = desc.strip_prefix(prefix) {
            desc = rest;
            break;
        }
    }
    desc.split_whitespace().collect::<Vec<_>>().join(" ")
}
