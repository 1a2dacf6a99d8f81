//! Normalization of extracted statement text.
//!
//! Extractors hand us loosely formatted page text: tab-separated columns,
//! ragged whitespace, and (for some PDF backends) Hebrew runs emitted in
//! reverse order while digits and Latin substrings stay correctly ordered.

use crate::types::{ExtractError, TextExtractor};

re!(re_whitespace, r"\s+");
re!(re_hebrew_run, r"[\x{0590}-\x{05FF}\s]+");
re!(re_hebrew_char, r"[\x{0590}-\x{05FF}]");

/// Collapse whitespace/tab runs to single spaces and trim, per line.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(|line| re_whitespace().replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reverse the character order of Hebrew runs, leaving digits, Latin text
/// and punctuation untouched. A run is a maximal stretch of Hebrew-block
/// characters plus interior whitespace; runs without an actual Hebrew
/// character (pure whitespace) are left alone. Applied per line so a run
/// never crosses a line boundary.
///
/// This repairs extractors that emit right-to-left script reversed relative
/// to reading order. It is NOT idempotent on already-correct text, so
/// callers decide whether their extractor needs it.
pub fn reverse_hebrew_runs(text: &str) -> String {
    text.lines()
        .map(reverse_runs_in_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn reverse_runs_in_line(line: &str) -> String {
    re_hebrew_run()
        .replace_all(line, |caps: &regex::Captures<'_>| {
            let run = &caps[0];
            if re_hebrew_char().is_match(run) {
                run.chars().rev().collect::<String>()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

/// Pull the document's pages through the extraction collaborator and hand
/// back normalized lines, ready for line-driven parsing.
pub(crate) fn extract_normalized_lines(
    extractor: &dyn TextExtractor,
    data: &[u8],
) -> Result<Vec<String>, ExtractError> {
    let pages = extractor.extract_pages(data)?;
    Ok(normalize(&pages.join("\n"))
        .lines()
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_tabs_and_spaces() {
        assert_eq!(normalize("a\t\tb   c  "), "a b c");
    }

    #[test]
    fn normalize_works_per_line() {
        assert_eq!(normalize("  a  b \n\t c\td "), "a b\nc d");
    }

    #[test]
    fn normalize_keeps_blank_lines() {
        assert_eq!(normalize("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn reverses_a_pure_hebrew_run() {
        assert_eq!(reverse_hebrew_runs("שלום"), "םולש");
    }

    #[test]
    fn leaves_digits_and_latin_untouched() {
        // The amount and punctuation keep their order; only the Hebrew run flips.
        assert_eq!(reverse_hebrew_runs("(םולש) 123.45"), "(שלום) 123.45");
    }

    #[test]
    fn reverses_each_run_independently() {
        assert_eq!(reverse_hebrew_runs("בא-12-דג"), "אב-12-גד");
    }

    #[test]
    fn interior_whitespace_belongs_to_the_run() {
        // "בא דג" is one run; reversal swaps the word order too.
        assert_eq!(reverse_hebrew_runs("בא דג"), "גד אב");
    }

    #[test]
    fn boundary_whitespace_travels_with_the_run() {
        // A space adjacent to a Hebrew run is part of the run and moves to
        // the other side on reversal, mirroring what the extractor did.
        assert_eq!(reverse_hebrew_runs("יחק 50.00"), " קחי50.00");
    }

    #[test]
    fn whitespace_only_stretches_are_not_reversed() {
        assert_eq!(reverse_hebrew_runs("a   b"), "a   b");
    }

    #[test]
    fn runs_do_not_cross_line_boundaries() {
        assert_eq!(reverse_hebrew_runs("אב\nגד"), "בא\nדג");
    }
}
