use agora_core::ParsedTransaction;
use serde::Serialize;
use thiserror::Error;

/// Everything one statement document converted into: the identity namespace
/// it belongs to, the transactions recovered from it, and the lines the
/// parser had to give up on. Zero transactions plus warnings is a valid
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    /// Institution plus sub-account (e.g. a masked card suffix). Statements
    /// from different cards of one institution must not share a source, or
    /// their transactions would collide in the identity space.
    pub source: String,
    pub transactions: Vec<ParsedTransaction>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document is not valid UTF-8 text")]
    InvalidEncoding,
    #[error("text extraction failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// The text-extraction collaborator. Takes raw document bytes and yields
/// per-page plain text, bidirectional artifacts included. Correcting them
/// is the normalizer's job, not the extractor's.
pub trait TextExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Extractor for documents that are already plain text (e.g. the output of
/// `pdftotext`). Pages are split on form feed, the conventional page
/// separator in extracted text.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, data: &[u8]) -> Result<Vec<String>, ExtractError> {
        let text = std::str::from_utf8(data).map_err(|_| ExtractError::InvalidEncoding)?;
        Ok(text.split('\x0c').map(str::to_string).collect())
    }
}

/// One institution's statement format: a filename predicate for detection
/// and the conversion itself. Implementations live in a fixed registry
/// list; supporting a new institution means appending one more, never
/// modifying these.
pub trait StatementConverter: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches_filename(&self, filename: &str) -> bool;

    /// Convert a statement document. Unrecoverable extraction problems are
    /// errors; per-line anomalies are demoted to warnings on the result.
    fn convert(
        &self,
        extractor: &dyn TextExtractor,
        data: &[u8],
        filename: &str,
    ) -> Result<ConversionResult, ConvertError>;
}
