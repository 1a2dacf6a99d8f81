use crate::hapoalim::Hapoalim;
use crate::isracard::Isracard;
use crate::types::StatementConverter;

/// Ordered list of known statement formats. Detection is first-match-wins
/// on the filename, so more specific predicates must register earlier.
pub struct FormatRegistry {
    converters: Vec<Box<dyn StatementConverter>>,
}

impl FormatRegistry {
    pub fn new(converters: Vec<Box<dyn StatementConverter>>) -> Self {
        Self { converters }
    }

    /// The built-in institutions. Supporting another one means appending
    /// its converter here.
    pub fn builtin() -> Self {
        Self::new(vec![Box::new(Isracard), Box::new(Hapoalim)])
    }

    /// Find the converter for a document by filename. `None` means the
    /// format is unrecognized and nothing should be parsed.
    pub fn detect(&self, filename: &str) -> Option<&dyn StatementConverter> {
        self.converters
            .iter()
            .find(|c| c.matches_filename(filename))
            .map(|c| c.as_ref())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
