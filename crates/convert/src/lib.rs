// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod hapoalim;
pub mod isracard;
pub mod registry;
pub mod text;
pub mod types;
pub mod validate;
pub(crate) mod util;

pub use hapoalim::Hapoalim;
pub use isracard::Isracard;
pub use registry::FormatRegistry;
pub use text::{normalize, reverse_hebrew_runs};
pub use types::{
    ConversionResult, ConvertError, ExtractError, PlainTextExtractor, StatementConverter,
    TextExtractor,
};
pub use validate::{validate, ValidationError};
