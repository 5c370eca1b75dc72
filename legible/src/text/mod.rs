//! Text cleanup for raw recognizer output.
//!
//! [`normalize`] folds Unicode compatibility forms, [`declutter`] drops noise
//! lines and tidies whitespace, and [`merge`] combines the output of several
//! engines into one cleaned string.

mod declutter;
mod merge;
mod normalize;

pub use declutter::{collapse_whitespace, declutter};
pub use merge::{clean_merged, merge_engine_outputs, strict_filter};
pub use normalize::{normalize, scrub_symbols};

/// Punctuation that counts as legitimate text alongside letters, digits and
/// whitespace.
pub(crate) const TEXT_PUNCTUATION: &str = ".,;:!?¡¿'\"()-/%";

pub(crate) fn is_text_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || TEXT_PUNCTUATION.contains(c)
}
