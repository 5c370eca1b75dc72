use unicode_normalization::UnicodeNormalization;

use super::is_text_char;

/// NFKC normalization plus the ligature and dash folds OCR engines need.
///
/// `ﬁ`/`ﬂ` become `fi`/`fl`, em and en dashes become `-`, and carriage
/// returns become line feeds.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len());
    for c in text.nfkc() {
        match c {
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{2014}' | '\u{2013}' => out.push('-'),
            '\r' => out.push('\n'),
            c => out.push(c),
        }
    }
    out
}

/// Replace every character that is not a letter, digit, whitespace or common
/// punctuation with a space.
pub fn scrub_symbols(text: &str) -> String {
    text.chars()
        .map(|c| if is_text_char(c) { c } else { ' ' })
        .collect()
}
