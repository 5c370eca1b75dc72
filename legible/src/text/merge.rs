use super::{collapse_whitespace, declutter, normalize, scrub_symbols};
use crate::ocr::RecognitionSpan;

fn join_spans(spans: &[RecognitionSpan]) -> String {
    spans
        .iter()
        .map(|span| span.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate engine outputs: all neural spans first, then the classical
/// ones, one span per line.
pub fn merge_engine_outputs(neural: &[RecognitionSpan], classical: &[RecognitionSpan]) -> String {
    [join_spans(neural), join_spans(classical)]
        .into_iter()
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// More digits than twice the letters: page numbers, stray barcodes, dates
/// torn out of context.
fn is_numeric_noise(line: &str) -> bool {
    let digits = line.chars().filter(|c| c.is_numeric()).count();
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    digits > letters * 2
}

/// Extra line filter for merged output.
///
/// Drops lines of two characters or fewer, lines dominated by digits, and a
/// line that repeats the previous kept line (case-insensitive). Blank lines
/// are kept as single paragraph breaks.
pub fn strict_filter(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous: Option<String> = None;
    let mut pending_break = false;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            pending_break = !lines.is_empty();
            continue;
        }
        if line.chars().count() <= 2 || is_numeric_noise(line) {
            continue;
        }

        let key = line.to_lowercase();
        if previous.as_deref() == Some(key.as_str()) {
            continue;
        }
        if pending_break {
            lines.push("");
            pending_break = false;
        }
        lines.push(line);
        previous = Some(key);
    }

    lines.join("\n")
}

/// Full cleanup applied to merged engine output.
pub fn clean_merged(text: &str) -> String {
    let text = normalize(text);
    let text = scrub_symbols(&text);
    let text = declutter(&text);
    let text = strict_filter(&text);
    collapse_whitespace(&text)
}
