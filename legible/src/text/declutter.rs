use std::sync::OnceLock;

use regex::Regex;

use super::is_text_char;

/// Lines where less than this share of characters look like text are noise.
const MIN_TEXT_RATIO: f32 = 0.4;

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex is valid"))
}

fn text_ratio(line: &str) -> f32 {
    let total = line.chars().count();
    if total == 0 {
        return 0.0;
    }
    let good = line.chars().filter(|&c| is_text_char(c)).count();
    good as f32 / total as f32
}

/// Drop everything before the first letter, digit, `(`, `¿` or `¡`.
fn strip_leading_garbage(line: &str) -> &str {
    line.trim_start_matches(|c: char| !(c.is_alphanumeric() || matches!(c, '(' | '¿' | '¡')))
}

/// Cleaned form of one line, or `None` if the line is noise.
fn clean_line(line: &str) -> Option<String> {
    let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
    if text_ratio(&line) < MIN_TEXT_RATIO {
        return None;
    }

    let line = strip_leading_garbage(&line);
    // Re-checked after stripping so a second pass keeps the same lines.
    if text_ratio(line) < MIN_TEXT_RATIO {
        return None;
    }
    if !line.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(line.to_string())
}

/// Remove noise lines and tidy whitespace.
///
/// Each line is trimmed and its inner whitespace collapsed. Lines that are
/// mostly symbols, or have no letters at all, are dropped, and leading
/// symbol runs are stripped from the rest. Runs of blank lines between
/// surviving lines become a single blank line. Idempotent.
pub fn declutter(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_break = false;

    for raw in text.lines() {
        if raw.trim().is_empty() {
            pending_break = !lines.is_empty();
            continue;
        }
        let Some(line) = clean_line(raw) else {
            continue;
        };
        if pending_break {
            lines.push(String::new());
            pending_break = false;
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Collapse horizontal whitespace to single spaces and blank-line runs to a
/// single blank line, then trim.
pub fn collapse_whitespace(text: &str) -> String {
    let joined = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    blank_runs()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}
