//! Deterministic word tokenization shared by similarity and relevance code.

/// Split an identifier or free-text phrase into lower-cased word tokens.
///
/// Splits on separator characters (`/`, `.`, `-`, `_`, whitespace and any
/// other non-alphanumeric byte) and on camel-case transitions, so both
/// `"InvoiceLineItem"` and `"invoice-line_item"` tokenize to
/// `["invoice", "line", "item"]`. Tokens shorter than two characters are
/// dropped.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in input.chars() {
        if !ch.is_alphanumeric() {
            flush(&mut tokens, &mut current);
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            flush(&mut tokens, &mut current);
        }
        prev_lower = ch.is_lowercase() || ch.is_numeric();
        current.extend(ch.to_lowercase());
    }
    flush(&mut tokens, &mut current);
    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    if current.chars().count() >= 2 {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
}
