//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, floored, with
//! a minimum of one token per entry. The estimate is deliberately
//! backend-agnostic so trimming is deterministic regardless of which model
//! serves the request.

use switchyard_core::message::WireMessage;

/// Characters assumed per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count for a string: `max(1, chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / CHARS_PER_TOKEN).max(1)
}

/// Estimate tokens for a whole wire sequence.
pub fn estimate_sequence_tokens(messages: &[WireMessage]) -> usize {
    messages.iter().map(|m| estimate_tokens(&m.content)).sum()
}

/// Keep at most `max_chars` characters of `text`, respecting UTF-8 boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
