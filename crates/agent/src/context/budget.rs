//! Budget trimming: fit a wire sequence into the model's input budget.
//!
//! When a conversation outgrows the window, the head entry (system prefix
//! plus first user question) is kept with priority and the newest tail
//! entries fill whatever budget is left. Older middle entries are dropped.

use switchyard_config::ContextConfig;
use switchyard_core::message::WireMessage;

use super::normalize::collapse;
use super::token::{CHARS_PER_TOKEN, estimate_sequence_tokens, estimate_tokens, truncate_chars};

/// Token accounting for one backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub window_tokens: usize,
    pub reserved_output_tokens: usize,
    pub head_char_cap: usize,
    pub output_cap: usize,
    pub min_output: usize,
    pub safety_margin: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

/// A sequence ready to send, with its token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Fitted {
    pub messages: Vec<WireMessage>,
    pub input_tokens: usize,
    pub max_output_tokens: usize,
    /// Whether anything was cut to make the sequence fit
    pub trimmed: bool,
}

impl ContextWindow {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            window_tokens: config.window_tokens as usize,
            reserved_output_tokens: config.reserved_output_tokens as usize,
            head_char_cap: config.head_char_cap,
            output_cap: config.output_cap as usize,
            min_output: config.min_output as usize,
            safety_margin: config.safety_margin as usize,
        }
    }

    /// Maximum input cost: window minus the reserved output allowance.
    pub fn input_budget(&self) -> usize {
        self.window_tokens.saturating_sub(self.reserved_output_tokens)
    }

    /// Reply allowance for a given input cost:
    /// `min(cap, max(min, window - input - margin))`.
    pub fn output_allowance(&self, input_tokens: usize) -> usize {
        let free = self
            .window_tokens
            .saturating_sub(input_tokens)
            .saturating_sub(self.safety_margin);
        free.max(self.min_output).min(self.output_cap)
    }

    /// Trim `messages` to the input budget and compute the reply allowance.
    pub fn fit(&self, messages: Vec<WireMessage>) -> Fitted {
        let before = estimate_sequence_tokens(&messages);
        let budget = self.input_budget();

        let (messages, trimmed) = if before > budget {
            (trim_to_budget(&messages, budget, self.head_char_cap), true)
        } else {
            (messages, false)
        };

        let input_tokens = estimate_sequence_tokens(&messages);
        if trimmed {
            tracing::debug!(before, after = input_tokens, budget, "Trimmed conversation to fit the window");
        }

        Fitted {
            max_output_tokens: self.output_allowance(input_tokens),
            input_tokens,
            messages,
            trimmed,
        }
    }
}

/// Keep the head entry and as many of the newest entries as fit in `budget`.
///
/// The result costs at most `budget` tokens, or consists of the head entry
/// alone when the capped head exceeds the budget by itself. A sequence that
/// already fits comes back unchanged.
pub fn trim_to_budget(messages: &[WireMessage], budget: usize, head_char_cap: usize) -> Vec<WireMessage> {
    if estimate_sequence_tokens(messages) <= budget {
        return messages.to_vec();
    }
    let Some((first, rest)) = messages.split_first() else {
        return Vec::new();
    };

    let head = WireMessage {
        role: first.role,
        content: truncate_chars(&first.content, head_char_cap).to_string(),
    };
    let mut remaining = budget.saturating_sub(estimate_tokens(&head.content));

    // Newest first; stop at the first entry that no longer fits.
    let mut tail: Vec<WireMessage> = Vec::new();
    for message in rest.iter().rev() {
        let content = truncate_chars(&message.content, remaining.saturating_mul(CHARS_PER_TOKEN));
        let cost = estimate_tokens(content);
        if cost > remaining {
            break;
        }
        remaining -= cost;
        tail.push(WireMessage {
            role: message.role,
            content: content.to_string(),
        });
    }
    tail.reverse();

    // Merging adjacent entries can round up past the budget; shed the
    // oldest kept entry until the collapsed sequence fits.
    loop {
        let mut assembled = Vec::with_capacity(tail.len() + 1);
        assembled.push(head.clone());
        assembled.extend(tail.iter().cloned());
        let collapsed = collapse(assembled);

        if tail.is_empty() || estimate_sequence_tokens(&collapsed) <= budget {
            return collapsed;
        }
        tail.remove(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::normalize::{is_well_formed, normalize};
    use switchyard_core::message::{Turn, WireRole};

    fn window(window_tokens: usize, reserved: usize) -> ContextWindow {
        ContextWindow {
            window_tokens,
            reserved_output_tokens: reserved,
            ..ContextWindow::default()
        }
    }

    fn long_conversation(pairs: usize, chars: usize) -> Vec<WireMessage> {
        let mut out = Vec::new();
        for i in 0..pairs {
            out.push(WireMessage::user(format!("{i}:{}", "u".repeat(chars))));
            out.push(WireMessage::assistant(format!("{i}:{}", "a".repeat(chars))));
        }
        out
    }

    #[test]
    fn default_budget() {
        let w = ContextWindow::default();
        assert_eq!(w.input_budget(), 7168);
        assert_eq!(w.head_char_cap, 24_000);
    }

    #[test]
    fn fitting_sequence_untouched() {
        let msgs = vec![WireMessage::user("hello"), WireMessage::assistant("hi")];
        let fitted = ContextWindow::default().fit(msgs.clone());
        assert_eq!(fitted.messages, msgs);
        assert!(!fitted.trimmed);
        assert_eq!(fitted.input_tokens, 2);
    }

    #[test]
    fn trimmed_output_fits_budget() {
        let msgs = long_conversation(50, 400);
        let budget = 1000;
        let out = trim_to_budget(&msgs, budget, 24_000);
        assert!(estimate_sequence_tokens(&out) <= budget);
        assert!(is_well_formed(&out));
        // Head survives, newest entry survives
        assert!(out[0].content.starts_with("0:"));
        assert!(out.last().unwrap().content.starts_with("49:"));
    }

    #[test]
    fn keeps_newest_entries_in_order() {
        let msgs = long_conversation(10, 40);
        let out = trim_to_budget(&msgs, 60, 24_000);
        let positions: Vec<usize> = out[1..]
            .iter()
            .map(|m| m.content.split(':').next().unwrap().parse().unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert_eq!(*positions.last().unwrap(), 9);
    }

    #[test]
    fn oversized_head_is_capped_and_alone() {
        let msgs = vec![
            WireMessage::user("x".repeat(100_000)),
            WireMessage::assistant("reply"),
            WireMessage::user("follow up"),
        ];
        let out = trim_to_budget(&msgs, 1000, 24_000);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content.chars().count(), 24_000);
    }

    #[test]
    fn newest_entry_truncated_to_remaining() {
        let msgs = vec![
            WireMessage::user("q".repeat(40)),
            WireMessage::assistant("a".repeat(4000)),
        ];
        // head costs 10, leaving 40 tokens = 160 chars for the tail
        let out = trim_to_budget(&msgs, 50, 24_000);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].content.len(), 160);
        assert_eq!(estimate_sequence_tokens(&out), 50);
    }

    #[test]
    fn merged_tail_never_exceeds_budget() {
        // Dropping the assistant in the middle would put two user entries
        // side by side; their merge must still fit.
        let msgs = vec![
            WireMessage::user("h".repeat(7)),
            WireMessage::assistant("a".repeat(400)),
            WireMessage::user("u".repeat(7)),
        ];
        let budget = 3;
        let out = trim_to_budget(&msgs, budget, 24_000);
        assert!(is_well_formed(&out));
        assert!(estimate_sequence_tokens(&out) <= budget || out.len() == 1);
    }

    #[test]
    fn utf8_content_is_cut_on_char_boundaries() {
        let msgs = vec![
            WireMessage::user("é".repeat(50_000)),
            WireMessage::assistant("ü".repeat(50_000)),
        ];
        let out = trim_to_budget(&msgs, 7168, 24_000);
        assert_eq!(out[0].content.chars().count(), 24_000);
        assert!(estimate_sequence_tokens(&out) <= 7168);
    }

    #[test]
    fn output_allowance_bounds() {
        let w = ContextWindow::default();
        assert_eq!(w.output_allowance(10), 1024);
        assert_eq!(w.output_allowance(7000), 1024);
        assert_eq!(w.output_allowance(7500), 642);
        assert_eq!(w.output_allowance(8000), 256);
        assert_eq!(w.output_allowance(100_000), 256);
    }

    #[test]
    fn normalize_then_fit_is_idempotent_on_compliant_input() {
        let turns = vec![
            Turn::user("What is the GDP of India?"),
            Turn::assistant("About 3.7 trillion USD."),
            Turn::user("And China?"),
        ];
        let wire = normalize(&turns).unwrap();
        let fitted = window(8192, 1024).fit(wire.clone());
        assert_eq!(fitted.messages, wire);

        let again: Vec<Turn> = fitted
            .messages
            .iter()
            .map(|m| match m.role {
                WireRole::User => Turn::user(m.content.as_str()),
                WireRole::Assistant => Turn::assistant(m.content.as_str()),
            })
            .collect();
        assert_eq!(normalize(&again).unwrap(), wire);
    }

    #[test]
    fn tiny_window_still_produces_request() {
        let wire = normalize(&[Turn::system("s".repeat(1000)), Turn::user("q")]).unwrap();
        let fitted = window(100, 90).fit(wire);
        assert_eq!(fitted.messages.len(), 1);
        assert!(fitted.trimmed);
        assert_eq!(fitted.max_output_tokens, 256);
    }
}
