//! Message normalization: conversation turns to the two-role wire protocol.
//!
//! The backend accepts only `user`/`assistant` entries, strictly
//! alternating, starting with `user`. Conversations are messier: the
//! supervisor wraps them in system instructions, and two actors can answer
//! back to back. Normalization:
//!
//! 1. Splits system content from user/assistant turns
//! 2. Folds system content into the first user entry as a prefix
//! 3. Collapses consecutive same-role entries
//! 4. Inserts a placeholder user entry if the sequence opens with assistant

use switchyard_core::error::Error;
use switchyard_core::message::{Role, Turn, WireMessage, WireRole};

/// Label placed in front of folded system content.
pub const SYSTEM_PREFIX: &str = "System instruction: ";

/// Content of the synthetic user entry that opens an assistant-first sequence.
pub const CONTINUE_PLACEHOLDER: &str = "Continue.";

/// Separator used when two same-role entries are merged.
pub const MERGE_SEPARATOR: &str = "\n\n";

/// Convert conversation turns into a wire sequence.
///
/// Fails fast with [`Error::EmptyConversation`] on zero turns.
pub fn normalize(turns: &[Turn]) -> Result<Vec<WireMessage>, Error> {
    if turns.is_empty() {
        return Err(Error::EmptyConversation);
    }

    let mut system_parts: Vec<&str> = Vec::new();
    let mut raw: Vec<WireMessage> = Vec::with_capacity(turns.len() + 1);

    for turn in turns {
        match turn.role {
            Role::System => system_parts.push(&turn.content),
            Role::User => raw.push(WireMessage::user(turn.content.as_str())),
            Role::Assistant => raw.push(WireMessage::assistant(turn.content.as_str())),
        }
    }

    if !system_parts.is_empty() {
        let prefix = format!("{SYSTEM_PREFIX}{}\n\n", system_parts.join("\n").trim());
        match raw.first_mut() {
            Some(first) if first.role == WireRole::User => {
                first.content.insert_str(0, &prefix);
            }
            _ => raw.insert(0, WireMessage::user(prefix.trim())),
        }
    }

    Ok(collapse(raw))
}

/// Merge adjacent same-role entries and force a leading user entry.
///
/// Idempotent: an already-alternating, user-first sequence comes back
/// unchanged.
pub fn collapse(messages: Vec<WireMessage>) -> Vec<WireMessage> {
    let mut out: Vec<WireMessage> = Vec::with_capacity(messages.len());

    for message in messages {
        match out.last_mut() {
            Some(prev) if prev.role == message.role => {
                prev.content.push_str(MERGE_SEPARATOR);
                prev.content.push_str(&message.content);
            }
            _ => out.push(message),
        }
    }

    if out.first().is_some_and(|m| m.role != WireRole::User) {
        out.insert(0, WireMessage::user(CONTINUE_PLACEHOLDER));
    }

    out
}

/// Check the wire invariants: user first, no two adjacent entries share a role.
pub fn is_well_formed(messages: &[WireMessage]) -> bool {
    let starts_with_user = messages.first().is_none_or(|m| m.role == WireRole::User);
    starts_with_user && messages.windows(2).all(|w| w[0].role != w[1].role)
}
