//! Token estimation and history trimming.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, and being pure it keeps the trimming logic trivially testable.

use lodestar_core::message::Message;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up. Monotonic: appending text
/// never decreases the estimate.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Trim a chronological message list to fit a token budget.
///
/// Walks from most-recent to oldest, accumulating
/// `estimate_tokens(content) + per_message_overhead` per message, and stops
/// before the first message that would exceed `max_budget`. The kept
/// messages are returned restored to chronological order, together with the
/// budget they consume.
///
/// A message that alone exceeds the budget is dropped whole — partial-
/// message truncation would hand the model a turn with a broken boundary.
pub fn trim_to_fit(
    messages: &[Message],
    max_budget: usize,
    per_message_overhead: usize,
) -> (Vec<Message>, usize) {
    if max_budget == 0 {
        return (Vec::new(), 0);
    }

    let mut kept: Vec<Message> = Vec::new();
    let mut used = 0;

    for message in messages.iter().rev() {
        let cost = estimate_tokens(&message.content) + per_message_overhead;
        if used + cost > max_budget {
            break;
        }
        kept.push(message.clone());
        used += cost;
    }

    kept.reverse();
    (kept, used)
}
