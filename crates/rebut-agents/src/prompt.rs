//! Prompt rendering helpers

use rebut_core::text::truncate_chars;
use rebut_core::{Evidence, Round};

/// Per-side character budget in the argument generator's history
pub const ARGUMENT_HISTORY_CHARS: usize = 100;

/// Per-side character budget in the moderator's transcript
pub const MODERATOR_HISTORY_CHARS: usize = 150;

/// Render the trailing `window` rounds as the opponent sees them
pub fn render_history(rounds: &[Round], window: usize) -> String {
    if rounds.is_empty() {
        return String::new();
    }
    let start = rounds.len().saturating_sub(window);
    let mut out = String::from("\n\nPrevious debate rounds:\n");
    for round in &rounds[start..] {
        out.push_str(&format!(
            "Round {}: User said: {}...\n",
            round.round,
            truncate_chars(&round.user_argument, ARGUMENT_HISTORY_CHARS)
        ));
        out.push_str(&format!(
            "You responded: {}...\n",
            truncate_chars(&round.ai_argument, ARGUMENT_HISTORY_CHARS)
        ));
    }
    out
}

/// Render every round as a moderator transcript
pub fn render_transcript(topic: &str, rounds: &[Round]) -> String {
    let mut out = format!("Topic: {}\n\n", topic);
    for round in rounds {
        out.push_str(&format!("Round {}:\n", round.round));
        out.push_str(&format!(
            "User: {}...\n",
            truncate_chars(&round.user_argument, MODERATOR_HISTORY_CHARS)
        ));
        out.push_str(&format!(
            "AI: {}...\n\n",
            truncate_chars(&round.ai_argument, MODERATOR_HISTORY_CHARS)
        ));
    }
    out
}

/// Render evidence as a numbered list
pub fn render_evidence(evidence: &[Evidence]) -> String {
    if evidence.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n\nEvidence to support your argument:\n");
    for (idx, item) in evidence.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (Source: {})\n",
            idx + 1,
            item.snippet,
            item.source
        ));
    }
    out
}
