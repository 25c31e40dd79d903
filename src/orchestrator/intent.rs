// ── Orchestrator: intent classification ────────────────────────────────────
// A small rule set augmented by the AI client for ambiguous text
// (spec.md §4.6 step 1). Keyword matching first since it is free and
// covers the common cases; only genuinely ambiguous text pays for an AI
// round trip.

use serde::{Deserialize, Serialize};

use crate::ai::ProviderChain;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MoveTime,
    Insert,
    Delete,
    Replace,
    Update,
    Explain,
    Booking,
    Unknown,
}

const MOVE_KEYWORDS: &[&str] = &["move", "reschedule", "shift", "push back", "push it", "earlier", "later"];
const INSERT_KEYWORDS: &[&str] = &["add", "insert", "include", "also visit", "squeeze in"];
const DELETE_KEYWORDS: &[&str] = &["remove", "delete", "cancel", "drop", "skip"];
const REPLACE_KEYWORDS: &[&str] = &["replace", "swap", "instead of", "switch"];
const UPDATE_KEYWORDS: &[&str] = &["change", "update", "rename", "edit"];
const EXPLAIN_KEYWORDS: &[&str] = &["why", "what is", "explain", "tell me about", "how long", "how much"];
const BOOKING_KEYWORDS: &[&str] = &["book", "booking", "reserve", "reservation", "confirm"];

/// Keyword pass only. Returns `Unknown` when nothing matches, signalling
/// the caller to try the AI fallback.
pub fn classify_rule_based(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let groups: &[(Intent, &[&str])] = &[
        (Intent::Booking, BOOKING_KEYWORDS),
        (Intent::Delete, DELETE_KEYWORDS),
        (Intent::Replace, REPLACE_KEYWORDS),
        (Intent::MoveTime, MOVE_KEYWORDS),
        (Intent::Insert, INSERT_KEYWORDS),
        (Intent::Update, UPDATE_KEYWORDS),
        (Intent::Explain, EXPLAIN_KEYWORDS),
    ];
    for (intent, keywords) in groups {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *intent;
        }
    }
    Intent::Unknown
}

/// Full classification: rule set first, AI fallback for ambiguous text
/// (spec.md §4.6: "a small rule set augmented by the AI client; ambiguity
/// → UNKNOWN"). The AI fallback itself may still resolve to `Unknown`.
pub async fn classify(text: &str, ai: &ProviderChain) -> Intent {
    let rule_based = classify_rule_based(text);
    if rule_based != Intent::Unknown {
        return rule_based;
    }

    let system = "Classify the user's itinerary-editing request into exactly one category.";
    let hint = "respond with JSON {\"intent\": one of move_time|insert|delete|replace|update|explain|booking|unknown}";
    match ai.generate_structured(system, text, hint).await {
        Ok(raw) => serde_json::from_str::<IntentResponse>(&raw).map(|r| r.intent).unwrap_or(Intent::Unknown),
        Err(_) => Intent::Unknown,
    }
}

#[derive(Deserialize)]
struct IntentResponse {
    intent: Intent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_move_requests() {
        assert_eq!(classify_rule_based("please move the museum visit to 3pm"), Intent::MoveTime);
    }

    #[test]
    fn classifies_delete_requests() {
        assert_eq!(classify_rule_based("cancel the dinner reservation"), Intent::Delete);
    }

    #[test]
    fn classifies_explain_requests() {
        assert_eq!(classify_rule_based("why is this museum included?"), Intent::Explain);
    }

    #[test]
    fn unmatched_text_is_unknown() {
        assert_eq!(classify_rule_based("blah blah nonsense"), Intent::Unknown);
    }
}
