//! Best-effort score extraction from model output.
//!
//! The evaluation prompt asks for a JSON body with an integer `score`
//! field, but the model may answer in prose. Extraction tries the JSON
//! field first, then the textual patterns `"score": N` and `N点`.
//! Anything outside 0–100 (or no match at all) yields no score — a
//! missing score is recorded as such, never substituted.

use once_cell::sync::Lazy;
use regex::Regex;

static SCORE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""score"\s*:\s*(\d{1,3})"#).unwrap());
static SCORE_POINTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,3})\s*点").unwrap());

/// Extract an integer score in `[0, 100]` from model output.
pub fn parse_score(text: &str) -> Option<u32> {
    // Structured output: a JSON object with a numeric (or numeric-string)
    // "score" member.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        let field = match value.get("score") {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if let Some(n) = field {
            if (0..=100).contains(&n) {
                return Some(n as u32);
            }
        }
    }

    // Textual fallbacks, in order.
    for pattern in [&*SCORE_FIELD, &*SCORE_POINTS] {
        if let Some(caps) = pattern.captures(text) {
            if let Ok(n) = caps[1].parse::<i64>() {
                if (0..=100).contains(&n) {
                    return Some(n as u32);
                }
            }
        }
    }

    None
}
