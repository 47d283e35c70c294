//! Company-name guessing over extracted document text.
//!
//! A convenience heuristic, not an algorithm: an ordered list of patterns
//! for common Japanese corporate forms, first match wins. The CLI lets
//! the user override the guess, and "unknown" is an acceptable answer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback label when no name can be guessed and none was supplied.
pub const UNKNOWN_COMPANY: &str = "（企業名不明）";

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Applicant field: 応募者: / 申請者：
        r"(?:応募者|申請者)[:：]\s*([^\n]{2,30})",
        // Corporate form prefix/suffix
        r"(株式会社[^\s\n]{1,30})",
        r"([^\s\n]{1,30}株式会社)",
        r"(合同会社[^\s\n]{1,30})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[。．,.、\s]+$").unwrap());

/// Guess a company name from free text. Returns `None` when no pattern
/// produces a plausible name.
pub fn guess_company_name(text: &str) -> Option<String> {
    for pattern in PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let name = TRAILING_NOISE.replace(caps[1].trim(), "").to_string();
            let len = name.chars().count();
            if (2..=40).contains(&len) {
                return Some(name);
            }
        }
    }
    None
}
