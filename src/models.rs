//! Core data types used throughout plancheck.
//!
//! These types represent the check modes, retrieval hits, history rows,
//! and reports that flow through the review pipeline.

use anyhow::{bail, Result};

/// The two supported check tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Scored evaluation against the review criteria prompt.
    Criteria,
    /// Proofreading and consistency check.
    Typo,
}

impl CheckMode {
    /// Parse a CLI mode string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "criteria" => Ok(CheckMode::Criteria),
            "typo" => Ok(CheckMode::Typo),
            other => bail!("Unknown check mode: {}. Use criteria or typo.", other),
        }
    }

    /// Machine name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckMode::Criteria => "criteria",
            CheckMode::Typo => "typo",
        }
    }

    /// Label stored in the history CSV and shown to users.
    ///
    /// Kept in Japanese for continuity with history files produced by
    /// earlier versions of the system.
    pub fn label(&self) -> &'static str {
        match self {
            CheckMode::Criteria => "審査項目",
            CheckMode::Typo => "誤字脱字",
        }
    }
}

/// A chunk selected by the retriever, with its position in the original
/// chunk sequence preserved for citation.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    /// 0-based index of the chunk in document order.
    pub index: usize,
    pub text: String,
    /// Cosine similarity to the query (0.0 for the blank-query fallback).
    pub score: f32,
}

/// One append-only row of the check history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S`. Sorts lexicographically.
    pub timestamp: String,
    pub company_name: String,
    /// Absent when no score could be extracted from the model output.
    pub score: Option<u32>,
    /// Mode label, see [`CheckMode::label`].
    pub mode: String,
    pub filename: String,
}

/// The outcome of a completed check run.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub timestamp: String,
    pub company_name: String,
    pub mode: CheckMode,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// The context chunks handed to the model, in rank order.
    pub retrieved: Vec<Retrieved>,
    /// Raw model output.
    pub response: String,
    /// Score extracted from the output, if any.
    pub score: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(CheckMode::parse("criteria").unwrap(), CheckMode::Criteria);
        assert_eq!(CheckMode::parse("typo").unwrap(), CheckMode::Typo);
        assert!(CheckMode::parse("spellcheck").is_err());
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(CheckMode::Criteria.label(), "審査項目");
        assert_eq!(CheckMode::Typo.label(), "誤字脱字");
    }
}
