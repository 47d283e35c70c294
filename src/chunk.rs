//! Japanese-aware sentence chunker.
//!
//! Splits document text into sentence units on the terminal markers
//! `。` `！` `？` and newline, keeping the marker attached to its unit,
//! then packs units into windows bounded by a maximum character count.
//! Adjacent windows share an `overlap`-character tail so that context
//! crossing a window boundary is not lost.
//!
//! A unit longer than `max_chars` is never split further — it becomes
//! its own oversized chunk. Sentences stay whole.

use anyhow::{bail, Result};

/// Sentence terminators. A unit is everything up to and including one of these.
const TERMINATORS: [char; 4] = ['。', '！', '？', '\n'];

/// Split text into sentence units.
///
/// Each unit ends with its terminator; trailing text without a terminator
/// becomes a final unit if it is not pure whitespace. Whitespace-only
/// terminated units (e.g. a bare newline) are kept — the windowing pass
/// trims them away at chunk boundaries.
pub fn split_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut buf = String::new();
    for ch in text.chars() {
        buf.push(ch);
        if TERMINATORS.contains(&ch) {
            units.push(std::mem::take(&mut buf));
        }
    }
    if !buf.trim().is_empty() {
        units.push(buf);
    }
    units
}

/// Split `text` into overlapping chunks of at most `max_chars` characters.
///
/// Units are accumulated into a buffer while they fit; when the next unit
/// would overflow, the buffer is flushed (trimmed) as a chunk and the next
/// buffer is seeded with the trailing `overlap` characters of the flushed
/// one. Counts are in characters, not bytes.
///
/// Invalid parameters (`max_chars == 0`, `overlap >= max_chars`) are
/// rejected before any segmentation happens. Empty input yields an empty
/// sequence.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<String>> {
    if max_chars == 0 {
        bail!("chunking.max_chars must be > 0");
    }
    if overlap >= max_chars {
        bail!(
            "chunking.overlap ({}) must be smaller than max_chars ({})",
            overlap,
            max_chars
        );
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for unit in split_units(text) {
        let unit_chars = unit.chars().count();
        if buf_chars + unit_chars <= max_chars {
            buf.push_str(&unit);
            buf_chars += unit_chars;
            continue;
        }

        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        // Seed the next window with the tail of the flushed buffer.
        if overlap > 0 && buf_chars > overlap {
            buf = char_tail(&buf, overlap);
        } else {
            buf.clear();
        }
        buf.push_str(&unit);
        buf_chars = buf.chars().count();
    }

    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    Ok(chunks)
}

/// Last `n` characters of `s` (the whole string if shorter).
fn char_tail(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        return s.to_string();
    }
    let skip = count - n;
    let start = s
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 100, 10).unwrap().is_empty());
        assert!(chunk_text("   \n  ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("これは文です。", 100, 10).unwrap();
        assert_eq!(chunks, vec!["これは文です。".to_string()]);
    }

    #[test]
    fn test_units_keep_terminators() {
        let units = split_units("一文目。二文目！三文目？残り");
        assert_eq!(units, vec!["一文目。", "二文目！", "三文目？", "残り"]);
    }

    #[test]
    fn test_newline_is_a_terminator() {
        let units = split_units("見出し\n本文です。");
        assert_eq!(units, vec!["見出し\n", "本文です。"]);
    }

    #[test]
    fn test_no_overlap_reconstructs_text() {
        let text = "これは文です。次の文です。最後の文。";
        let chunks = chunk_text(text, 10, 0).unwrap();
        assert!(chunks.len() >= 2);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_overlap_seeds_next_chunk() {
        let text = "これは文です。次の文です。最後の文。";
        let chunks = chunk_text(text, 10, 3).unwrap();
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            // max_chars plus at most the overlap seed
            assert!(chunk.chars().count() <= 13, "oversized chunk: {}", chunk);
        }
        // The second chunk starts with the tail of the first.
        let tail: String = chunks[0]
            .chars()
            .rev()
            .take(3)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert!(chunks[1].starts_with(&tail));
    }

    #[test]
    fn test_chunks_preserve_document_order() {
        let text = "一。二。三。四。五。六。七。八。";
        let chunks = chunk_text(text, 4, 0).unwrap();
        let rejoined = chunks.concat();
        assert_eq!(rejoined, text);
        for chunk in &chunks {
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn test_oversized_unit_never_split() {
        let long_unit: String = "あ".repeat(30) + "。";
        let text = format!("短い文。{}次の文。", long_unit);
        let chunks = chunk_text(&text, 10, 0).unwrap();
        // The oversized sentence appears intact in exactly one chunk.
        let holders: Vec<_> = chunks.iter().filter(|c| c.contains(&long_unit)).collect();
        assert_eq!(holders.len(), 1);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(chunk_text("文。", 0, 0).is_err());
        assert!(chunk_text("文。", 10, 10).is_err());
        assert!(chunk_text("文。", 10, 20).is_err());
    }

    #[test]
    fn test_deterministic() {
        let text = "検証用の文です。二つ目の文です。三つ目です！最後？";
        let a = chunk_text(text, 12, 4).unwrap();
        let b = chunk_text(text, 12, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_char_tail_multibyte_safe() {
        assert_eq!(char_tail("日本語です", 2), "です");
        assert_eq!(char_tail("短い", 10), "短い");
    }
}
