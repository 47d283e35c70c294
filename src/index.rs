//! Per-document TF-IDF index over a chunk set.
//!
//! The index is a value built once per check run and discarded with it:
//! the vocabulary is fitted only on the chunks of the document being
//! checked, never shared across runs. Terms are unigrams and bigrams of
//! script-aware word tokens; weights are smoothed TF-IDF with
//! L2-normalized rows, so a dot product between rows (or between a row
//! and a transformed query) is a cosine similarity.
//!
//! Tokenization is script-aware: Latin/numeric runs become word tokens,
//! while each CJK character is its own token. Unspaced Japanese text has
//! no word boundaries, and treating a whole clause as a single token
//! would make lexical matching useless.

use std::collections::HashMap;

use anyhow::{bail, Result};

/// Vocabulary cap. Irrelevant for typical chunk counts (tens of chunks),
/// guards pathological inputs.
pub const MAX_VOCAB_TERMS: usize = 50_000;

/// Fitted vocabulary, IDF weights, and the chunk×term weight matrix.
///
/// Row `i` corresponds exactly to `chunks[i]` of the chunk set the index
/// was built from.
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
    /// Sparse rows sorted by term id, L2-normalized.
    rows: Vec<Vec<(usize, f32)>>,
}

/// Build a TF-IDF index over `chunks`.
///
/// Fitting on an empty chunk set is a configuration error, not a valid
/// degenerate case — the caller must have produced at least one chunk.
pub fn build_index(chunks: &[String]) -> Result<TfidfIndex> {
    if chunks.is_empty() {
        bail!("cannot build a TF-IDF index over an empty chunk set");
    }

    // Term counts per chunk, plus document and corpus frequencies.
    let mut chunk_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(chunks.len());
    let mut df: HashMap<String, u32> = HashMap::new();
    let mut corpus_tf: HashMap<String, u64> = HashMap::new();

    for chunk in chunks {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in terms(&tokenize(chunk)) {
            *counts.entry(term).or_insert(0) += 1;
        }
        for (term, count) in &counts {
            *df.entry(term.clone()).or_insert(0) += 1;
            *corpus_tf.entry(term.clone()).or_insert(0) += u64::from(*count);
        }
        chunk_counts.push(counts);
    }

    // Select the vocabulary: cap by corpus frequency, then assign term ids
    // in lexicographic order so identical input yields an identical index.
    let mut selected: Vec<&String> = df.keys().collect();
    if selected.len() > MAX_VOCAB_TERMS {
        selected.sort_by(|a, b| corpus_tf[*b].cmp(&corpus_tf[*a]).then(a.cmp(b)));
        selected.truncate(MAX_VOCAB_TERMS);
    }
    selected.sort();

    let vocab: HashMap<String, usize> = selected
        .iter()
        .enumerate()
        .map(|(id, term)| ((*term).clone(), id))
        .collect();

    // Smoothed IDF: ln((1 + n) / (1 + df)) + 1.
    let n = chunks.len() as f32;
    let mut idf = vec![0.0f32; vocab.len()];
    for (term, &id) in &vocab {
        let d = df[term] as f32;
        idf[id] = ((1.0 + n) / (1.0 + d)).ln() + 1.0;
    }

    // Weight rows and L2-normalize them.
    let rows = chunk_counts
        .iter()
        .map(|counts| {
            let mut row: Vec<(usize, f32)> = counts
                .iter()
                .filter_map(|(term, &count)| {
                    vocab.get(term).map(|&id| (id, count as f32 * idf[id]))
                })
                .collect();
            row.sort_by_key(|&(id, _)| id);
            l2_normalize(&mut row);
            row
        })
        .collect();

    Ok(TfidfIndex { vocab, idf, rows })
}

impl TfidfIndex {
    /// Number of rows (one per chunk).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of terms in the fitted vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Transform a query into the fitted vector space.
    ///
    /// Terms not seen during fitting are ignored — they contribute zero
    /// weight. The result is L2-normalized; it is empty when no query
    /// term is in the vocabulary.
    pub fn query_vector(&self, query: &str) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms(&tokenize(query)) {
            if let Some(&id) = self.vocab.get(&term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let mut vector: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(id, count)| (id, count * self.idf[id]))
            .collect();
        vector.sort_by_key(|&(id, _)| id);
        l2_normalize(&mut vector);
        vector
    }

    /// Cosine similarity between a transformed query and row `row`.
    ///
    /// Both sides are L2-normalized, so this is a sparse dot product.
    /// Returns 0.0 when either side is empty.
    pub fn similarity(&self, query_vector: &[(usize, f32)], row: usize) -> f32 {
        sparse_dot(query_vector, &self.rows[row])
    }
}

/// Script-aware word tokenizer.
///
/// Alphanumeric runs become lowercased word tokens; each CJK character is
/// emitted as its own token. Everything else is a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for ch in text.chars() {
        if is_cjk(ch) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            tokens.push(ch.to_string());
        } else if ch.is_alphanumeric() {
            word.extend(ch.to_lowercase());
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

/// Unigram and bigram terms over a token sequence.
fn terms(tokens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = tokens.to_vec();
    for pair in tokens.windows(2) {
        out.push(format!("{} {}", pair[0], pair[1]));
    }
    out
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{31F0}'..='\u{31FF}' // katakana phonetic extensions
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}' // CJK compatibility ideographs
        | '\u{FF66}'..='\u{FF9D}' // halfwidth katakana
    )
}

fn l2_normalize(vector: &mut [(usize, f32)]) {
    let norm: f32 = vector.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for entry in vector.iter_mut() {
            entry.1 /= norm;
        }
    }
}

/// Dot product of two sparse vectors sorted by term id.
fn sparse_dot(a: &[(usize, f32)], b: &[(usize, f32)]) -> f32 {
    let mut dot = 0.0f32;
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
