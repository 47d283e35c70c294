//! Top-K chunk retrieval against a fitted TF-IDF index.
//!
//! Scores every chunk by cosine similarity to the query and returns the
//! `k` best, each carrying its original position in the chunk sequence.
//! A blank query is not an error: the pipeline falls back to the first
//! `k` chunks in document order so a degenerate query never stalls a run.

use crate::index::TfidfIndex;
use crate::models::Retrieved;

/// Retrieve the top `k` chunks for `query`.
///
/// Results are ordered by similarity descending; ties break on the lower
/// original index, so identical input always produces identical output.
/// `k` is clamped to the chunk count, and `k == 0` yields nothing.
pub fn retrieve_top_k(
    query: &str,
    index: &TfidfIndex,
    chunks: &[String],
    k: usize,
) -> Vec<Retrieved> {
    debug_assert_eq!(index.len(), chunks.len());

    if k == 0 || chunks.is_empty() {
        return Vec::new();
    }
    let k = k.min(chunks.len());

    if query.trim().is_empty() {
        return chunks
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, text)| Retrieved {
                index: i,
                text: text.clone(),
                score: 0.0,
            })
            .collect();
    }

    let query_vector = index.query_vector(query);
    let mut scored: Vec<(usize, f32)> = (0..chunks.len())
        .map(|i| (i, index.similarity(&query_vector, i)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(k);

    scored
        .into_iter()
        .map(|(i, score)| Retrieved {
            index: i,
            text: chunks[i].clone(),
            score,
        })
        .collect()
}
