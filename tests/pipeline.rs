//! End-to-end properties of the chunk → index → retrieve pipeline,
//! exercised through the library API with no model call involved.

use plancheck::chunk::chunk_text;
use plancheck::index::build_index;
use plancheck::retrieve::retrieve_top_k;

#[test]
fn chunking_small_japanese_document() {
    let text = "これは文です。次の文です。最後の文。";
    let chunks = chunk_text(text, 10, 3).unwrap();

    assert!(chunks.len() >= 2, "expected at least two chunks");
    for chunk in &chunks {
        // max_chars plus at most the overlap seed
        assert!(
            chunk.chars().count() <= 13,
            "chunk too long: {:?}",
            chunk
        );
        assert!(!chunk.trim().is_empty());
    }

    // Ignoring the overlap duplication, the three sentences come back in
    // order: each sentence appears somewhere, and first occurrences are
    // ordered like the document.
    let sentences = ["これは文です。", "次の文です。", "最後の文。"];
    let mut last_pos = 0;
    for sentence in sentences {
        let pos = chunks
            .iter()
            .position(|c| c.contains(sentence))
            .unwrap_or_else(|| panic!("sentence {:?} missing from chunks", sentence));
        assert!(pos >= last_pos, "sentence order not preserved");
        last_pos = pos;
    }
}

#[test]
fn chunking_without_overlap_reconstructs_document() {
    let text = "一文目。二文目。三文目。四文目。五文目。";
    let chunks = chunk_text(text, 10, 0).unwrap();
    assert!(chunks.len() >= 2);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn retrieval_prefers_lexical_overlap() {
    let chunks: Vec<String> = ["猫が好き", "犬が好き", "鳥は嫌い"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let index = build_index(&chunks).unwrap();

    let hits = retrieve_top_k("猫", &index, &chunks, 2);
    assert_eq!(hits.len(), 2);
    assert!(hits[0].text.contains("猫"));
    assert_ne!(hits[0].text, "鳥は嫌い");
}

#[test]
fn retrieval_bounds_and_uniqueness() {
    let chunks: Vec<String> = (0..8)
        .map(|i| format!("第{}章の内容です。売上計画と体制。", i))
        .collect();
    let index = build_index(&chunks).unwrap();

    for k in [0usize, 1, 3, 8, 50] {
        let hits = retrieve_top_k("売上計画", &index, &chunks, k);
        assert!(hits.len() <= k.min(chunks.len()));
        let mut indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), hits.len(), "duplicate chunk indices at k={}", k);
        assert!(indices.iter().all(|&i| i < chunks.len()));
    }
}

#[test]
fn blank_query_returns_leading_chunks() {
    let chunks: Vec<String> = ["一。", "二。", "三。"].iter().map(|s| s.to_string()).collect();
    let index = build_index(&chunks).unwrap();

    let hits = retrieve_top_k("", &index, &chunks, 2);
    let indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(hits[0].text, "一。");
    assert_eq!(hits[1].text, "二。");
}

#[test]
fn full_pipeline_is_deterministic() {
    let text = "当社は精密部品の製造を行う。新規設備の導入で生産性を高める。\
                売上は三年で二倍を見込む。品質管理体制を強化する。";
    let chunks_a = chunk_text(text, 20, 5).unwrap();
    let chunks_b = chunk_text(text, 20, 5).unwrap();
    assert_eq!(chunks_a, chunks_b);

    let index_a = build_index(&chunks_a).unwrap();
    let index_b = build_index(&chunks_b).unwrap();

    let hits_a = retrieve_top_k("売上と生産性", &index_a, &chunks_a, 3);
    let hits_b = retrieve_top_k("売上と生産性", &index_b, &chunks_b, 3);
    assert_eq!(hits_a, hits_b);
}

#[test]
fn oversized_sentence_survives_whole() {
    let long_sentence: String = "長".repeat(50) + "。";
    let text = format!("前の文。{}後の文。", long_sentence);
    let chunks = chunk_text(&text, 10, 2).unwrap();

    let holders: Vec<_> = chunks.iter().filter(|c| c.contains(&long_sentence)).collect();
    assert_eq!(holders.len(), 1, "oversized sentence must appear intact exactly once");
}

#[test]
fn query_longer_than_any_chunk_still_ranks() {
    let chunks: Vec<String> = ["設備投資の計画。", "人材育成の方針。"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let index = build_index(&chunks).unwrap();

    // A long query with partial vocabulary overlap must rank the related
    // chunk first; unseen terms contribute nothing.
    let query = "本事業における設備投資の妥当性と、導入機械の性能について評価する";
    let hits = retrieve_top_k(query, &index, &chunks, 2);
    assert_eq!(hits[0].index, 0);
    assert!(hits[0].score >= hits[1].score);
}
