//! Extractive answer assembly from retrieved chunks.

use crate::retriever::Hit;
use crate::tokenizer::word_set;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const EXCERPT_CHARS: usize = 500;
const FALLBACK_CHARS: usize = 300;
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub chunk_id: u32,
    /// At most 500 characters, with "..." appended when cut.
    pub text: String,
    /// Rounded to 4 decimal places.
    pub score: f32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Longest prefix of at most `max` characters, and whether anything was cut.
fn prefix_chars(s: &str, max: usize) -> (&str, bool) {
    match s.char_indices().nth(max) {
        Some((byte, _)) => (&s[..byte], true),
        None => (s, false),
    }
}

fn round4(x: f32) -> f32 { (x * 10_000.0).round() / 10_000.0 }

pub fn citation(hit: &Hit<'_>) -> Citation {
    let (excerpt, cut) = prefix_chars(&hit.chunk.text, EXCERPT_CHARS);
    Citation {
        chunk_id: hit.chunk.chunk_id,
        text: if cut { format!("{excerpt}...") } else { excerpt.to_string() },
        score: round4(hit.score),
        source: hit.chunk.source.clone(),
    }
}

/// Sentences from the hits ranked by how many query words they share.
/// Equal overlap keeps the order the sentences appear in, hits taken best first.
fn ranked_sentences(query: &str, hits: &[Hit<'_>]) -> Vec<String> {
    let query_words = word_set(query);
    let combined = hits.iter().map(|h| h.chunk.text.as_str()).collect::<Vec<_>>().join(" ").replace('\n', " ");
    let mut scored: Vec<(String, usize)> = combined
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
        .filter_map(|s| {
            let overlap = word_set(s).intersection(&query_words).count();
            (overlap > 0).then(|| (s.to_string(), overlap))
        })
        .collect();
    // stable
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(MAX_SENTENCES).map(|(s, _)| s).collect()
}

/// Distinct sources in order of first appearance.
fn sources<'a>(hits: &'a [Hit<'_>]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    hits.iter().map(|h| h.chunk.source.as_str()).filter(|s| seen.insert(*s)).collect()
}

pub fn compose_answer(query: &str, hits: &[Hit<'_>]) -> String {
    let sentences = ranked_sentences(query, hits);
    if sentences.is_empty() {
        let top = hits.first().map(|h| h.chunk.text.as_str()).unwrap_or_default();
        let (prefix, cut) = prefix_chars(top, FALLBACK_CHARS);
        return format!("Based on the filing: {prefix}{}", if cut { "..." } else { "" });
    }
    format!("{}. [Sources: {}]", sentences.join(". "), sources(hits).join(", "))
}

/// Build the answer and citations for hits that already passed the confidence gate.
pub fn synthesize(query: &str, hits: &[Hit<'_>]) -> Synthesis {
    Synthesis { answer: compose_answer(query, hits), citations: hits.iter().map(citation).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Chunk;

    fn chunk(source: &str, id: u32, text: &str) -> Chunk {
        Chunk { source: source.into(), chunk_id: id, text: text.into() }
    }

    fn hit(chunk: &Chunk, score: f32) -> Hit<'_> {
        Hit { row: chunk.chunk_id as usize, chunk, score }
    }

    #[test]
    fn picks_overlapping_sentences_and_lists_sources() {
        let a = chunk("10k_2023.txt", 0, "Revenue grew twelve percent in fiscal 2023. The weather was fine today indeed.");
        let b = chunk("10k_2022.txt", 3, "Revenue in fiscal 2022 was flat overall. Foreign exchange revenue risk is material.");
        let hits = [hit(&a, 0.5), hit(&b, 0.4)];
        let answer = compose_answer("How did revenue change in fiscal 2023?", &hits);
        assert!(answer.starts_with("Revenue grew twelve percent in fiscal 2023. "));
        assert!(!answer.contains("weather"));
        assert!(answer.ends_with(". [Sources: 10k_2023.txt, 10k_2022.txt]"));
    }

    #[test]
    fn at_most_three_sentences() {
        let text = "Risk one is described here. Risk two is described here. Risk three is described here. Risk four is described here.";
        let a = chunk("a.txt", 0, text);
        let answer = compose_answer("risk", &[hit(&a, 0.9)]);
        assert!(answer.contains("Risk three"));
        assert!(!answer.contains("Risk four"));
    }

    #[test]
    fn short_segments_are_ignored() {
        let a = chunk("a.txt", 0, "Risk. Risk is everywhere in markets today.");
        let answer = compose_answer("risk", &[hit(&a, 0.9)]);
        assert_eq!(answer, "Risk is everywhere in markets today. [Sources: a.txt]");
    }

    #[test]
    fn falls_back_to_top_chunk_prefix() {
        let long = "x".repeat(400);
        let a = chunk("a.txt", 0, &long);
        let answer = compose_answer("unrelated words", &[hit(&a, 0.9)]);
        assert_eq!(answer, format!("Based on the filing: {}...", "x".repeat(300)));
        assert!(!answer.contains("[Sources"));
    }

    #[test]
    fn citations_truncate_and_round() {
        let long = "é".repeat(600);
        let a = chunk("a.txt", 7, &long);
        let c = citation(&hit(&a, 0.123456));
        assert_eq!(c.chunk_id, 7);
        assert_eq!(c.source, "a.txt");
        assert_eq!(c.text.chars().count(), 503);
        assert!(c.text.ends_with("..."));
        assert!((c.score - 0.1235).abs() < 1e-6);

        let short = chunk("b.txt", 0, "short text");
        assert_eq!(citation(&hit(&short, 0.2)).text, "short text");
    }

    #[test]
    fn equal_overlap_keeps_original_order() {
        let a = chunk("a.txt", 0, "Liquidity risk is discussed in detail. Credit risk is discussed in detail.");
        let b = chunk("b.txt", 0, "Market risk is discussed in detail too.");
        let hits = [hit(&a, 0.5), hit(&b, 0.5)];
        let first = compose_answer("risk", &hits);
        for _ in 0..5 {
            assert_eq!(compose_answer("risk", &hits), first);
        }
        assert!(first.starts_with("Liquidity risk is discussed in detail. Credit risk"));
    }
}
