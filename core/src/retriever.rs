use crate::error::{RagError, Result};
use crate::index::{Chunk, TfidfIndex};
use std::cmp::Ordering;
use std::sync::Arc;

/// One ranked chunk. `row` is its position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    pub row: usize,
    pub chunk: &'a Chunk,
    /// Cosine similarity in (0, 1].
    pub score: f32,
}

/// Cosine ranking over a shared, immutable index.
pub struct Retriever {
    index: Arc<TfidfIndex>,
    row_norms: Vec<f32>,
}

impl Retriever {
    pub fn new(index: Arc<TfidfIndex>) -> Self {
        let row_norms = (0..index.len())
            .map(|i| index.matrix.row(i).iter().map(|w| w * w).sum::<f32>().sqrt())
            .collect();
        Self { index, row_norms }
    }

    pub fn index(&self) -> &TfidfIndex { &self.index }

    /// Rank chunks against `query` and keep the best `top_k` with positive similarity.
    /// Equal scores keep lower rows first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Hit<'_>>> {
        let q = self.index.vectorize(query);
        if q.is_empty() || top_k == 0 || self.index.is_empty() {
            tracing::debug!(query, "no query terms in vocabulary");
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for (i, &norm) in self.row_norms.iter().enumerate() {
            if norm == 0.0 {
                continue;
            }
            let row = self.index.matrix.row(i);
            let dot: f32 = q.iter().map(|&(col, w)| w * row[col as usize]).sum();
            let score = dot / norm;
            if !score.is_finite() {
                return Err(RagError::Internal(format!("non-finite similarity for row {i}")));
            }
            if score > 0.0 {
                scored.push((i, score.min(1.0)));
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        tracing::debug!(query, hits = scored.len(), top = scored.first().map(|s| s.1).unwrap_or(0.0), "retrieved");
        Ok(scored
            .into_iter()
            .map(|(row, score)| Hit { row, chunk: &self.index.chunks[row], score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::fit;
    use crate::tokenizer::Analyzer;

    fn retriever(texts: &[&str]) -> Retriever {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk { source: "doc.txt".into(), chunk_id: i as u32, text: (*t).into() })
            .collect();
        Retriever::new(Arc::new(fit(chunks, 1, 1000, Analyzer::default()).unwrap()))
    }

    #[test]
    fn ranks_by_descending_cosine() {
        let r = retriever(&[
            "goodwill impairment testing",
            "interest rate risk and interest rate swaps",
            "interest income",
        ]);
        let hits = r.retrieve("interest rate", 3).unwrap();
        assert_eq!(hits[0].row, 1);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.score > 0.0 && h.score <= 1.0));
        assert!(hits.iter().all(|h| h.row != 0));
    }

    #[test]
    fn respects_top_k() {
        let r = retriever(&["risk one", "risk two", "risk three", "risk four"]);
        assert_eq!(r.retrieve("risk", 2).unwrap().len(), 2);
        assert!(r.retrieve("risk", 0).unwrap().is_empty());
    }

    #[test]
    fn equal_scores_prefer_lower_rows() {
        let r = retriever(&["liquidity", "solvency", "liquidity"]);
        let hits = r.retrieve("liquidity", 5).unwrap();
        let rows: Vec<usize> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn out_of_vocabulary_query_is_empty() {
        let r = retriever(&["interest rates rose"]);
        assert!(r.retrieve("banana recipe", 3).unwrap().is_empty());
        assert!(r.retrieve("", 3).unwrap().is_empty());
    }

    #[test]
    fn self_match_scores_one() {
        let r = retriever(&["deferred tax assets", "lease obligations"]);
        let hits = r.retrieve("deferred tax assets", 1).unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }
}
