use crate::error::{RagError, Result};
use crate::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type ChunkId = u32;
pub type Column = u32;

/// A source file and its raw text.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name; carried into every chunk and citation.
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub source: String,
    /// 0-based position within `source`.
    pub chunk_id: ChunkId,
    pub text: String,
}

/// Frozen term -> column mapping plus the idf of each column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Ordered so the persisted JSON is stable across builds.
    pub vocabulary: BTreeMap<String, Column>,
    /// Indexed by column.
    pub idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.idf.len() }
    pub fn is_empty(&self) -> bool { self.idf.is_empty() }
    pub fn column(&self, term: &str) -> Option<Column> { self.vocabulary.get(term).copied() }

    /// Columns must be exactly 0..len with one term each.
    pub fn is_consistent(&self) -> bool {
        if self.vocabulary.len() != self.idf.len() {
            return false;
        }
        let mut seen = vec![false; self.idf.len()];
        for &col in self.vocabulary.values() {
            match seen.get_mut(col as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }
}

/// Dense row-major matrix: one row per chunk, one column per vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    pub rows: u32,
    pub cols: u32,
    pub data: Vec<f32>,
}

impl DenseMatrix {
    /// Fails when either dimension does not fit the persisted `u32` header.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let too_large = || RagError::TooLarge { rows, cols };
        let r = u32::try_from(rows).map_err(|_| too_large())?;
        let c = u32::try_from(cols).map_err(|_| too_large())?;
        let len = rows.checked_mul(cols).ok_or_else(too_large)?;
        Ok(Self { rows: r, cols: c, data: vec![0.0; len] })
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let cols = self.cols as usize;
        &self.data[i * cols..(i + 1) * cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let cols = self.cols as usize;
        &mut self.data[i * cols..(i + 1) * cols]
    }

    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.rows as usize * self.cols as usize
    }
}

/// The full read-only index. Row `i` of `matrix` is the weight vector of `chunks[i]`.
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    pub chunks: Vec<Chunk>,
    pub vocabulary: Vocabulary,
    pub matrix: DenseMatrix,
    pub analyzer: Analyzer,
    pub document_count: usize,
}

impl TfidfIndex {
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    /// Project text into the index space: raw counts of in-vocabulary terms times frozen idf,
    /// L2-normalized. Out-of-vocabulary terms are ignored. Sparse (column, weight) pairs.
    pub fn vectorize(&self, text: &str) -> Vec<(Column, f32)> {
        let mut counts: HashMap<Column, u32> = HashMap::new();
        for term in self.analyzer.terms(text) {
            if let Some(col) = self.vocabulary.column(&term) {
                *counts.entry(col).or_insert(0) += 1;
            }
        }
        let mut weights: Vec<(Column, f32)> = counts
            .into_iter()
            .map(|(col, tf)| (col, tf as f32 * self.vocabulary.idf[col as usize]))
            .collect();
        weights.sort_by_key(|(col, _)| *col);
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in weights.iter_mut() { *w /= norm; }
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_consistency() {
        let mut v = Vocabulary {
            vocabulary: BTreeMap::from([("rate".to_string(), 1), ("risk".to_string(), 0)]),
            idf: vec![1.0, 1.5],
        };
        assert!(v.is_consistent());
        v.vocabulary.insert("loss".into(), 1);
        assert!(!v.is_consistent());
    }

    #[test]
    fn matrix_rows_are_contiguous() {
        let mut m = DenseMatrix::zeros(2, 3).unwrap();
        m.row_mut(1)[2] = 4.0;
        assert_eq!(m.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(m.row(1), &[0.0, 0.0, 4.0]);
        assert!(m.is_well_formed());
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let rows = u32::MAX as usize + 1;
        assert!(matches!(DenseMatrix::zeros(rows, 0), Err(RagError::TooLarge { .. })));
        assert!(matches!(DenseMatrix::zeros(0, rows), Err(RagError::TooLarge { .. })));
    }
}
