//! Offline index construction: corpus directory -> chunks -> TF-IDF index -> artifacts.

use crate::chunker::chunk;
use crate::config::{BuildConfig, ChunkerConfig};
use crate::error::{RagError, Result};
use crate::index::{Chunk, Column, DenseMatrix, Document, TfidfIndex, Vocabulary};
use crate::persist::{save_index, IndexPaths};
use crate::tokenizer::Analyzer;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub chunk_count: usize,
    pub document_count: usize,
    pub vocabulary_size: usize,
}

impl BuildStats {
    pub fn of(index: &TfidfIndex) -> Self {
        Self {
            chunk_count: index.chunks.len(),
            document_count: index.document_count,
            vocabulary_size: index.vocabulary.len(),
        }
    }
}

/// Read every `*.txt` file directly under `dir`, in file-name order. Invalid UTF-8 is replaced.
pub fn read_corpus(dir: &Path) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        let p = entry.path();
        if !p.is_file() || p.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        let bytes = fs::read(p)?;
        let id = entry.file_name().to_string_lossy().into_owned();
        docs.push(Document { id, text: String::from_utf8_lossy(&bytes).into_owned() });
    }
    Ok(docs)
}

/// Chunk each document independently; chunk ids restart at 0 per document.
pub fn chunk_documents(docs: &[Document], cfg: &ChunkerConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for doc in docs {
        let before = chunks.len();
        chunks.extend(chunk(&doc.text, cfg).enumerate().map(|(i, text)| Chunk {
            source: doc.id.clone(),
            chunk_id: i as u32,
            text,
        }));
        if chunks.len() == before {
            tracing::warn!(source = %doc.id, "document produced no chunks");
        }
    }
    chunks
}

/// Fit vocabulary and weights over `chunks`, preserving their order as row order.
pub fn fit(chunks: Vec<Chunk>, document_count: usize, max_features: usize, analyzer: Analyzer) -> Result<TfidfIndex> {
    let chunk_terms: Vec<Vec<String>> = chunks.iter().map(|c| analyzer.terms(&c.text)).collect();

    let mut corpus_tf: HashMap<&str, u64> = HashMap::new();
    let mut df: HashMap<&str, u32> = HashMap::new();
    for terms in &chunk_terms {
        let mut seen: HashSet<&str> = HashSet::new();
        for term in terms {
            *corpus_tf.entry(term.as_str()).or_insert(0) += 1;
            if seen.insert(term.as_str()) {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }
    }

    // Most frequent first, lexicographic among equals; columns then follow term order.
    let mut ranked: Vec<(&str, u64)> = corpus_tf.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_features);
    let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
    kept.sort_unstable();

    let n = chunks.len() as f32;
    let mut vocabulary: BTreeMap<String, Column> = BTreeMap::new();
    let mut idf: Vec<f32> = Vec::with_capacity(kept.len());
    for (col, term) in kept.iter().enumerate() {
        let df_t = df.get(term).copied().unwrap_or(0) as f32;
        idf.push(((1.0 + n) / (1.0 + df_t)).ln() + 1.0);
        vocabulary.insert((*term).to_string(), col as Column);
    }
    let vocabulary = Vocabulary { vocabulary, idf };

    let mut matrix = DenseMatrix::zeros(chunks.len(), vocabulary.len())?;
    for (i, terms) in chunk_terms.iter().enumerate() {
        let row = matrix.row_mut(i);
        for term in terms {
            if let Some(col) = vocabulary.column(term) {
                row[col as usize] += 1.0;
            }
        }
        let mut norm = 0.0f32;
        for (col, w) in row.iter_mut().enumerate() {
            *w *= vocabulary.idf[col];
            norm += *w * *w;
        }
        let norm = norm.sqrt();
        if norm > 0.0 {
            for w in row.iter_mut() { *w /= norm; }
        }
    }

    Ok(TfidfIndex { chunks, vocabulary, matrix, analyzer, document_count })
}

/// Chunk and fit in memory. `Ok(None)` when the documents yield no chunks at all.
pub fn index_documents(docs: &[Document], cfg: &BuildConfig) -> Result<Option<TfidfIndex>> {
    let chunks = chunk_documents(docs, &cfg.chunker);
    if chunks.is_empty() {
        return Ok(None);
    }
    fit(chunks, docs.len(), cfg.max_features, Analyzer::new(cfg.stem)).map(Some)
}

/// Build and persist an index from the `*.txt` files in `input`.
/// Nothing is written unless the corpus yields at least one chunk.
pub fn build_index(input: &Path, output: &Path, cfg: &BuildConfig) -> Result<BuildStats> {
    let docs = read_corpus(input)?;
    tracing::info!(documents = docs.len(), input = %input.display(), "read corpus");
    let index = index_documents(&docs, cfg)?.ok_or_else(|| RagError::EmptyCorpus { path: input.to_path_buf() })?;
    save_index(&IndexPaths::new(output), &index)?;
    let stats = BuildStats::of(&index);
    tracing::info!(
        chunks = stats.chunk_count,
        documents = stats.document_count,
        vocabulary = stats.vocabulary_size,
        output = %output.display(),
        "index build complete"
    );
    Ok(stats)
}
