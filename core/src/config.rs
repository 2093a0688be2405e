use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;
pub const CONFIDENCE_THRESHOLD: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target window length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Windows shorter than this are dropped.
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { chunk_size: 512, overlap: 64, min_chunk_size: 50 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub chunker: ChunkerConfig,
    /// Vocabulary cap: only the most frequent terms become columns.
    pub max_features: usize,
    /// Apply English stemming to tokens before forming terms.
    pub stem: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { chunker: ChunkerConfig::default(), max_features: 10_000, stem: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub top_k: usize,
    pub confidence_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K, confidence_threshold: CONFIDENCE_THRESHOLD }
    }
}

impl EngineConfig {
    /// Defaults overridden by RAG_TOP_K and RAG_CONFIDENCE_THRESHOLD when set and parseable.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(k) = std::env::var("RAG_TOP_K").ok().and_then(|v| v.trim().parse::<usize>().ok()) {
            cfg.top_k = k.max(1);
        }
        if let Some(t) = std::env::var("RAG_CONFIDENCE_THRESHOLD").ok().and_then(|v| v.trim().parse::<f32>().ok()) {
            if t.is_finite() && t >= 0.0 {
                cfg.confidence_threshold = t;
            }
        }
        cfg
    }
}
