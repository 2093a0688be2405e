use crate::builder::BuildStats;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::gate::{ConfidenceGate, GateDecision};
use crate::index::TfidfIndex;
use crate::persist::{load_index, IndexPaths};
use crate::retriever::Retriever;
use crate::synth::{self, Citation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// What a caller gets back for one question. `message` is set only when abstaining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub answer: String,
    pub confidence: f32,
    pub citations: Vec<Citation>,
    pub abstained: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl QaResponse {
    fn abstain(confidence: f32, message: String) -> Self {
        Self { answer: String::new(), confidence, citations: Vec::new(), abstained: true, message: Some(message) }
    }
}

/// Retrieve, gate and synthesize over an index that is loaded once and never mutated.
pub struct QaEngine {
    retriever: Retriever,
    gate: ConfidenceGate,
    top_k: usize,
}

impl QaEngine {
    pub fn new(index: Arc<TfidfIndex>, cfg: EngineConfig) -> Self {
        Self { retriever: Retriever::new(index), gate: ConfidenceGate::new(cfg.confidence_threshold), top_k: cfg.top_k }
    }

    /// Load the artifacts under `dir`. Fails with `IndexNotFound` if any is missing.
    pub fn open<P: AsRef<Path>>(dir: P, cfg: EngineConfig) -> Result<Self> {
        let index = load_index(&IndexPaths::new(dir))?;
        Ok(Self::new(Arc::new(index), cfg))
    }

    pub fn index(&self) -> &TfidfIndex { self.retriever.index() }

    pub fn stats(&self) -> BuildStats { BuildStats::of(self.index()) }

    pub fn retriever(&self) -> &Retriever { &self.retriever }

    /// Answer `question` or abstain. `Err` means something broke, never "no answer".
    pub fn synthesize(&self, question: &str) -> Result<QaResponse> {
        let hits = self.retriever.retrieve(question, self.top_k)?;
        match self.gate.decide(hits.first().map(|h| h.score)) {
            GateDecision::Abstain { confidence, message } => {
                tracing::debug!(question, confidence, "abstained");
                Ok(QaResponse::abstain(confidence, message))
            }
            GateDecision::Answer { confidence } => {
                let out = synth::synthesize(question, &hits);
                Ok(QaResponse {
                    answer: out.answer,
                    confidence: (confidence * 10_000.0).round() / 10_000.0,
                    citations: out.citations,
                    abstained: false,
                    message: None,
                })
            }
        }
    }
}
