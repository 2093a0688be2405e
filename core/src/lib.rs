//! Extractive question answering over plain-text filings.
//!
//! The offline path chunks a corpus and fits a TF-IDF index
//! ([`builder`], [`persist`]); the serving path loads that index once and
//! answers questions through [`QaEngine`]: retrieve, gate, synthesize.

pub mod builder;
pub mod chunker;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod gate;
pub mod index;
pub mod persist;
pub mod retriever;
pub mod synth;
pub mod tokenizer;

pub use builder::{build_index, BuildStats};
pub use chunker::chunk;
pub use config::{BuildConfig, ChunkerConfig, EngineConfig};
pub use engine::{QaEngine, QaResponse};
pub use error::{RagError, Result};
pub use gate::{ConfidenceGate, GateDecision};
pub use index::{Chunk, DenseMatrix, Document, TfidfIndex, Vocabulary};
pub use retriever::{Hit, Retriever};
pub use synth::Citation;
