/// Outcome of gating one query on its best retrieval score.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Answer { confidence: f32 },
    Abstain { confidence: f32, message: String },
}

impl GateDecision {
    pub fn confidence(&self) -> f32 {
        match self {
            GateDecision::Answer { confidence } | GateDecision::Abstain { confidence, .. } => *confidence,
        }
    }

    pub fn is_abstain(&self) -> bool { matches!(self, GateDecision::Abstain { .. }) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    /// Minimum raw top score required to answer.
    pub threshold: f32,
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self { Self { threshold } }

    /// Raw cosine scores stay well below 1 even for strong matches, so they are doubled and capped.
    pub fn scale(score: f32) -> f32 { (score * 2.0).clamp(0.0, 1.0) }

    /// `top_score` is `None` when retrieval returned nothing.
    pub fn decide(&self, top_score: Option<f32>) -> GateDecision {
        let Some(score) = top_score else {
            return GateDecision::Abstain { confidence: 0.0, message: "No relevant information found.".into() };
        };
        let confidence = Self::scale(score);
        if score < self.threshold {
            GateDecision::Abstain { confidence, message: format!("Confidence too low ({confidence:.2}).") }
        } else {
            GateDecision::Answer { confidence }
        }
    }
}

impl Default for ConfidenceGate {
    fn default() -> Self { Self::new(crate::config::CONFIDENCE_THRESHOLD) }
}
