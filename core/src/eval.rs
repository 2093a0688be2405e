//! Accuracy tally for a JSONL set of test questions.

use crate::engine::QaEngine;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub question: String,
    #[serde(default)]
    pub expect_abstain: bool,
    #[serde(default)]
    pub expected_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub question: String,
    pub answer: String,
    pub abstained: bool,
    pub confidence: f32,
    pub citations: usize,
    pub correct: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalReport {
    pub total: usize,
    pub answered: usize,
    pub abstained: usize,
    pub correct: usize,
    pub citations_provided: usize,
    pub avg_confidence: f32,
    pub accuracy: f32,
    pub details: Vec<CaseResult>,
}

pub fn load_testset(path: &Path) -> Result<Vec<TestCase>> {
    let reader = BufReader::new(File::open(path)?);
    let mut cases = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        cases.push(serde_json::from_str(&line)?);
    }
    Ok(cases)
}

/// Run every case through the engine. An internal failure aborts the whole run.
pub fn evaluate(engine: &QaEngine, cases: &[TestCase]) -> Result<EvalReport> {
    let mut report = EvalReport { total: cases.len(), ..EvalReport::default() };
    let mut confidence_sum = 0.0f32;

    for case in cases {
        let r = engine.synthesize(&case.question)?;
        let correct = if r.abstained {
            report.abstained += 1;
            case.expect_abstain
        } else {
            report.answered += 1;
            if case.expected_keywords.is_empty() {
                !case.expect_abstain
            } else {
                let answer = r.answer.to_lowercase();
                case.expected_keywords.iter().any(|kw| answer.contains(&kw.to_lowercase()))
            }
        };
        if correct { report.correct += 1; }
        if !r.citations.is_empty() { report.citations_provided += 1; }
        confidence_sum += r.confidence;
        report.details.push(CaseResult {
            question: case.question.clone(),
            answer: r.answer,
            abstained: r.abstained,
            confidence: r.confidence,
            citations: r.citations.len(),
            correct,
        });
    }

    if report.total > 0 {
        report.avg_confidence = confidence_sum / report.total as f32;
        report.accuracy = report.correct as f32 / report.total as f32;
    }
    Ok(report)
}
