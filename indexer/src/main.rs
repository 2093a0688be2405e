use anyhow::Result;
use clap::{Parser, Subcommand};
use rag_core::eval::{evaluate, load_testset, EvalReport};
use rag_core::{build_index, BuildConfig, ChunkerConfig, EngineConfig, QaEngine};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query the TF-IDF filing index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk every .txt file in a directory and write index artifacts
    Build {
        /// Directory of plain-text filings
        #[arg(long, default_value = "./data/filings")]
        input: PathBuf,
        /// Output index directory
        #[arg(long, default_value = "./index")]
        output: PathBuf,
        #[arg(long, default_value_t = 512)]
        chunk_size: usize,
        #[arg(long, default_value_t = 64)]
        overlap: usize,
        #[arg(long, default_value_t = 50)]
        min_chunk_size: usize,
        /// Vocabulary cap (most frequent unigrams and bigrams)
        #[arg(long, default_value_t = 10_000)]
        max_features: usize,
        /// Stem tokens before building terms
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
    /// Ask one question and print the JSON response
    Ask {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        question: String,
    },
    /// Run a JSONL test set and print an accuracy report
    Eval {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long, default_value = "./eval/testset.jsonl")]
        testset: PathBuf,
        /// Fail when accuracy falls below this
        #[arg(long, default_value_t = 0.5)]
        min_accuracy: f32,
    },
}

fn main() -> Result<ExitCode> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, chunk_size, overlap, min_chunk_size, max_features, stem } => {
            let cfg = BuildConfig { chunker: ChunkerConfig { chunk_size, overlap, min_chunk_size }, max_features, stem };
            match build_index(&input, &output, &cfg) {
                Ok(stats) => {
                    println!("{}", json!({ "status": "success", "stats": stats }));
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::error!(error = %e, "index build failed");
                    println!("{}", json!({ "status": "error", "reason": e.to_string() }));
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Ask { index, question } => {
            let engine = QaEngine::open(&index, EngineConfig::from_env())?;
            let response = engine.synthesize(&question)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Eval { index, testset, min_accuracy } => {
            let engine = QaEngine::open(&index, EngineConfig::from_env())?;
            let cases = load_testset(&testset)?;
            let report = evaluate(&engine, &cases)?;
            print_report(&report);
            Ok(if report.accuracy < min_accuracy { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
    }
}

fn preview(s: &str, n: usize) -> String {
    let mut out: String = s.chars().take(n).collect();
    if s.chars().count() > n { out.push_str("..."); }
    out
}

fn print_report(r: &EvalReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}\nEVALUATION REPORT\n{rule}");
    println!("Total questions:   {}", r.total);
    println!("Answered:          {}", r.answered);
    println!("Abstained:         {}", r.abstained);
    println!("Correct:           {}", r.correct);
    println!("Accuracy:          {:.1}%", r.accuracy * 100.0);
    println!("Avg confidence:    {:.3}", r.avg_confidence);
    println!("With citations:    {}", r.citations_provided);
    println!("\nDetails:\n{}", "-".repeat(60));
    for d in &r.details {
        println!("{} Q: {}", if d.correct { "✓" } else { "✗" }, preview(&d.question, 50));
        println!("  → {}", if d.abstained { "ABSTAINED".to_string() } else { preview(&d.answer, 60) });
        println!("  Confidence: {:.3}, Citations: {}\n", d.confidence, d.citations);
    }
}
