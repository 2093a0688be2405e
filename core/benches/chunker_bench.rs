use criterion::{criterion_group, criterion_main, Criterion};
use rag_core::chunker::chunk;
use rag_core::tokenizer::Analyzer;
use rag_core::ChunkerConfig;

fn filing_text() -> String {
    "Our results of operations are subject to risks from changes in interest rates and foreign \
     currency exchange rates; we manage these exposures through derivative instruments. "
        .repeat(400)
}

fn bench_chunk(c: &mut Criterion) {
    let text = filing_text();
    let cfg = ChunkerConfig::default();
    c.bench_function("chunk_filing", |b| b.iter(|| chunk(&text, &cfg).count()));
}

fn bench_analyze(c: &mut Criterion) {
    let text = filing_text();
    let analyzer = Analyzer::default();
    c.bench_function("analyze_filing", |b| b.iter(|| analyzer.terms(&text).len()));
}

criterion_group!(benches, bench_chunk, bench_analyze);
criterion_main!(benches);
