use rag_core::tokenizer::{tokenize, Analyzer};

#[test]
fn it_normalizes_and_stems() {
    let toks = tokenize("Running Runners RUN!", true);
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Decomposed e + combining acute composes under NFKC
    let toks = tokenize("The cafe\u{301}'s menu.", false);
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(words.contains(&"caf\u{e9}".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let toks = tokenize("The quick brown fox and the lazy dog", false);
    let words: Vec<String> = toks.into_iter().map(|(w, _)| w).collect();
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
}

#[test]
fn unstemmed_analyzer_keeps_surface_forms() {
    let terms = Analyzer::new(false).terms("Currency fluctuations");
    assert!(terms.contains(&"fluctuations".to_string()));
    assert!(terms.contains(&"currency fluctuations".to_string()));
}

#[test]
fn fullwidth_digits_fold_under_nfkc() {
    let terms = Analyzer::default().terms("ＦＹ２０２３ revenue");
    assert!(terms.contains(&"fy2023".to_string()));
}
