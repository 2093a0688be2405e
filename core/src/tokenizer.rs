use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\b\w\w+\b").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","also","am","among","an","and","any","are","aren","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","couldn",
            "did","didn","do","does","doesn","doing","don","down","during",
            "each","either","etc","ever","every","few","for","from","further",
            "had","hadn","has","hasn","have","haven","having","he","her","here","hers","herself","him","himself","his","how","however",
            "i","ie","if","in","into","is","isn","it","its","itself",
            "just","least","less","let","many","may","me","might","more","most","much","must","mustn","my","myself",
            "neither","no","nor","not","now","of","off","often","on","once","only","or","other","otherwise","ought","our","ours","ourselves","out","over","own",
            "per","rather","same","she","should","shouldn","since","so","some","still","such",
            "than","that","the","their","theirs","them","themselves","then","there","thereby","therefore","these","they","this","those","though","through","thus","to","too",
            "under","until","up","upon","us","very","via",
            "was","wasn","we","well","were","weren","what","whatever","when","where","whether","which","while","who","whom","whose","why","will","with","within","without","won","would","wouldn",
            "yet","you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into (token, position) using NFKC normalization, lowercase and stopword removal,
/// optionally stemming each surviving token. Positions count every regex match, stopwords included.
pub fn tokenize(text: &str, stem: bool) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let mut tokens = Vec::new();
    for (pos, mat) in RE.find_iter(&normalized).enumerate() {
        let token = mat.as_str();
        if is_stopword(token) { continue; }
        let token = if stem { STEMMER.stem(token).to_string() } else { token.to_string() };
        tokens.push((token, pos));
    }
    tokens
}

/// Analyzer settings frozen into the index at build time and re-applied to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    pub stem: bool,
    /// Largest n-gram emitted; 1 = unigrams only, 2 = unigrams and bigrams.
    pub ngram_max: usize,
}

impl Default for Analyzer {
    fn default() -> Self { Self { stem: false, ngram_max: 2 } }
}

impl Analyzer {
    pub fn new(stem: bool) -> Self { Self { stem, ..Self::default() } }

    /// Every unigram followed by every adjacent n-gram up to `ngram_max`, joined by single spaces.
    /// N-grams are formed over the stopword-filtered stream.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let tokens: Vec<String> = tokenize(text, self.stem).into_iter().map(|(t, _)| t).collect();
        let mut out = tokens.clone();
        for n in 2..=self.ngram_max.max(1) {
            for window in tokens.windows(n) {
                out.push(window.join(" "));
            }
        }
        out
    }
}

/// Lowercase whitespace-separated words with surrounding punctuation stripped.
/// Used for sentence/query overlap, which deliberately keeps stopwords.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}
