//! Sentence-aware sliding-window chunking.
//!
//! All offsets are in characters of the whitespace-normalized text, never bytes.

use crate::config::ChunkerConfig;
use std::ops::Range;

/// Cut markers in priority order: (character, must be followed by whitespace).
const MARKERS: [(char, bool); 3] = [('.', true), ('\n', false), (';', true)];
/// How far before the nominal cut the boundary search starts.
const LOOKBEHIND: usize = 100;
/// How far past the nominal cut the boundary search may extend.
const LOOKAHEAD: usize = 50;

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Raw windows over the normalized text, before trimming and the minimum-size filter.
pub struct Windows {
    chars: Vec<char>,
    chunk_size: usize,
    overlap: usize,
    start: usize,
    done: bool,
}

impl Windows {
    pub fn new(text: &str, cfg: &ChunkerConfig) -> Self {
        Self {
            chars: normalize_whitespace(text).chars().collect(),
            chunk_size: cfg.chunk_size.max(1),
            overlap: cfg.overlap,
            start: 0,
            done: false,
        }
    }

    /// The normalized text as characters; window ranges index into this.
    pub fn chars(&self) -> &[char] { &self.chars }

    fn boundary(&self, start: usize) -> Option<usize> {
        let search_start = start + self.chunk_size.saturating_sub(LOOKBEHIND);
        let search_end = (start + self.chunk_size + LOOKAHEAD).min(self.chars.len());
        if search_start >= search_end {
            return None;
        }
        let region = &self.chars[search_start..search_end];
        MARKERS.iter().find_map(|&(mark, needs_space)| {
            let width = if needs_space { 2 } else { 1 };
            region
                .windows(width)
                .rposition(|w| w[0] == mark && (!needs_space || w[1].is_whitespace()))
                .map(|i| search_start + i + width)
        })
    }
}

impl Iterator for Windows {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        let len = self.chars.len();
        if self.done || self.start >= len {
            return None;
        }
        let start = self.start;
        let mut end = start + self.chunk_size;
        if end < len {
            if let Some(cut) = self.boundary(start) {
                end = cut;
            }
        } else {
            end = len;
        }

        if end >= len {
            self.done = true;
        } else {
            // start must strictly increase or the loop never ends
            let next = end.saturating_sub(self.overlap);
            self.start = if next <= start { end } else { next };
        }
        Some(start..end)
    }
}

/// Lazily yields chunk texts for one document. Consumed once.
pub struct Chunks {
    windows: Windows,
    min_chunk_size: usize,
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let range = self.windows.next()?;
            let text: String = self.windows.chars()[range].iter().collect();
            let text = text.trim();
            if text.chars().count() >= self.min_chunk_size {
                return Some(text.to_string());
            }
        }
    }
}

/// Split `text` into overlapping, size-bounded passages.
pub fn chunk(text: &str, cfg: &ChunkerConfig) -> Chunks {
    Chunks { windows: Windows::new(text, cfg), min_chunk_size: cfg.min_chunk_size }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize, overlap: usize, min_chunk_size: usize) -> ChunkerConfig {
        ChunkerConfig { chunk_size, overlap, min_chunk_size }
    }

    fn sample(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {i} talks about revenue and margins in some detail."))
            .collect::<Vec<_>>()
            .join("\n  ")
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        assert_eq!(chunk("", &ChunkerConfig::default()).count(), 0);
        assert_eq!(chunk(" \n\t  ", &ChunkerConfig::default()).count(), 0);
    }

    #[test]
    fn short_text_below_minimum_yields_nothing() {
        assert_eq!(chunk("Too short.", &cfg(512, 64, 50)).count(), 0);
    }

    #[test]
    fn short_text_is_emitted_whole_and_normalized() {
        let out: Vec<String> = chunk("  Risk   factors\ninclude currency fluctuation. ", &cfg(512, 64, 10)).collect();
        assert_eq!(out, vec!["Risk factors include currency fluctuation.".to_string()]);
    }

    #[test]
    fn cuts_land_after_sentence_ends() {
        let text = sample(30);
        let out: Vec<String> = chunk(&text, &cfg(200, 30, 20)).collect();
        assert!(out.len() > 1);
        for c in &out[..out.len() - 1] {
            assert!(c.ends_with('.'), "chunk not cut at a sentence end: {c:?}");
        }
    }

    fn first_window(text: &str, chunk_size: usize) -> Range<usize> {
        Windows::new(text, &cfg(chunk_size, 0, 1)).next().unwrap()
    }

    #[test]
    fn semicolon_cut_when_no_period() {
        let text = format!("{}; {}", "a".repeat(80), "b".repeat(200));
        assert_eq!(first_window(&text, 100), 0..82);
        let first = chunk(&text, &cfg(100, 0, 1)).next().unwrap();
        assert!(first.ends_with("a;"));
    }

    #[test]
    fn period_wins_over_later_semicolon() {
        let text = format!("{}. {}; {}", "a".repeat(30), "b".repeat(40), "c".repeat(200));
        assert_eq!(first_window(&text, 100), 0..32);
    }

    #[test]
    fn last_period_in_zone_is_used() {
        let text = format!("{}. {}. {}", "a".repeat(20), "b".repeat(60), "c".repeat(200));
        assert_eq!(first_window(&text, 100), 0..84);
    }

    #[test]
    fn markers_before_the_zone_are_ignored() {
        // zone for a 300-char window starts at 200
        let text = format!("{}. {}; {}", "a".repeat(50), "b".repeat(200), "c".repeat(300));
        assert_eq!(first_window(&text, 300), 0..254);
    }

    #[test]
    fn no_marker_cuts_at_window_size() {
        let text = format!("{}. {}", "a".repeat(20), "b".repeat(400));
        assert_eq!(first_window(&text, 300), 0..300);
    }

    #[test]
    fn marker_past_window_end_extends_cut() {
        let text = format!("{}; {}", "a".repeat(130), "b".repeat(200));
        assert_eq!(first_window(&text, 100), 0..132);
    }

    #[test]
    fn windows_cover_text_without_gaps() {
        let text = sample(40);
        for (size, overlap) in [(120, 20), (200, 0), (333, 90), (64, 64), (50, 200)] {
            let windows = Windows::new(&text, &cfg(size, overlap, 1));
            let len = windows.chars().len();
            let ranges: Vec<Range<usize>> = windows.collect();
            assert_eq!(ranges.first().map(|r| r.start), Some(0));
            assert_eq!(ranges.last().map(|r| r.end), Some(len));
            for pair in ranges.windows(2) {
                assert!(pair[1].start > pair[0].start);
                assert!(pair[1].start <= pair[0].end, "gap between {:?} and {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn consecutive_windows_share_overlap() {
        let text = "x".repeat(1000);
        let ranges: Vec<Range<usize>> = Windows::new(&text, &cfg(300, 50, 1)).collect();
        assert_eq!(ranges[0], 0..300);
        assert_eq!(ranges[1], 250..550);
    }

    #[test]
    fn is_deterministic() {
        let text = sample(25);
        let a: Vec<String> = chunk(&text, &ChunkerConfig::default()).collect();
        let b: Vec<String> = chunk(&text, &ChunkerConfig::default()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn terminates_with_degenerate_config() {
        let text = "word ".repeat(500);
        assert!(chunk(&text, &cfg(0, 0, 0)).count() > 0);
        assert!(chunk(&text, &cfg(10, 1000, 1)).count() > 0);
    }
}
