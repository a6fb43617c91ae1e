use crate::pinyin::{correct, MatchMode, Vocabulary};

/// Whitespace-split, correct every token, rejoin with single spaces.
///
/// Punctuation stays glued to its word, so `hao,` is not corrected.
pub fn normalize(text: &str, vocabulary: &Vocabulary, mode: MatchMode) -> String {
    text.split_whitespace()
        .map(|token| correct(token, vocabulary, mode))
        .collect::<Vec<_>>()
        .join(" ")
}
