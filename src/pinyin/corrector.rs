use serde::{Deserialize, Serialize};

use super::Vocabulary;

/// Precomposed tone-marked vowels accepted inside pinyin tokens.
const TONE_VOWELS: [char; 24] = [
    'ā', 'ē', 'ī', 'ō', 'ū', 'ǖ', 'á', 'é', 'í', 'ó', 'ú', 'ǘ', 'ǎ', 'ě', 'ǐ', 'ǒ', 'ǔ', 'ǚ', 'à',
    'è', 'ì', 'ò', 'ù', 'ǜ',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Ideograph,
    PinyinLike,
    Other,
}

/// How a pinyin-like token is matched against the vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    EditDistance,
    LongestPrefix,
}

fn is_ideograph(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
}

fn is_pinyin_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, 'ü' | 'Ü') || TONE_VOWELS.contains(&ch)
}

/// Ideographs are checked first; empty and mixed tokens are `Other`.
pub fn classify(token: &str) -> TokenClass {
    if token.is_empty() {
        return TokenClass::Other;
    }
    if token.chars().all(is_ideograph) {
        TokenClass::Ideograph
    } else if token.chars().all(is_pinyin_char) {
        TokenClass::PinyinLike
    } else {
        TokenClass::Other
    }
}

/// Only pinyin-like tokens reach the vocabulary; everything else comes
/// back verbatim. Mixed tokens such as `你hao` are deliberately left alone.
pub fn correct(token: &str, vocabulary: &Vocabulary, mode: MatchMode) -> String {
    match classify(token) {
        TokenClass::PinyinLike => match mode {
            MatchMode::EditDistance => vocabulary.nearest_by_edit_distance(token),
            MatchMode::LongestPrefix => vocabulary.longest_prefix_match(token),
        },
        TokenClass::Ideograph | TokenClass::Other => token.to_string(),
    }
}
