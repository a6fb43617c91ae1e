use std::collections::VecDeque;
use std::sync::Arc;

use jieba_rs::Jieba;

pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub type LengthFn = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Counts jieba segments, ignoring pure-whitespace ones.
///
/// The dictionary is loaded once; clone the `Arc` returned by
/// [`TokenCounter::length_fn`] instead of building another counter.
pub struct TokenCounter {
    jieba: Jieba,
}

impl TokenCounter {
    pub fn new() -> Self {
        Self { jieba: Jieba::new() }
    }

    pub fn count(&self, text: &str) -> usize {
        self.jieba
            .cut(text, false)
            .into_iter()
            .filter(|token| !token.trim().is_empty())
            .count()
    }

    pub fn length_fn(self: Arc<Self>) -> LengthFn {
        Arc::new(move |text: &str| self.count(text))
    }
}

#[cfg(test)]
pub fn char_length() -> LengthFn {
    Arc::new(|text: &str| text.chars().count())
}

/// Recursive separator splitter.
///
/// Text is cut on the first separator it contains, pieces are merged
/// greedily up to `chunk_size` (measured with the length function) and each
/// new chunk starts with up to `chunk_overlap` of the previous one's tail.
/// Pieces that are still too large are split again with the remaining
/// separators; `""` falls back to single characters.
#[derive(Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    length_fn: LengthFn,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize, length_fn: LengthFn) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            length_fn,
        }
    }

    #[cfg(test)]
    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn measure(&self, text: &str) -> usize {
        (self.length_fn)(text)
    }

    /// Chunks in document order. Empty text gives no chunks; text that
    /// already fits the budget comes back as a single chunk.
    pub fn split(&self, text: &str) -> Vec<String> {
        if self.measure(text) <= self.chunk_size {
            return trimmed(text).into_iter().collect();
        }
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();

        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, ch)| &text[i..i + ch.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|piece| !piece.is_empty()).collect()
        };

        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if self.measure(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                if let Some(piece) = trimmed(piece) {
                    chunks.push(piece);
                }
            } else {
                chunks.extend(self.split_with(piece, remaining));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    /// Windows are measured as joined text; token counts are not additive
    /// across pieces.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();

        for &piece in pieces {
            if !window.is_empty() && self.measure_with(&window, piece, separator) > self.chunk_size {
                if let Some(chunk) = join(&window, separator) {
                    merged.push(chunk);
                }
                // Keep at most `chunk_overlap` of the tail, and only as much
                // as still leaves room for the incoming piece.
                while !window.is_empty()
                    && (self.measure(&raw_join(&window, separator)) > self.chunk_overlap
                        || self.measure_with(&window, piece, separator) > self.chunk_size)
                {
                    window.pop_front();
                }
            }
            window.push_back(piece);
        }
        if let Some(chunk) = join(&window, separator) {
            merged.push(chunk);
        }
        merged
    }

    fn measure_with(&self, window: &VecDeque<&str>, piece: &str, separator: &str) -> usize {
        let mut candidate = raw_join(window, separator);
        if !window.is_empty() {
            candidate.push_str(separator);
        }
        candidate.push_str(piece);
        self.measure(&candidate)
    }
}

fn raw_join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn join(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    trimmed(&raw_join(window, separator))
}

fn trimmed(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
