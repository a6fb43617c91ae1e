use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use log::info;

use crate::error::{Result, TutorError};

/// Canonical pinyin syllables, loaded once and shared read-only.
///
/// Entries keep the order of the source file; that order breaks ties in
/// [`Vocabulary::nearest_by_edit_distance`].
#[derive(Debug, Default)]
pub struct Vocabulary {
    entries: Vec<String>,
    members: HashSet<String>,
    trie: TrieNode,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    word: Option<String>,
}

impl TrieNode {
    fn insert(&mut self, word: &str) {
        let mut node = self;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.word = Some(word.to_string());
    }
}

impl Vocabulary {
    /// Reads one syllable per line. Blank lines are skipped, entries are
    /// lower-cased and duplicates dropped.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            TutorError::Config(format!(
                "cannot read pinyin vocabulary {}: {}",
                path.display(),
                err
            ))
        })?;
        let vocabulary = Self::from_entries(content.lines());
        if vocabulary.is_empty() {
            return Err(TutorError::Config(format!(
                "pinyin vocabulary {} is empty",
                path.display()
            )));
        }
        info!(
            "Loaded {} pinyin entries from {}",
            vocabulary.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Vocabulary::default();
        for entry in entries {
            let entry = entry.as_ref().trim().to_lowercase();
            if entry.is_empty() || vocabulary.members.contains(&entry) {
                continue;
            }
            vocabulary.trie.insert(&entry);
            vocabulary.members.insert(entry.clone());
            vocabulary.entries.push(entry);
        }
        vocabulary
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.members.contains(token)
    }

    /// Entry with the smallest Levenshtein distance to `token`; the first
    /// one in file order wins a tie. An empty vocabulary hands the token
    /// back unchanged.
    pub fn nearest_by_edit_distance(&self, token: &str) -> String {
        if self.contains(token) {
            return token.to_string();
        }
        let mut best: Option<(&str, usize)> = None;
        for entry in &self.entries {
            let distance = levenshtein(token, entry);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((entry, distance));
            }
        }
        best.map_or_else(|| token.to_string(), |(entry, _)| entry.to_string())
    }

    /// Entry stored at the longest prefix of `token`, or `token` itself when
    /// no prefix is known. Whatever follows the prefix is dropped:
    /// `ni3hao` against {ni3, hao3} gives `ni3`.
    pub fn longest_prefix_match(&self, token: &str) -> String {
        let mut node = &self.trie;
        let mut matched: Option<&str> = None;
        for ch in token.chars() {
            match node.children.get(&ch) {
                Some(next) => {
                    node = next;
                    if let Some(word) = &node.word {
                        matched = Some(word);
                    }
                }
                None => break,
            }
        }
        matched.unwrap_or(token).to_string()
    }
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
