use anyhow::{Context, Result, anyhow};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::path::Path;

/// Words used when no list is configured. Everything here should be
/// drawable in under a minute.
pub const DEFAULT_WORDS: &[&str] = &[
    "apple", "anchor", "balloon", "banana", "bicycle", "bridge", "butterfly", "cactus",
    "camera", "candle", "castle", "cat", "cloud", "crown", "diamond", "dog", "dragon",
    "drum", "elephant", "envelope", "fish", "flower", "ghost", "giraffe", "guitar",
    "hammer", "helicopter", "house", "ice cream", "island", "kite", "ladder", "lamp",
    "lighthouse", "moon", "mountain", "mushroom", "octopus", "owl", "penguin", "piano",
    "pizza", "rabbit", "rainbow", "robot", "rocket", "sailboat", "scissors", "snail",
    "snowman", "spider", "star", "sun", "sword", "tent", "tree", "umbrella", "volcano",
    "whale", "windmill",
];

/// The pool secret words are drawn from.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// Build a bank from newline-separated text. Blank lines and lines
    /// starting with `#` are skipped; entries are trimmed, lowercased and
    /// deduplicated keeping first occurrence order.
    pub fn from_word_list(word_list: &str) -> Self {
        let mut seen = HashSet::new();
        let words = word_list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .filter(|word| seen.insert(word.clone()))
            .collect();

        Self { words }
    }

    pub fn builtin() -> Self {
        Self::from_word_list(&DEFAULT_WORDS.join("\n"))
    }

    /// Load a word list file. An empty list is an error since no round could
    /// ever start.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;
        let bank = Self::from_word_list(&contents);
        if bank.is_empty() {
            return Err(anyhow!("word list {} contains no words", path.display()));
        }
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pick a word uniformly at random, avoiding `previous` whenever another
    /// word is available.
    pub fn pick<R: Rng + ?Sized>(&self, previous: Option<&str>, rng: &mut R) -> Option<String> {
        let candidates: Vec<&String> = self
            .words
            .iter()
            .filter(|word| Some(word.as_str()) != previous)
            .collect();

        if candidates.is_empty() {
            return self.words.choose(rng).cloned();
        }
        candidates.choose(rng).map(|word| (*word).clone())
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self::builtin()
    }
}
