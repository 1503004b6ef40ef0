use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{FreqError, FreqResult};

/// Character class matched by default: Latin and Cyrillic letters
pub const DEFAULT_WORD_PATTERN: &str = "[a-zа-я]";

static PATTERN_CACHE: Lazy<DashMap<String, Arc<Regex>>> = Lazy::new(DashMap::new);

/// Extracts words from decoded text.
///
/// Implementations must be pure: the same text always yields the same words,
/// and nothing is shared between calls. Workers call `tokenize` concurrently.
pub trait Tokenizer: Send + Sync + Debug {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Regex-based tokenizer matching runs of a character class.
///
/// Matching is case-insensitive, so `[a-z]` also accepts `A-Z`. Tokens keep
/// their original case unless `fold_case` is set.
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    regex: Arc<Regex>,
    min_length: usize,
    fold_case: bool,
}

impl RegexTokenizer {
    /// Creates a tokenizer for words of at least `min_length` characters
    pub fn new(word_class: &str, min_length: usize, fold_case: bool) -> FreqResult<Self> {
        if word_class.trim().is_empty() {
            return Err(FreqError::invalid_pattern("word pattern must not be empty"));
        }

        // A zero-length minimum would match the empty string everywhere.
        let min_length = min_length.max(1);
        let pattern = format!("(?i)(?:{}){{{},}}", word_class, min_length);

        let regex = match PATTERN_CACHE.get(&pattern) {
            Some(entry) => entry.clone(),
            None => {
                let compiled = Arc::new(
                    Regex::new(&pattern)
                        .map_err(|e| FreqError::invalid_pattern(format!("{}: {}", word_class, e)))?,
                );
                debug!("Compiled word pattern {}", pattern);
                PATTERN_CACHE.insert(pattern, compiled.clone());
                compiled
            }
        };

        Ok(Self {
            regex,
            min_length,
            fold_case,
        })
    }

    /// Tokenizer with the default letter class
    pub fn with_min_length(min_length: usize) -> FreqResult<Self> {
        Self::new(DEFAULT_WORD_PATTERN, min_length, false)
    }

    pub fn fold_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let words = self.regex.find_iter(text).map(|m| m.as_str());
        if self.fold_case {
            words.map(str::to_lowercase).collect()
        } else {
            words.map(str::to_owned).collect()
        }
    }
}
