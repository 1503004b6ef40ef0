//! Word frequency maps and top-K ranking.
//!
//! [`FrequencyMap::merge`] is commutative and associative: partial maps may be
//! folded in any order and any grouping and still produce the same totals.
//! That property is what lets the pipeline merge worker output as it arrives.
//!
//! Ranking is deterministic. Entries are ordered by count descending and ties
//! are broken by ascending byte-wise comparison of the word, so equal corpora
//! always produce identical rankings regardless of scheduling or hash order.
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::hash_map::{self, HashMap};

/// Mapping from word to occurrence count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: HashMap<String, u64>,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every word yielded by `words`
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for word in words {
            map.add(word, 1);
        }
        map
    }

    /// Adds `count` occurrences of `word`. Empty words and zero counts are ignored.
    pub fn add(&mut self, word: impl Into<String>, count: u64) {
        let word = word.into();
        if word.is_empty() || count == 0 {
            return;
        }
        *self.counts.entry(word).or_insert(0) += count;
    }

    /// Folds `other` into this map
    pub fn merge(&mut self, mut other: FrequencyMap) {
        if other.counts.len() > self.counts.len() {
            std::mem::swap(&mut self.counts, &mut other.counts);
        }
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }

    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, u64> {
        self.counts.iter()
    }

    /// Returns the `k` most frequent words.
    ///
    /// `k == 0` yields an empty result. When fewer than `k` distinct words
    /// exist all of them are returned.
    pub fn top_k(&self, k: usize) -> RankedResult {
        if k == 0 || self.counts.is_empty() {
            return RankedResult::default();
        }

        let mut entries: Vec<WordCount> = self
            .counts
            .iter()
            .map(|(word, &count)| WordCount::new(word.clone(), count))
            .collect();

        if entries.len() > k {
            entries.select_nth_unstable_by(k - 1, WordCount::rank_order);
            entries.truncate(k);
        }
        entries.sort_unstable_by(WordCount::rank_order);

        RankedResult { entries }
    }
}

impl<S: Into<String>> FromIterator<S> for FrequencyMap {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_words(iter)
    }
}

impl<'a> IntoIterator for &'a FrequencyMap {
    type Item = (&'a String, &'a u64);
    type IntoIter = hash_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

/// One ranked entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

impl WordCount {
    pub fn new(word: impl Into<String>, count: u64) -> Self {
        Self {
            word: word.into(),
            count,
        }
    }

    /// Count descending, then word ascending
    pub fn rank_order(a: &WordCount, b: &WordCount) -> Ordering {
        b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
    }
}

/// Top-K words in rank order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedResult {
    entries: Vec<WordCount>,
}

impl RankedResult {
    pub fn entries(&self) -> &[WordCount] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordCount> {
        self.entries.iter()
    }

    /// Entries paired with their 1-based rank
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &WordCount)> {
        self.entries.iter().enumerate().map(|(i, wc)| (i + 1, wc))
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a WordCount;
    type IntoIter = std::slice::Iter<'a, WordCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
