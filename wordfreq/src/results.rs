use crate::errors::FreqError;
use crate::frequency::RankedResult;
use crate::metrics::MetricsSnapshot;

/// Outcome of one analysis run
#[derive(Debug, Default)]
pub struct AnalysisReport {
    /// Top-K words, most frequent first
    pub ranked: RankedResult,
    /// Number of files discovery handed to the pipeline
    pub files_discovered: usize,
    /// Number of distinct words counted
    pub distinct_words: usize,
    /// Total number of words counted
    pub total_words: u64,
    /// Non-fatal failures, one per skipped file or chunk
    pub failures: Vec<FreqError>,
    /// Pipeline counters at the end of the run
    pub stats: MetricsSnapshot,
}

impl AnalysisReport {
    /// Number of distinct input files that produced at least one failure
    pub fn files_failed(&self) -> usize {
        let mut paths: Vec<_> = self.failures.iter().filter_map(FreqError::path).collect();
        paths.sort();
        paths.dedup();
        paths.len()
    }

    /// Whether every discovered file was read without failure
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
