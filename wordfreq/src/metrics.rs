use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks throughput counters shared by every pipeline stage
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    // File metrics
    files_opened: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,

    // Chunk metrics
    chunks_emitted: Arc<AtomicU64>,
    bytes_emitted: Arc<AtomicU64>,
    oversized_chunks: Arc<AtomicU64>,

    // Counting metrics
    partial_maps: Arc<AtomicU64>,
    words_counted: Arc<AtomicU64>,
}

impl PipelineMetrics {
    /// Creates a new PipelineMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successfully opened input file
    pub fn record_file_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file that could not be opened or was abandoned mid-stream
    pub fn record_file_failed(&self) {
        let failed = self.files_failed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("File failed, {} failures so far", failed);
    }

    /// Records a chunk handed to the workers
    pub fn record_chunk(&self, bytes: usize, oversized: bool) {
        self.chunks_emitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted
            .fetch_add(bytes as u64, Ordering::Relaxed);
        if oversized {
            self.oversized_chunks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a partial frequency map built from `words` tokens
    pub fn record_partial(&self, words: u64) {
        self.partial_maps.fetch_add(1, Ordering::Relaxed);
        self.words_counted.fetch_add(words, Ordering::Relaxed);
    }

    /// Gets the current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_opened: self.files_opened.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            chunks_emitted: self.chunks_emitted.load(Ordering::Relaxed),
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
            oversized_chunks: self.oversized_chunks.load(Ordering::Relaxed),
            partial_maps: self.partial_maps.load(Ordering::Relaxed),
            words_counted: self.words_counted.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Pipeline stats:\n\
             Files opened/failed: {}/{}\n\
             Chunks emitted: {} ({} bytes, {} oversized)\n\
             Partial maps built: {}\n\
             Words counted: {}",
            stats.files_opened,
            stats.files_failed,
            stats.chunks_emitted,
            stats.bytes_emitted,
            stats.oversized_chunks,
            stats.partial_maps,
            stats.words_counted
        );
    }
}

/// Point-in-time copy of [`PipelineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub files_opened: u64,
    pub files_failed: u64,
    pub chunks_emitted: u64,
    pub bytes_emitted: u64,
    pub oversized_chunks: u64,
    pub partial_maps: u64,
    pub words_counted: u64,
}
