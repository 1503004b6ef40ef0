//! Concurrent stage graph that turns a chunk stream into word frequencies.
//!
//! ```text
//!               ┌─ worker-0 ─┐
//! generator ────┼─ worker-1 ─┼── fan-in ── aggregate
//!               └─ worker-N ─┘
//! ```
//!
//! Every stage runs on its own named thread and talks to its neighbours over
//! bounded `crossbeam-channel` channels, so a slow consumer throttles the
//! producers. All stages also watch a shared [`DoneSignal`]. The driver closes
//! it once aggregation returns, for any reason, and then joins every thread.
//!
//! Per-file and per-chunk failures flow through the graph as `Err` items and
//! are collected by the aggregator without interrupting the run.
pub(crate) mod parallel;
mod stages;
mod worker;

pub use stages::{Aggregate, DoneSignal};

pub(crate) use stages::{ChunkMessage, PartialMessage};
pub(crate) use worker::ChunkCounter;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::{AnalyzerConfig, EncodingMode};
use crate::errors::FreqResult;
use crate::metrics::PipelineMetrics;
use crate::splitter::Chunk;
use crate::tokenizer::Tokenizer;
use stages::StageHandles;

/// Default buffer size of every inter-stage channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4;

/// A configured generator → workers → fan-in → aggregate graph
#[derive(Debug, Clone)]
pub struct Pipeline {
    workers: NonZeroUsize,
    capacity: usize,
    timeout: Option<Duration>,
    counter: ChunkCounter,
}

impl Pipeline {
    /// Creates a pipeline with one worker per CPU and no deadline
    pub fn new(tokenizer: Arc<dyn Tokenizer>, metrics: PipelineMetrics) -> Self {
        Self {
            workers: NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            timeout: None,
            counter: ChunkCounter {
                tokenizer,
                encoding_mode: EncodingMode::default(),
                metrics,
            },
        }
    }

    pub fn from_config(
        config: &AnalyzerConfig,
        tokenizer: Arc<dyn Tokenizer>,
        metrics: PipelineMetrics,
    ) -> Self {
        Self::new(tokenizer, metrics)
            .workers(config.thread_count)
            .capacity(config.channel_capacity)
            .timeout(config.timeout)
            .encoding_mode(config.encoding_mode)
    }

    pub fn workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = workers;
        self
    }

    /// Channel buffer size; 0 makes every handoff a rendezvous
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn encoding_mode(mut self, encoding_mode: EncodingMode) -> Self {
        self.counter.encoding_mode = encoding_mode;
        self
    }

    /// Runs the graph over `source` and returns the aggregated totals.
    ///
    /// Returns [`FreqError::Timeout`](crate::errors::FreqError::Timeout) when the
    /// deadline expires and
    /// [`FreqError::StagePanicked`](crate::errors::FreqError::StagePanicked)
    /// when any stage thread panicked. Either way every spawned thread has
    /// exited by the time this returns.
    pub fn run<I>(&self, source: I) -> FreqResult<Aggregate>
    where
        I: IntoIterator<Item = FreqResult<Chunk>>,
        I::IntoIter: Send + 'static,
    {
        let mut done = DoneSignal::new();
        let mut stages = StageHandles::default();

        let outcome = self.launch(&done, source, &mut stages);

        done.close();
        debug!("Joining {} pipeline stages", stages.len());
        let joined = stages.join();

        let totals = outcome?;
        joined?;
        Ok(totals)
    }

    fn launch<I>(
        &self,
        done: &DoneSignal,
        source: I,
        stages: &mut StageHandles,
    ) -> FreqResult<Aggregate>
    where
        I: IntoIterator<Item = ChunkMessage>,
        I::IntoIter: Send + 'static,
    {
        let chunks = stages::spawn_generator(done.listener(), source, self.capacity, stages)?;

        let mut outputs = Vec::with_capacity(self.workers.get());
        for id in 0..self.workers.get() {
            outputs.push(worker::spawn_worker(
                id,
                done.listener(),
                chunks.clone(),
                self.counter.clone(),
                self.capacity,
                stages,
            )?);
        }
        drop(chunks);

        let merged = stages::fan_in(done.listener(), outputs, self.capacity, stages)?;
        debug!(
            "Pipeline running with {} workers, channel capacity {}",
            self.workers, self.capacity
        );

        stages::aggregate(merged, self.timeout)
    }
}
