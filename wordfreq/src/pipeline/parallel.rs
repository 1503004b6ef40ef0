use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::debug;

use super::{Aggregate, ChunkCounter, PartialMessage};
use crate::errors::{FreqError, FreqResult};
use crate::reader::FileChunks;
use crate::splitter::SplitOptions;

/// Counts `files` on a dedicated rayon pool.
///
/// Each file is split sequentially on whichever pool thread picks it up; the
/// per-thread accumulators are then reduced pairwise. Produces the same totals
/// as [`Pipeline::run`](super::Pipeline::run) over the same files.
pub(crate) fn run_parallel(
    files: Vec<PathBuf>,
    options: SplitOptions,
    counter: &ChunkCounter,
    threads: NonZeroUsize,
) -> FreqResult<Aggregate> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.get())
        .thread_name(|i| format!("wordfreq-par-{}", i))
        .build()
        .map_err(|e| FreqError::config_error(format!("unable to build thread pool: {}", e)))?;

    debug!(
        "Counting {} files on {} rayon threads",
        files.len(),
        threads
    );

    let totals = pool.install(|| {
        files
            .into_par_iter()
            .flat_map_iter(|path| FileChunks::new(vec![path], options, counter.metrics.clone()))
            .filter_map(|message| counter.process(message))
            .fold(Aggregate::default, |acc, partial: PartialMessage| {
                acc.absorb(partial)
            })
            .reduce(Aggregate::default, Aggregate::combine)
    });

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingMode;
    use crate::metrics::PipelineMetrics;
    use crate::tokenizer::RegexTokenizer;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn counter() -> ChunkCounter {
        ChunkCounter {
            tokenizer: Arc::new(RegexTokenizer::with_min_length(3).unwrap()),
            encoding_mode: EncodingMode::Lossy,
            metrics: PipelineMetrics::new(),
        }
    }

    #[test]
    fn test_parallel_counts_every_file() {
        let dir = tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..6 {
            let path = dir.path().join(format!("{}.txt", i));
            fs::write(&path, "cat dog cat\nbird").unwrap();
            files.push(path);
        }

        let counter = counter();
        let totals = run_parallel(
            files,
            SplitOptions::new(NonZeroUsize::new(4).unwrap()),
            &counter,
            NonZeroUsize::new(3).unwrap(),
        )
        .unwrap();

        assert_eq!(totals.frequencies.get("cat"), 12);
        assert_eq!(totals.frequencies.get("dog"), 6);
        assert_eq!(totals.frequencies.get("bird"), 6);
        assert_eq!(counter.metrics.snapshot().files_opened, 6);
    }

    #[test]
    fn test_parallel_collects_failures() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("here.txt");
        fs::write(&present, "present words").unwrap();
        let missing = dir.path().join("gone.txt");

        let totals = run_parallel(
            vec![present, missing],
            SplitOptions::default(),
            &counter(),
            NonZeroUsize::new(2).unwrap(),
        )
        .unwrap();

        assert_eq!(totals.frequencies.get("present"), 1);
        assert_eq!(totals.failures.len(), 1);
        assert!(matches!(totals.failures[0], FreqError::FileNotFound(_)));
    }
}
