use std::fs::File;
use std::path::PathBuf;
use tracing::{trace, warn};

use crate::errors::{FreqError, FreqResult};
use crate::metrics::PipelineMetrics;
use crate::splitter::{Chunk, ChunkSplitter, SplitOptions};

/// Streams word-safe chunks from a list of files, one file at a time.
///
/// Open and read failures are yielded inline as `Err` items and the iterator
/// moves on to the next file. Only the file currently being split is held open;
/// its handle is released as soon as its splitter finishes, fails, or the
/// iterator itself is dropped.
pub struct FileChunks {
    paths: std::vec::IntoIter<PathBuf>,
    options: SplitOptions,
    current: Option<ChunkSplitter<File>>,
    metrics: PipelineMetrics,
}

impl FileChunks {
    pub fn new(paths: Vec<PathBuf>, options: SplitOptions, metrics: PipelineMetrics) -> Self {
        Self {
            paths: paths.into_iter(),
            options,
            current: None,
            metrics,
        }
    }

    fn open_next(&mut self) -> Option<FreqResult<()>> {
        let path = self.paths.next()?;
        trace!("Opening file: {}", path.display());
        match File::open(&path) {
            Ok(file) => {
                self.metrics.record_file_opened();
                self.current = Some(ChunkSplitter::new(file, path, self.options));
                Some(Ok(()))
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path.display(), e);
                self.metrics.record_file_failed();
                Some(Err(FreqError::file_open(path, e)))
            }
        }
    }
}

impl Iterator for FileChunks {
    type Item = FreqResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(splitter) = self.current.as_mut() {
                match splitter.next() {
                    Some(Ok(chunk)) => {
                        let oversized = chunk.len() > self.options.chunk_size.get();
                        self.metrics.record_chunk(chunk.len(), oversized);
                        return Some(Ok(chunk));
                    }
                    Some(Err(e)) => {
                        self.current = None;
                        self.metrics.record_file_failed();
                        return Some(Err(e));
                    }
                    None => {
                        self.current = None;
                        continue;
                    }
                }
            }

            if let Err(e) = self.open_next()? {
                return Some(Err(e));
            }
        }
    }
}
