use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::borrow::Cow;
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace, warn};

use super::stages::{is_done, ChunkMessage, PartialMessage, StageHandles};
use crate::config::EncodingMode;
use crate::errors::{FreqError, FreqResult};
use crate::frequency::FrequencyMap;
use crate::metrics::PipelineMetrics;
use crate::splitter::Chunk;
use crate::tokenizer::Tokenizer;

/// Decodes chunk bytes according to the encoding mode
pub(crate) fn decode_chunk(chunk: &Chunk, encoding_mode: EncodingMode) -> FreqResult<Cow<'_, str>> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(chunk.data())
            .map(Cow::Borrowed)
            .map_err(|e| FreqError::encoding_error(chunk.origin(), e)),
        EncodingMode::Lossy => {
            let text = String::from_utf8_lossy(chunk.data());
            if let Cow::Owned(_) = text {
                warn!("Invalid UTF-8 replaced in file: {}", chunk.origin().display());
            }
            Ok(text)
        }
    }
}

/// Everything a worker needs to turn a chunk into a partial map
#[derive(Debug, Clone)]
pub(crate) struct ChunkCounter {
    pub tokenizer: Arc<dyn Tokenizer>,
    pub encoding_mode: EncodingMode,
    pub metrics: PipelineMetrics,
}

impl ChunkCounter {
    /// Tokenizes one chunk and tallies its words
    pub fn count(&self, chunk: &Chunk) -> FreqResult<FrequencyMap> {
        let text = decode_chunk(chunk, self.encoding_mode)?;
        let words = self.tokenizer.tokenize(&text);
        self.metrics.record_partial(words.len() as u64);
        Ok(FrequencyMap::from_words(words))
    }

    /// Maps an incoming message to the partial result to send downstream.
    ///
    /// Errors pass through untouched. Blank chunks produce nothing.
    pub fn process(&self, message: ChunkMessage) -> Option<PartialMessage> {
        match message {
            Err(e) => Some(Err(e)),
            Ok(chunk) if chunk.is_blank() => None,
            Ok(chunk) => {
                trace!(
                    "Counting {} bytes from {}",
                    chunk.len(),
                    chunk.origin().display()
                );
                Some(self.count(&chunk))
            }
        }
    }
}

/// Spawns one worker and returns its output channel.
///
/// The worker pulls from the shared `input` until it is drained or `done`
/// closes, and selects against `done` on every send so it never blocks after
/// cancellation.
pub(crate) fn spawn_worker(
    id: usize,
    done: Receiver<()>,
    input: Receiver<ChunkMessage>,
    counter: ChunkCounter,
    capacity: usize,
    stages: &mut StageHandles,
) -> FreqResult<Receiver<PartialMessage>> {
    let (output, results) = bounded(capacity);
    let name = format!("wordfreq-worker-{}", id);
    let handle = thread::Builder::new()
        .name(name.clone())
        .spawn(move || run_worker(done, input, output, counter))?;
    stages.push(name, handle);
    Ok(results)
}

fn run_worker(
    done: Receiver<()>,
    input: Receiver<ChunkMessage>,
    output: Sender<PartialMessage>,
    counter: ChunkCounter,
) {
    loop {
        let message = select! {
            recv(input) -> msg => match msg {
                Ok(message) => message,
                Err(_) => break,
            },
            recv(done) -> _ => break,
        };

        // Ready select arms are picked at random, so done can lose the race above
        if is_done(&done) {
            break;
        }

        let Some(partial) = counter.process(message) else {
            continue;
        };

        select! {
            send(output, partial) -> res => {
                if res.is_err() {
                    break;
                }
            }
            recv(done) -> _ => break,
        }
    }
    debug!(
        "{} finished",
        thread::current().name().unwrap_or("worker")
    );
}
