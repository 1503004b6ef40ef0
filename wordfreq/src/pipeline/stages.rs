use crossbeam_channel::{bounded, select, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::errors::{FreqError, FreqResult};
use crate::frequency::FrequencyMap;
use crate::splitter::Chunk;

/// Item flowing from the generator to the workers
pub(crate) type ChunkMessage = FreqResult<Chunk>;

/// Item flowing from the workers to the aggregator
pub(crate) type PartialMessage = FreqResult<FrequencyMap>;

/// Cancellation broadcast shared by every stage.
///
/// Nothing is ever sent on the channel. Closing the signal drops its only
/// sender, which makes every `recv(done)` arm ready at once. Closing is
/// idempotent and also happens on drop, so the graph unwinds on every exit
/// path of the driver.
#[derive(Debug)]
pub struct DoneSignal {
    trigger: Option<Sender<()>>,
    listener: Receiver<()>,
}

impl DoneSignal {
    pub fn new() -> Self {
        let (trigger, listener) = bounded(0);
        Self {
            trigger: Some(trigger),
            listener,
        }
    }

    /// A receiver that becomes ready once the signal closes
    pub fn listener(&self) -> Receiver<()> {
        self.listener.clone()
    }

    pub fn close(&mut self) {
        if self.trigger.take().is_some() {
            debug!("Done signal closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.trigger.is_none()
    }
}

impl Default for DoneSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        self.close();
    }
}

/// Non-blocking check of a done listener
pub(crate) fn is_done(done: &Receiver<()>) -> bool {
    matches!(done.try_recv(), Err(TryRecvError::Disconnected))
}

/// Join handles of every thread spawned for one pipeline run
#[derive(Debug, Default)]
pub(crate) struct StageHandles {
    handles: Vec<(String, JoinHandle<()>)>,
}

impl StageHandles {
    pub fn push(&mut self, name: String, handle: JoinHandle<()>) {
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Joins every stage, reporting the first one that panicked
    pub fn join(self) -> FreqResult<()> {
        let mut panicked = None;
        for (name, handle) in self.handles {
            if handle.join().is_err() {
                error!("Pipeline stage {} panicked", name);
                panicked.get_or_insert(name);
            }
        }
        match panicked {
            Some(name) => Err(FreqError::StagePanicked(name)),
            None => Ok(()),
        }
    }
}

/// Spawns the generator stage, which drains `source` onto a bounded channel
pub(crate) fn spawn_generator<I>(
    done: Receiver<()>,
    source: I,
    capacity: usize,
    stages: &mut StageHandles,
) -> FreqResult<Receiver<ChunkMessage>>
where
    I: IntoIterator<Item = ChunkMessage>,
    I::IntoIter: Send + 'static,
{
    let (output, chunks) = bounded(capacity);
    let source = source.into_iter();
    let name = "wordfreq-generator".to_string();
    let handle = thread::Builder::new().name(name.clone()).spawn(move || {
        for message in source {
            if is_done(&done) {
                break;
            }
            select! {
                send(output, message) -> res => {
                    if res.is_err() {
                        break;
                    }
                }
                recv(done) -> _ => break,
            }
        }
        debug!("Generator finished");
    })?;
    stages.push(name, handle);
    Ok(chunks)
}

/// Merges the worker channels into one.
///
/// One forwarder thread runs per input and each owns a clone of the output
/// sender; the merged channel disconnects once the last forwarder exits.
pub(crate) fn fan_in(
    done: Receiver<()>,
    inputs: Vec<Receiver<PartialMessage>>,
    capacity: usize,
    stages: &mut StageHandles,
) -> FreqResult<Receiver<PartialMessage>> {
    let (output, merged) = bounded(capacity);

    for (id, input) in inputs.into_iter().enumerate() {
        let output = output.clone();
        let done = done.clone();
        let name = format!("wordfreq-fan-in-{}", id);
        let handle = thread::Builder::new().name(name.clone()).spawn(move || loop {
            let message = select! {
                recv(input) -> msg => match msg {
                    Ok(message) => message,
                    Err(_) => break,
                },
                recv(done) -> _ => break,
            };
            select! {
                send(output, message) -> res => {
                    if res.is_err() {
                        break;
                    }
                }
                recv(done) -> _ => break,
            }
        })?;
        stages.push(name, handle);
    }

    Ok(merged)
}

/// Running totals of the aggregation stage
#[derive(Debug, Default)]
pub struct Aggregate {
    /// The final frequency map
    pub frequencies: FrequencyMap,
    /// Chunk- and file-level failures, in arrival order
    pub failures: Vec<FreqError>,
    /// Number of partial maps folded in
    pub partials_merged: u64,
}

impl Aggregate {
    /// Folds one worker result into the totals
    pub fn absorb(mut self, message: PartialMessage) -> Self {
        self.record(message);
        self
    }

    pub fn record(&mut self, message: PartialMessage) {
        match message {
            Ok(partial) => {
                self.frequencies.merge(partial);
                self.partials_merged += 1;
            }
            Err(e) => {
                warn!("Skipping input: {}", e);
                self.failures.push(e);
            }
        }
    }

    /// Combines two independent aggregates
    pub fn combine(mut self, other: Aggregate) -> Self {
        self.frequencies.merge(other.frequencies);
        self.failures.extend(other.failures);
        self.partials_merged += other.partials_merged;
        self
    }
}

/// Drains the merged channel on the calling thread.
///
/// This is the only place the final map is mutated. With a `deadline` the
/// stage gives up once it expires and returns [`FreqError::Timeout`].
pub(crate) fn aggregate(
    input: Receiver<PartialMessage>,
    deadline: Option<Duration>,
) -> FreqResult<Aggregate> {
    let timer = match deadline {
        Some(limit) => crossbeam_channel::after(limit),
        None => crossbeam_channel::never(),
    };

    let mut totals = Aggregate::default();
    loop {
        select! {
            recv(input) -> msg => match msg {
                Ok(message) => totals.record(message),
                Err(_) => break,
            },
            recv(timer) -> _ => {
                let limit = deadline.unwrap_or_default();
                warn!("Aggregation timed out after {:?}", limit);
                return Err(FreqError::Timeout(limit));
            }
        }
    }

    debug!(
        "Aggregated {} partial maps, {} failures",
        totals.partials_merged,
        totals.failures.len()
    );
    Ok(totals)
}
