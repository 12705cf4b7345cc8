//! Wiring stages into a running pipeline.
//!
//! ```text
//! input -> S0 -> q0 -> S1 -> q1 -> ... -> S(n-1) -> output
//! ```
//!
//! Each stage gets its own thread and the `n - 1` intermediate queues are
//! bounded, so a slow stage holds back everything upstream of it. The builder
//! returns as soon as the threads are started; the caller sees completion as
//! the end-of-stream envelope arriving on the output queue.

use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::envelope::{Envelope, EnvelopeReceiver, EnvelopeSender, queue};
use crate::error::{PipelineError, Result};
use crate::runner::{StageSummary, run_stage};
use crate::stage::{Emitter, Stage, apply};

/// Default capacity of the queues between stages.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Tuning for pipeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Envelopes each intermediate queue holds before sends block. Larger
    /// values let neighbouring stages drift further apart; output is the
    /// same for any value.
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Collects stages and launches them as a pipeline.
///
/// ```
/// use record_chain::{Envelope, PipelineBuilder, Record, Context, queue, verbs};
///
/// let (in_tx, in_rx) = queue(1);
/// let (out_tx, out_rx) = queue(1);
/// let args: Vec<String> = ["clean-whitespace", "-v"].iter().map(|s| s.to_string()).collect();
/// let running = PipelineBuilder::new()
///     .stages(verbs::parse_chain(&args)?)
///     .spawn(in_rx, out_tx)?;
///
/// in_tx.send(Envelope::data(Record::from_pairs([("a", " x ")]), Context::detached())).unwrap();
/// in_tx.send(Envelope::EndOfStream).unwrap();
///
/// let first = out_rx.recv().unwrap();
/// assert_eq!(first.record().unwrap().get("a").unwrap().as_str(), "x");
/// assert!(out_rx.recv().unwrap().is_end_of_stream());
/// running.join()?;
/// # Ok::<(), record_chain::PipelineError>(())
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// An empty builder with the default queue capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole construction config.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the capacity of every intermediate queue. Zero is rejected by
    /// [`spawn`](Self::spawn).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Append one stage.
    pub fn stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append stages in order.
    pub fn stages(mut self, stages: impl IntoIterator<Item = Box<dyn Stage>>) -> Self {
        self.stages.extend(stages);
        self
    }

    /// Start one runner thread per stage, reading from `input` and writing
    /// to `output`, and return without waiting for them.
    ///
    /// An empty stage list or a zero queue capacity is rejected before any
    /// thread starts.
    pub fn spawn(self, input: EnvelopeReceiver, output: EnvelopeSender) -> Result<RunningPipeline> {
        let n = self.stages.len();
        if n == 0 {
            return Err(PipelineError::EmptyPipeline);
        }
        let capacity = self.config.queue_capacity;
        if capacity == 0 {
            return Err(PipelineError::InvalidQueueCapacity(capacity));
        }

        // Stage i reads receivers[i] and writes senders[i].
        let mut receivers = Vec::with_capacity(n);
        let mut senders = Vec::with_capacity(n);
        receivers.push(input);
        for _ in 1..n {
            let (tx, rx) = queue(capacity);
            senders.push(tx);
            receivers.push(rx);
        }
        senders.push(output);

        let mut runners = Vec::with_capacity(n);
        for (index, ((stage, rx), tx)) in self
            .stages
            .into_iter()
            .zip(receivers)
            .zip(senders)
            .enumerate()
        {
            let name = stage.name().to_string();
            let handle = thread::Builder::new()
                .name(format!("stage-{index}-{name}"))
                .spawn(move || run_stage(index, stage, rx, tx))?;
            runners.push(Runner {
                name,
                index,
                handle,
            });
        }
        debug!(stages = n, queue_capacity = capacity, "pipeline started");

        Ok(RunningPipeline { runners })
    }
}

#[derive(Debug)]
struct Runner {
    name: String,
    index: usize,
    handle: JoinHandle<Result<StageSummary>>,
}

/// Handle to the runner threads of a started pipeline.
#[derive(Debug)]
pub struct RunningPipeline {
    runners: Vec<Runner>,
}

impl RunningPipeline {
    /// Stage names, in pipeline order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.runners.iter().map(|r| r.name.as_str()).collect()
    }

    /// Number of stages, one runner thread each.
    pub fn len(&self) -> usize {
        self.runners.len()
    }

    /// Always `false` for a spawned pipeline.
    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Wait for every runner to terminate.
    ///
    /// Blocks until each stage has forwarded the end-of-stream envelope, so
    /// the output queue must be drained concurrently or beforehand. Every
    /// runner is joined. A panicked runner is reported ahead of the queue
    /// disconnects it causes in its neighbours; otherwise the first failure
    /// in pipeline order is returned.
    pub fn join(self) -> Result<Vec<StageSummary>> {
        let mut summaries = Vec::with_capacity(self.runners.len());
        let mut errors = Vec::new();
        for runner in self.runners {
            let result = runner
                .handle
                .join()
                .unwrap_or(Err(PipelineError::RunnerPanicked {
                    stage: runner.name,
                    index: runner.index,
                }));
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => errors.push(e),
            }
        }
        let panicked = errors
            .iter()
            .position(|e| matches!(e, PipelineError::RunnerPanicked { .. }));
        if let Some(i) = panicked {
            return Err(errors.swap_remove(i));
        }
        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(summaries),
        }
    }
}

/// Run envelopes through stages on the calling thread.
///
/// Each input envelope is pushed through the whole chain before the next
/// one is taken, and input stops at the first end-of-stream envelope. Output
/// matches what a spawned pipeline delivers to its output queue for the same
/// stages and input.
pub fn run_inline(
    stages: &mut [Box<dyn Stage>],
    input: impl IntoIterator<Item = Envelope>,
) -> Vec<Envelope> {
    let mut output = Vec::new();
    for envelope in input {
        let terminal = envelope.is_end_of_stream();
        output.extend(push_through_stages(vec![envelope], stages));
        if terminal {
            break;
        }
    }
    output
}

fn push_through_stages(envelopes: Vec<Envelope>, stages: &mut [Box<dyn Stage>]) -> Vec<Envelope> {
    let mut current = envelopes;
    for stage in stages.iter_mut() {
        let mut next = Vec::new();
        let mut send = |e: Envelope| {
            next.push(e);
            true
        };
        let mut emit = Emitter::new(&mut send);
        for envelope in current {
            apply(stage.as_mut(), envelope, &mut emit);
        }
        current = next;
    }
    current
}
