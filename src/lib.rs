//! # record-chain
//!
//! A streaming record pipeline: a chain of transformation stages ("verbs")
//! each running on its own thread, connected by small bounded queues.
//!
//! ## Overview
//!
//! - **Envelopes**: a stream is a run of data envelopes (a [`Record`] plus
//!   its [`Context`]) closed by exactly one [`Envelope::EndOfStream`]
//! - **Stages**: each [`Stage`] turns one record into zero or more records,
//!   and may hold records back until the end of the stream
//! - **Runners**: one thread per stage; the runner, not the stage, forwards
//!   the end-of-stream envelope, once, after the stage's final flush
//! - **Backpressure**: a full queue blocks its sender, so the slowest stage
//!   sets the pace of the whole chain
//!
//! ## Example
//!
//! ```
//! use record_chain::{dkvp, queue, verbs, Envelope, PipelineBuilder};
//!
//! let args: Vec<String> = "clean-whitespace -v then head -n 1"
//!     .split(' ')
//!     .map(String::from)
//!     .collect();
//! let (in_tx, in_rx) = queue(1);
//! let (out_tx, out_rx) = queue(1);
//! let running = PipelineBuilder::new()
//!     .stages(verbs::parse_chain(&args)?)
//!     .spawn(in_rx, out_tx)?;
//!
//! std::thread::spawn(move || {
//!     in_tx.send(dkvp::envelope("a= x ,b=y  z")).unwrap();
//!     in_tx.send(dkvp::envelope("a=dropped")).unwrap();
//!     in_tx.send(Envelope::EndOfStream).unwrap();
//! });
//!
//! let mut out = Vec::new();
//! let summary = dkvp::write_stream(&out_rx, &mut out)?;
//! running.join()?;
//!
//! assert_eq!(String::from_utf8(out).unwrap(), "a=x,b=y z\n");
//! assert_eq!(summary.records, 1);
//! # Ok::<(), record_chain::PipelineError>(())
//! ```

pub mod dkvp;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod stage;
pub mod verbs;

pub use envelope::{Envelope, EnvelopeReceiver, EnvelopeSender, queue};
pub use error::{PipelineError, RecordError, Result};
pub use pipeline::{
    DEFAULT_QUEUE_CAPACITY, PipelineBuilder, PipelineConfig, RunningPipeline, run_inline,
};
pub use record::{Context, Record, Value};
pub use runner::{StageSummary, run_stage};
pub use stage::{Emitter, Stage, StageState, apply};
