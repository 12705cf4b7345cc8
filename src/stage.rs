//! The stage contract.
//!
//! A [`Stage`] sees data records one at a time and may emit any number of
//! records for each. Stateful stages hold records back and release them from
//! [`Stage::flush`], which runs when the end of the stream arrives. Stages
//! never see or emit the end-of-stream envelope themselves: [`apply`]
//! forwards it exactly once after the flush, and [`Emitter`] has no way to
//! produce one.

use std::sync::Arc;

use crate::envelope::Envelope;
use crate::error::RecordError;
use crate::record::{Context, Record};

/// A pipeline stage that processes records one at a time.
///
/// Implementations own all of their state; a stage runs on exactly one
/// runner thread.
pub trait Stage: Send {
    /// Process a single data record, emitting zero or more output records.
    fn process(&mut self, record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>);

    /// Emit any deferred output. Called once, when the end of the stream
    /// arrives and before it is forwarded.
    fn flush(&mut self, _emit: &mut Emitter<'_>) {}

    /// The verb name of this stage.
    fn name(&self) -> &str;
}

/// Whether a stage is still consuming its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Running,
    Terminated,
}

/// Output handle given to a stage.
///
/// Envelopes go straight to the downstream queue, so a fan-out stage is
/// subject to backpressure between emissions. Once the downstream side is
/// gone, further emissions are dropped and [`Emitter::is_closed`] reports it.
pub struct Emitter<'a> {
    send: &'a mut dyn FnMut(Envelope) -> bool,
    records: u64,
    errors: u64,
    closed: bool,
}

impl<'a> Emitter<'a> {
    /// Wrap a send function. It returns `false` when the receiver is gone.
    pub fn new(send: &'a mut dyn FnMut(Envelope) -> bool) -> Self {
        Self {
            send,
            records: 0,
            errors: 0,
            closed: false,
        }
    }

    /// Emit a data record.
    pub fn emit(&mut self, record: Record, context: Arc<Context>) {
        if self.forward(Envelope::Data { record, context }) {
            self.records += 1;
        }
    }

    /// Emit a record-level error in place of a record.
    pub fn emit_error(&mut self, error: RecordError, context: Arc<Context>) {
        if self.forward(Envelope::Error { error, context }) {
            self.errors += 1;
        }
    }

    /// Data records emitted so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Error envelopes emitted or passed through so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn forward(&mut self, envelope: Envelope) -> bool {
        if self.closed {
            return false;
        }
        if !(self.send)(envelope) {
            self.closed = true;
        }
        !self.closed
    }
}

/// Run one envelope through a stage.
///
/// Data goes to [`Stage::process`]. Error envelopes pass through untouched,
/// in position. The end-of-stream envelope triggers [`Stage::flush`] and is
/// then forwarded, once, as the last emission; the returned state is
/// [`StageState::Terminated`] only in that case.
pub fn apply(stage: &mut dyn Stage, envelope: Envelope, emit: &mut Emitter<'_>) -> StageState {
    match envelope {
        Envelope::Data { record, context } => {
            stage.process(record, &context, emit);
            StageState::Running
        }
        Envelope::Error { error, context } => {
            emit.emit_error(error, context);
            StageState::Running
        }
        Envelope::EndOfStream => {
            stage.flush(emit);
            emit.forward(Envelope::EndOfStream);
            StageState::Terminated
        }
    }
}
