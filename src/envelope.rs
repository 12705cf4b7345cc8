//! The unit that travels between stages.
//!
//! A stream is a finite run of `Data` (and possibly `Error`) envelopes
//! followed by exactly one `EndOfStream`. The terminal variant carries no
//! record, so "end of stream with data attached" cannot be represented.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::error::RecordError;
use crate::record::{Context, Record};

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Data {
        record: Record,
        context: Arc<Context>,
    },
    /// A record-level failure, kept in stream position.
    Error {
        error: RecordError,
        context: Arc<Context>,
    },
    EndOfStream,
}

impl Envelope {
    /// Wrap a record and its origin as a data envelope.
    pub fn data(record: Record, context: Arc<Context>) -> Self {
        Envelope::Data { record, context }
    }

    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Envelope::EndOfStream)
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Envelope::Data { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Envelope::Data { record, .. } => Some(record),
            _ => None,
        }
    }
}

/// Sending half of an envelope queue.
pub type EnvelopeSender = Sender<Envelope>;
/// Receiving half of an envelope queue.
pub type EnvelopeReceiver = Receiver<Envelope>;

/// Create a bounded envelope queue. Sends block while `capacity` envelopes
/// are waiting.
pub fn queue(capacity: usize) -> (EnvelopeSender, EnvelopeReceiver) {
    bounded(capacity)
}
