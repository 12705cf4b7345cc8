//! Error types for pipeline construction, verb configuration, and record I/O.

use std::io;

use thiserror::Error;

/// Errors surfaced by pipeline construction, verb parsing, runners, and the
/// DKVP reader/writer.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A pipeline needs at least one stage.
    #[error("pipeline has no stages")]
    EmptyPipeline,

    /// Intermediate queues must hold at least one envelope.
    #[error("invalid queue capacity {0}: must be at least 1")]
    InvalidQueueCapacity(usize),

    #[error("unknown verb '{0}'")]
    UnknownVerb(String),

    /// A verb was given flags it cannot run with.
    #[error("{verb}: {message}")]
    VerbUsage { verb: String, message: String },

    /// The runner's input queue was disconnected before the end-of-stream
    /// envelope arrived.
    #[error("stage {index} ({stage}): input closed before end of stream")]
    InputClosed { stage: String, index: usize },

    /// The runner's downstream receiver went away.
    #[error("stage {index} ({stage}): output closed while forwarding")]
    OutputClosed { stage: String, index: usize },

    /// A reader or writer lost the other end of its queue.
    #[error("{endpoint}: queue disconnected before end of stream")]
    Disconnected { endpoint: &'static str },

    #[error("stage {index} ({stage}): runner panicked")]
    RunnerPanicked { stage: String, index: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PipelineError {
    pub(crate) fn usage(verb: &str, message: impl Into<String>) -> Self {
        PipelineError::VerbUsage {
            verb: verb.to_string(),
            message: message.into(),
        }
    }
}

/// A record-level failure carried by an error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{verb}: missing field '{field}'")]
    MissingField { verb: String, field: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
