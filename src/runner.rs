//! The per-stage worker loop.

use tracing::{debug, error};

use crate::envelope::{Envelope, EnvelopeReceiver, EnvelopeSender};
use crate::error::{PipelineError, Result};
use crate::stage::{Emitter, Stage, StageState, apply};

/// What one runner did before it terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub name: String,
    pub index: usize,
    /// Data records received.
    pub records_in: u64,
    /// Data records emitted.
    pub records_out: u64,
    /// Error envelopes emitted or passed through.
    pub errors: u64,
}

/// Drive one stage until it has forwarded the end-of-stream envelope.
///
/// An empty input queue only blocks; the loop ends after the terminal
/// envelope has gone downstream. A disconnected queue on either side is a
/// broken pipeline and ends the runner with an error instead.
pub fn run_stage(
    index: usize,
    mut stage: Box<dyn Stage>,
    input: EnvelopeReceiver,
    output: EnvelopeSender,
) -> Result<StageSummary> {
    let mut summary = StageSummary {
        name: stage.name().to_string(),
        index,
        records_in: 0,
        records_out: 0,
        errors: 0,
    };
    debug!(stage = %summary.name, index, "runner started");

    loop {
        let Ok(envelope) = input.recv() else {
            error!(stage = %summary.name, index, "input queue closed before end of stream");
            return Err(PipelineError::InputClosed {
                stage: summary.name,
                index,
            });
        };
        if matches!(envelope, Envelope::Data { .. }) {
            summary.records_in += 1;
        }

        let mut send = |e: Envelope| output.send(e).is_ok();
        let mut emit = Emitter::new(&mut send);
        let state = apply(stage.as_mut(), envelope, &mut emit);
        summary.records_out += emit.records();
        summary.errors += emit.errors();

        if emit.is_closed() {
            error!(stage = %summary.name, index, "output queue closed while forwarding");
            return Err(PipelineError::OutputClosed {
                stage: summary.name,
                index,
            });
        }
        if state == StageState::Terminated {
            debug!(
                stage = %summary.name,
                index,
                records_in = summary.records_in,
                records_out = summary.records_out,
                errors = summary.errors,
                "runner terminated"
            );
            return Ok(summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::envelope::queue;
    use crate::record::{Context, Record};

    struct Passthrough;

    impl Stage for Passthrough {
        fn process(&mut self, record: Record, context: &Arc<Context>, emit: &mut Emitter<'_>) {
            emit.emit(record, Arc::clone(context));
        }

        fn name(&self) -> &str {
            "passthrough"
        }
    }

    #[test]
    fn test_runner_terminates_after_forwarding_end_of_stream() {
        let (in_tx, in_rx) = queue(1);
        let (out_tx, out_rx) = queue(1);
        let handle = thread::spawn(move || run_stage(0, Box::new(Passthrough), in_rx, out_tx));

        in_tx
            .send(Envelope::data(Record::from_pairs([("a", "1")]), Context::detached()))
            .unwrap();
        assert!(out_rx.recv().unwrap().record().is_some());
        in_tx.send(Envelope::EndOfStream).unwrap();
        assert!(out_rx.recv().unwrap().is_end_of_stream());

        let summary = handle.join().unwrap().unwrap();
        assert_eq!(summary.records_in, 1);
        assert_eq!(summary.records_out, 1);
        // the runner dropped its sender on exit
        assert!(out_rx.recv().is_err());
    }

    #[test]
    fn test_runner_keeps_waiting_on_empty_input() {
        let (in_tx, in_rx) = queue(1);
        let (out_tx, out_rx) = queue(1);
        let handle = thread::spawn(move || run_stage(0, Box::new(Passthrough), in_rx, out_tx));

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!handle.is_finished());

        in_tx.send(Envelope::EndOfStream).unwrap();
        assert!(out_rx.recv().unwrap().is_end_of_stream());
        assert!(handle.join().unwrap().is_ok());
    }

    #[test]
    fn test_runner_reports_closed_input() {
        let (in_tx, in_rx) = queue(1);
        let (out_tx, _out_rx) = queue(1);
        drop(in_tx);
        let err = run_stage(3, Box::new(Passthrough), in_rx, out_tx).unwrap_err();
        assert!(matches!(err, PipelineError::InputClosed { index: 3, .. }));
    }

    #[test]
    fn test_runner_reports_closed_output() {
        let (in_tx, in_rx) = queue(2);
        let (out_tx, out_rx) = queue(1);
        drop(out_rx);
        in_tx
            .send(Envelope::data(Record::new(), Context::detached()))
            .unwrap();
        let err = run_stage(0, Box::new(Passthrough), in_rx, out_tx).unwrap_err();
        assert!(matches!(err, PipelineError::OutputClosed { .. }));
    }
}
