//! DKVP ("delimited key-value pairs") reading and writing.
//!
//! One record per line, fields separated by `,`, key and value by `=`:
//!
//! ```text
//! a=1,b=hello,c=3.5
//! ```
//!
//! A field without `=` is keyed by its 1-based position. Empty lines are
//! skipped. The reader is the pipeline's source: it sends one data envelope
//! per line and then the single end-of-stream envelope. The writer is the
//! sink: it drains envelopes until the end of the stream.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::envelope::{Envelope, EnvelopeReceiver, EnvelopeSender};
use crate::error::{PipelineError, Result};
use crate::record::{Context, Record};

const FIELD_SEPARATOR: char = ',';
const PAIR_SEPARATOR: char = '=';

/// Parse one DKVP line into a record.
pub fn parse_line(line: &str) -> Record {
    let mut record = Record::new();
    for (i, field) in line.split(FIELD_SEPARATOR).enumerate() {
        match field.split_once(PAIR_SEPARATOR) {
            Some((key, value)) => record.put(key, value),
            None => record.put((i + 1).to_string(), field),
        }
    }
    record
}

/// Format a record as one DKVP line, without the newline.
pub fn format_record(record: &Record) -> String {
    let mut line = String::new();
    for (i, (key, value)) in record.iter().enumerate() {
        if i > 0 {
            line.push(FIELD_SEPARATOR);
        }
        line.push_str(key);
        line.push(PAIR_SEPARATOR);
        line.push_str(value.as_str());
    }
    line
}

/// Running record numbers across all inputs.
#[derive(Debug, Default)]
struct Position {
    filenum: usize,
    nr: u64,
}

/// Read every line of one input as data envelopes. Returns `false` if the
/// downstream queue has gone away.
fn send_lines<R: BufRead>(
    reader: R,
    filename: Option<&str>,
    position: &mut Position,
    tx: &EnvelopeSender,
) -> Result<bool> {
    position.filenum += 1;
    let mut fnr = 0;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        fnr += 1;
        position.nr += 1;
        let context = Context::new(
            filename.map(str::to_string),
            position.filenum,
            position.nr,
            fnr,
        );
        if tx.send(Envelope::data(parse_line(line), context)).is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Read DKVP records from `paths` in order (stdin when empty) and send them
/// followed by one end-of-stream envelope. Returns the number of records
/// sent.
///
/// A read error stops reading; the end-of-stream envelope is still sent so
/// the pipeline drains, and the error is returned.
pub fn read_into(paths: &[PathBuf], tx: &EnvelopeSender) -> Result<u64> {
    let mut position = Position::default();
    let result = read_all(paths, &mut position, tx);
    if tx.send(Envelope::EndOfStream).is_err() {
        return Err(PipelineError::Disconnected { endpoint: "reader" });
    }
    debug!(records = position.nr, files = position.filenum, "input read");
    result.map(|()| position.nr)
}

fn read_all(paths: &[PathBuf], position: &mut Position, tx: &EnvelopeSender) -> Result<()> {
    if paths.is_empty() {
        let stdin = io::stdin();
        if !send_lines(stdin.lock(), None, position, tx)? {
            return Err(PipelineError::Disconnected { endpoint: "reader" });
        }
        return Ok(());
    }
    for path in paths {
        let file = File::open(path)?;
        let name = path.display().to_string();
        if !send_lines(BufReader::new(file), Some(&name), position, tx)? {
            return Err(PipelineError::Disconnected { endpoint: "reader" });
        }
    }
    Ok(())
}

/// [`read_into`] on its own thread, taking ownership of the sender.
pub fn spawn_reader(paths: Vec<PathBuf>, tx: EnvelopeSender) -> Result<JoinHandle<Result<u64>>> {
    let handle = thread::Builder::new()
        .name("dkvp-reader".to_string())
        .spawn(move || read_into(&paths, &tx))?;
    Ok(handle)
}

/// What the writer saw before the end of the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSummary {
    pub records: u64,
    pub errors: u64,
}

/// Write data envelopes as DKVP lines until the end-of-stream envelope.
/// Error envelopes are logged with their source position and counted.
pub fn write_stream<W: Write>(rx: &EnvelopeReceiver, writer: &mut W) -> Result<SinkSummary> {
    let mut summary = SinkSummary::default();
    loop {
        let Ok(envelope) = rx.recv() else {
            return Err(PipelineError::Disconnected { endpoint: "writer" });
        };
        match envelope {
            Envelope::Data { record, .. } => {
                writeln!(writer, "{}", format_record(&record))?;
                summary.records += 1;
            }
            Envelope::Error { error, context } => {
                warn!(source = %context, "{error}");
                summary.errors += 1;
            }
            Envelope::EndOfStream => break,
        }
    }
    writer.flush()?;
    Ok(summary)
}

/// A detached data envelope from a DKVP line.
pub fn envelope(line: &str) -> Envelope {
    Envelope::data(parse_line(line), Context::detached())
}
